// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file assembly.
//!
//! Turns a [`Timeline`] into a Type 1 MIDI file: one track per non-empty
//! part in track order, each on its part's channel and opened with a track
//! name and program change. The first track also carries tempo and a 4/4
//! time signature.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::config::InstrumentPrograms;
use crate::timeline::{micros_per_beat, EventKind, NoteEvent, Part, Timeline, TICKS_PER_BEAT};

/// Largest value a variable-length quantity can hold
const MAX_VLQ: u32 = 0x0FFF_FFFF;

/// Largest tempo the three-byte tempo meta event can hold
const MAX_TEMPO_MICROS: u32 = 0x00FF_FFFF;

/// MIDI file writing failure
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write MIDI file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One event in a track, at an absolute tick
#[derive(Debug, Clone)]
struct TrackEvent {
    tick: u64,
    data: Vec<u8>,
}

impl TrackEvent {
    fn note(tick: u64, channel: u8, event: &NoteEvent) -> Self {
        let data = match event.kind {
            EventKind::NoteOn => vec![
                0x90 | (channel & 0x0F),
                event.pitch & 0x7F,
                event.velocity & 0x7F,
            ],
            EventKind::NoteOff => vec![0x80 | (channel & 0x0F), event.pitch & 0x7F, 0],
        };
        Self { tick, data }
    }

    fn program_change(channel: u8, program: u8) -> Self {
        Self {
            tick: 0,
            data: vec![0xC0 | (channel & 0x0F), program & 0x7F],
        }
    }

    fn tempo(bpm: u32) -> Self {
        let micros = micros_per_beat(bpm).min(MAX_TEMPO_MICROS);
        Self {
            tick: 0,
            data: vec![
                0xFF,
                0x51,
                0x03,
                ((micros >> 16) & 0xFF) as u8,
                ((micros >> 8) & 0xFF) as u8,
                (micros & 0xFF) as u8,
            ],
        }
    }

    /// 4/4, 24 clocks per click, 8 thirty-seconds per quarter
    fn common_time() -> Self {
        Self {
            tick: 0,
            data: vec![0xFF, 0x58, 0x04, 4, 2, 24, 8],
        }
    }

    fn track_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut data = vec![0xFF, 0x03];
        write_variable_length(&mut data, bytes.len() as u32);
        data.extend_from_slice(bytes);
        Self { tick: 0, data }
    }
}

/// Builds Type 1 MIDI files from timelines
#[derive(Debug, Clone)]
pub struct MidiAssembler<'a> {
    tempo: u32,
    programs: &'a InstrumentPrograms,
}

impl<'a> MidiAssembler<'a> {
    pub fn new(tempo: u32, programs: &'a InstrumentPrograms) -> Self {
        Self { tempo, programs }
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    /// Assemble the file. Same timeline in, same bytes out.
    pub fn assemble(&self, timeline: &Timeline) -> Vec<u8> {
        let parts: Vec<(Part, &[NoteEvent])> = timeline.parts().collect();
        let mut buffer = Vec::new();

        if parts.is_empty() {
            write_header(&mut buffer, 1);
            write_track(&mut buffer, &[]);
            return buffer;
        }

        write_header(&mut buffer, parts.len() as u16);
        for (index, (part, events)) in parts.iter().enumerate() {
            let track = self.track_events(*part, events, index == 0);
            debug!("Assembled {} track: {} events", part, events.len());
            write_track(&mut buffer, &track);
        }
        buffer
    }

    fn track_events(&self, part: Part, events: &[NoteEvent], first: bool) -> Vec<TrackEvent> {
        let channel = part.channel();
        let mut track = Vec::with_capacity(events.len() + 4);

        track.push(TrackEvent::program_change(channel, self.programs.program(part)));
        track.push(TrackEvent::track_name(part.label()));
        if first {
            track.push(TrackEvent::tempo(self.tempo));
            track.push(TrackEvent::common_time());
        }
        track.extend(events.iter().map(|e| TrackEvent::note(e.tick, channel, e)));
        track
    }
}

/// Assemble a timeline into Type 1 MIDI file bytes
pub fn assemble(timeline: &Timeline, tempo_bpm: u32, programs: &InstrumentPrograms) -> Vec<u8> {
    MidiAssembler::new(tempo_bpm, programs).assemble(timeline)
}

/// Write MIDI bytes to a file. The bytes go to a temporary file next to the
/// destination, which is then renamed into place.
pub fn write_midi_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_error = |source: io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.flush().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn write_header(buffer: &mut Vec<u8>, tracks: u16) {
    buffer.extend_from_slice(b"MThd");
    buffer.extend_from_slice(&6u32.to_be_bytes());
    buffer.extend_from_slice(&1u16.to_be_bytes());
    buffer.extend_from_slice(&tracks.to_be_bytes());
    buffer.extend_from_slice(&(TICKS_PER_BEAT as u16).to_be_bytes());
}

fn write_track(buffer: &mut Vec<u8>, events: &[TrackEvent]) {
    let mut data = Vec::new();
    let mut last_tick = 0u64;

    for event in events {
        let delta = event.tick.saturating_sub(last_tick).min(MAX_VLQ as u64);
        write_variable_length(&mut data, delta as u32);
        data.extend_from_slice(&event.data);
        last_tick = last_tick.max(event.tick);
    }

    // End of track
    write_variable_length(&mut data, 0);
    data.extend_from_slice(&[0xFF, 0x2F, 0x00]);

    buffer.extend_from_slice(b"MTrk");
    buffer.extend_from_slice(&(data.len() as u32).to_be_bytes());
    buffer.extend_from_slice(&data);
}

/// Write a variable-length quantity
fn write_variable_length(buffer: &mut Vec<u8>, value: u32) {
    let mut value = value.min(MAX_VLQ);
    let mut bytes = [0u8; 4];
    let mut len = 0;

    bytes[len] = (value & 0x7F) as u8;
    len += 1;
    value >>= 7;
    while value > 0 {
        bytes[len] = (value & 0x7F) as u8 | 0x80;
        len += 1;
        value >>= 7;
    }

    buffer.extend(bytes[..len].iter().rev());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::NoteBuffer;

    fn timeline_with(parts: &[Part]) -> Timeline {
        let mut timeline = Timeline::new(4, 120);
        for (i, &part) in parts.iter().enumerate() {
            let mut buffer = NoteBuffer::new(timeline.total_ticks());
            buffer.push(60 + i as u8, 100, 0, 480);
            buffer.push(64 + i as u8, 90, 480, 240);
            timeline.insert(part, buffer.into_events());
        }
        timeline
    }

    #[test]
    fn test_variable_length() {
        let mut buffer = Vec::new();
        write_variable_length(&mut buffer, 0);
        assert_eq!(buffer, vec![0x00]);

        buffer.clear();
        write_variable_length(&mut buffer, 127);
        assert_eq!(buffer, vec![0x7F]);

        buffer.clear();
        write_variable_length(&mut buffer, 128);
        assert_eq!(buffer, vec![0x81, 0x00]);

        buffer.clear();
        write_variable_length(&mut buffer, 16383);
        assert_eq!(buffer, vec![0xFF, 0x7F]);

        buffer.clear();
        write_variable_length(&mut buffer, u32::MAX);
        assert_eq!(buffer, vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_tempo_event() {
        let event = TrackEvent::tempo(120);
        // 500000 = 0x07A120
        assert_eq!(event.data, vec![0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
        // Too slow for three bytes: clamped
        assert_eq!(&TrackEvent::tempo(1).data[3..], &[0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_header_and_track_count() {
        let programs = InstrumentPrograms::default();
        let bytes = assemble(&timeline_with(&[Part::Bass, Part::Drums]), 174, &programs);

        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[8..10], &1u16.to_be_bytes());
        assert_eq!(&bytes[10..12], &2u16.to_be_bytes());
        assert_eq!(&bytes[12..14], &480u16.to_be_bytes());
        assert_eq!(&bytes[14..18], b"MTrk");
    }

    #[test]
    fn test_empty_timeline_is_one_empty_track() {
        let programs = InstrumentPrograms::default();
        let bytes = assemble(&Timeline::new(16, 120), 120, &programs);

        assert_eq!(&bytes[10..12], &1u16.to_be_bytes());
        assert_eq!(&bytes[14..18], b"MTrk");
        assert_eq!(&bytes[18..22], &4u32.to_be_bytes());
        assert_eq!(&bytes[22..], &[0x00, 0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn test_first_track_layout() {
        let programs = InstrumentPrograms::default();
        let bytes = assemble(&timeline_with(&[Part::Drums]), 120, &programs);
        let track = &bytes[22..];

        // Program change on channel 9 leads the track
        assert_eq!(&track[0..3], &[0x00, 0xC9, programs.drums]);
        // Track name "Drums"
        assert_eq!(&track[3..7], &[0x00, 0xFF, 0x03, 5]);
        assert_eq!(&track[7..12], b"Drums");
        // Tempo then time signature
        assert_eq!(&track[12..16], &[0x00, 0xFF, 0x51, 0x03]);
        assert_eq!(&track[19..27], &[0x00, 0xFF, 0x58, 0x04, 4, 2, 24, 8]);
        // First note on channel 9
        assert_eq!(&track[27..31], &[0x00, 0x99, 60, 100]);
        assert!(track.ends_with(&[0x00, 0xFF, 0x2F, 0x00]));
    }

    #[test]
    fn test_only_first_track_has_tempo() {
        let programs = InstrumentPrograms::default();
        let bytes = assemble(&timeline_with(&[Part::Bass, Part::Lead]), 120, &programs);
        let tempo_count = bytes.windows(3).filter(|w| w == &[0xFF, 0x51, 0x03]).count();
        assert_eq!(tempo_count, 1);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let programs = InstrumentPrograms::default();
        let timeline = timeline_with(&[Part::Bass, Part::Chords, Part::Drums]);
        assert_eq!(
            assemble(&timeline, 140, &programs),
            assemble(&timeline, 140, &programs)
        );
    }

    #[test]
    fn test_write_midi_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mid");
        let programs = InstrumentPrograms::default();
        let bytes = assemble(&timeline_with(&[Part::Lead]), 120, &programs);

        write_midi_file(&path, &bytes).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
        // Only the destination remains
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.mid");
        let err = write_midi_file(&path, b"MThd").unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
        assert!(!path.exists());
    }
}
