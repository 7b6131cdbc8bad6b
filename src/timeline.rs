// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Event timeline model.
//!
//! Absolute-tick note-on/note-off events at 480 ticks per beat, keyed by
//! part. Generators write sounding notes into a [`NoteBuffer`], which clamps
//! them to the composition length and resolves same-pitch overlaps before
//! splitting them into events.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ticks per quarter-note beat
pub const TICKS_PER_BEAT: u32 = 480;

/// Beats in one 4/4 measure
pub const BEATS_PER_MEASURE: u32 = 4;

/// Ticks in one 4/4 measure
pub const TICKS_PER_MEASURE: u64 = (TICKS_PER_BEAT * BEATS_PER_MEASURE) as u64;

/// Total ticks for a duration in beats
pub fn total_ticks(beats: u32) -> u64 {
    beats as u64 * TICKS_PER_BEAT as u64
}

/// Microseconds per beat for a tempo, rounded to the nearest microsecond
/// and never below one
pub fn micros_per_beat(bpm: u32) -> u32 {
    ((60_000_000.0 / bpm.max(1) as f64).round() as u32).max(1)
}

/// Musical parts, in track order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Bass,
    Chords,
    Lead,
    Pads,
    Arpeggio,
    Drums,
}

impl Part {
    pub const ALL: [Part; 6] = [
        Part::Bass,
        Part::Chords,
        Part::Lead,
        Part::Pads,
        Part::Arpeggio,
        Part::Drums,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Part::Bass => "bass",
            Part::Chords => "chords",
            Part::Lead => "lead",
            Part::Pads => "pads",
            Part::Arpeggio => "arpeggio",
            Part::Drums => "drums",
        }
    }

    /// Track name written to the MIDI file
    pub fn label(self) -> &'static str {
        match self {
            Part::Bass => "Bass",
            Part::Chords => "Chords",
            Part::Lead => "Lead",
            Part::Pads => "Pads",
            Part::Arpeggio => "Arpeggio",
            Part::Drums => "Drums",
        }
    }

    /// MIDI channel (0-based); drums use the General MIDI percussion channel
    pub fn channel(self) -> u8 {
        match self {
            Part::Bass => 0,
            Part::Chords => 1,
            Part::Lead => 2,
            Part::Pads => 3,
            Part::Arpeggio => 4,
            Part::Drums => 9,
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bass" => Some(Part::Bass),
            "chords" | "chord" => Some(Part::Chords),
            "lead" | "melody" => Some(Part::Lead),
            "pads" | "pad" => Some(Part::Pads),
            "arpeggio" | "arp" => Some(Part::Arpeggio),
            "drums" | "drum" => Some(Part::Drums),
            _ => None,
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Rhythmic note values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmValue {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    DottedHalf,
    DottedQuarter,
    DottedEighth,
}

impl RhythmValue {
    /// Length in ticks
    pub fn ticks(self) -> u64 {
        let beat = TICKS_PER_BEAT as u64;
        match self {
            RhythmValue::Whole => beat * 4,
            RhythmValue::Half => beat * 2,
            RhythmValue::Quarter => beat,
            RhythmValue::Eighth => beat / 2,
            RhythmValue::Sixteenth => beat / 4,
            RhythmValue::ThirtySecond => beat / 8,
            RhythmValue::DottedHalf => beat * 3,
            RhythmValue::DottedQuarter => beat * 3 / 2,
            RhythmValue::DottedEighth => beat * 3 / 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NoteOn,
    NoteOff,
}

/// One note event at an absolute tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub kind: EventKind,
    pub pitch: u8,
    pub velocity: u8,
    pub tick: u64,
}

impl NoteEvent {
    pub fn note_on(pitch: u8, velocity: u8, tick: u64) -> Self {
        Self {
            kind: EventKind::NoteOn,
            pitch,
            velocity,
            tick,
        }
    }

    pub fn note_off(pitch: u8, tick: u64) -> Self {
        Self {
            kind: EventKind::NoteOff,
            pitch,
            velocity: 0,
            tick,
        }
    }
}

/// A sounding note: pitch, velocity and its [start, end) tick span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteSpan {
    pub pitch: u8,
    pub velocity: u8,
    pub start: u64,
    pub end: u64,
}

impl NoteSpan {
    pub fn duration(&self) -> u64 {
        self.end - self.start
    }
}

/// Broken note-on/note-off pairing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    #[error("note-off for pitch {pitch} at tick {tick} has no sounding note")]
    OrphanNoteOff { pitch: u8, tick: u64 },
    #[error("note-on for pitch {pitch} at tick {tick} overlaps a sounding note")]
    Overlap { pitch: u8, tick: u64 },
    #[error("note-on for pitch {pitch} at tick {tick} is never released")]
    Unreleased { pitch: u8, tick: u64 },
    #[error("note-on for pitch {pitch} at tick {tick} has zero velocity")]
    SilentNoteOn { pitch: u8, tick: u64 },
    #[error("event for pitch {pitch} at tick {tick} is past the end ({total})")]
    PastEnd { pitch: u8, tick: u64, total: u64 },
}

/// Sort events by tick; at equal ticks note-offs come first, then by pitch
pub fn sort_events(events: &mut [NoteEvent]) {
    events.sort_by_key(|e| {
        let rank = match e.kind {
            EventKind::NoteOff => 0u8,
            EventKind::NoteOn => 1u8,
        };
        (e.tick, rank, e.pitch)
    });
}

/// Pair note-ons with note-offs, checking the event invariants.
///
/// Events must already be in timeline order.
pub fn pair_events(events: &[NoteEvent]) -> Result<Vec<NoteSpan>, PairingError> {
    let mut sounding: [Option<(u64, u8)>; 128] = [None; 128];
    let mut spans = Vec::with_capacity(events.len() / 2);

    for event in events {
        let slot = &mut sounding[(event.pitch & 0x7F) as usize];
        match event.kind {
            EventKind::NoteOn => {
                if event.velocity == 0 {
                    return Err(PairingError::SilentNoteOn {
                        pitch: event.pitch,
                        tick: event.tick,
                    });
                }
                if slot.is_some() {
                    return Err(PairingError::Overlap {
                        pitch: event.pitch,
                        tick: event.tick,
                    });
                }
                *slot = Some((event.tick, event.velocity));
            }
            EventKind::NoteOff => {
                let (start, velocity) = slot.take().ok_or(PairingError::OrphanNoteOff {
                    pitch: event.pitch,
                    tick: event.tick,
                })?;
                spans.push(NoteSpan {
                    pitch: event.pitch,
                    velocity,
                    start,
                    end: event.tick,
                });
            }
        }
    }

    if let Some((pitch, (tick, _))) = sounding
        .iter()
        .enumerate()
        .find_map(|(pitch, slot)| slot.map(|s| (pitch as u8, s)))
    {
        return Err(PairingError::Unreleased { pitch, tick });
    }

    spans.sort_by_key(|s| (s.start, s.pitch));
    Ok(spans)
}

/// Check that a part's events pair up and stay inside the composition
pub fn check_part(events: &[NoteEvent], total_ticks: u64) -> Result<(), PairingError> {
    if let Some(late) = events.iter().find(|e| e.tick > total_ticks) {
        return Err(PairingError::PastEnd {
            pitch: late.pitch,
            tick: late.tick,
            total: total_ticks,
        });
    }
    pair_events(events).map(|_| ())
}

/// Collects notes for one part and turns them into well-formed events.
#[derive(Debug, Clone)]
pub struct NoteBuffer {
    total_ticks: u64,
    notes: Vec<NoteSpan>,
}

impl NoteBuffer {
    pub fn new(total_ticks: u64) -> Self {
        Self {
            total_ticks,
            notes: Vec::new(),
        }
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Add a note. Notes starting at or after the end, or with a pitch above
    /// 127, are dropped; the rest are clamped to the end and to a length of
    /// at least one tick. Returns whether the note was kept.
    pub fn push(&mut self, pitch: u8, velocity: u8, start: u64, duration: u64) -> bool {
        if start >= self.total_ticks || pitch > 127 {
            return false;
        }
        let end = (start + duration.max(1)).min(self.total_ticks);
        self.notes.push(NoteSpan {
            pitch,
            velocity: velocity.clamp(1, 127),
            start,
            end,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Resolve same-pitch overlaps and emit sorted events.
    ///
    /// A note overlapping the next note of the same pitch ends one tick before
    /// it; a note starting on the same tick as an earlier one is dropped.
    pub fn into_events(mut self) -> Vec<NoteEvent> {
        // Stable: among equal starts the first pushed wins
        self.notes.sort_by_key(|n| (n.pitch, n.start));

        let mut kept: Vec<NoteSpan> = Vec::with_capacity(self.notes.len());
        for note in self.notes {
            if let Some(prev) = kept.last_mut() {
                if prev.pitch == note.pitch && prev.end >= note.start {
                    if prev.start == note.start {
                        continue;
                    }
                    let trimmed = note.start - 1;
                    if trimmed > prev.start {
                        prev.end = trimmed;
                    } else {
                        kept.pop();
                    }
                }
            }
            kept.push(note);
        }

        let mut events = Vec::with_capacity(kept.len() * 2);
        for note in kept {
            events.push(NoteEvent::note_on(note.pitch, note.velocity, note.start));
            events.push(NoteEvent::note_off(note.pitch, note.end));
        }
        sort_events(&mut events);
        events
    }
}

/// Part-keyed events for one composition
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    parts: BTreeMap<Part, Vec<NoteEvent>>,
    beats: u32,
    bpm: u32,
}

impl Timeline {
    pub fn new(beats: u32, bpm: u32) -> Self {
        Self {
            parts: BTreeMap::new(),
            beats,
            bpm,
        }
    }

    /// Set a part's events, replacing any previous ones
    pub fn insert(&mut self, part: Part, mut events: Vec<NoteEvent>) {
        sort_events(&mut events);
        self.parts.insert(part, events);
    }

    pub fn events(&self, part: Part) -> &[NoteEvent] {
        self.parts.get(&part).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parts with at least one event, in track order
    pub fn parts(&self) -> impl Iterator<Item = (Part, &[NoteEvent])> {
        self.parts
            .iter()
            .filter(|(_, events)| !events.is_empty())
            .map(|(part, events)| (*part, events.as_slice()))
    }

    pub fn has_part(&self, part: Part) -> bool {
        !self.events(part).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.parts().next().is_none()
    }

    pub fn event_count(&self) -> usize {
        self.parts.values().map(Vec::len).sum()
    }

    pub fn beats(&self) -> u32 {
        self.beats
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn total_ticks(&self) -> u64 {
        total_ticks(self.beats)
    }

    pub fn micros_per_beat(&self) -> u32 {
        micros_per_beat(self.bpm)
    }

    /// Note rectangles for a piano roll
    pub fn note_spans(&self, part: Part) -> Result<Vec<NoteSpan>, PairingError> {
        pair_events(self.events(part))
    }

    /// Lowest and highest pitch across all parts
    pub fn pitch_range(&self) -> Option<(u8, u8)> {
        let mut pitches = self.parts.values().flatten().map(|e| e.pitch);
        let first = pitches.next()?;
        Some(pitches.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// A copy holding a single part
    pub fn only(&self, part: Part) -> Timeline {
        let mut single = Timeline::new(self.beats, self.bpm);
        if let Some(events) = self.parts.get(&part) {
            single.parts.insert(part, events.clone());
        }
        single
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_math() {
        assert_eq!(total_ticks(16), 7680);
        assert_eq!(micros_per_beat(120), 500_000);
        assert_eq!(micros_per_beat(174), 344_828);
        assert_eq!(micros_per_beat(u32::MAX), 1);
        assert_eq!(micros_per_beat(120_000_000), 1);
        assert_eq!(RhythmValue::DottedEighth.ticks(), 360);
        assert_eq!(RhythmValue::ThirtySecond.ticks(), 60);
    }

    #[test]
    fn test_part_channels() {
        assert_eq!(Part::Drums.channel(), 9);
        assert_eq!(Part::from_name("Arp"), Some(Part::Arpeggio));
        assert_eq!(Part::from_name("kazoo"), None);
    }

    #[test]
    fn test_buffer_clamps_to_end() {
        let mut buffer = NoteBuffer::new(960);
        assert!(buffer.push(60, 100, 480, 960));
        assert!(!buffer.push(62, 100, 960, 120));
        assert!(buffer.push(64, 0, 0, 0));

        let events = buffer.into_events();
        let spans = pair_events(&events).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], NoteSpan { pitch: 64, velocity: 1, start: 0, end: 1 });
        assert_eq!(spans[1].end, 960);
    }

    #[test]
    fn test_buffer_resolves_overlaps() {
        let mut buffer = NoteBuffer::new(1920);
        buffer.push(60, 100, 0, 480);
        buffer.push(60, 90, 240, 480); // overlaps the first
        buffer.push(60, 80, 240, 120); // duplicate start, dropped
        buffer.push(60, 70, 720, 240); // starts exactly when the second ends

        let events = buffer.into_events();
        let spans = pair_events(&events).unwrap();
        assert_eq!(spans.len(), 3);
        assert_eq!((spans[0].start, spans[0].end), (0, 239));
        assert_eq!((spans[1].start, spans[1].end, spans[1].velocity), (240, 719, 90));
        assert_eq!((spans[2].start, spans[2].end), (720, 960));
    }

    #[test]
    fn test_note_off_sorts_before_note_on() {
        let mut events = vec![
            NoteEvent::note_on(64, 100, 480),
            NoteEvent::note_off(60, 480),
            NoteEvent::note_on(60, 100, 0),
        ];
        sort_events(&mut events);
        assert_eq!(events[0].tick, 0);
        assert_eq!(events[1].kind, EventKind::NoteOff);
        assert_eq!(events[2].kind, EventKind::NoteOn);
    }

    #[test]
    fn test_pairing_errors() {
        let orphan = [NoteEvent::note_off(60, 10)];
        assert!(matches!(
            pair_events(&orphan),
            Err(PairingError::OrphanNoteOff { .. })
        ));

        let hanging = [NoteEvent::note_on(60, 100, 0)];
        assert!(matches!(
            pair_events(&hanging),
            Err(PairingError::Unreleased { pitch: 60, tick: 0 })
        ));

        let late = [NoteEvent::note_on(60, 100, 0), NoteEvent::note_off(60, 2000)];
        assert!(matches!(
            check_part(&late, 1920),
            Err(PairingError::PastEnd { .. })
        ));
    }

    #[test]
    fn test_timeline_queries() {
        let mut timeline = Timeline::new(4, 120);
        let mut bass = NoteBuffer::new(timeline.total_ticks());
        bass.push(40, 100, 0, 480);
        timeline.insert(Part::Bass, bass.into_events());
        let mut lead = NoteBuffer::new(timeline.total_ticks());
        lead.push(76, 100, 480, 480);
        timeline.insert(Part::Lead, lead.into_events());
        timeline.insert(Part::Pads, Vec::new());

        assert_eq!(timeline.pitch_range(), Some((40, 76)));
        let parts: Vec<Part> = timeline.parts().map(|(p, _)| p).collect();
        assert_eq!(parts, vec![Part::Bass, Part::Lead]);
        assert_eq!(timeline.event_count(), 4);

        let only = timeline.only(Part::Lead);
        assert!(!only.has_part(Part::Bass));
        assert_eq!(only.note_spans(Part::Lead).unwrap().len(), 1);
        assert!(Timeline::new(4, 120).pitch_range().is_none());
    }
}
