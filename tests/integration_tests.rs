// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for genremidi
//!
//! These tests drive the public API end to end: genre loading, composition,
//! MIDI assembly and file output.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use genremidi::config::GenreFile;
use genremidi::{
    scale_intervals, Composer, Composition, EventKind, GenerationRequest, GenreStore, NoteEvent,
    Part, PartSelection, Timeline,
};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

fn bundled_genres() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("genres.yaml")
}

/// Note events of one parsed track as (kind, pitch, velocity, tick), plus
/// the channels its messages used
fn parse_track(track: &[midly::TrackEvent]) -> (Vec<NoteEvent>, BTreeSet<u8>) {
    let mut tick = 0u64;
    let mut notes = Vec::new();
    let mut channels = BTreeSet::new();

    for event in track {
        tick += event.delta.as_int() as u64;
        if let TrackEventKind::Midi { channel, message } = &event.kind {
            channels.insert(channel.as_int());
            match message {
                MidiMessage::NoteOn { key, vel } => {
                    notes.push(NoteEvent::note_on(key.as_int(), vel.as_int(), tick))
                }
                MidiMessage::NoteOff { key, .. } => {
                    notes.push(NoteEvent::note_off(key.as_int(), tick))
                }
                _ => {}
            }
        }
    }
    (notes, channels)
}

fn compose(store: &GenreStore, seed: u64, request: GenerationRequest) -> Composition {
    Composer::with_seed(store, seed).compose(&request).unwrap()
}

fn assert_timeline_well_formed(timeline: &Timeline) {
    for (part, events) in timeline.parts() {
        assert!(
            events.iter().all(|e| e.tick <= timeline.total_ticks()),
            "{} runs past the end",
            part
        );
        let spans = timeline
            .note_spans(part)
            .unwrap_or_else(|e| panic!("{}: {}", part, e));
        for pitch in 0..=127u8 {
            let mut same: Vec<_> = spans.iter().filter(|s| s.pitch == pitch).collect();
            same.sort_by_key(|s| s.start);
            for pair in same.windows(2) {
                assert!(pair[0].end < pair[1].start, "{} overlaps at pitch {}", part, pitch);
            }
        }
        assert!(spans.iter().all(|s| s.end > s.start));
    }
}

#[test]
fn test_every_bundled_genre_is_well_formed() {
    let store = GenreStore::try_load(bundled_genres()).unwrap();
    assert_eq!(store.len(), 14);

    for name in store.genre_names() {
        for seed in 0..3 {
            let request = GenerationRequest::new("E", 32)
                .with_genre(name)
                .with_parts(PartSelection::all());
            let composition = compose(&store, seed, request);
            assert_eq!(composition.genre(), name);
            assert_timeline_well_formed(composition.timeline());
            assert!(composition.timeline().has_part(Part::Drums), "{} has no drums", name);
        }
    }
}

#[test]
fn test_chords_and_pads_follow_the_progression() {
    let yaml = r#"
default_genre: Plain
genres:
  Plain:
    tempo: 120
    scale: Minor
    progressions:
      - [i, iv, VII, III]
    chords:
      voicing: { triad: 1.0, extended: 0.0, inverted: 1.0 }
    pads:
      voicing: { triad: 1.0, extended: 0.0, inverted: 0.0 }
"#;
    let store = GenreStore::from_file(GenreFile::from_yaml(yaml).unwrap()).unwrap();
    let request = GenerationRequest::new("A", 16)
        .with_parts(PartSelection::from_parts([Part::Chords, Part::Pads]));
    let composition = compose(&store, 4, request);

    let chords = composition.progression().resolve(composition.scale());
    assert_eq!(chords.len(), 4);
    let tonic = composition.root().root_midi();

    for part in [Part::Chords, Part::Pads] {
        let spans = composition.timeline().note_spans(part).unwrap();
        for measure in 0..4u64 {
            let sounding: BTreeSet<u8> = spans
                .iter()
                .filter(|s| s.start / 1920 == measure)
                .map(|s| s.pitch % 12)
                .collect();
            let expected: BTreeSet<u8> = chords[measure as usize % chords.len()]
                .pitch_classes(tonic)
                .into_iter()
                .collect();
            assert_eq!(sounding, expected, "{} measure {}", part, measure);
        }
    }
}

#[test]
fn test_assembled_file_reparses_to_the_timeline() {
    let store = GenreStore::builtin();
    let composition = compose(&store, 11, GenerationRequest::new("C#", 16));
    let bytes = composition.to_midi_bytes();
    let smf = Smf::parse(&bytes).unwrap();

    assert_eq!(smf.header.format, midly::Format::Parallel);
    assert!(matches!(smf.header.timing, Timing::Metrical(t) if t.as_int() == 480));

    let parts: Vec<(Part, &[NoteEvent])> = composition.timeline().parts().collect();
    assert_eq!(smf.tracks.len(), parts.len());

    for (track, (part, events)) in smf.tracks.iter().zip(parts) {
        assert!(matches!(
            track.first().map(|e| (e.delta.as_int(), &e.kind)),
            Some((0, TrackEventKind::Midi { message: MidiMessage::ProgramChange { .. }, .. }))
        ));
        let (parsed, channels) = parse_track(track);
        assert_eq!(parsed.as_slice(), events, "{}", part);
        assert_eq!(channels, BTreeSet::from([part.channel()]));
        assert!(matches!(
            track.last().map(|e| &e.kind),
            Some(TrackEventKind::Meta(MetaMessage::EndOfTrack))
        ));
    }
}

#[test]
fn test_minor_scale_intervals_are_stable() {
    let first = scale_intervals("Minor").unwrap();
    assert_eq!(first, &[0, 2, 3, 5, 7, 8, 10]);
    assert_eq!(scale_intervals("minor").unwrap(), first);
    assert!(scale_intervals("Klingon").is_err());
}

#[test]
fn test_one_measure_of_drums_has_kick_and_snare() {
    let store = GenreStore::builtin();
    for seed in 0..5 {
        let request = GenerationRequest::new("A", 4)
            .with_parts(PartSelection::from_parts([Part::Drums]));
        let composition = compose(&store, seed, request);
        let onsets: BTreeSet<u8> = composition
            .timeline()
            .events(Part::Drums)
            .iter()
            .filter(|e| e.kind == EventKind::NoteOn)
            .map(|e| e.pitch)
            .collect();
        assert!(onsets.contains(&36));
        assert!(onsets.contains(&38));
        // Opening crash
        assert!(composition.timeline().events(Part::Drums).iter().any(|e| {
            e.kind == EventKind::NoteOn && e.pitch == 49 && e.tick == 0
        }));
        assert!(composition.timeline().events(Part::Drums).iter().all(|e| e.tick <= 1920));
    }
}

#[test]
fn test_drum_and_bass_bass_and_drums() {
    let store = GenreStore::builtin();
    let request = GenerationRequest::new("A", 16)
        .with_scale("Minor")
        .with_bpm(174)
        .with_genre("Drum and Bass")
        .with_parts(PartSelection::from_parts([Part::Bass, Part::Drums]));
    let composition = compose(&store, 2024, request);

    assert_eq!(composition.timeline().total_ticks(), 7680);
    assert_eq!(composition.timeline().micros_per_beat(), 344_828);

    let bytes = composition.to_midi_bytes();
    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 2);

    let tempo = smf.tracks[0].iter().find_map(|e| match &e.kind {
        TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
        _ => None,
    });
    assert_eq!(tempo, Some(344_828));

    let (bass, bass_channels) = parse_track(&smf.tracks[0]);
    let (drums, drum_channels) = parse_track(&smf.tracks[1]);
    assert_eq!(bass_channels, BTreeSet::from([0]));
    assert_eq!(drum_channels, BTreeSet::from([9]));
    assert!(bass.iter().chain(&drums).all(|e| e.tick <= 7680));
}

#[test]
fn test_unknown_genre_uses_default() {
    let store = GenreStore::load(bundled_genres());
    let composition = compose(&store, 8, GenerationRequest::new("G", 8).with_genre("Sea Shanty"));

    let default = store.default_config();
    assert_eq!(composition.genre(), default.name);
    assert_eq!(composition.bpm(), default.tempo);
    assert_eq!(composition.scale().name(), "Minor");
}

#[test]
fn test_missing_genre_file_uses_builtin() {
    let store = GenreStore::load("/nonexistent/genres.yaml");
    assert_eq!(store.len(), 1);
    assert_eq!(store.default_config().tempo, 174);
}

#[test]
fn test_toml_genre_document() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
default_genre = "Slow"

[genres.Slow]
tempo = 70
scale = "Dorian"
progressions = [["i", "IV"]]

[genres.Slow.bass]
style = "rolling"
"#
    )
    .unwrap();

    let store = GenreStore::try_load(file.path()).unwrap();
    let slow = store.get("slow").unwrap();
    assert_eq!(slow.tempo, 70);

    let composition = compose(&store, 1, GenerationRequest::new("D", 8));
    assert_eq!(composition.genre(), "Slow");
    assert_eq!(composition.bpm(), 70);
    assert_eq!(composition.progression().symbols(), &["i", "IV"]);
    assert_timeline_well_formed(composition.timeline());
}

#[test]
fn test_write_full_and_part_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = GenreStore::builtin();
    let request = GenerationRequest::new("A", 8)
        .with_parts(PartSelection::from_parts([Part::Bass, Part::Chords, Part::Drums]));
    let composition = compose(&store, 6, request);

    let full = dir.path().join("song.mid");
    composition.write_midi(&full).unwrap();
    let smf_bytes = std::fs::read(&full).unwrap();
    assert_eq!(Smf::parse(&smf_bytes).unwrap().tracks.len(), 3);

    let drums = dir.path().join("song_drums.mid");
    composition.write_part_midi(Part::Drums, &drums).unwrap();
    let part_bytes = std::fs::read(&drums).unwrap();
    let smf = Smf::parse(&part_bytes).unwrap();
    assert_eq!(smf.tracks.len(), 1);
    let (events, channels) = parse_track(&smf.tracks[0]);
    assert_eq!(channels, BTreeSet::from([9]));
    assert_eq!(events.as_slice(), composition.timeline().events(Part::Drums));
}
