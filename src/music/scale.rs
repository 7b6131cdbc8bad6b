// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scale catalogue and diatonic chord tables.
//!
//! Every scale carries its interval set within one octave and a table of
//! chords keyed by roman-numeral symbol. Chord intervals are relative to the
//! tonic and may exceed an octave. All lookups are pure and allocation-free.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Chord table: symbol → semitone intervals above the tonic
pub type ChordTable = &'static [(&'static str, &'static [u8])];

/// Errors from theory table lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TheoryError {
    #[error("unknown scale: {0}")]
    UnknownScale(String),
    #[error("unknown chord '{symbol}' in scale {scale}")]
    UnknownChord { scale: String, symbol: String },
    #[error("unknown root note: {0}")]
    UnknownNote(String),
}

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        self as u8
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// MIDI note of this root in the fourth octave (C4 = 60 .. B4 = 71)
    pub fn root_midi(self) -> MidiNote {
        60 + self.pitch_class()
    }
}

impl FromStr for Note {
    type Err = TheoryError;

    /// Parse note from string (e.g., "C", "C#", "Db", "F#")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let note = match upper.as_str() {
            "C" | "B#" => Note::C,
            "C#" | "CS" | "DB" => Note::Cs,
            "D" => Note::D,
            "D#" | "DS" | "EB" => Note::Ds,
            "E" | "FB" => Note::E,
            "F" | "E#" => Note::F,
            "F#" | "FS" | "GB" => Note::Fs,
            "G" => Note::G,
            "G#" | "GS" | "AB" => Note::Gs,
            "A" => Note::A,
            "A#" | "AS" | "BB" => Note::As,
            "B" | "CB" => Note::B,
            _ => return Err(TheoryError::UnknownNote(s.to_string())),
        };
        Ok(note)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Note::C => "C",
            Note::Cs => "C#",
            Note::D => "D",
            Note::Ds => "D#",
            Note::E => "E",
            Note::F => "F",
            Note::Fs => "F#",
            Note::G => "G",
            Note::Gs => "G#",
            Note::A => "A",
            Note::As => "A#",
            Note::B => "B",
        };
        write!(f, "{}", name)
    }
}

pub const MAJOR_TRIAD: &[u8] = &[0, 4, 7];
pub const MINOR_TRIAD: &[u8] = &[0, 3, 7];

const MAJOR_CHORDS: ChordTable = &[
    ("I", &[0, 4, 7]),
    ("ii", &[2, 5, 9]),
    ("iii", &[4, 7, 11]),
    ("IV", &[5, 9, 12]),
    ("V", &[7, 11, 14]),
    ("vi", &[9, 12, 16]),
    ("vii°", &[11, 14, 17]),
];

const MINOR_CHORDS: ChordTable = &[
    ("i", &[0, 3, 7]),
    ("ii°", &[2, 5, 8]),
    ("III", &[3, 7, 10]),
    ("iv", &[5, 8, 12]),
    ("V", &[7, 10, 14]),
    ("v", &[7, 10, 14]),
    ("VI", &[8, 12, 15]),
    ("VII", &[10, 14, 17]),
];

const MINOR_HARMONIC_CHORDS: ChordTable = &[
    ("i", &[0, 3, 7]),
    ("ii°", &[2, 5, 8]),
    ("III+", &[3, 7, 11]),
    ("iv", &[5, 8, 12]),
    ("V", &[7, 11, 14]),
    ("VI", &[8, 12, 15]),
    ("vii°", &[11, 14, 17]),
];

const MINOR_MELODIC_CHORDS: ChordTable = &[
    ("i", &[0, 3, 7]),
    ("ii", &[2, 5, 9]),
    ("III+", &[3, 7, 11]),
    ("IV", &[5, 9, 12]),
    ("V", &[7, 11, 14]),
    ("vi°", &[9, 12, 15]),
    ("vii°", &[11, 14, 17]),
];

const PENTATONIC_MAJOR_CHORDS: ChordTable =
    &[("I", &[0, 4, 7]), ("IV", &[5, 9, 12]), ("V", &[7, 11, 14])];

const PENTATONIC_MINOR_CHORDS: ChordTable =
    &[("i", &[0, 3, 7]), ("iv", &[5, 8, 12]), ("v", &[7, 10, 14])];

const BLUES_MINOR_CHORDS: ChordTable = &[
    ("i", &[0, 3, 7]),
    ("IV7", &[5, 9, 12, 15]),
    ("V7", &[7, 11, 14, 17]),
];

const BLUES_MAJOR_CHORDS: ChordTable = &[
    ("I", &[0, 4, 7]),
    ("IV7", &[5, 9, 12, 15]),
    ("V7", &[7, 11, 14, 17]),
];

const CHROMATIC_CHORDS: ChordTable = &[("Cmaj", &[0, 4, 7]), ("Cmin", &[0, 3, 7])];

const DORIAN_CHORDS: ChordTable = &[
    ("i", &[0, 3, 7]),
    ("ii", &[2, 5, 9]),
    ("III", &[3, 7, 10]),
    ("IV", &[5, 9, 12]),
    ("v", &[7, 10, 14]),
    ("vi°", &[9, 12, 15]),
    ("VII", &[10, 14, 17]),
];

const PHRYGIAN_CHORDS: ChordTable = &[
    ("i", &[0, 3, 7]),
    ("II°", &[1, 5, 8]),
    ("III", &[3, 7, 10]),
    ("iv", &[5, 8, 12]),
    ("v°", &[7, 10, 13]),
    ("VI", &[8, 12, 15]),
    ("vii", &[10, 13, 17]),
];

const LYDIAN_CHORDS: ChordTable = &[
    ("I", &[0, 4, 7]),
    ("II", &[2, 6, 9]),
    ("iii", &[4, 7, 11]),
    ("IV+", &[6, 9, 12]),
    ("V", &[7, 11, 14]),
    ("vi", &[9, 12, 16]),
    ("vii°", &[11, 14, 17]),
];

const MIXOLYDIAN_CHORDS: ChordTable = &[
    ("I", &[0, 4, 7]),
    ("ii°", &[2, 5, 8]),
    ("iii°", &[4, 7, 10]),
    ("IV", &[5, 9, 12]),
    ("v", &[7, 10, 14]),
    ("vi°", &[9, 12, 15]),
    ("VII", &[10, 14, 17]),
];

const AEOLIAN_CHORDS: ChordTable = &[
    ("i", &[0, 3, 7]),
    ("ii°", &[2, 5, 8]),
    ("III", &[3, 7, 10]),
    ("iv", &[5, 8, 12]),
    ("v", &[7, 10, 14]),
    ("VI", &[8, 12, 15]),
    ("VII", &[10, 14, 17]),
];

const LOCRIAN_CHORDS: ChordTable = &[
    ("i°", &[0, 3, 6]),
    ("IIb", &[1, 5, 8]),
    ("IIIb", &[3, 6, 10]),
    ("iv°", &[5, 8, 11]),
    ("Vb", &[6, 10, 13]),
    ("VIb", &[8, 11, 15]),
    ("VIIb", &[10, 13, 17]),
];

const BEBOP_MAJOR_CHORDS: ChordTable = &[("I", &[0, 4, 7]), ("V7", &[7, 11, 14, 17])];
const BEBOP_DOMINANT_CHORDS: ChordTable = &[("V7", &[7, 11, 14, 17])];
const BEBOP_MINOR_CHORDS: ChordTable = &[("i", &[0, 3, 7])];

/// Scale types in the catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleType {
    Major,
    Minor,
    MinorHarmonic,
    MinorMelodic,
    PentatonicMajor,
    PentatonicMinor,
    BluesMinor,
    BluesMajor,
    Chromatic,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    BebopMajor,
    BebopDominant,
    BebopMinor,
    BebopDorian,
    BebopMelodicMinor,
    BebopPhrygianDominant,
}

impl ScaleType {
    pub const ALL: [ScaleType; 22] = [
        ScaleType::Major,
        ScaleType::Minor,
        ScaleType::MinorHarmonic,
        ScaleType::MinorMelodic,
        ScaleType::PentatonicMajor,
        ScaleType::PentatonicMinor,
        ScaleType::BluesMinor,
        ScaleType::BluesMajor,
        ScaleType::Chromatic,
        ScaleType::Ionian,
        ScaleType::Dorian,
        ScaleType::Phrygian,
        ScaleType::Lydian,
        ScaleType::Mixolydian,
        ScaleType::Aeolian,
        ScaleType::Locrian,
        ScaleType::BebopMajor,
        ScaleType::BebopDominant,
        ScaleType::BebopMinor,
        ScaleType::BebopDorian,
        ScaleType::BebopMelodicMinor,
        ScaleType::BebopPhrygianDominant,
    ];

    /// Get the intervals (semitones from root) for this scale type
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleType::Major | ScaleType::Ionian => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::Minor | ScaleType::Aeolian => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::MinorHarmonic => &[0, 2, 3, 5, 7, 8, 11],
            ScaleType::MinorMelodic => &[0, 2, 3, 5, 7, 9, 11],
            ScaleType::PentatonicMajor => &[0, 2, 4, 7, 9],
            ScaleType::PentatonicMinor => &[0, 3, 5, 7, 10],
            ScaleType::BluesMinor => &[0, 3, 5, 6, 7, 10],
            ScaleType::BluesMajor => &[0, 2, 3, 4, 7, 9],
            ScaleType::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            ScaleType::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleType::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleType::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleType::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleType::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            ScaleType::BebopMajor => &[0, 2, 4, 5, 7, 8, 9, 11],
            ScaleType::BebopDominant => &[0, 2, 4, 5, 7, 8, 10, 11],
            ScaleType::BebopMinor | ScaleType::BebopDorian | ScaleType::BebopMelodicMinor => {
                &[0, 2, 3, 5, 7, 9, 10, 11]
            }
            ScaleType::BebopPhrygianDominant => &[0, 1, 4, 5, 7, 8, 10],
        }
    }

    /// Diatonic chord table for this scale
    pub fn chords(self) -> ChordTable {
        match self {
            ScaleType::Major | ScaleType::Ionian => MAJOR_CHORDS,
            ScaleType::Minor => MINOR_CHORDS,
            ScaleType::MinorHarmonic => MINOR_HARMONIC_CHORDS,
            ScaleType::MinorMelodic => MINOR_MELODIC_CHORDS,
            ScaleType::PentatonicMajor => PENTATONIC_MAJOR_CHORDS,
            ScaleType::PentatonicMinor => PENTATONIC_MINOR_CHORDS,
            ScaleType::BluesMinor => BLUES_MINOR_CHORDS,
            ScaleType::BluesMajor => BLUES_MAJOR_CHORDS,
            ScaleType::Chromatic => CHROMATIC_CHORDS,
            ScaleType::Dorian => DORIAN_CHORDS,
            ScaleType::Phrygian => PHRYGIAN_CHORDS,
            ScaleType::Lydian => LYDIAN_CHORDS,
            ScaleType::Mixolydian => MIXOLYDIAN_CHORDS,
            ScaleType::Aeolian => AEOLIAN_CHORDS,
            ScaleType::Locrian => LOCRIAN_CHORDS,
            ScaleType::BebopMajor => BEBOP_MAJOR_CHORDS,
            ScaleType::BebopDominant | ScaleType::BebopPhrygianDominant => BEBOP_DOMINANT_CHORDS,
            ScaleType::BebopMinor | ScaleType::BebopDorian | ScaleType::BebopMelodicMinor => {
                BEBOP_MINOR_CHORDS
            }
        }
    }

    /// Look up a chord symbol in this scale's table
    pub fn chord(self, symbol: &str) -> Option<&'static [u8]> {
        self.chords()
            .iter()
            .find(|(name, _)| *name == symbol)
            .map(|(_, intervals)| *intervals)
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "Major",
            ScaleType::Minor => "Minor",
            ScaleType::MinorHarmonic => "Minor Harmonic",
            ScaleType::MinorMelodic => "Minor Melodic",
            ScaleType::PentatonicMajor => "Pentatonic Major",
            ScaleType::PentatonicMinor => "Pentatonic Minor",
            ScaleType::BluesMinor => "Blues Minor",
            ScaleType::BluesMajor => "Blues Major",
            ScaleType::Chromatic => "Chromatic",
            ScaleType::Ionian => "Ionian",
            ScaleType::Dorian => "Dorian",
            ScaleType::Phrygian => "Phrygian",
            ScaleType::Lydian => "Lydian",
            ScaleType::Mixolydian => "Mixolydian",
            ScaleType::Aeolian => "Aeolian",
            ScaleType::Locrian => "Locrian",
            ScaleType::BebopMajor => "Bebop Major",
            ScaleType::BebopDominant => "Bebop Dominant",
            ScaleType::BebopMinor => "Bebop Minor",
            ScaleType::BebopDorian => "Bebop Dorian",
            ScaleType::BebopMelodicMinor => "Bebop Melodic Minor",
            ScaleType::BebopPhrygianDominant => "Bebop Phrygian Dominant",
        }
    }

    /// Parse a scale name, ignoring case and separators
    pub fn from_name(s: &str) -> Option<Self> {
        let key = normalize_name(s);
        if let Some(scale) = ScaleType::ALL
            .iter()
            .copied()
            .find(|scale| normalize_name(scale.name()) == key)
        {
            return Some(scale);
        }
        match key.as_str() {
            "naturalminor" => Some(ScaleType::Minor),
            "harmonicminor" => Some(ScaleType::MinorHarmonic),
            "melodicminor" => Some(ScaleType::MinorMelodic),
            "majorpentatonic" => Some(ScaleType::PentatonicMajor),
            "minorpentatonic" => Some(ScaleType::PentatonicMinor),
            "blues" => Some(ScaleType::BluesMinor),
            _ => None,
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lowercase and strip spaces, dashes and underscores.
pub(crate) fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Interval set of a named scale
pub fn scale_intervals(scale_name: &str) -> Result<&'static [u8], TheoryError> {
    ScaleType::from_name(scale_name)
        .map(ScaleType::intervals)
        .ok_or_else(|| TheoryError::UnknownScale(scale_name.to_string()))
}

/// Intervals of a chord symbol within a named scale
pub fn chord_intervals(scale_name: &str, symbol: &str) -> Result<&'static [u8], TheoryError> {
    let scale = ScaleType::from_name(scale_name)
        .ok_or_else(|| TheoryError::UnknownScale(scale_name.to_string()))?;
    scale.chord(symbol).ok_or_else(|| TheoryError::UnknownChord {
        scale: scale.name().to_string(),
        symbol: symbol.to_string(),
    })
}

/// Resolve a chord symbol, substituting when the scale lacks it.
///
/// Symbols missing from the scale's table are looked up in the Major table
/// when they start with `I` or `V` and in the Minor table otherwise, falling
/// back to the plain major or minor triad.
pub fn resolve_chord(scale: ScaleType, symbol: &str) -> &'static [u8] {
    if let Some(intervals) = scale.chord(symbol) {
        return intervals;
    }

    let (source, fallback) = if symbol.starts_with('I') || symbol.starts_with('V') {
        (ScaleType::Major, MAJOR_TRIAD)
    } else {
        (ScaleType::Minor, MINOR_TRIAD)
    };
    let intervals = source.chord(symbol).unwrap_or(fallback);
    debug!(
        "Chord '{}' not in {} table, substituting {:?} from {}",
        symbol, scale, intervals, source
    );
    intervals
}

/// A scale rooted on a particular note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    root: Note,
    scale_type: ScaleType,
}

impl Scale {
    pub fn new(root: Note, scale_type: ScaleType) -> Self {
        Self { root, scale_type }
    }

    /// Parse root and scale names
    pub fn parse(root: &str, scale: &str) -> Result<Self, TheoryError> {
        let root = root.parse::<Note>()?;
        let scale_type = ScaleType::from_name(scale)
            .ok_or_else(|| TheoryError::UnknownScale(scale.to_string()))?;
        Ok(Self::new(root, scale_type))
    }

    pub fn root(&self) -> Note {
        self.root
    }

    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    /// MIDI notes of one octave of the scale, shifted by `octave` octaves
    /// from the fourth octave. Notes outside 0-127 are dropped.
    pub fn notes_in_octave(&self, octave: i8) -> Vec<MidiNote> {
        let base = self.root.root_midi() as i16 + octave as i16 * 12;
        self.scale_type
            .intervals()
            .iter()
            .map(|&i| base + i as i16)
            .filter(|n| (0..=127).contains(n))
            .map(|n| n as MidiNote)
            .collect()
    }

    /// Check if a MIDI note's pitch class belongs to the scale
    pub fn contains(&self, note: MidiNote) -> bool {
        let degree = (note as i16 - self.root.pitch_class() as i16).rem_euclid(12) as u8;
        self.scale_type.intervals().contains(&degree)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.scale_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_parsing() {
        assert_eq!("C".parse::<Note>(), Ok(Note::C));
        assert_eq!("c#".parse::<Note>(), Ok(Note::Cs));
        assert_eq!("Db".parse::<Note>(), Ok(Note::Cs));
        assert_eq!("Bb".parse::<Note>(), Ok(Note::As));
        assert!(matches!(
            "H".parse::<Note>(),
            Err(TheoryError::UnknownNote(_))
        ));
    }

    #[test]
    fn test_root_midi() {
        assert_eq!(Note::C.root_midi(), 60);
        assert_eq!(Note::A.root_midi(), 69);
        assert_eq!(Note::B.root_midi(), 71);
    }

    #[test]
    fn test_minor_intervals_are_stable() {
        let first = scale_intervals("Minor").unwrap();
        let second = scale_intervals("Minor").unwrap();
        assert_eq!(first, &[0, 2, 3, 5, 7, 8, 10]);
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
    }

    #[test]
    fn test_scale_name_normalization() {
        assert_eq!(ScaleType::from_name("minor_harmonic"), Some(ScaleType::MinorHarmonic));
        assert_eq!(ScaleType::from_name("Minor Harmonic"), Some(ScaleType::MinorHarmonic));
        assert_eq!(ScaleType::from_name("BEBOP-DORIAN"), Some(ScaleType::BebopDorian));
        assert_eq!(ScaleType::from_name("harmonic minor"), Some(ScaleType::MinorHarmonic));
        assert_eq!(ScaleType::from_name("whole tone"), None);
    }

    #[test]
    fn test_every_scale_round_trips_its_name() {
        for scale in ScaleType::ALL {
            assert_eq!(ScaleType::from_name(scale.name()), Some(scale));
            assert!(!scale.chords().is_empty());
            assert_eq!(scale.intervals()[0], 0);
        }
    }

    #[test]
    fn test_chord_lookup_errors() {
        assert_eq!(chord_intervals("Minor", "VI").unwrap(), &[8, 12, 15]);
        assert!(matches!(
            chord_intervals("Minor", "IV"),
            Err(TheoryError::UnknownChord { .. })
        ));
        assert!(matches!(
            chord_intervals("Klingon", "i"),
            Err(TheoryError::UnknownScale(_))
        ));
    }

    #[test]
    fn test_resolve_chord_substitution() {
        // In the table
        assert_eq!(resolve_chord(ScaleType::Minor, "iv"), &[5, 8, 12]);
        // Upper-case symbols borrow from Major
        assert_eq!(resolve_chord(ScaleType::Minor, "IV"), &[5, 9, 12]);
        // Lower-case symbols borrow from Minor
        assert_eq!(resolve_chord(ScaleType::Major, "i"), &[0, 3, 7]);
        // Unknown everywhere falls back to a triad
        assert_eq!(resolve_chord(ScaleType::Major, "Vsus"), MAJOR_TRIAD);
        assert_eq!(resolve_chord(ScaleType::Major, "xyz"), MINOR_TRIAD);
    }

    #[test]
    fn test_scale_notes_in_octave() {
        let scale = Scale::parse("A", "Minor").unwrap();
        assert_eq!(scale.notes_in_octave(0), vec![69, 71, 72, 74, 76, 77, 79]);
        assert_eq!(scale.notes_in_octave(-2)[0], 45);
        assert!(scale.contains(60)); // C
        assert!(!scale.contains(61)); // C#
        assert_eq!(scale.to_string(), "A Minor");
    }
}
