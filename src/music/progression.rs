// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord progressions chosen for a single composition run.

use std::fmt;

use super::scale::{resolve_chord, MidiNote, ScaleType};

/// Symbol used when a progression is empty
pub const TONIC_SYMBOL: &str = "i";

/// A chord symbol resolved against a scale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    pub symbol: String,
    pub intervals: &'static [u8],
}

impl Chord {
    pub fn resolve(scale: ScaleType, symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            intervals: resolve_chord(scale, symbol),
        }
    }

    /// Interval of the chord root above the tonic
    pub fn root_interval(&self) -> u8 {
        self.intervals.first().copied().unwrap_or(0)
    }

    /// Major quality: the third sits four semitones above the root
    pub fn is_major(&self) -> bool {
        match self.intervals {
            [root, third, ..] => third.saturating_sub(*root) == 4,
            _ => false,
        }
    }

    /// MIDI notes of the chord built on `tonic`, shifted by `octave` octaves.
    /// Tones outside 0-127 are dropped.
    pub fn tones(&self, tonic: MidiNote, octave: i8) -> Vec<MidiNote> {
        let base = tonic as i16 + octave as i16 * 12;
        self.intervals
            .iter()
            .map(|&i| base + i as i16)
            .filter(|n| (0..=127).contains(n))
            .map(|n| n as MidiNote)
            .collect()
    }

    /// Pitch classes relative to C of the chord built on `tonic`
    pub fn pitch_classes(&self, tonic: MidiNote) -> Vec<u8> {
        let mut classes: Vec<u8> = self
            .intervals
            .iter()
            .map(|&i| ((tonic as u16 + i as u16) % 12) as u8)
            .collect();
        classes.sort_unstable();
        classes.dedup();
        classes
    }
}

/// One concrete ordered list of chord symbols for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionInstance {
    symbols: Vec<String>,
}

impl ProgressionInstance {
    /// Build from symbols; an empty list becomes the tonic chord alone
    pub fn new(symbols: Vec<String>) -> Self {
        if symbols.is_empty() {
            return Self {
                symbols: vec![TONIC_SYMBOL.to_string()],
            };
        }
        Self { symbols }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// True when every symbol is in the scale's own chord table
    pub fn fits(&self, scale: ScaleType) -> bool {
        self.symbols.iter().all(|s| scale.chord(s).is_some())
    }

    /// Resolve every symbol once against the scale
    pub fn resolve(&self, scale: ScaleType) -> Vec<Chord> {
        self.symbols
            .iter()
            .map(|symbol| Chord::resolve(scale, symbol))
            .collect()
    }
}

impl fmt::Display for ProgressionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbols.join(" - "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_progression_is_tonic() {
        let prog = ProgressionInstance::new(Vec::new());
        assert_eq!(prog.symbols(), &["i".to_string()]);
        assert_eq!(prog.resolve(ScaleType::Minor)[0].intervals, &[0, 3, 7]);
    }

    #[test]
    fn test_fits_scale() {
        let prog = ProgressionInstance::new(symbols(&["i", "VII", "VI", "V"]));
        assert!(prog.fits(ScaleType::Minor));
        assert!(!prog.fits(ScaleType::Major));
        assert_eq!(prog.to_string(), "i - VII - VI - V");
    }

    #[test]
    fn test_chord_quality_and_tones() {
        let major = Chord::resolve(ScaleType::Major, "IV");
        assert!(major.is_major());
        assert_eq!(major.root_interval(), 5);
        assert_eq!(major.tones(57, 0), vec![62, 66, 69]);

        let minor = Chord::resolve(ScaleType::Minor, "i");
        assert!(!minor.is_major());
        // A minor: A C E
        assert_eq!(minor.pitch_classes(69), vec![0, 4, 9]);
    }
}
