// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Genre configuration.
//!
//! Typed per-genre records loaded from a YAML (or TOML) document. Every knob
//! has an explicit default so a genre entry only needs to state what makes
//! it different. A built-in Drum and Bass record backs the store when the
//! document is missing or broken.

pub mod store;

pub use store::{GenreStore, DEFAULT_GENRE};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generators::arpeggio::ArpOrder;
use crate::generators::drums::DrumVoice;
use crate::timeline::{Part, RhythmValue, TICKS_PER_BEAT, TICKS_PER_MEASURE};

/// Genre configuration problems. Always recovered by falling back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("genre '{genre}': {reason}")]
    InvalidGenre { genre: String, reason: String },
    #[error("genre '{genre}' names unknown scale '{scale}'")]
    UnknownScale { genre: String, scale: String },
    #[error("genre document defines no usable genres")]
    NoGenres,
}

/// Root of a genre document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreFile {
    /// Genre used when a request names none or an unknown one
    #[serde(default = "default_genre_name")]
    pub default_genre: String,
    /// Genre records keyed by display name
    #[serde(default)]
    pub genres: BTreeMap<String, GenreConfig>,
}

fn default_genre_name() -> String {
    DEFAULT_GENRE.to_string()
}

impl GenreFile {
    /// Load a genre document; `.toml` files are parsed as TOML, anything
    /// else as YAML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read genre file: {:?}", path))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Parse a genre document from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML genre document")
    }

    /// Parse a genre document from TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML genre document")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize genre document to YAML")
    }
}

/// Everything a genre contributes to generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreConfig {
    /// Display name, taken from the document key
    #[serde(skip)]
    pub name: String,
    /// Default tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: u32,
    /// Default scale name
    #[serde(default = "default_scale")]
    pub scale: String,
    /// Candidate chord progressions
    #[serde(default = "default_progressions")]
    pub progressions: Vec<Vec<String>>,
    #[serde(default)]
    pub programs: InstrumentPrograms,
    #[serde(default)]
    pub bass: BassStyle,
    #[serde(default)]
    pub chords: ChordStyle,
    #[serde(default)]
    pub lead: LeadStyle,
    #[serde(default)]
    pub pads: PadStyle,
    #[serde(default)]
    pub arpeggio: ArpeggioStyle,
    #[serde(default)]
    pub drums: DrumStyle,
}

fn default_tempo() -> u32 {
    120
}
fn default_scale() -> String {
    "Minor".to_string()
}
fn default_progressions() -> Vec<Vec<String>> {
    vec![symbols(&["i", "iv", "v", "i"])]
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl GenreConfig {
    /// The built-in Drum and Bass record
    pub fn drum_and_bass() -> Self {
        Self {
            name: DEFAULT_GENRE.to_string(),
            tempo: 174,
            scale: "Minor".to_string(),
            progressions: vec![
                symbols(&["i", "VII", "VI", "V"]),
                symbols(&["i", "iv", "VII", "III"]),
                symbols(&["i", "i", "i", "i"]),
                symbols(&["i", "iv", "v", "i"]),
                symbols(&["i", "VI", "VII", "i"]),
                symbols(&["I", "IV", "V", "I"]),
                symbols(&["I", "vi", "IV", "V"]),
                symbols(&["I", "ii", "V", "I"]),
            ],
            programs: InstrumentPrograms::default(),
            bass: BassStyle {
                rhythms: vec![
                    WeightedRhythm::new(RhythmValue::Quarter, 1.0),
                    WeightedRhythm::new(RhythmValue::Eighth, 1.0),
                    WeightedRhythm::new(RhythmValue::DottedEighth, 1.0),
                    WeightedRhythm::new(RhythmValue::DottedQuarter, 1.0),
                    WeightedRhythm::new(RhythmValue::Half, 1.0),
                    WeightedRhythm::new(RhythmValue::Sixteenth, 0.3),
                ],
                ..BassStyle::default()
            },
            chords: ChordStyle {
                voicing: VoicingWeights {
                    triad: 0.5,
                    extended: 1.0,
                    inverted: 0.7,
                },
                ..ChordStyle::default()
            },
            lead: LeadStyle {
                rest_probability: 0.7,
                notes_per_measure: CountRange(1, 3),
                rhythms: vec![
                    WeightedRhythm::new(RhythmValue::Eighth, 1.0),
                    WeightedRhythm::new(RhythmValue::Sixteenth, 1.0),
                ],
                velocity: VelocityRange(80, 110),
                ..LeadStyle::default()
            },
            pads: PadStyle::default(),
            arpeggio: ArpeggioStyle {
                rates: vec![
                    WeightedRhythm::new(RhythmValue::Sixteenth, 1.0),
                    WeightedRhythm::new(RhythmValue::ThirtySecond, 0.5),
                ],
                ..ArpeggioStyle::default()
            },
            drums: DrumStyle::default(),
        }
    }

    /// Check every knob; the first problem found is reported
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidGenre {
            genre: self.name.clone(),
            reason,
        };

        if self.tempo == 0 {
            return Err(invalid("tempo must be positive".to_string()));
        }
        if self.progressions.is_empty() {
            return Err(invalid("no chord progressions".to_string()));
        }
        if self.progressions.iter().any(Vec::is_empty) {
            return Err(invalid("empty chord progression".to_string()));
        }
        for part in Part::ALL {
            let program = self.programs.program(part);
            if program > 127 {
                return Err(invalid(format!("{} program {} out of range", part, program)));
            }
        }

        self.bass.velocity.validate().map_err(&invalid)?;
        self.bass.gate.validate().map_err(&invalid)?;
        validate_rhythms(&self.bass.rhythms).map_err(&invalid)?;
        check_probability("bass.chord_tone_bias", self.bass.chord_tone_bias).map_err(&invalid)?;

        if !matches!(self.chords.duration_beats, 1 | 2 | 4) {
            return Err(invalid(format!(
                "chords.duration_beats must be 1, 2 or 4, got {}",
                self.chords.duration_beats
            )));
        }
        self.chords.voicing.validate().map_err(&invalid)?;
        self.chords.velocity.validate().map_err(&invalid)?;
        self.chords.gate.validate().map_err(&invalid)?;

        check_probability("lead.rest_probability", self.lead.rest_probability).map_err(&invalid)?;
        check_probability("lead.chord_tone_bias", self.lead.chord_tone_bias).map_err(&invalid)?;
        check_probability(
            "lead.octave_jump_probability",
            self.lead.octave_jump_probability,
        )
        .map_err(&invalid)?;
        self.lead.notes_per_measure.validate().map_err(&invalid)?;
        validate_rhythms(&self.lead.rhythms).map_err(&invalid)?;
        self.lead.velocity.validate().map_err(&invalid)?;
        self.lead.gate.validate().map_err(&invalid)?;

        self.pads.voicing.validate().map_err(&invalid)?;
        self.pads.velocity.validate().map_err(&invalid)?;
        self.pads.gate.validate().map_err(&invalid)?;

        validate_rhythms(&self.arpeggio.rates).map_err(&invalid)?;
        self.arpeggio.velocity.validate().map_err(&invalid)?;
        self.arpeggio.gate.validate().map_err(&invalid)?;
        if self.arpeggio.orders.is_empty() {
            return Err(invalid("arpeggio.orders is empty".to_string()));
        }

        check_probability("drums.fill_probability", self.drums.fill_probability)
            .map_err(&invalid)?;
        check_probability("drums.ghost_probability", self.drums.ghost_probability)
            .map_err(&invalid)?;
        check_probability("drums.ride_probability", self.drums.ride_probability)
            .map_err(&invalid)?;
        if self.drums.fill_every == 0 {
            return Err(invalid("drums.fill_every must be positive".to_string()));
        }
        self.drums.patterns.validate().map_err(&invalid)?;

        Ok(())
    }
}

fn check_probability(knob: &str, value: f64) -> std::result::Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} must be within 0..=1, got {}", knob, value))
    }
}

fn validate_rhythms(menu: &[WeightedRhythm]) -> std::result::Result<(), String> {
    if menu.is_empty() {
        return Err("empty rhythm menu".to_string());
    }
    if menu.iter().any(|r| !r.weight.is_finite() || r.weight < 0.0) {
        return Err("rhythm weights must be non-negative".to_string());
    }
    if menu.iter().all(|r| r.weight == 0.0) {
        return Err("rhythm weights sum to zero".to_string());
    }
    Ok(())
}

/// General MIDI program per part
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstrumentPrograms {
    pub bass: u8,
    pub chords: u8,
    pub lead: u8,
    pub pads: u8,
    pub arpeggio: u8,
    pub drums: u8,
}

impl Default for InstrumentPrograms {
    fn default() -> Self {
        Self {
            bass: 33,     // Electric Bass (finger)
            chords: 1,    // Bright Acoustic Piano
            lead: 81,     // Lead 2 (sawtooth)
            pads: 89,     // Pad 2 (warm)
            arpeggio: 81, // Lead 2 (sawtooth)
            drums: 0,
        }
    }
}

impl InstrumentPrograms {
    pub fn program(&self, part: Part) -> u8 {
        match part {
            Part::Bass => self.bass,
            Part::Chords => self.chords,
            Part::Lead => self.lead,
            Part::Pads => self.pads,
            Part::Arpeggio => self.arpeggio,
            Part::Drums => self.drums,
        }
    }
}

/// Inclusive velocity range `[low, high]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VelocityRange(pub u8, pub u8);

impl VelocityRange {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        rng.gen_range(self.0..=self.1.max(self.0)).clamp(1, 127)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.0 == 0 || self.0 > self.1 || self.1 > 127 {
            return Err(format!("velocity range [{}, {}] invalid", self.0, self.1));
        }
        Ok(())
    }
}

/// Note-off point as a fraction `[low, high]` of the nominal duration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GateRange(pub f64, pub f64);

impl GateRange {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.1 <= self.0 {
            return self.0;
        }
        rng.gen_range(self.0..=self.1)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let in_range = |g: f64| g > 0.0 && g <= 1.0;
        if !in_range(self.0) || !in_range(self.1) || self.0 > self.1 {
            return Err(format!("gate range [{}, {}] invalid", self.0, self.1));
        }
        Ok(())
    }
}

/// Inclusive count range `[low, high]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountRange(pub u32, pub u32);

impl CountRange {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.0..=self.1.max(self.0))
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.0 > self.1 {
            return Err(format!("count range [{}, {}] invalid", self.0, self.1));
        }
        Ok(())
    }
}

/// One entry in a weighted rhythm menu
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeightedRhythm {
    pub value: RhythmValue,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl WeightedRhythm {
    pub fn new(value: RhythmValue, weight: f64) -> Self {
        Self { value, weight }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BassKind {
    /// Weighted random rhythm and pitch per measure
    #[default]
    Free,
    /// Patterns from the rolling bass library
    Rolling,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BassStyle {
    pub style: BassKind,
    pub octave: i8,
    pub rhythms: Vec<WeightedRhythm>,
    pub chord_tone_bias: f64,
    pub velocity: VelocityRange,
    pub gate: GateRange,
}

impl Default for BassStyle {
    fn default() -> Self {
        Self {
            style: BassKind::Free,
            octave: -2,
            rhythms: vec![
                WeightedRhythm::new(RhythmValue::Quarter, 1.0),
                WeightedRhythm::new(RhythmValue::Eighth, 1.0),
                WeightedRhythm::new(RhythmValue::DottedEighth, 0.5),
                WeightedRhythm::new(RhythmValue::DottedQuarter, 0.5),
                WeightedRhythm::new(RhythmValue::Half, 0.5),
            ],
            chord_tone_bias: 0.7,
            velocity: VelocityRange(90, 110),
            gate: GateRange(0.85, 0.98),
        }
    }
}

/// Relative weights of the chord voicing strategies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoicingWeights {
    pub triad: f64,
    pub extended: f64,
    pub inverted: f64,
}

impl Default for VoicingWeights {
    fn default() -> Self {
        Self {
            triad: 1.0,
            extended: 1.0,
            inverted: 1.0,
        }
    }
}

impl VoicingWeights {
    fn validate(&self) -> std::result::Result<(), String> {
        let weights = [self.triad, self.extended, self.inverted];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("voicing weights must be non-negative".to_string());
        }
        if weights.iter().all(|w| *w == 0.0) {
            return Err("voicing weights sum to zero".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChordStyle {
    /// Length of each chord strike in beats
    pub duration_beats: u32,
    pub octave: i8,
    pub voicing: VoicingWeights,
    pub velocity: VelocityRange,
    pub gate: GateRange,
}

impl Default for ChordStyle {
    fn default() -> Self {
        Self {
            duration_beats: 4,
            octave: -1,
            voicing: VoicingWeights::default(),
            velocity: VelocityRange(80, 100),
            gate: GateRange(0.8, 0.95),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LeadStyle {
    pub octave: i8,
    /// Chance a whole measure stays silent
    pub rest_probability: f64,
    pub notes_per_measure: CountRange,
    pub rhythms: Vec<WeightedRhythm>,
    pub chord_tone_bias: f64,
    pub octave_jump_probability: f64,
    pub velocity: VelocityRange,
    pub gate: GateRange,
}

impl Default for LeadStyle {
    fn default() -> Self {
        Self {
            octave: 0,
            rest_probability: 0.0,
            notes_per_measure: CountRange(2, 5),
            rhythms: vec![
                WeightedRhythm::new(RhythmValue::Quarter, 1.0),
                WeightedRhythm::new(RhythmValue::Eighth, 1.0),
                WeightedRhythm::new(RhythmValue::DottedEighth, 1.0),
                WeightedRhythm::new(RhythmValue::Sixteenth, 0.3),
            ],
            chord_tone_bias: 0.6,
            octave_jump_probability: 0.15,
            velocity: VelocityRange(90, 120),
            gate: GateRange(0.9, 0.9),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PadStyle {
    pub octave: i8,
    pub voicing: VoicingWeights,
    pub velocity: VelocityRange,
    pub gate: GateRange,
}

impl Default for PadStyle {
    fn default() -> Self {
        Self {
            octave: 0,
            voicing: VoicingWeights {
                triad: 1.0,
                extended: 1.0,
                inverted: 0.0,
            },
            velocity: VelocityRange(50, 70),
            gate: GateRange(0.99, 0.99),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArpeggioStyle {
    pub octave: i8,
    pub rates: Vec<WeightedRhythm>,
    pub orders: Vec<ArpOrder>,
    pub velocity: VelocityRange,
    pub gate: GateRange,
}

impl Default for ArpeggioStyle {
    fn default() -> Self {
        Self {
            octave: 0,
            rates: vec![
                WeightedRhythm::new(RhythmValue::Eighth, 1.0),
                WeightedRhythm::new(RhythmValue::Sixteenth, 1.0),
            ],
            orders: ArpOrder::ALL.to_vec(),
            velocity: VelocityRange(65, 85),
            gate: GateRange(0.8, 0.95),
        }
    }
}

/// One template hit: `[tick offset in measure, velocity, duration in beats]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DrumHit(pub u32, pub u8, pub f64);

impl DrumHit {
    pub fn offset(&self) -> u64 {
        self.0 as u64
    }

    pub fn velocity(&self) -> u8 {
        self.1
    }

    pub fn duration_ticks(&self) -> u64 {
        ((self.2 * TICKS_PER_BEAT as f64).round() as u64).max(1)
    }
}

/// A one-measure pattern for a single drum voice
pub type DrumTemplate = Vec<DrumHit>;

/// Candidate templates per drum voice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrumPatterns {
    #[serde(default)]
    pub kick: Vec<DrumTemplate>,
    #[serde(default)]
    pub snare: Vec<DrumTemplate>,
    #[serde(default)]
    pub closed_hat: Vec<DrumTemplate>,
    #[serde(default)]
    pub open_hat: Vec<DrumTemplate>,
    #[serde(default)]
    pub percussion: Vec<DrumTemplate>,
}

impl DrumPatterns {
    pub fn templates(&self, voice: DrumVoice) -> &[DrumTemplate] {
        match voice {
            DrumVoice::Kick => &self.kick,
            DrumVoice::Snare => &self.snare,
            DrumVoice::ClosedHat => &self.closed_hat,
            DrumVoice::OpenHat => &self.open_hat,
            DrumVoice::Percussion => &self.percussion,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for voice in DrumVoice::ALL {
            for hit in self.templates(voice).iter().flatten() {
                if hit.offset() >= TICKS_PER_MEASURE {
                    return Err(format!("{:?} hit at tick {} is past the measure", voice, hit.0));
                }
                if hit.1 == 0 || hit.1 > 127 {
                    return Err(format!("{:?} hit velocity {} out of range", voice, hit.1));
                }
                if !hit.2.is_finite() || hit.2 <= 0.0 {
                    return Err(format!("{:?} hit duration {} must be positive", voice, hit.2));
                }
            }
        }
        Ok(())
    }
}

impl Default for DrumPatterns {
    /// Two-step breakbeat templates
    fn default() -> Self {
        let kick: &[(u32, u8, f64)] = &[(0, 110, 0.5), (1200, 100, 0.5)];
        let snare: &[(u32, u8, f64)] = &[(480, 120, 0.5), (1440, 120, 0.5)];
        let with = |base: &[(u32, u8, f64)], extra: (u32, u8, f64)| {
            let mut hits: DrumTemplate = base.iter().map(|&(t, v, d)| DrumHit(t, v, d)).collect();
            hits.push(DrumHit(extra.0, extra.1, extra.2));
            hits.sort_by_key(|h| h.0);
            hits
        };
        let plain = |base: &[(u32, u8, f64)]| -> DrumTemplate {
            base.iter().map(|&(t, v, d)| DrumHit(t, v, d)).collect()
        };

        Self {
            kick: vec![
                plain(kick),
                with(kick, (240, 70, 0.25)),
                with(kick, (840, 65, 0.25)),
            ],
            snare: vec![plain(snare), with(snare, (1800, 60, 0.25))],
            closed_hat: vec![
                (0..16)
                    .map(|i| DrumHit(i * 120, if i % 2 == 0 { 75 } else { 60 }, 0.125))
                    .collect(),
                (0..8).map(|i| DrumHit(i * 240, 70, 0.25)).collect(),
            ],
            open_hat: vec![
                Vec::new(),
                vec![DrumHit(840, 75, 0.5)],
                vec![DrumHit(1800, 75, 0.5)],
            ],
            percussion: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DrumStyle {
    /// Fills are considered on every Nth measure
    pub fill_every: u32,
    pub fill_probability: f64,
    pub ghost_probability: f64,
    /// Plus/minus velocity jitter for template hits
    pub humanize_velocity: u8,
    /// Crash on the first downbeat, held two beats
    pub crash_on_start: bool,
    /// Chance of a ride on beat four of a measure without a fill
    pub ride_probability: f64,
    pub patterns: DrumPatterns,
}

impl Default for DrumStyle {
    fn default() -> Self {
        Self {
            fill_every: 4,
            fill_probability: 0.7,
            ghost_probability: 0.3,
            humanize_velocity: 5,
            crash_on_start: true,
            ride_probability: 0.4,
            patterns: DrumPatterns::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_genre_document() {
        let yaml = r#"
default_genre: Techno
genres:
  Techno:
    tempo: 130
    scale: Minor
    progressions:
      - [i, iv]
    chords:
      duration_beats: 1
    bass:
      style: rolling
      rhythms:
        - { value: eighth, weight: 2 }
        - { value: sixteenth }
    drums:
      patterns:
        kick:
          - [[0, 120, 0.5], [480, 120, 0.5], [960, 120, 0.5], [1440, 120, 0.5]]
"#;

        let file = GenreFile::from_yaml(yaml).unwrap();
        assert_eq!(file.default_genre, "Techno");
        let techno = &file.genres["Techno"];
        assert_eq!(techno.tempo, 130);
        assert_eq!(techno.chords.duration_beats, 1);
        assert_eq!(techno.chords.octave, -1);
        assert_eq!(techno.bass.style, BassKind::Rolling);
        assert_eq!(techno.bass.rhythms[0].weight, 2.0);
        assert_eq!(techno.bass.rhythms[1].weight, 1.0);
        assert_eq!(techno.drums.patterns.kick[0].len(), 4);
        assert!(techno.drums.patterns.snare.is_empty());
        assert_eq!(techno.programs.bass, 33);
    }

    #[test]
    fn test_default_values() {
        let file = GenreFile::from_yaml("genres:\n  Minimal: {}\n").unwrap();
        let minimal = &file.genres["Minimal"];
        assert_eq!(file.default_genre, DEFAULT_GENRE);
        assert_eq!(minimal.tempo, 120);
        assert_eq!(minimal.scale, "Minor");
        assert_eq!(minimal.progressions, vec![symbols(&["i", "iv", "v", "i"])]);
        assert_eq!(minimal.drums.fill_every, 4);
        assert!(minimal.drums.crash_on_start);
        assert_eq!(minimal.drums.ride_probability, 0.4);
        assert!(!minimal.drums.patterns.kick.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
[genres.House]
tempo = 124
scale = "Major"
progressions = [["I", "vi", "ii", "V"]]

[genres.House.programs]
chords = 4
"#;
        let file = GenreFile::from_toml(text).unwrap();
        let house = &file.genres["House"];
        assert_eq!(house.tempo, 124);
        assert_eq!(house.programs.chords, 4);
        assert_eq!(house.programs.lead, 81);
    }

    #[test]
    fn test_builtin_is_valid() {
        let dnb = GenreConfig::drum_and_bass();
        assert_eq!(dnb.tempo, 174);
        assert!(dnb.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_knobs() {
        let mut bad = GenreConfig::drum_and_bass();
        bad.chords.duration_beats = 3;
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidGenre { .. })
        ));

        let mut bad = GenreConfig::drum_and_bass();
        bad.progressions.push(Vec::new());
        assert!(bad.validate().is_err());

        let mut bad = GenreConfig::drum_and_bass();
        bad.lead.velocity = VelocityRange(100, 90);
        assert!(bad.validate().is_err());

        let mut bad = GenreConfig::drum_and_bass();
        bad.drums.patterns.kick = vec![vec![DrumHit(1920, 100, 0.5)]];
        assert!(bad.validate().is_err());

        let mut bad = GenreConfig::drum_and_bass();
        bad.drums.ride_probability = 1.5;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_round_trip() {
        let mut file = GenreFile {
            default_genre: DEFAULT_GENRE.to_string(),
            genres: BTreeMap::new(),
        };
        file.genres
            .insert(DEFAULT_GENRE.to_string(), GenreConfig::drum_and_bass());

        let yaml = file.to_yaml().unwrap();
        let parsed = GenreFile::from_yaml(&yaml).unwrap();
        let original = &file.genres[DEFAULT_GENRE];
        let reparsed = &parsed.genres[DEFAULT_GENRE];
        assert_eq!(original.progressions, reparsed.progressions);
        assert_eq!(original.drums, reparsed.drums);
        assert_eq!(original.lead, reparsed.lead);
    }

    #[test]
    fn test_drum_hit_duration() {
        assert_eq!(DrumHit(0, 100, 0.5).duration_ticks(), 240);
        assert_eq!(DrumHit(0, 100, 0.0001).duration_ticks(), 1);
    }
}
