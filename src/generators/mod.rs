// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Part generators.
//!
//! Each generator turns the shared context (root, scale, resolved
//! progression, length and genre knobs) into the events of one part. They
//! work in one-measure blocks, look up the active chord per measure, and
//! write every note through a [`NoteBuffer`].

pub mod arpeggio;
pub mod bass;
pub mod chords;
pub mod drums;
pub mod lead;
pub mod pads;

use std::collections::HashMap;
use std::fmt;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{GenreConfig, WeightedRhythm};
use crate::music::{Chord, MidiNote, Note, ProgressionInstance, Scale, ScaleType};
use crate::timeline::{total_ticks, NoteBuffer, NoteEvent, Part, RhythmValue, TICKS_PER_MEASURE};

/// Context shared by all generators in one run
#[derive(Debug, Clone)]
pub struct GeneratorContext<'a> {
    root: Note,
    scale: ScaleType,
    chords: Vec<Chord>,
    beats: u32,
    genre: &'a GenreConfig,
}

impl<'a> GeneratorContext<'a> {
    pub fn new(
        root: Note,
        scale: ScaleType,
        progression: &ProgressionInstance,
        beats: u32,
        genre: &'a GenreConfig,
    ) -> Self {
        let mut chords = progression.resolve(scale);
        if chords.is_empty() {
            chords = ProgressionInstance::new(Vec::new()).resolve(scale);
        }
        Self {
            root,
            scale,
            chords,
            beats,
            genre,
        }
    }

    pub fn root(&self) -> Note {
        self.root
    }

    pub fn scale(&self) -> ScaleType {
        self.scale
    }

    pub fn genre(&self) -> &'a GenreConfig {
        self.genre
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn beats(&self) -> u32 {
        self.beats
    }

    /// MIDI note of the tonic in the fourth octave
    pub fn root_midi(&self) -> MidiNote {
        self.root.root_midi()
    }

    pub fn total_ticks(&self) -> u64 {
        total_ticks(self.beats)
    }

    /// Number of measures, counting a trailing partial one
    pub fn measures(&self) -> u64 {
        self.total_ticks().div_ceil(TICKS_PER_MEASURE)
    }

    pub fn measure_start(&self, measure: u64) -> u64 {
        measure * TICKS_PER_MEASURE
    }

    /// End of a measure, cut at the end of the composition
    pub fn measure_end(&self, measure: u64) -> u64 {
        (self.measure_start(measure) + TICKS_PER_MEASURE).min(self.total_ticks())
    }

    /// Chord active in a measure; the progression cycles
    pub fn chord_at(&self, measure: u64) -> &Chord {
        &self.chords[(measure % self.chords.len() as u64) as usize]
    }

    /// Chord tones in the register `octave` octaves from the tonic
    pub fn chord_tones(&self, chord: &Chord, octave: i8) -> Vec<MidiNote> {
        chord.tones(self.root_midi(), octave)
    }

    /// Scale tones in the register `octave` octaves from the tonic
    pub fn scale_tones(&self, octave: i8) -> Vec<MidiNote> {
        Scale::new(self.root, self.scale).notes_in_octave(octave)
    }

    /// Empty note buffer covering the whole composition
    pub fn buffer(&self) -> NoteBuffer {
        NoteBuffer::new(self.total_ticks())
    }
}

/// Trait for all generator implementations
pub trait Generator: Send {
    /// Generate the complete event list of this part
    fn generate(&mut self, context: &GeneratorContext) -> Vec<NoteEvent>;

    /// The part this generator writes
    fn part(&self) -> Part;

    /// Get the generator type name
    fn name(&self) -> &'static str;
}

/// Factory function type for creating generators from their RNG
pub type GeneratorFactory = fn(StdRng) -> Box<dyn Generator>;

/// Registry of generators by part
#[derive(Default)]
pub struct GeneratorRegistry {
    factories: HashMap<Part, GeneratorFactory>,
}

impl GeneratorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in generators registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Part::Bass, bass::BassGenerator::create);
        registry.register(Part::Chords, chords::ChordGenerator::create);
        registry.register(Part::Lead, lead::LeadGenerator::create);
        registry.register(Part::Pads, pads::PadGenerator::create);
        registry.register(Part::Arpeggio, arpeggio::ArpeggioGenerator::create);
        registry.register(Part::Drums, drums::DrumGenerator::create);
        registry
    }

    /// Register a generator factory, replacing any previous one for the part
    pub fn register(&mut self, part: Part, factory: GeneratorFactory) {
        self.factories.insert(part, factory);
    }

    /// Create the generator for a part
    pub fn create(&self, part: Part, rng: StdRng) -> Option<Box<dyn Generator>> {
        self.factories.get(&part).map(|factory| factory(rng))
    }

    /// Registered parts in track order
    pub fn available(&self) -> Vec<Part> {
        let mut parts: Vec<Part> = self.factories.keys().copied().collect();
        parts.sort();
        parts
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.available())
            .finish()
    }
}

/// Pick a note value from a weighted menu; quarter notes if the menu is unusable
pub fn choose_rhythm<R: Rng + ?Sized>(menu: &[WeightedRhythm], rng: &mut R) -> RhythmValue {
    match WeightedIndex::new(menu.iter().map(|r| r.weight)) {
        Ok(index) => menu[index.sample(rng)].value,
        Err(_) => RhythmValue::Quarter,
    }
}

/// Pick a chord tone with probability `chord_tone_bias`, otherwise a scale tone
pub fn choose_pitch<R: Rng + ?Sized>(
    chord_tones: &[MidiNote],
    scale_tones: &[MidiNote],
    chord_tone_bias: f64,
    rng: &mut R,
) -> Option<MidiNote> {
    let prefer_chord = rng.gen::<f64>() < chord_tone_bias;
    let (first, second) = if prefer_chord {
        (chord_tones, scale_tones)
    } else {
        (scale_tones, chord_tones)
    };
    first.choose(rng).or_else(|| second.choose(rng)).copied()
}

/// Sounding length for a nominal duration and gate fraction, at least one tick
pub fn gate_ticks(duration: u64, gate: f64) -> u64 {
    let gated = (duration as f64 * gate).round() as u64;
    gated.clamp(1, duration.max(1))
}

/// Move a note by whole octaves into `[low, high]`, then clamp to MIDI range
pub fn fit_register(note: i16, low: i16, high: i16) -> MidiNote {
    let mut n = note;
    if n < low {
        n += (low - n + 11) / 12 * 12;
    }
    if n > high {
        n -= (n - high + 11) / 12 * 12;
    }
    n.clamp(0, 127) as MidiNote
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::timeline::check_part;

    pub fn progression(list: &[&str]) -> ProgressionInstance {
        ProgressionInstance::new(list.iter().map(|s| s.to_string()).collect())
    }

    pub fn context<'a>(genre: &'a GenreConfig, beats: u32, chords: &[&str]) -> GeneratorContext<'a> {
        GeneratorContext::new(Note::A, ScaleType::Minor, &progression(chords), beats, genre)
    }

    pub fn assert_well_formed(events: &[NoteEvent], total_ticks: u64) {
        if let Err(e) = check_part(events, total_ticks) {
            panic!("malformed events: {}", e);
        }
    }
}
