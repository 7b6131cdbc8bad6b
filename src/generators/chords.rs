// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord generator.
//!
//! Strikes the measure's chord every `duration_beats` beats with a voicing
//! picked once per measure, so each measure sounds exactly one chord.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{fit_register, gate_ticks, Generator, GeneratorContext};
use crate::config::VoicingWeights;
use crate::music::MidiNote;
use crate::timeline::{NoteEvent, Part, TICKS_PER_BEAT};

/// Register chord tones are folded into
const CHORD_LOW: i16 = 48;
const CHORD_HIGH: i16 = 84;

/// Chord voicing strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voicing {
    /// Chord tones as resolved, close position
    Triad,
    /// Adds a seventh, sometimes a ninth
    Extended,
    /// First or second inversion
    Inverted,
}

impl Voicing {
    pub const ALL: [Voicing; 3] = [Voicing::Triad, Voicing::Extended, Voicing::Inverted];
}

/// Pick a voicing by weight; close triads if the weights are unusable
pub fn choose_voicing<R: Rng + ?Sized>(weights: &VoicingWeights, rng: &mut R) -> Voicing {
    let table = [weights.triad, weights.extended, weights.inverted];
    match WeightedIndex::new(table) {
        Ok(index) => Voicing::ALL[index.sample(rng)],
        Err(_) => Voicing::Triad,
    }
}

/// Voice a chord from its tones. The result is sorted, deduplicated and
/// stays within MIDI range.
pub fn voice_chord<R: Rng + ?Sized>(
    voicing: Voicing,
    tones: &[MidiNote],
    major: bool,
    rng: &mut R,
) -> Vec<MidiNote> {
    let mut notes: Vec<u16> = tones.iter().map(|&n| n as u16).collect();
    notes.sort_unstable();
    notes.dedup();
    let Some(&root) = notes.first() else {
        return Vec::new();
    };

    match voicing {
        Voicing::Triad => {}
        Voicing::Extended => {
            // Four-note chords already carry their seventh
            if notes.len() < 4 {
                let (seventh, ninth_probability) = if major { (11, 0.3) } else { (10, 0.4) };
                notes.push(root + seventh);
                if rng.gen::<f64>() < ninth_probability {
                    notes.push(root + 14);
                }
            }
        }
        Voicing::Inverted => {
            let inversion = rng.gen_range(1..=2).min(notes.len().saturating_sub(1));
            notes = invert_chord(&notes, inversion);
        }
    }

    notes.sort_unstable();
    notes.dedup();
    notes
        .into_iter()
        .filter(|&n| n <= 127)
        .map(|n| n as MidiNote)
        .collect()
}

/// Invert a chord by moving bottom notes up an octave
fn invert_chord(notes: &[u16], inversion: usize) -> Vec<u16> {
    let mut result = notes.to_vec();
    for _ in 0..inversion {
        if !result.is_empty() {
            let bottom = result.remove(0);
            result.push(bottom + 12);
        }
    }
    result.sort_unstable();
    result
}

/// Chord generator
pub struct ChordGenerator {
    rng: StdRng,
}

impl ChordGenerator {
    /// Create a new chord generator
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Factory function for registry
    pub fn create(rng: StdRng) -> Box<dyn Generator> {
        Box::new(Self::with_rng(rng))
    }
}

impl Default for ChordGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for ChordGenerator {
    fn generate(&mut self, context: &GeneratorContext) -> Vec<NoteEvent> {
        let style = &context.genre().chords;
        let strike = style.duration_beats.max(1) as u64 * TICKS_PER_BEAT as u64;
        let mut buffer = context.buffer();

        for measure in 0..context.measures() {
            let chord = context.chord_at(measure);
            let tones: Vec<MidiNote> = context
                .chord_tones(chord, style.octave)
                .into_iter()
                .map(|n| fit_register(n as i16, CHORD_LOW, CHORD_HIGH))
                .collect();
            let voicing = choose_voicing(&style.voicing, &mut self.rng);
            let notes = voice_chord(voicing, &tones, chord.is_major(), &mut self.rng);

            let end = context.measure_end(measure);
            let mut tick = context.measure_start(measure);
            while tick < end {
                let length = strike.min(end - tick);
                let velocity = style.velocity.sample(&mut self.rng);
                let gate = style.gate.sample(&mut self.rng);
                for &note in &notes {
                    buffer.push(note, velocity, tick, gate_ticks(length, gate));
                }
                tick += strike;
            }
        }

        buffer.into_events()
    }

    fn part(&self) -> Part {
        Part::Chords
    }

    fn name(&self) -> &'static str {
        "chords"
    }
}
