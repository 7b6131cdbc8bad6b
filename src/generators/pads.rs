// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pad generator: one sustained chord per measure in a high register.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::chords::{choose_voicing, voice_chord};
use super::{fit_register, gate_ticks, Generator, GeneratorContext};
use crate::music::MidiNote;
use crate::timeline::{NoteEvent, Part};

const PAD_LOW: i16 = 60;
const PAD_HIGH: i16 = 96;

/// Sustained pad generator
pub struct PadGenerator {
    rng: StdRng,
}

impl PadGenerator {
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

impl Default for PadGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for PadGenerator {
    fn generate(&mut self, context: &GeneratorContext) -> Vec<NoteEvent> {
        let style = &context.genre().pads;
        let mut buffer = context.buffer();

        for measure in 0..context.measures() {
            let chord = context.chord_at(measure);
            // Pads sit an octave above the chord part
            let tones: Vec<MidiNote> = context
                .chord_tones(chord, style.octave.saturating_add(1))
                .into_iter()
                .map(|n| fit_register(n as i16, PAD_LOW, PAD_HIGH))
                .collect();
            let voicing = choose_voicing(&style.voicing, &mut self.rng);
            let notes = voice_chord(voicing, &tones, chord.is_major(), &mut self.rng);

            let start = context.measure_start(measure);
            let length = context.measure_end(measure) - start;
            let gate = style.gate.sample(&mut self.rng);
            for note in notes {
                let velocity = style.velocity.sample(&mut self.rng);
                buffer.push(note, velocity, start, gate_ticks(length, gate));
            }
        }

        buffer.into_events()
    }

    fn part(&self) -> Part {
        Part::Pads
    }

    fn name(&self) -> &'static str {
        "pads"
    }
}
