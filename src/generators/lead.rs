// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Lead melody generator.
//!
//! Writes a handful of notes per measure from the start of the measure,
//! mixing chord tones and scale tones, with occasional octave jumps and
//! whole-measure rests for sparse genres.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{choose_pitch, choose_rhythm, gate_ticks, Generator, GeneratorContext};
use crate::timeline::{NoteEvent, Part, RhythmValue};

/// Octave jumps stay inside this range
const JUMP_CEILING: u8 = 100;
const JUMP_FLOOR: u8 = 30;

/// Lead melody generator
pub struct LeadGenerator {
    rng: StdRng,
}

impl LeadGenerator {
    /// Create a new lead generator
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

    /// Move a note an octave up, or down if up would leave the lead range
    fn octave_jump(&mut self, pitch: u8, probability: f64) -> u8 {
        if self.rng.gen::<f64>() >= probability {
            return pitch;
        }
        if pitch + 12 <= JUMP_CEILING {
            pitch + 12
        } else if pitch >= JUMP_FLOOR + 12 {
            pitch - 12
        } else {
            pitch
        }
    }
}

impl Default for LeadGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for LeadGenerator {
    fn generate(&mut self, context: &GeneratorContext) -> Vec<NoteEvent> {
        let style = &context.genre().lead;
        let scale_tones = context.scale_tones(style.octave);
        let shortest = RhythmValue::ThirtySecond.ticks();
        let mut buffer = context.buffer();

        for measure in 0..context.measures() {
            if self.rng.gen::<f64>() < style.rest_probability {
                continue;
            }

            let chord_tones = context.chord_tones(context.chord_at(measure), style.octave);
            let count = style.notes_per_measure.sample(&mut self.rng);
            let end = context.measure_end(measure);
            let mut tick = context.measure_start(measure);

            for _ in 0..count {
                if tick >= end {
                    break;
                }
                let duration = choose_rhythm(&style.rhythms, &mut self.rng)
                    .ticks()
                    .max(shortest)
                    .min(end - tick);
                let Some(pitch) =
                    choose_pitch(&chord_tones, &scale_tones, style.chord_tone_bias, &mut self.rng)
                else {
                    break;
                };
                let pitch = self.octave_jump(pitch, style.octave_jump_probability);
                let velocity = style.velocity.sample(&mut self.rng);
                let gate = style.gate.sample(&mut self.rng);
                buffer.push(pitch, velocity, tick, gate_ticks(duration, gate));
                tick += duration;
            }
        }

        buffer.into_events()
    }

    fn part(&self) -> Part {
        Part::Lead
    }

    fn name(&self) -> &'static str {
        "lead"
    }
}
