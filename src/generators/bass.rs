// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Bass generator.
//!
//! Two styles: free bass draws a weighted rhythm and a chord- or scale-tone
//! pitch for every step, while rolling bass plays curated one-measure
//! patterns relative to the chord root, with ghost notes and glides.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::{choose_pitch, choose_rhythm, fit_register, gate_ticks, Generator, GeneratorContext};
use crate::config::{BassKind, BassStyle};
use crate::music::Chord;
use crate::timeline::RhythmValue::{DottedEighth, Eighth, Quarter, Sixteenth};
use crate::timeline::{NoteBuffer, NoteEvent, Part, RhythmValue};

/// Register rolling patterns are kept in
const ROLLING_LOW: i16 = 36;
const ROLLING_HIGH: i16 = 72;

/// Gate used for glide steps
const GLIDE_GATE: f64 = 0.99;

/// One step of a rolling bass pattern
#[derive(Debug, Clone, Copy)]
struct RollingStep {
    /// Semitones above the chord root
    interval: i16,
    value: RhythmValue,
    velocity: (u8, u8),
    ghost: bool,
    glide: bool,
}

const fn step(interval: i16, value: RhythmValue, lo: u8, hi: u8) -> RollingStep {
    RollingStep {
        interval,
        value,
        velocity: (lo, hi),
        ghost: false,
        glide: false,
    }
}

const fn ghost(interval: i16, value: RhythmValue, lo: u8, hi: u8) -> RollingStep {
    RollingStep {
        ghost: true,
        ..step(interval, value, lo, hi)
    }
}

const fn glide(interval: i16, value: RhythmValue, lo: u8, hi: u8) -> RollingStep {
    RollingStep {
        glide: true,
        ..step(interval, value, lo, hi)
    }
}

/// Rolling bass pattern library
const ROLLING_PATTERNS: &[&[RollingStep]] = &[
    // Root pulse with a fifth
    &[
        step(0, Eighth, 80, 95),
        step(0, Eighth, 80, 95),
        step(7, Eighth, 80, 95),
        step(0, Eighth, 80, 95),
    ],
    // Walking up through the minor pentatonic
    &[
        step(0, Quarter, 90, 100),
        step(3, Eighth, 70, 85),
        step(5, Eighth, 70, 85),
        step(7, Quarter, 85, 95),
        glide(10, Eighth, 75, 90),
        step(12, Eighth, 75, 90),
        step(14, Eighth, 65, 80),
    ],
    // Syncopated with ghosts
    &[
        step(0, Eighth, 90, 100),
        ghost(7, Sixteenth, 60, 75),
        step(0, Eighth, 80, 90),
        step(5, Eighth, 70, 85),
        step(7, Eighth, 85, 95),
        step(0, DottedEighth, 90, 100),
        ghost(10, Sixteenth, 65, 80),
    ],
    // Arpeggiated major shape
    &[
        step(0, Eighth, 85, 95),
        step(4, Eighth, 80, 90),
        step(7, Eighth, 85, 95),
        step(12, Eighth, 80, 90),
        step(7, Eighth, 85, 95),
        step(4, Eighth, 80, 90),
    ],
];

/// Bass line generator
pub struct BassGenerator {
    rng: StdRng,
}

impl BassGenerator {
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

    /// Weighted rhythm and pitch per step, clamped to two octaves above the
    /// bass register floor
    fn free_measure(
        &mut self,
        context: &GeneratorContext,
        style: &BassStyle,
        measure: u64,
        buffer: &mut NoteBuffer,
    ) {
        let chord = context.chord_at(measure);
        let chord_tones = context.chord_tones(chord, style.octave);
        let scale_tones = context.scale_tones(style.octave);
        let low = context.root_midi() as i16 + style.octave as i16 * 12;

        let end = context.measure_end(measure);
        let mut tick = context.measure_start(measure);
        while tick < end {
            let duration = choose_rhythm(&style.rhythms, &mut self.rng).ticks().min(end - tick);
            if let Some(pitch) =
                choose_pitch(&chord_tones, &scale_tones, style.chord_tone_bias, &mut self.rng)
            {
                let pitch = fit_register(pitch as i16, low, low + 24);
                let velocity = style.velocity.sample(&mut self.rng);
                let gate = style.gate.sample(&mut self.rng);
                buffer.push(pitch, velocity, tick, gate_ticks(duration, gate));
            }
            tick += duration;
        }
    }

    /// One pattern from the rolling library, rooted on the chord root
    fn rolling_measure(
        &mut self,
        context: &GeneratorContext,
        style: &BassStyle,
        chord: &Chord,
        start: u64,
        end: u64,
        buffer: &mut NoteBuffer,
    ) {
        let Some(pattern) = ROLLING_PATTERNS.choose(&mut self.rng) else {
            return;
        };
        let root = context.root_midi() as i16
            + style.octave as i16 * 12
            + chord.root_interval() as i16;

        let mut tick = start;
        for step in pattern.iter().cycle() {
            if tick >= end {
                break;
            }
            let nominal = step.value.ticks().min(end - tick);
            let pitch = fit_register(root + step.interval, ROLLING_LOW, ROLLING_HIGH);

            let (velocity, length) = if step.ghost {
                let lo = step.velocity.0;
                let velocity = self.rng.gen_range(lo..=lo.saturating_add(15));
                let length = nominal.min(RhythmValue::ThirtySecond.ticks());
                (velocity, length)
            } else {
                let (lo, hi) = step.velocity;
                let gate = if step.glide {
                    GLIDE_GATE
                } else {
                    style.gate.sample(&mut self.rng)
                };
                (self.rng.gen_range(lo..=hi), gate_ticks(nominal, gate))
            };

            buffer.push(pitch, velocity, tick, length);
            tick += nominal;
        }
    }
}

impl Default for BassGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for BassGenerator {
    fn generate(&mut self, context: &GeneratorContext) -> Vec<NoteEvent> {
        let style = &context.genre().bass;
        let mut buffer = context.buffer();

        for measure in 0..context.measures() {
            match style.style {
                BassKind::Free => self.free_measure(context, style, measure, &mut buffer),
                BassKind::Rolling => {
                    let chord = context.chord_at(measure);
                    let start = context.measure_start(measure);
                    let end = context.measure_end(measure);
                    self.rolling_measure(context, style, chord, start, end, &mut buffer);
                }
            }
        }

        buffer.into_events()
    }

    fn part(&self) -> Part {
        Part::Bass
    }

    fn name(&self) -> &'static str {
        "bass"
    }
}
