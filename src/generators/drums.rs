// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Drum generator driven by genre templates.
//!
//! Every measure instantiates one randomly chosen template per drum voice,
//! humanizes the velocities, may drop in a ghost snare and, at phrase
//! boundaries, replaces the last beat with a fill. A crash opens the part
//! and rides land sparsely on beat four.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{gate_ticks, Generator, GeneratorContext};
use crate::config::DrumStyle;
use crate::timeline::{NoteBuffer, NoteEvent, Part, RhythmValue, TICKS_PER_BEAT};

/// Standard General MIDI drum notes
pub mod gm_drums {
    pub const KICK: u8 = 36;
    pub const SNARE: u8 = 38;
    pub const CLAP: u8 = 39;
    pub const CLOSED_HAT: u8 = 42;
    pub const OPEN_HAT: u8 = 46;
    pub const CRASH: u8 = 49;
    pub const RIDE: u8 = 51;
}

/// Drum voices with template slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrumVoice {
    Kick,
    Snare,
    ClosedHat,
    OpenHat,
    Percussion,
}

impl DrumVoice {
    pub const ALL: [DrumVoice; 5] = [
        DrumVoice::Kick,
        DrumVoice::Snare,
        DrumVoice::ClosedHat,
        DrumVoice::OpenHat,
        DrumVoice::Percussion,
    ];

    /// General MIDI note for this voice
    pub fn note(self) -> u8 {
        match self {
            DrumVoice::Kick => gm_drums::KICK,
            DrumVoice::Snare => gm_drums::SNARE,
            DrumVoice::ClosedHat => gm_drums::CLOSED_HAT,
            DrumVoice::OpenHat => gm_drums::OPEN_HAT,
            DrumVoice::Percussion => gm_drums::CLAP,
        }
    }
}

/// Fills that replace the last beat of a phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillKind {
    /// Four to eight snare hits
    SnareRoll,
    /// Kick, snare, kick
    KickSnareCombo,
    /// Three closed hats into a snare
    HatSnareQuick,
}

impl FillKind {
    pub const ALL: [FillKind; 3] = [
        FillKind::SnareRoll,
        FillKind::KickSnareCombo,
        FillKind::HatSnareQuick,
    ];
}

/// Sixteenth positions where a ghost snare may land
const GHOST_SLOTS: [u64; 7] = [3, 6, 7, 9, 11, 14, 15];

const CRASH_VELOCITY: u8 = 110;
const RIDE_VELOCITY: u8 = 90;

/// Drum pattern generator
pub struct DrumGenerator {
    rng: StdRng,
}

impl DrumGenerator {
    /// Create a new drum generator
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

    /// Apply humanization to a velocity
    fn humanize_velocity(&mut self, velocity: u8, amount: u8) -> u8 {
        let var = amount as i16;
        let offset = self.rng.gen_range(-var..=var);
        (velocity as i16 + offset).clamp(1, 127) as u8
    }

    /// Decide whether this measure ends in a fill
    fn fill_for(&mut self, measure: u64, style: &DrumStyle) -> Option<FillKind> {
        if style.fill_every == 0 || (measure + 1) % style.fill_every as u64 != 0 {
            return None;
        }
        if self.rng.gen::<f64>() >= style.fill_probability {
            return None;
        }
        FillKind::ALL.choose(&mut self.rng).copied()
    }

    /// Write a one-beat fill starting at `at`
    fn write_fill(&mut self, kind: FillKind, at: u64, buffer: &mut NoteBuffer) {
        let sixteenth = RhythmValue::Sixteenth.ticks();
        let short = gate_ticks(sixteenth, 0.8);

        match kind {
            FillKind::SnareRoll => {
                let count: u64 = self.rng.gen_range(4..=8);
                let step = if count <= 4 {
                    sixteenth
                } else {
                    RhythmValue::ThirtySecond.ticks()
                };
                for i in 0..count {
                    // Slight crescendo into the downbeat
                    let velocity = self.rng.gen_range(70..=95) + (i as u8) * 3;
                    buffer.push(gm_drums::SNARE, velocity, at + i * step, gate_ticks(step, 0.8));
                }
            }
            FillKind::KickSnareCombo => {
                let kick = self.rng.gen_range(90..=110);
                let snare = self.rng.gen_range(100..=120);
                let pickup = self.rng.gen_range(70..=90);
                buffer.push(gm_drums::KICK, kick, at, short);
                buffer.push(gm_drums::SNARE, snare, at + 2 * sixteenth, short);
                buffer.push(gm_drums::KICK, pickup, at + 3 * sixteenth, short);
            }
            FillKind::HatSnareQuick => {
                for i in 0..3 {
                    let velocity = self.rng.gen_range(60..=80);
                    buffer.push(
                        gm_drums::CLOSED_HAT,
                        velocity,
                        at + i * sixteenth,
                        sixteenth / 2,
                    );
                }
                let velocity = self.rng.gen_range(100..=120);
                buffer.push(gm_drums::SNARE, velocity, at + 3 * sixteenth, short);
            }
        }
    }
}

impl Default for DrumGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for DrumGenerator {
    fn generate(&mut self, context: &GeneratorContext) -> Vec<NoteEvent> {
        let style = &context.genre().drums;
        let sixteenth = RhythmValue::Sixteenth.ticks();
        let mut buffer = context.buffer();

        if style.crash_on_start {
            let velocity = self.humanize_velocity(CRASH_VELOCITY, style.humanize_velocity);
            buffer.push(gm_drums::CRASH, velocity, 0, 2 * TICKS_PER_BEAT as u64);
        }

        for measure in 0..context.measures() {
            let start = context.measure_start(measure);
            let fill = self.fill_for(measure, style);
            let fill_start = start + 3 * TICKS_PER_BEAT as u64;

            for voice in DrumVoice::ALL {
                let Some(template) = style.patterns.templates(voice).choose(&mut self.rng) else {
                    continue;
                };
                for hit in template {
                    let tick = start + hit.offset();
                    if fill.is_some() && tick >= fill_start {
                        continue;
                    }
                    let velocity = self.humanize_velocity(hit.velocity(), style.humanize_velocity);
                    buffer.push(voice.note(), velocity, tick, hit.duration_ticks());
                }
            }

            if self.rng.gen::<f64>() < style.ghost_probability {
                let limit = if fill.is_some() { 12 } else { 16 };
                let slots: Vec<u64> = GHOST_SLOTS.iter().copied().filter(|s| *s < limit).collect();
                if let Some(slot) = slots.choose(&mut self.rng) {
                    let velocity = self.rng.gen_range(40..=60);
                    buffer.push(gm_drums::SNARE, velocity, start + slot * sixteenth, sixteenth / 2);
                }
            }

            // Ride on beat four, never under a fill
            if fill.is_none() && self.rng.gen::<f64>() < style.ride_probability {
                let velocity = self.humanize_velocity(RIDE_VELOCITY, style.humanize_velocity);
                buffer.push(gm_drums::RIDE, velocity, fill_start, TICKS_PER_BEAT as u64);
            }

            if let Some(kind) = fill {
                debug!("Drum fill {:?} in measure {}", kind, measure + 1);
                self.write_fill(kind, fill_start, &mut buffer);
            }
        }

        buffer.into_events()
    }

    fn part(&self) -> Part {
        Part::Drums
    }

    fn name(&self) -> &'static str {
        "drums"
    }
}
