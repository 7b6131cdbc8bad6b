// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Arpeggiator.
//!
//! Spreads the measure's chord across octaves, orders it by the chosen
//! pattern and steps through it at a fixed rate for the whole measure.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{choose_rhythm, fit_register, gate_ticks, Generator, GeneratorContext};
use crate::music::MidiNote;
use crate::timeline::{NoteEvent, Part};

const ARP_LOW: i16 = 48;
const ARP_HIGH: i16 = 84;

/// Arpeggio orderings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArpOrder {
    /// Ascending
    Up,
    /// Descending
    Down,
    /// Ascending then descending without repeating the ends
    UpDown,
    /// Random permutation, repeated
    Shuffled,
    /// A few chord tones scattered across octaves
    Broken,
}

impl ArpOrder {
    pub const ALL: [ArpOrder; 5] = [
        ArpOrder::Up,
        ArpOrder::Down,
        ArpOrder::UpDown,
        ArpOrder::Shuffled,
        ArpOrder::Broken,
    ];
}

/// Chord tones copied one and two octaves up and down, kept in the
/// arpeggio register
pub fn expand_chord(tones: &[MidiNote]) -> Vec<MidiNote> {
    let mut notes: Vec<MidiNote> = tones
        .iter()
        .flat_map(|&t| [-24i16, -12, 0, 12, 24].into_iter().map(move |o| t as i16 + o))
        .filter(|n| (ARP_LOW..=ARP_HIGH).contains(n))
        .map(|n| n as MidiNote)
        .collect();

    if notes.is_empty() {
        notes = tones
            .iter()
            .map(|&t| fit_register(t as i16, ARP_LOW, ARP_HIGH))
            .collect();
    }
    notes.sort_unstable();
    notes.dedup();
    notes
}

/// Order the expanded notes into one pattern cycle
pub fn order_notes<R: Rng + ?Sized>(
    order: ArpOrder,
    expanded: &[MidiNote],
    tones: &[MidiNote],
    rng: &mut R,
) -> Vec<MidiNote> {
    match order {
        ArpOrder::Up => expanded.to_vec(),
        ArpOrder::Down => expanded.iter().rev().copied().collect(),
        ArpOrder::UpDown => {
            let mut cycle = expanded.to_vec();
            if expanded.len() > 2 {
                cycle.extend(expanded[1..expanded.len() - 1].iter().rev());
            }
            cycle
        }
        ArpOrder::Shuffled => {
            let mut cycle = expanded.to_vec();
            cycle.shuffle(rng);
            cycle
        }
        ArpOrder::Broken => {
            let count = rng.gen_range(2..=4).min(tones.len());
            let picked: Vec<MidiNote> = tones.choose_multiple(rng, count).copied().collect();
            let mut cycle: Vec<MidiNote> = picked
                .into_iter()
                .map(|t| {
                    let shift = [-12i16, 0, 12].choose(rng).copied().unwrap_or(0);
                    fit_register(t as i16 + shift, ARP_LOW, ARP_HIGH)
                })
                .collect();
            cycle.sort_unstable();
            cycle.dedup();
            if cycle.is_empty() {
                return expanded.to_vec();
            }
            cycle
        }
    }
}

/// Arpeggio generator
pub struct ArpeggioGenerator {
    rng: StdRng,
}

impl ArpeggioGenerator {
    /// Create a new arpeggio generator
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

impl Default for ArpeggioGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for ArpeggioGenerator {
    fn generate(&mut self, context: &GeneratorContext) -> Vec<NoteEvent> {
        let style = &context.genre().arpeggio;
        let mut buffer = context.buffer();

        for measure in 0..context.measures() {
            let tones = context.chord_tones(context.chord_at(measure), style.octave);
            let expanded = expand_chord(&tones);
            let order = style.orders.choose(&mut self.rng).copied().unwrap_or(ArpOrder::Up);
            let cycle = order_notes(order, &expanded, &tones, &mut self.rng);
            if cycle.is_empty() {
                continue;
            }
            let step = choose_rhythm(&style.rates, &mut self.rng).ticks();

            let end = context.measure_end(measure);
            let mut tick = context.measure_start(measure);
            for &note in cycle.iter().cycle() {
                if tick >= end {
                    break;
                }
                let length = step.min(end - tick);
                let velocity = style.velocity.sample(&mut self.rng);
                let gate = style.gate.sample(&mut self.rng);
                buffer.push(note, velocity, tick, gate_ticks(length, gate));
                tick += step;
            }
        }

        buffer.into_events()
    }

    fn part(&self) -> Part {
        Part::Arpeggio
    }

    fn name(&self) -> &'static str {
        "arpeggio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenreConfig, WeightedRhythm};
    use crate::generators::testing::{assert_well_formed, context};
    use crate::timeline::{EventKind, RhythmValue};

    #[test]
    fn test_expand_chord() {
        // A minor at A4
        let expanded = expand_chord(&[69, 72, 76]);
        assert_eq!(expanded, vec![48, 52, 57, 60, 64, 69, 72, 76, 81, 84]);
        // Nothing lands in range: fold instead
        assert_eq!(expand_chord(&[120]), vec![84]);
    }

    #[test]
    fn test_orders() {
        let mut rng = StdRng::seed_from_u64(6);
        let notes = [57, 60, 64, 69];
        assert_eq!(order_notes(ArpOrder::Up, &notes, &notes, &mut rng), vec![57, 60, 64, 69]);
        assert_eq!(order_notes(ArpOrder::Down, &notes, &notes, &mut rng), vec![69, 64, 60, 57]);
        assert_eq!(
            order_notes(ArpOrder::UpDown, &notes, &notes, &mut rng),
            vec![57, 60, 64, 69, 64, 60]
        );

        let mut shuffled = order_notes(ArpOrder::Shuffled, &notes, &notes, &mut rng);
        shuffled.sort_unstable();
        assert_eq!(shuffled, notes.to_vec());

        let broken = order_notes(ArpOrder::Broken, &notes, &[69, 72, 76], &mut rng);
        assert!((1..=3).contains(&broken.len()));
        assert!(broken.iter().all(|n| matches!(n % 12, 9 | 0 | 4)));
    }

    #[test]
    fn test_arpeggio_fills_measures_at_rate() {
        let mut genre = GenreConfig::drum_and_bass();
        genre.arpeggio.rates = vec![WeightedRhythm::new(RhythmValue::Sixteenth, 1.0)];
        genre.arpeggio.orders = vec![ArpOrder::Up];
        let ctx = context(&genre, 8, &["i", "VI"]);
        let mut gen = ArpeggioGenerator::with_rng(StdRng::seed_from_u64(12));
        let events = gen.generate(&ctx);
        assert_well_formed(&events, ctx.total_ticks());

        let onsets: Vec<&NoteEvent> = events
            .iter()
            .filter(|e| e.kind == EventKind::NoteOn)
            .collect();
        assert_eq!(onsets.len(), 32);
        assert!(onsets.iter().all(|e| e.tick % 120 == 0));
        assert!(events.iter().all(|e| (48..=84).contains(&e.pitch)));

        // First measure climbs
        let first: Vec<u8> = onsets.iter().take(4).map(|e| e.pitch).collect();
        assert!(first.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_arpeggio_all_orders_are_well_formed() {
        let genre = GenreConfig::drum_and_bass();
        let ctx = context(&genre, 32, &["i", "VII", "VI", "V"]);
        for seed in 0..10 {
            let mut gen = ArpeggioGenerator::with_rng(StdRng::seed_from_u64(seed));
            let events = gen.generate(&ctx);
            assert_well_formed(&events, ctx.total_ticks());
            assert!(!events.is_empty());
        }
    }
}
