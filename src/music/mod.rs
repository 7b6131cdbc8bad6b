// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory tables for the generation engine.
//!
//! Scale interval sets, diatonic chord tables keyed by symbol, and the
//! progression instance shared by all generators in one run.

pub mod progression;
pub mod scale;

pub use progression::{Chord, ProgressionInstance};
pub use scale::{
    chord_intervals, resolve_chord, scale_intervals, MidiNote, Note, Scale, ScaleType, TheoryError,
};
