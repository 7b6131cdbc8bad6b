// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Genre-driven procedural MIDI composition.
//!
//! Bass, chords, lead, pads, arpeggio and drum parts are generated from a
//! root, a scale, a tempo and a genre record, collected in a [`Timeline`]
//! and written out as a Type 1 Standard MIDI File.
//!
//! ```no_run
//! use genremidi::{Composer, GenerationRequest, GenreStore};
//!
//! let store = GenreStore::load("genres.yaml");
//! let mut composer = Composer::new(&store);
//! let composition = composer
//!     .compose(&GenerationRequest::new("A", 16).with_genre("Drum and Bass"))
//!     .unwrap();
//! composition.write_midi(std::path::Path::new("out.mid")).unwrap();
//! ```

pub mod composer;
pub mod config;
pub mod export;
pub mod generators;
pub mod music;
pub mod timeline;

pub use composer::{
    ComposeError, Composer, Composition, GenerationRequest, PartSelection, ValidationError,
};
pub use config::{ConfigError, GenreConfig, GenreStore, InstrumentPrograms, DEFAULT_GENRE};
pub use export::{assemble, write_midi_file, ExportError, MidiAssembler};
pub use music::{chord_intervals, scale_intervals, Note, Scale, ScaleType, TheoryError};
pub use timeline::{EventKind, NoteEvent, NoteSpan, Part, Timeline, TICKS_PER_BEAT};
