// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Composition driver.
//!
//! Validates a request, resolves genre, scale, tempo and progression, runs
//! each requested generator against the same progression and collects the
//! results into a [`Composition`].

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{GenreConfig, GenreStore, InstrumentPrograms};
use crate::export::{assemble, write_midi_file, ExportError};
use crate::generators::{GeneratorContext, GeneratorRegistry};
use crate::music::{Note, ProgressionInstance, ScaleType, TheoryError};
use crate::timeline::{check_part, PairingError, Part, Timeline, BEATS_PER_MEASURE};

/// Rejected generation request
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("beats must be a positive multiple of 4, got {0}")]
    BeatsNotMeasureAligned(u32),
    #[error("tempo must be positive")]
    ZeroTempo,
    #[error("no parts selected")]
    NoParts,
    #[error(transparent)]
    Theory(#[from] TheoryError),
}

/// Composition failure
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("{part} generator produced malformed events")]
    InvariantViolation {
        part: Part,
        #[source]
        source: PairingError,
    },
}

/// Set of parts to generate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartSelection(BTreeSet<Part>);

impl PartSelection {
    pub fn all() -> Self {
        Self(Part::ALL.into_iter().collect())
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_parts<I: IntoIterator<Item = Part>>(parts: I) -> Self {
        Self(parts.into_iter().collect())
    }

    pub fn with(mut self, part: Part) -> Self {
        self.0.insert(part);
        self
    }

    pub fn contains(&self, part: Part) -> bool {
        self.0.contains(&part)
    }

    /// Selected parts in track order
    pub fn parts(&self) -> impl Iterator<Item = Part> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for PartSelection {
    type Err = String;

    /// Comma-separated part names, or "all"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Part::from_name(name).ok_or_else(|| format!("unknown part '{}'", name)))
            .collect::<Result<BTreeSet<Part>, String>>()
            .map(Self)
    }
}

impl fmt::Display for PartSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.parts().map(Part::name).collect();
        write!(f, "{}", names.join(","))
    }
}

/// What to compose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Root note name
    pub root: String,
    /// Scale name; the genre's scale when absent
    pub scale: Option<String>,
    /// Tempo; the genre's tempo when absent
    pub bpm: Option<u32>,
    /// Length in beats, a positive multiple of 4
    pub beats: u32,
    pub parts: PartSelection,
    /// Genre name; the default genre when absent
    pub genre: Option<String>,
}

impl GenerationRequest {
    /// Request for every part in the default genre
    pub fn new(root: impl Into<String>, beats: u32) -> Self {
        Self {
            root: root.into(),
            scale: None,
            bpm: None,
            beats,
            parts: PartSelection::all(),
            genre: None,
        }
    }

    pub fn with_scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = Some(scale.into());
        self
    }

    pub fn with_bpm(mut self, bpm: u32) -> Self {
        self.bpm = Some(bpm);
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_parts(mut self, parts: PartSelection) -> Self {
        self.parts = parts;
        self
    }

    /// Check the request and parse its root and scale
    pub fn validate(&self) -> Result<(Note, Option<ScaleType>), ValidationError> {
        if self.beats == 0 || self.beats % BEATS_PER_MEASURE != 0 {
            return Err(ValidationError::BeatsNotMeasureAligned(self.beats));
        }
        if self.bpm == Some(0) {
            return Err(ValidationError::ZeroTempo);
        }
        if self.parts.is_empty() {
            return Err(ValidationError::NoParts);
        }
        let root = self.root.parse::<Note>()?;
        let scale = match &self.scale {
            Some(name) => Some(
                ScaleType::from_name(name)
                    .ok_or_else(|| TheoryError::UnknownScale(name.clone()))?,
            ),
            None => None,
        };
        Ok((root, scale))
    }
}

/// A finished composition and the parameters it was made with
#[derive(Debug, Clone)]
pub struct Composition {
    timeline: Timeline,
    genre: String,
    root: Note,
    scale: ScaleType,
    bpm: u32,
    progression: ProgressionInstance,
    programs: InstrumentPrograms,
}

impl Composition {
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn root(&self) -> Note {
        self.root
    }

    pub fn scale(&self) -> ScaleType {
        self.scale
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn progression(&self) -> &ProgressionInstance {
        &self.progression
    }

    pub fn programs(&self) -> &InstrumentPrograms {
        &self.programs
    }

    /// The whole composition as Type 1 MIDI file bytes
    pub fn to_midi_bytes(&self) -> Vec<u8> {
        assemble(&self.timeline, self.bpm, &self.programs)
    }

    /// A single part as MIDI file bytes
    pub fn part_midi_bytes(&self, part: Part) -> Vec<u8> {
        assemble(&self.timeline.only(part), self.bpm, &self.programs)
    }

    pub fn write_midi(&self, path: &Path) -> Result<(), ExportError> {
        write_midi_file(path, &self.to_midi_bytes())
    }

    pub fn write_part_midi(&self, part: Part, path: &Path) -> Result<(), ExportError> {
        write_midi_file(path, &self.part_midi_bytes(part))
    }
}

/// Runs generators against a genre library
#[derive(Debug)]
pub struct Composer<'a> {
    store: &'a GenreStore,
    registry: GeneratorRegistry,
    rng: StdRng,
}

impl<'a> Composer<'a> {
    /// Composer with unseeded randomness
    pub fn new(store: &'a GenreStore) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    /// Composer that repeats its output for the same seed and requests
    pub fn with_seed(store: &'a GenreStore, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: &'a GenreStore, rng: StdRng) -> Self {
        Self {
            store,
            registry: GeneratorRegistry::with_builtins(),
            rng,
        }
    }

    /// Replace the generator registry
    pub fn with_registry(mut self, registry: GeneratorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn store(&self) -> &GenreStore {
        self.store
    }

    /// Compose one piece
    pub fn compose(&mut self, request: &GenerationRequest) -> Result<Composition, ComposeError> {
        let (root, requested_scale) = request.validate()?;

        let genre = match &request.genre {
            Some(name) => self.store.resolve(name),
            None => self.store.default_config(),
        };
        let scale = requested_scale.unwrap_or_else(|| genre_scale(genre));
        let bpm = request.bpm.unwrap_or(genre.tempo);
        let progression = GenreStore::choose_progression_for(genre, scale, &mut self.rng);

        info!(
            "Composing {} beats of {} in {} {} at {} BPM ({})",
            request.beats, genre.name, root, scale, bpm, progression
        );

        let context = GeneratorContext::new(root, scale, &progression, request.beats, genre);
        let mut timeline = Timeline::new(request.beats, bpm);

        // One seed per part in fixed order, so a part's output does not
        // depend on which other parts were requested
        for part in Part::ALL {
            let seed: u64 = self.rng.gen();
            if !request.parts.contains(part) {
                continue;
            }
            let Some(mut generator) = self.registry.create(part, StdRng::seed_from_u64(seed)) else {
                warn!("No generator registered for {}, skipping", part);
                continue;
            };

            let events = generator.generate(&context);
            check_part(&events, context.total_ticks())
                .map_err(|source| ComposeError::InvariantViolation { part, source })?;
            debug!("{}: {} events", generator.name(), events.len());
            timeline.insert(part, events);
        }

        Ok(Composition {
            timeline,
            genre: genre.name.clone(),
            root,
            scale,
            bpm,
            progression,
            programs: genre.programs,
        })
    }
}

/// The genre's scale, or Minor if the genre names an unknown scale
fn genre_scale(genre: &GenreConfig) -> ScaleType {
    ScaleType::from_name(&genre.scale).unwrap_or_else(|| {
        warn!(
            "Genre {} uses unknown scale '{}', using Minor",
            genre.name, genre.scale
        );
        ScaleType::Minor
    })
}
