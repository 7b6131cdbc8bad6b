// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The loaded genre library.
//!
//! Loading never fails: a missing or malformed document yields the built-in
//! store, invalid genre records are dropped one by one, and lookups of
//! unknown genres fall back to the default genre.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use super::{ConfigError, GenreConfig, GenreFile};
use crate::music::scale::normalize_name;
use crate::music::{ProgressionInstance, ScaleType};

/// Genre that is always available
pub const DEFAULT_GENRE: &str = "Drum and Bass";

/// Read-only genre records keyed by normalized name
#[derive(Debug, Clone)]
pub struct GenreStore {
    genres: BTreeMap<String, GenreConfig>,
    default: GenreConfig,
}

impl GenreStore {
    /// Store holding only the built-in Drum and Bass genre
    pub fn builtin() -> Self {
        let dnb = GenreConfig::drum_and_bass();
        let mut genres = BTreeMap::new();
        genres.insert(normalize_name(&dnb.name), dnb.clone());
        Self {
            genres,
            default: dnb,
        }
    }

    /// Load a genre document, falling back to the built-in store on any
    /// failure
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(store) => store,
            Err(e) => {
                warn!("{:#}; using built-in genres", e);
                Self::builtin()
            }
        }
    }

    /// Load a genre document, reporting failures
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = GenreFile::load(path.as_ref())?;
        let store = Self::from_file(file)?;
        info!(
            "Loaded {} genres from {:?} (default: {})",
            store.len(),
            path.as_ref(),
            store.default.name
        );
        Ok(store)
    }

    /// Build a store from a parsed document, dropping invalid genres
    pub fn from_file(file: GenreFile) -> Result<Self, ConfigError> {
        let mut genres = BTreeMap::new();
        for (name, mut config) in file.genres {
            config.name = name;
            if let Err(e) = config.validate() {
                warn!("Dropping genre: {}", e);
                continue;
            }
            if ScaleType::from_name(&config.scale).is_none() {
                warn!(
                    "{}",
                    ConfigError::UnknownScale {
                        genre: config.name.clone(),
                        scale: config.scale.clone(),
                    }
                );
            }
            genres.insert(normalize_name(&config.name), config);
        }

        if genres.is_empty() {
            return Err(ConfigError::NoGenres);
        }

        genres
            .entry(normalize_name(DEFAULT_GENRE))
            .or_insert_with(GenreConfig::drum_and_bass);

        let default = match genres.get(&normalize_name(&file.default_genre)) {
            Some(config) => config.clone(),
            None => {
                warn!(
                    "Default genre '{}' is not defined, using {}",
                    file.default_genre, DEFAULT_GENRE
                );
                genres
                    .get(&normalize_name(DEFAULT_GENRE))
                    .cloned()
                    .unwrap_or_else(GenreConfig::drum_and_bass)
            }
        };

        Ok(Self { genres, default })
    }

    /// Look up a genre by name, ignoring case and separators
    pub fn get(&self, name: &str) -> Option<&GenreConfig> {
        self.genres.get(&normalize_name(name))
    }

    /// Look up a genre, falling back to the default genre
    pub fn resolve(&self, name: &str) -> &GenreConfig {
        match self.get(name) {
            Some(config) => config,
            None => {
                warn!(
                    "Unknown genre '{}', using {}",
                    name,
                    self.default.name
                );
                &self.default
            }
        }
    }

    pub fn default_config(&self) -> &GenreConfig {
        &self.default
    }

    /// Display names of all loaded genres
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.values().map(|g| g.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.genres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }

    /// Pick one of the genre's progressions uniformly
    pub fn choose_progression<R: Rng + ?Sized>(
        config: &GenreConfig,
        rng: &mut R,
    ) -> ProgressionInstance {
        let symbols = config.progressions.choose(rng).cloned().unwrap_or_default();
        ProgressionInstance::new(symbols)
    }

    /// Pick a progression whose symbols all exist in the scale; when none
    /// fit, any progression may be picked and chords get substituted
    pub fn choose_progression_for<R: Rng + ?Sized>(
        config: &GenreConfig,
        scale: ScaleType,
        rng: &mut R,
    ) -> ProgressionInstance {
        let fitting: Vec<&Vec<String>> = config
            .progressions
            .iter()
            .filter(|p| p.iter().all(|symbol| scale.chord(symbol).is_some()))
            .collect();

        match fitting.choose(rng) {
            Some(symbols) => ProgressionInstance::new((*symbols).clone()),
            None => {
                debug!(
                    "No {} progression fits {}, substituting chords",
                    config.name, scale
                );
                Self::choose_progression(config, rng)
            }
        }
    }
}

impl Default for GenreStore {
    fn default() -> Self {
        Self::builtin()
    }
}
