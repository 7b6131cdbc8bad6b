// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use genremidi::music::ScaleType;
use genremidi::{Composer, Composition, GenerationRequest, GenreStore, PartSelection};

#[derive(Parser, Debug)]
#[command(
    name = "genremidi",
    version,
    about = "Generate multi-part electronic music as MIDI files"
)]
struct Cli {
    /// Genre library (YAML, or TOML by extension)
    #[arg(long, global = true, default_value = "genres.yaml")]
    genres: PathBuf,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, default_value_t = false)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a piece and write it as a MIDI file
    Generate {
        /// Root note (C, C#, Db, ... B)
        #[arg(short, long, default_value = "A")]
        key: String,

        /// Scale name; the genre's scale when omitted
        #[arg(short, long)]
        scale: Option<String>,

        /// Tempo in BPM; the genre's tempo when omitted
        #[arg(short, long)]
        bpm: Option<u32>,

        /// Length in beats, a multiple of 4
        #[arg(long, default_value_t = 16)]
        beats: u32,

        /// Genre name; the library's default genre when omitted
        #[arg(short, long)]
        genre: Option<String>,

        /// Comma-separated parts, or "all"
        #[arg(short, long, default_value = "bass,chords,lead,drums")]
        parts: PartSelection,

        /// Output file
        #[arg(short, long, default_value = "output.mid")]
        output: PathBuf,

        /// Also write one file per part next to the output
        #[arg(long, default_value_t = false)]
        split: bool,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List the loaded genres
    Genres,
    /// List the known scales
    Scales,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// `song.mid` + bass -> `song_bass.mid`
fn part_path(output: &Path, part: genremidi::Part) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{}_{}.mid", stem, part.name()))
}

fn write_outputs(composition: &Composition, output: &Path, split: bool) -> Result<()> {
    composition
        .write_midi(output)
        .with_context(|| format!("Failed to write {:?}", output))?;
    info!("Wrote {:?}", output);

    if split {
        for (part, _) in composition.timeline().parts() {
            let path = part_path(output, part);
            composition
                .write_part_midi(part, &path)
                .with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote {:?}", path);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Generate {
            key,
            scale,
            bpm,
            beats,
            genre,
            parts,
            output,
            split,
            seed,
        } => {
            let store = GenreStore::load(&cli.genres);
            let mut composer = match seed {
                Some(seed) => Composer::with_seed(&store, seed),
                None => Composer::new(&store),
            };

            let mut request = GenerationRequest::new(key, beats).with_parts(parts);
            request.scale = scale;
            request.bpm = bpm;
            request.genre = genre;

            let composition = composer.compose(&request)?;
            println!(
                "{} in {} {} at {} BPM, {} beats: {}",
                composition.genre(),
                composition.root(),
                composition.scale(),
                composition.bpm(),
                beats,
                composition.progression()
            );
            write_outputs(&composition, &output, split)?;
        }
        Command::Genres => {
            let store = GenreStore::load(&cli.genres);
            let default = store.default_config().name.clone();
            for name in store.genre_names() {
                let marker = if name == default { " (default)" } else { "" };
                if let Some(config) = store.get(name) {
                    println!(
                        "{:<16} {:>3} BPM  {}{}",
                        name, config.tempo, config.scale, marker
                    );
                }
            }
        }
        Command::Scales => {
            for scale in ScaleType::ALL {
                let intervals: Vec<String> =
                    scale.intervals().iter().map(|i| i.to_string()).collect();
                println!("{:<24} {}", scale.name(), intervals.join(" "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use genremidi::Part;

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("out/song.mid"), Part::Bass),
            PathBuf::from("out/song_bass.mid")
        );
        assert_eq!(
            part_path(Path::new("take"), Part::Drums),
            PathBuf::from("take_drums.mid")
        );
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::parse_from([
            "genremidi", "generate", "--key", "F#", "--beats", "32", "--parts", "bass,pads",
            "--seed", "7", "--split",
        ]);
        match cli.command {
            Command::Generate {
                key, beats, parts, seed, split, ..
            } => {
                assert_eq!(key, "F#");
                assert_eq!(beats, 32);
                assert_eq!(parts, PartSelection::from_parts([Part::Bass, Part::Pads]));
                assert_eq!(seed, Some(7));
                assert!(split);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
