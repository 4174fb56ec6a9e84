//! # Segue - Content-Based Continuous Play
//!
//! Loads a CSV catalog of songs with numeric audio features, fits a cosine
//! nearest-neighbour model over the standardized features and keeps picking
//! the most similar unplayed song of comparable length.
//!
//! ## Usage
//!
//! ```bash
//! # Simulated continuous play from a song
//! segue --dataset data.csv play "Danny Boy"
//!
//! # One recommendation, with songs already heard
//! segue next "Danny Boy" --played "Molly Malone"
//!
//! # Inspect the candidate window
//! segue neighbors "Danny Boy" --neighbors 20
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use rand::seq::SliceRandom;
use segue::catalog::Catalog;
use segue::cli::{self, Args, Command, SelectionArgs};
use segue::completion;
use segue::config::{self, Overrides, Settings};
use segue::playback::{Clock, NoDelay, PlaybackLoop, PlaybackOptions, SystemClock};
use segue::recommend::{Recommender, Selection, Verdict};
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

/// Resolve the config file, load it and apply the global flags.
fn load_settings(args: &Args) -> Result<(PathBuf, Settings)> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    let settings = Settings::load(&path)?.with_overrides(Overrides {
        dataset: args.dataset.clone(),
        excluded_column: args.excluded_column.clone(),
        neighbors: args.neighbors.map(|k| k as usize),
        ..Overrides::default()
    });
    Ok((path, settings))
}

fn load_catalog(settings: &Settings) -> Result<Catalog> {
    let path = settings.dataset_path()?;
    Catalog::from_path(&path).with_context(|| format!("Failed to load dataset {}", path.display()))
}

/// Load the catalog and fit the model. Any data problem is fatal here.
fn load_recommender(settings: &Settings) -> Result<Recommender> {
    settings.validate()?;
    let started = Instant::now();
    let catalog = load_catalog(settings)?;
    let recommender =
        Recommender::from_catalog(catalog, &settings.excluded_column, settings.neighbors)
            .context("Failed to prepare song features")?;
    info!(
        "Fitted {} songs on {:?} in {:?}",
        recommender.catalog().len(),
        recommender.columns(),
        started.elapsed()
    );
    Ok(recommender)
}

fn apply_selection(settings: Settings, selection: &SelectionArgs) -> Settings {
    settings.with_overrides(Overrides {
        duration_tolerance_ms: selection.tolerance,
        ..Overrides::default()
    })
}

fn played_set(selection: &SelectionArgs) -> HashSet<String> {
    selection.played.iter().cloned().collect()
}

fn run_playback<C: Clock>(
    recommender: &Recommender,
    start: String,
    options: PlaybackOptions,
    played: HashSet<String>,
    clock: C,
) -> Result<()> {
    let stdout = io::stdout();
    let report = PlaybackLoop::new(recommender, start, options, clock, stdout.lock())
        .with_played(played)
        .run()?;
    info!(
        "Played {} transitions with {} playlist resets; stopped: {:?}",
        report.transitions.len(),
        report.resets,
        report.stop
    );
    Ok(())
}

fn format_duration(ms: i64) -> String {
    let seconds = ms.max(0) / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Main entry point.
///
/// Logging goes to stderr through `env_logger` and is controlled by
/// `RUST_LOG`, e.g. `RUST_LOG=segue=debug segue play "Danny Boy"`. Standard
/// output carries only the playback transcript and command results.
fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let (config_path, settings) = load_settings(&args)?;
    debug!("Effective settings: {settings:?}");

    match args.command {
        Command::Play {
            song,
            selection,
            limit,
            no_delay,
            playback_scale,
        } => {
            let settings = apply_selection(settings, &selection).with_overrides(Overrides {
                start_song: song,
                playback_scale,
                ..Overrides::default()
            });
            let recommender = load_recommender(&settings)?;

            let start = match settings.start_song.clone() {
                Some(start) => start,
                None => {
                    let song = recommender
                        .catalog()
                        .songs()
                        .choose(&mut rand::thread_rng())
                        .context("Catalog is empty")?;
                    info!("No start song given, starting from random song '{}'", song.name);
                    song.name.clone()
                }
            };

            let options = PlaybackOptions {
                tolerance_ms: settings.duration_tolerance_ms,
                playback_scale: settings.playback_scale,
                limit,
            };
            let played = played_set(&selection);

            if no_delay {
                run_playback(&recommender, start, options, played, NoDelay)?;
            } else {
                run_playback(&recommender, start, options, played, SystemClock)?;
            }
        }
        Command::Next { song, selection } => {
            let settings = apply_selection(settings, &selection);
            let recommender = load_recommender(&settings)?;
            let result = recommender.recommend_next(
                &song,
                &played_set(&selection),
                settings.duration_tolerance_ms,
            );
            println!("{result}");
        }
        Command::Neighbors {
            song,
            selection,
            json,
        } => {
            let settings = apply_selection(settings, &selection);
            let recommender = load_recommender(&settings)?;
            let Some(candidates) = recommender.candidates(
                &song,
                &played_set(&selection),
                settings.duration_tolerance_ms,
            ) else {
                println!("{}", Selection::SongNotFound);
                return Ok(());
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            } else {
                println!(
                    "{:>3}  {:<40} {:>8} {:>9}  STATUS",
                    "#", "SONG", "LENGTH", "DISTANCE"
                );
                for (rank, c) in candidates.iter().enumerate() {
                    let status = match c.verdict {
                        Verdict::Eligible => "eligible".to_string(),
                        Verdict::AlreadyPlayed => "already played".to_string(),
                        Verdict::OutsideTolerance { difference_ms } => {
                            format!("off by {difference_ms} ms")
                        }
                    };
                    println!(
                        "{:>3}  {:<40} {:>8} {:>9.5}  {status}",
                        rank + 1,
                        c.name,
                        format_duration(c.duration_ms),
                        c.distance
                    );
                }
            }
        }
        Command::List => {
            let recommender = load_recommender(&settings)?;
            println!("Features: {}", recommender.columns().join(", "));
            for song in recommender.catalog().songs() {
                println!("{} [{}]", song.name, format_duration(song.duration_ms));
            }
        }
        Command::InitConfig { force } => {
            Settings::default().save(&config_path, force)?;
            println!("Wrote default configuration to {}", config_path.display());
        }
        Command::Completion { shell, enhanced } => {
            if enhanced {
                if shell != cli::Shell::Bash {
                    anyhow::bail!("Enhanced completions are only supported for bash");
                }
                completion::generate_enhanced_bash_completion();
            } else {
                let mut cmd = Args::command();
                completion::generate_completions(
                    completion::shell_to_completion_shell(shell),
                    &mut cmd,
                );
            }
        }
        Command::CompleteSongs => {
            // Completion must stay quiet when no dataset is reachable.
            if let Ok(catalog) = load_catalog(&settings) {
                completion::print_song_completions(&catalog)?;
            }
        }
    }

    Ok(())
}
