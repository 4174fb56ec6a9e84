//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `segue` binary.
//!
//! ## Commands
//!
//! - `play`: Run the continuous-play loop from a starting song
//! - `next`: Ask for a single recommendation
//! - `neighbors`: Show the candidates a recommendation is chosen from
//! - `list`: Display the catalog
//! - `init-config`: Write a default configuration file
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! segue --dataset data.csv play "Danny Boy"
//! segue next "Danny Boy" --tolerance 5000
//! segue neighbors "Danny Boy" --json
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
///
/// Options that shape the fitted model are global so every subcommand sees the
/// same catalog.
#[derive(Parser, Debug)]
#[command(name = "segue")]
#[command(about = "Segue: content-based continuous play - picks the next most similar song")]
#[command(version)]
pub struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "SEGUE_CONFIG")]
    pub config: Option<PathBuf>,

    /// CSV dataset with `name`, `duration_ms` and numeric feature columns
    #[arg(long, global = true, env = "SEGUE_DATASET", value_hint = clap::ValueHint::FilePath)]
    pub dataset: Option<PathBuf>,

    /// Numeric column left out of the similarity features
    #[arg(long = "exclude", global = true, value_name = "COLUMN")]
    pub excluded_column: Option<String>,

    /// Nearest neighbours inspected per recommendation (search depth)
    #[arg(
        long,
        global = true,
        value_name = "K",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub neighbors: Option<u32>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Filters shared by every command that makes a recommendation.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Maximum duration difference to the current song, in milliseconds
    #[arg(short, long, value_name = "MS")]
    pub tolerance: Option<u64>,

    /// Treat a song as already played (repeatable)
    #[arg(long = "played", value_name = "SONG")]
    pub played: Vec<String>,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the continuous-play loop
    ///
    /// Repeatedly picks the most similar unplayed song within the duration
    /// tolerance, pausing for a scaled-down version of each song's length.
    /// Stops when no neighbour qualifies.
    Play {
        /// Song to start from (configured start song, or random, when omitted)
        #[arg(value_hint = clap::ValueHint::Other)]
        song: Option<String>,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Stop after this many transitions
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Do not pause between songs
        #[arg(long)]
        no_delay: bool,

        /// Divisor from song milliseconds to seconds of simulated playback
        #[arg(long, value_name = "DIVISOR")]
        playback_scale: Option<f64>,
    },

    /// Recommend the song to play after SONG
    Next {
        #[arg(value_hint = clap::ValueHint::Other)]
        song: String,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Show the nearest neighbours of SONG and why each is or is not eligible
    Neighbors {
        #[arg(value_hint = clap::ValueHint::Other)]
        song: String,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List all songs in the catalog
    List,

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    ///
    /// Usage: segue completion bash > ~/.local/share/bash-completion/completions/segue
    Completion {
        /// Shell to generate completions for
        shell: Shell,

        /// Also complete song names from the catalog (bash only)
        #[arg(long)]
        enhanced: bool,
    },

    /// List song names for completion scripts (hidden command)
    #[command(hide = true)]
    CompleteSongs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_play_with_filters() {
        let args = Args::try_parse_from([
            "segue",
            "--dataset",
            "songs.csv",
            "play",
            "Danny Boy",
            "--tolerance",
            "5000",
            "--played",
            "A",
            "--played",
            "B",
            "--limit",
            "3",
            "--no-delay",
        ])
        .unwrap();

        assert_eq!(args.dataset, Some(PathBuf::from("songs.csv")));
        match args.command {
            Command::Play {
                song,
                selection,
                limit,
                no_delay,
                ..
            } => {
                assert_eq!(song.as_deref(), Some("Danny Boy"));
                assert_eq!(selection.tolerance, Some(5000));
                assert_eq!(selection.played, vec!["A", "B"]);
                assert_eq!(limit, Some(3));
                assert!(no_delay);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = Args::try_parse_from([
            "segue",
            "next",
            "A",
            "--neighbors",
            "20",
            "--exclude",
            "mode",
        ])
        .unwrap();
        assert_eq!(args.neighbors, Some(20));
        assert_eq!(args.excluded_column.as_deref(), Some("mode"));
    }

    #[test]
    fn test_zero_neighbors_rejected() {
        assert!(Args::try_parse_from(["segue", "--neighbors", "0", "list"]).is_err());
    }
}
