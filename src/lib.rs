//! Content-based continuous play: pick the next song by audio similarity.
//!
//! Core modules:
//! - [`catalog`] - CSV loading and validation
//! - [`features`] - Feature selection and standardization
//! - [`index`] - Cosine nearest-neighbour search
//! - [`recommend`] - Next-song selection with played/duration filters
//! - [`playback`] - The simulated continuous-play loop
//!
//! ### Supporting Modules
//!
//! - [`config`] - Settings file and command-line overrides
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//! - [`error`] - Typed catalog errors
//!
//! ## Quick Start Example
//!
//! ```
//! use segue::catalog::Catalog;
//! use segue::playback::{NoDelay, PlaybackLoop, PlaybackOptions};
//! use segue::recommend::{self, Selection};
//! use std::collections::HashSet;
//!
//! let csv = "\
//! name,duration_ms,explicit,energy
//! A,200000,0,0.2
//! B,205000,0,0.25
//! C,400000,1,0.9
//! ";
//! let recommender = recommend::with_defaults(Catalog::from_reader(csv.as_bytes())?)?;
//!
//! // One recommendation
//! match recommender.recommend_next("A", &HashSet::new(), 10_000) {
//!     Selection::Next(next) => assert_eq!(next.name, "B"),
//!     other => panic!("{other}"),
//! }
//!
//! // A whole session, without real pauses
//! let mut transcript = Vec::new();
//! let options = PlaybackOptions::default();
//! let report = PlaybackLoop::new(&recommender, "A", options, NoDelay, &mut transcript).run()?;
//! assert_eq!(report.transitions[0].to, "B");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## How a Recommendation Is Made
//!
//! 1. Every numeric column except the excluded flag (default `explicit`) is
//!    standardized to zero mean and unit variance over the whole catalog.
//!    `duration_ms` is one of those columns.
//! 2. A cosine index returns the `k` (default 10) nearest rows of the current
//!    song.
//! 3. The current song's own row is dropped; the first remaining song that is
//!    unplayed and within the duration tolerance (default 10 000 ms) wins.
//!
//! ## Error Handling
//!
//! Loading and fitting return [`error::CatalogError`] for integrity problems
//! (duplicate names, missing values, missing columns). The binary reports them
//! through `anyhow` and exits. An unknown song or an empty candidate window is
//! an ordinary [`recommend::Selection`] outcome.

pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod features;
pub mod index;
pub mod playback;
pub mod recommend;
