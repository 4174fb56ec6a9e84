//! # Recommendation Selector
//!
//! Picks the song to play after the current one.
//!
//! ## Algorithm
//!
//! 1. Resolve the current song by exact name
//! 2. Retrieve its `k` nearest neighbours from the index (default 10)
//! 3. Walk them nearest first, skipping the current song's own row
//! 4. Accept the first candidate that has not been played and whose duration is
//!    within the tolerance of the current song's duration
//!
//! The walk never goes past the `k` retrieved neighbours, so a song inside the
//! tolerance but ranked below `k` is never offered. Raise `k` to search deeper.
//!
//! The self-match is skipped by row, not by position: when two songs share a
//! feature vector either may sort first, and only the query song is dropped.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::features;
use crate::index::{NeighborSearch, SimilarityIndex, DEFAULT_NEIGHBORS};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Default allowed duration difference between consecutive songs.
pub const DEFAULT_DURATION_TOLERANCE_MS: u64 = 10_000;

/// Default column left out of the feature set.
pub const DEFAULT_EXCLUDED_COLUMN: &str = "explicit";

/// The song chosen to play next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub name: String,
    pub duration_ms: i64,
    pub distance: f64,
}

/// Outcome of a single selector call.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Next(Recommendation),
    /// The requested song is not in the catalog.
    SongNotFound,
    /// Every retrieved neighbour was already played or too long/short.
    NoSuitableCandidate,
}

impl Selection {
    #[must_use]
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            Self::Next(rec) => Some(rec),
            _ => None,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next(rec) => write!(f, "Next song: '{}' ({} ms)", rec.name, rec.duration_ms),
            Self::SongNotFound => write!(f, "Song not found in the dataset."),
            Self::NoSuitableCandidate => {
                write!(f, "No suitable recommendation found within duration tolerance.")
            }
        }
    }
}

/// Why a retrieved neighbour was or was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Eligible,
    AlreadyPlayed,
    OutsideTolerance { difference_ms: u64 },
}

/// A retrieved neighbour together with its verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub duration_ms: i64,
    pub distance: f64,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Fitted recommendation context: catalog, feature columns and index.
///
/// Built once and then only read. The playback loop borrows it.
#[derive(Debug, Clone)]
pub struct Recommender<I = SimilarityIndex> {
    catalog: Catalog,
    columns: Vec<String>,
    index: I,
    neighbors: usize,
}

impl Recommender<SimilarityIndex> {
    /// Standardize the catalog's features (minus `excluded`) and fit a cosine
    /// index that retrieves `neighbors` rows per query.
    ///
    /// # Errors
    ///
    /// Fails when `excluded` is not a numeric column or nothing else is left.
    pub fn from_catalog(catalog: Catalog, excluded: &str, neighbors: usize) -> Result<Self> {
        let (scaler, matrix) = features::prepare(&catalog, excluded)?;
        let index = SimilarityIndex::build(&matrix);
        Ok(Self {
            columns: scaler.columns().to_vec(),
            catalog,
            index,
            neighbors: neighbors.max(1),
        })
    }
}

impl<I: NeighborSearch> Recommender<I> {
    /// Wrap an existing index. Rows of `index` must line up with `catalog`.
    pub fn with_index(catalog: Catalog, columns: Vec<String>, index: I, neighbors: usize) -> Self {
        Self {
            catalog,
            columns,
            index,
            neighbors: neighbors.max(1),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Feature columns in index order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn neighbors(&self) -> usize {
        self.neighbors
    }

    /// Every retrieved neighbour of `song_name` except the song itself, nearest
    /// first, each with its verdict. `None` when the song is unknown.
    ///
    /// At most `neighbors - 1` candidates are returned, even when identical
    /// songs push the current row out of the retrieved window.
    #[must_use]
    pub fn candidates(
        &self,
        song_name: &str,
        played: &HashSet<String>,
        tolerance_ms: u64,
    ) -> Option<Vec<Candidate>> {
        let row = self.catalog.find(song_name)?;
        let current = self.catalog.song(row)?;

        let candidates = self
            .index
            .nearest_to_row(row, self.neighbors)
            .into_iter()
            .filter(|hit| hit.row != row)
            .take(self.neighbors.saturating_sub(1))
            .filter_map(|hit| {
                let song = self.catalog.song(hit.row)?;
                let difference_ms = song.duration_ms.abs_diff(current.duration_ms);
                let verdict = if played.contains(&song.name) {
                    Verdict::AlreadyPlayed
                } else if difference_ms > tolerance_ms {
                    Verdict::OutsideTolerance { difference_ms }
                } else {
                    Verdict::Eligible
                };
                Some(Candidate {
                    name: song.name.clone(),
                    duration_ms: song.duration_ms,
                    distance: hit.distance,
                    verdict,
                })
            })
            .collect();

        Some(candidates)
    }

    /// Choose the next song after `song_name`.
    ///
    /// Read-only: `played` is not modified.
    #[must_use]
    pub fn recommend_next(
        &self,
        song_name: &str,
        played: &HashSet<String>,
        tolerance_ms: u64,
    ) -> Selection {
        let Some(candidates) = self.candidates(song_name, played, tolerance_ms) else {
            warn!("'{song_name}' is not in the catalog");
            return Selection::SongNotFound;
        };

        match candidates
            .into_iter()
            .find(|c| c.verdict == Verdict::Eligible)
        {
            Some(c) => {
                debug!(
                    "'{song_name}' -> '{}' (distance {:.4}, {} ms)",
                    c.name, c.distance, c.duration_ms
                );
                Selection::Next(Recommendation {
                    name: c.name,
                    duration_ms: c.duration_ms,
                    distance: c.distance,
                })
            }
            None => {
                warn!(
                    "No unplayed neighbour of '{song_name}' within {tolerance_ms} ms among {} nearest",
                    self.neighbors
                );
                Selection::NoSuitableCandidate
            }
        }
    }
}

/// Build a recommender with the default exclusion and neighbour count.
///
/// # Errors
///
/// See [`Recommender::from_catalog`].
pub fn with_defaults(catalog: Catalog) -> Result<Recommender> {
    Recommender::from_catalog(catalog, DEFAULT_EXCLUDED_COLUMN, DEFAULT_NEIGHBORS)
}
