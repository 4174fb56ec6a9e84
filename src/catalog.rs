//! # Catalog Module
//!
//! Loads the song dataset from CSV and validates it before anything is fitted.
//!
//! ## Column Typing
//!
//! Columns carry no declared types, so they are inferred from their cells: a
//! column is *numeric* when at least one cell holds a number and no cell holds
//! text. Empty cells and `NaN` count as missing rather than text, which lets a
//! numeric column with a hole be reported as a missing value instead of being
//! silently dropped from the feature set.
//!
//! Two columns are required:
//!
//! - `name`: unique lookup key, never used as a feature
//! - `duration_ms`: integral milliseconds, used both as a feature and by the
//!   duration filter
//!
//! ## Example
//!
//! ```
//! use segue::catalog::Catalog;
//!
//! let csv = "name,duration_ms,explicit,energy\n\
//!            Danny Boy,200000,0,0.2\n\
//!            Scarborough Fair,205000,0,0.3\n";
//! let catalog = Catalog::from_reader(csv.as_bytes())?;
//! assert_eq!(catalog.len(), 2);
//! assert_eq!(catalog.find("Danny Boy"), Some(0));
//! # Ok::<(), segue::error::CatalogError>(())
//! ```

use crate::error::{CatalogError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header of the lookup-key column
pub const NAME_COLUMN: &str = "name";

/// Header of the duration column (milliseconds)
pub const DURATION_COLUMN: &str = "duration_ms";

/// One row of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Song {
    pub name: String,
    pub duration_ms: i64,
    /// Raw values of every numeric column, in [`Catalog::columns`] order.
    pub features: Vec<f64>,
}

/// Immutable, validated set of songs.
#[derive(Debug, Clone)]
pub struct Catalog {
    songs: Vec<Song>,
    columns: Vec<String>,
    by_name: HashMap<String, usize>,
}

/// How a single cell reads.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
    Missing,
    Number(f64),
    Text,
}

fn classify(raw: &str) -> Cell {
    if raw.is_empty() {
        return Cell::Missing;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_nan() => Cell::Missing,
        Ok(v) => Cell::Number(v),
        Err(_) => Cell::Text,
    }
}

fn cell<'r>(record: &'r StringRecord, column: usize) -> &'r str {
    record.get(column).unwrap_or_default()
}

/// A column with no text cells is numeric, even when every cell is missing.
fn is_numeric(rows: &[StringRecord], column: usize) -> bool {
    rows.iter().all(|row| !matches!(classify(cell(row, column)), Cell::Text))
}

fn parse_duration(raw: &str, row: usize) -> Result<i64> {
    let invalid = || CatalogError::InvalidDuration {
        row,
        value: raw.to_string(),
    };

    if let Ok(ms) = raw.parse::<i64>() {
        return if ms < 0 { Err(invalid()) } else { Ok(ms) };
    }
    // Exported tables often write integer columns as `200000.0`.
    match classify(raw) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        Cell::Number(v) if v.fract() == 0.0 && (0.0..i64::MAX as f64).contains(&v) => Ok(v as i64),
        _ => Err(invalid()),
    }
}

impl Catalog {
    /// Open and validate a CSV dataset.
    ///
    /// # Errors
    ///
    /// Any [`CatalogError`]: unreadable file, malformed CSV, missing required
    /// columns, duplicate names, missing numeric values, or no rows at all.
    pub fn from_path(path: &Path) -> Result<Self> {
        info!("Loading catalog from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse and validate CSV data from any reader.
    ///
    /// Row numbers in errors are 1-based and count data rows only.
    ///
    /// # Errors
    ///
    /// See [`Catalog::from_path`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let locate = |wanted: &str| {
            headers
                .iter()
                .position(|h| h == wanted)
                .ok_or_else(|| CatalogError::MissingColumn(wanted.to_string()))
        };
        let name_at = locate(NAME_COLUMN)?;
        let duration_at = locate(DURATION_COLUMN)?;

        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if rows.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        // Durations first, so a bad duration is reported as such rather than
        // as "duration_ms is not numeric".
        let durations = rows
            .iter()
            .enumerate()
            .map(|(i, row)| parse_duration(cell(row, duration_at), i + 1))
            .collect::<Result<Vec<_>>>()?;

        let numeric: Vec<usize> = (0..headers.len())
            .filter(|&c| c != name_at && is_numeric(&rows, c))
            .collect();
        let columns: Vec<String> = numeric.iter().map(|&c| headers[c].clone()).collect();
        debug!("Numeric columns: {columns:?}");

        let mut songs = Vec::with_capacity(rows.len());
        let mut by_name = HashMap::with_capacity(rows.len());

        for (i, (row, duration_ms)) in rows.iter().zip(durations).enumerate() {
            let name = cell(row, name_at).to_string();
            if let Some(&first) = by_name.get(&name) {
                return Err(CatalogError::DuplicateName {
                    name,
                    first: first + 1,
                    second: i + 1,
                });
            }

            let features = numeric
                .iter()
                .map(|&c| match classify(cell(row, c)) {
                    Cell::Number(v) if v.is_finite() => Ok(v),
                    _ => Err(CatalogError::MissingValue {
                        row: i + 1,
                        column: headers[c].clone(),
                    }),
                })
                .collect::<Result<Vec<_>>>()?;

            by_name.insert(name.clone(), i);
            songs.push(Song {
                name,
                duration_ms,
                features,
            });
        }

        info!(
            "Loaded {} songs with {} numeric columns",
            songs.len(),
            columns.len()
        );

        Ok(Self {
            songs,
            columns,
            by_name,
        })
    }

    /// Row index of the song with exactly this name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Song> {
        self.find(name).map(|row| &self.songs[row])
    }

    #[must_use]
    pub fn song(&self, row: usize) -> Option<&Song> {
        self.songs.get(row)
    }

    #[must_use]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Names of the numeric columns, in feature order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
