//! # Error Types
//!
//! Typed failures raised while loading a catalog and preparing its features.
//! These are data-integrity problems: the binary treats every one of them as a
//! fatal startup error and wraps them with `anyhow` context at the boundary.
//!
//! Failing to find a song or running out of candidates is *not* an error;
//! see [`crate::recommend::Selection`].

use thiserror::Error;

/// Result alias for catalog and feature operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Everything that can go wrong between a CSV file and a fitted index
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The underlying CSV reader failed (malformed quoting, ragged rows, ...)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure while opening or reading the dataset
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A column the recommender relies on is absent from the header
    #[error("required column `{0}` is missing from the dataset")]
    MissingColumn(String),

    /// Two rows share a name; lookups by name would be ambiguous
    #[error("song name `{name}` appears more than once (rows {first} and {second})")]
    DuplicateName {
        name: String,
        first: usize,
        second: usize,
    },

    /// A numeric column has an empty, NaN or infinite cell
    #[error("row {row} has no usable value in numeric column `{column}`")]
    MissingValue { row: usize, column: String },

    /// `duration_ms` is not an integral number of milliseconds
    #[error("row {row} has invalid duration_ms `{value}`")]
    InvalidDuration { row: usize, value: String },

    /// The dataset has a header but no songs
    #[error("dataset contains no songs")]
    EmptyCatalog,

    /// The column configured for exclusion is not one of the numeric columns
    #[error("excluded column `{0}` is not a numeric column of the dataset")]
    ExcludedColumnMissing(String),

    /// Nothing is left to compare songs by
    #[error("no numeric feature columns remain after excluding `{0}`")]
    NoFeatures(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_data() {
        let err = CatalogError::DuplicateName {
            name: "Danny Boy".to_string(),
            first: 3,
            second: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("Danny Boy"));
        assert!(msg.contains('3') && msg.contains('7'));

        let err = CatalogError::MissingValue {
            row: 12,
            column: "energy".to_string(),
        };
        assert!(err.to_string().contains("energy"));
    }
}
