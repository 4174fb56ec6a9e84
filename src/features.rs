//! # Feature Preparation
//!
//! Turns raw catalog columns into standardized feature vectors.
//!
//! All numeric columns take part except one configured flag column
//! (`explicit` by default). `duration_ms` stays in, so song length counts
//! towards similarity as well as towards the duration filter.
//!
//! ```text
//! z = (x - mean) / std      (population std; a constant column divides by 1)
//! ```
//!
//! Means and deviations are computed once over the whole catalog. The fitted
//! [`Standardizer`] keeps the column order so any raw vector laid out like a
//! catalog row can be transformed the same way later.

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use log::debug;

/// Column selection plus per-column mean and scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    columns: Vec<String>,
    /// Position of each kept column within a catalog row's features.
    source: Vec<usize>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

/// One standardized vector per catalog row, aligned by row index.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.columns.len()
    }
}

/// Deviations this small relative to the mean are rounding noise.
fn effective_scale(std: f64, mean: f64) -> f64 {
    if !std.is_finite() || std <= 10.0 * f64::EPSILON * mean.abs().max(1.0) {
        1.0
    } else {
        std
    }
}

impl Standardizer {
    /// Fit on every numeric column of `catalog` except `excluded`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::ExcludedColumnMissing`] when `excluded` is not a numeric
    /// column, [`CatalogError::NoFeatures`] when nothing else is left.
    pub fn fit(catalog: &Catalog, excluded: &str) -> Result<Self> {
        if catalog.column_index(excluded).is_none() {
            return Err(CatalogError::ExcludedColumnMissing(excluded.to_string()));
        }

        let (source, columns): (Vec<usize>, Vec<String>) = catalog
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_str() != excluded)
            .map(|(i, name)| (i, name.clone()))
            .unzip();

        if columns.is_empty() {
            return Err(CatalogError::NoFeatures(excluded.to_string()));
        }

        #[allow(clippy::cast_precision_loss)]
        let n = catalog.len() as f64;
        let songs = catalog.songs();

        let means: Vec<f64> = source
            .iter()
            .map(|&c| songs.iter().map(|s| s.features[c]).sum::<f64>() / n)
            .collect();

        let scales: Vec<f64> = source
            .iter()
            .zip(&means)
            .map(|(&c, &mean)| {
                let variance = songs
                    .iter()
                    .map(|s| (s.features[c] - mean).powi(2))
                    .sum::<f64>()
                    / n;
                effective_scale(variance.sqrt(), mean)
            })
            .collect();

        debug!("Standardizing columns {columns:?} with means {means:?} and scales {scales:?}");

        Ok(Self {
            columns,
            source,
            means,
            scales,
        })
    }

    /// Standardize one raw vector laid out in catalog column order.
    ///
    /// # Panics
    ///
    /// Panics if `raw` is shorter than the catalog the standardizer was fitted on.
    #[must_use]
    pub fn transform(&self, raw: &[f64]) -> Vec<f64> {
        self.source
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(&c, (mean, scale))| (raw[c] - mean) / scale)
            .collect()
    }

    /// Standardize every catalog row.
    #[must_use]
    pub fn transform_catalog(&self, catalog: &Catalog) -> FeatureMatrix {
        FeatureMatrix {
            columns: self.columns.clone(),
            rows: catalog
                .songs()
                .iter()
                .map(|song| self.transform(&song.features))
                .collect(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}

/// Fit a [`Standardizer`] and apply it to the catalog it was fitted on.
///
/// # Errors
///
/// See [`Standardizer::fit`].
pub fn prepare(catalog: &Catalog, excluded: &str) -> Result<(Standardizer, FeatureMatrix)> {
    let scaler = Standardizer::fit(catalog, excluded)?;
    let matrix = scaler.transform_catalog(catalog);
    Ok((scaler, matrix))
}
