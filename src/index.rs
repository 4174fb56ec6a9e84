//! # Similarity Index
//!
//! Exhaustive cosine nearest-neighbour search over a [`FeatureMatrix`].
//!
//! Rows are normalized to unit length once at build time, so a query costs one
//! dot product per indexed row. Distances are computed in parallel with rayon.
//!
//! ```text
//! distance(a, b) = 1 - (a · b) / (|a| |b|)      clipped to [0, 2]
//! ```
//!
//! A zero vector has no direction: its similarity to anything is 0, so its
//! distance is 1.

use crate::features::FeatureMatrix;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

/// Default number of neighbours retrieved per query.
pub const DEFAULT_NEIGHBORS: usize = 10;

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f64,
}

/// Anything that can answer "which rows are closest to this row".
///
/// Results are sorted ascending by distance and hold at most `k` entries. The
/// query row itself is usually among them.
pub trait NeighborSearch {
    fn nearest_to_row(&self, row: usize, k: usize) -> Vec<Neighbor>;

    /// Number of indexed rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute-force cosine index.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    /// Unit-length copies of the indexed rows; zero rows stay zero.
    unit_rows: Vec<Vec<f64>>,
    dimensions: usize,
}

fn normalize(vector: &[f64]) -> Vec<f64> {
    let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm == 0.0 {
        vector.to_vec()
    } else {
        vector.iter().map(|v| v / norm).collect()
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine distance between two arbitrary vectors.
#[must_use]
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    (1.0 - dot(&normalize(a), &normalize(b))).clamp(0.0, 2.0)
}

fn by_distance(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .partial_cmp(&b.distance)
        .unwrap_or(Ordering::Equal)
        .then(a.row.cmp(&b.row))
}

impl SimilarityIndex {
    #[must_use]
    pub fn build(matrix: &FeatureMatrix) -> Self {
        log::debug!(
            "Building cosine index over {} rows x {} dimensions",
            matrix.len(),
            matrix.dimensions()
        );
        Self {
            unit_rows: matrix.rows().par_iter().map(|r| normalize(r)).collect(),
            dimensions: matrix.dimensions(),
        }
    }

    /// The `min(k, len)` rows closest to `vector`, nearest first; equal
    /// distances keep row order.
    ///
    /// # Panics
    ///
    /// Panics if `vector` does not have the index's dimensionality.
    #[must_use]
    pub fn query(&self, vector: &[f64], k: usize) -> Vec<Neighbor> {
        assert_eq!(
            vector.len(),
            self.dimensions,
            "query vector has the wrong number of features"
        );
        let target = normalize(vector);

        let mut hits: Vec<Neighbor> = self
            .unit_rows
            .par_iter()
            .enumerate()
            .map(|(row, unit)| Neighbor {
                row,
                distance: (1.0 - dot(&target, unit)).clamp(0.0, 2.0),
            })
            .collect();

        hits.sort_by(by_distance);
        hits.truncate(k);
        hits
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl NeighborSearch for SimilarityIndex {
    fn nearest_to_row(&self, row: usize, k: usize) -> Vec<Neighbor> {
        match self.unit_rows.get(row) {
            // Unit rows point the same way as the originals.
            Some(unit) => self.query(unit, k),
            None => Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.unit_rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::features;

    fn index_of(rows: &[&[f64]]) -> SimilarityIndex {
        SimilarityIndex {
            unit_rows: rows.iter().map(|r| normalize(r)).collect(),
            dimensions: rows[0].len(),
        }
    }

    #[test]
    fn test_query_sorted_and_includes_self() {
        let index = index_of(&[&[1.0, 0.0], &[1.0, 0.1], &[0.0, 1.0], &[-1.0, 0.0]]);

        let hits = index.nearest_to_row(0, 4);
        let rows: Vec<usize> = hits.iter().map(|n| n.row).collect();
        assert_eq!(rows, vec![0, 1, 2, 3]);
        assert!(hits[0].distance.abs() < 1e-12);
        assert!((hits[2].distance - 1.0).abs() < 1e-12);
        assert!((hits[3].distance - 2.0).abs() < 1e-12);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_never_returns_more_than_catalog_size() {
        let index = index_of(&[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]]);
        assert_eq!(index.nearest_to_row(1, DEFAULT_NEIGHBORS).len(), 3);
        assert_eq!(index.nearest_to_row(1, 2).len(), 2);
        assert!(index.nearest_to_row(99, 2).is_empty());
    }

    #[test]
    fn test_ties_keep_row_order() {
        // Rows 0, 1 and 2 point the same way.
        let index = index_of(&[&[1.0, 0.0], &[2.0, 0.0], &[3.0, 0.0], &[0.0, 1.0]]);
        let rows: Vec<usize> = index.query(&[5.0, 0.0], 3).iter().map(|n| n.row).collect();
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn test_zero_vector_is_orthogonal_to_everything() {
        assert!((cosine_distance(&[0.0, 0.0], &[1.0, 2.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_distance(&[3.0, 4.0], &[6.0, 8.0]).abs() < 1e-12);
    }

    #[test]
    fn test_build_from_prepared_catalog() {
        let csv = "\
name,duration_ms,explicit,energy
A,200000,0,0.2
B,205000,0,0.25
C,400000,1,0.9
";
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        let (_, matrix) = features::prepare(&catalog, "explicit").unwrap();
        let index = SimilarityIndex::build(&matrix);

        assert_eq!(index.len(), 3);
        assert_eq!(index.dimensions(), 2);
        let hits = index.nearest_to_row(0, 3);
        assert_eq!(hits[0].row, 0);
        assert_eq!(hits[1].row, 1, "B is the closest song to A");
        assert_eq!(hits[2].row, 2);
    }

    #[test]
    #[should_panic(expected = "wrong number of features")]
    fn test_query_with_wrong_dimensions_panics() {
        let index = index_of(&[&[1.0, 0.0], &[0.0, 1.0]]);
        let _ = index.query(&[1.0, 0.0, 0.0], 2);
    }
}
