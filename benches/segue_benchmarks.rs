//! # Segue Performance Benchmarks
//!
//! Benchmarks for the one-time fitting work and for the per-song query path.
//!
//! ## Benchmark Categories
//!
//! - **Catalog Loading**: CSV parsing and validation
//! - **Feature Preparation**: Standardization over the whole catalog
//! - **Index Queries**: Cosine k-nearest-neighbour search
//! - **Selection**: A full `recommend_next` call
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench index
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use segue::catalog::Catalog;
use segue::features;
use segue::index::{NeighborSearch, SimilarityIndex, DEFAULT_NEIGHBORS};
use segue::recommend;
use std::collections::HashSet;
use std::fmt::Write;
use std::hint::black_box;

/// Helper function to create a CSV catalog with realistic-looking features
fn create_catalog_csv(count: usize) -> String {
    let mut rng = StdRng::seed_from_u64(42);
    let mut csv = String::from(
        "name,duration_ms,explicit,danceability,energy,valence,acousticness,tempo,loudness,year\n",
    );
    for i in 0..count {
        writeln!(
            csv,
            "Song {i},{},{},{:.3},{:.3},{:.3},{:.3},{:.1},{:.1},{}",
            rng.gen_range(120_000..420_000),
            rng.gen_range(0..2),
            rng.gen::<f64>(),
            rng.gen::<f64>(),
            rng.gen::<f64>(),
            rng.gen::<f64>(),
            rng.gen_range(60.0..190.0),
            rng.gen_range(-30.0..0.0),
            rng.gen_range(1950..2021),
        )
        .expect("writing to a String cannot fail");
    }
    csv
}

fn create_catalog(count: usize) -> Catalog {
    Catalog::from_reader(create_catalog_csv(count).as_bytes()).expect("generated catalog is valid")
}

/// Benchmark CSV parsing and validation
fn benchmark_catalog_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_loading");

    for size in [100, 1_000, 10_000] {
        let csv = create_catalog_csv(size);
        group.bench_with_input(BenchmarkId::new("from_reader", size), &csv, |b, csv| {
            b.iter(|| Catalog::from_reader(black_box(csv.as_bytes())).expect("valid"))
        });
    }

    group.finish();
}

/// Benchmark standardization
fn benchmark_feature_preparation(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_preparation");

    for size in [100, 1_000, 10_000] {
        let catalog = create_catalog(size);
        group.bench_with_input(BenchmarkId::new("prepare", size), &catalog, |b, catalog| {
            b.iter(|| features::prepare(black_box(catalog), "explicit").expect("valid"))
        });
    }

    group.finish();
}

/// Benchmark nearest-neighbour queries
fn benchmark_index_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");

    for size in [1_000, 10_000, 50_000] {
        let catalog = create_catalog(size);
        let (_, matrix) = features::prepare(&catalog, "explicit").expect("valid");
        let index = SimilarityIndex::build(&matrix);

        group.bench_with_input(BenchmarkId::new("nearest_to_row", size), &index, |b, index| {
            b.iter(|| index.nearest_to_row(black_box(size / 2), DEFAULT_NEIGHBORS))
        });
    }

    group.finish();
}

/// Benchmark a complete selector call
fn benchmark_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");

    let recommender = recommend::with_defaults(create_catalog(10_000)).expect("valid");
    let played: HashSet<String> = (0..500).map(|i| format!("Song {i}")).collect();

    group.bench_function("recommend_next_10k", |b| {
        b.iter(|| recommender.recommend_next(black_box("Song 4242"), black_box(&played), 10_000))
    });

    group.finish();
}

// Group all benchmarks
criterion_group!(
    benches,
    benchmark_catalog_loading,
    benchmark_feature_preparation,
    benchmark_index_queries,
    benchmark_selection
);

criterion_main!(benches);
