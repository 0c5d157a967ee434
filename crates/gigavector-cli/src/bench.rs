//! Runtime micro-benchmark: per-operation latency of the distance kernels
//! at a range of dimensions, reported in microseconds.
//!
//! This mirrors `gigavector-core`'s `criterion`-based benches in which
//! vectors it measures and which metrics, but runs as a plain binary so it
//! can ship to users who don't have the workspace's dev-dependencies.

use colored::Colorize;
use comfy_table::Table;
use gigavector_core::DistanceMetric;
use std::time::Instant;

fn deterministic_vector(dim: usize, seed: u64) -> Vec<f32> {
    (0..dim)
        .map(|i| ((seed as f32 * 0.1 + i as f32 * 0.01).sin() + 1.0) / 2.0)
        .collect()
}

const METRICS: [DistanceMetric; 3] =
    [DistanceMetric::Euclidean, DistanceMetric::Cosine, DistanceMetric::Dot];

/// Runs the benchmark and prints a table of microseconds per call, one row
/// per (metric, dimension) pair, for both the SIMD-dispatched and scalar
/// fallback code paths.
pub fn run(dims: &[usize], iterations: usize) {
    println!("{}", "GigaVector distance kernel benchmark".bold());
    println!(
        "  detected CPU tier: {}\n",
        gigavector_core::simd::detected_features().tier_name().green()
    );

    let mut table = Table::new();
    table.set_header(vec!["metric", "dim", "dispatched (µs/op)", "scalar (µs/op)"]);

    for &dim in dims {
        let a = deterministic_vector(dim, 1);
        let b = deterministic_vector(dim, 2);

        for metric in METRICS {
            let dispatched_us = time_per_op(iterations, || {
                metric.distance(&a, &b).expect("dimensions already match")
            });
            let scalar_us = time_per_op(iterations, || metric.distance_scalar(&a, &b));

            table.add_row(vec![
                format!("{metric:?}"),
                dim.to_string(),
                format!("{dispatched_us:.3}"),
                format!("{scalar_us:.3}"),
            ]);
        }
    }

    println!("{table}");
}

fn time_per_op(iterations: usize, mut op: impl FnMut() -> f32) -> f64 {
    // One warm-up pass so the first call's cache/branch-predictor cost
    // doesn't skew the timed loop.
    std::hint::black_box(op());

    let start = Instant::now();
    let mut acc = 0.0f32;
    for _ in 0..iterations {
        acc += std::hint::black_box(op());
    }
    std::hint::black_box(acc);
    let elapsed = start.elapsed();

    elapsed.as_secs_f64() * 1_000_000.0 / iterations as f64
}
