//! HNSW index insertion and search benchmarks.
//!
//! Run with: `cargo bench --bench hnsw_benchmark`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gigavector_core::index::hnsw::HnswIndex;
use gigavector_core::index::HnswParams;
use gigavector_core::DistanceMetric;

fn generate_vector(dim: usize, seed: u64) -> Vec<f32> {
    (0..dim)
        .map(|i| ((seed as f32 * 0.1 + i as f32 * 0.01).sin() + 1.0) / 2.0)
        .collect()
}

fn bench_hnsw_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_insert");
    for count in [1_000usize, 10_000] {
        let dim = 128;
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::new("vectors", format!("{count}x{dim}d")),
            &count,
            |bencher, &count| {
                bencher.iter(|| {
                    let mut index = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default());
                    for i in 0..count {
                        let vector = generate_vector(dim, i as u64);
                        index.insert(i as u64, &vector);
                    }
                    black_box(index.fragmentation())
                });
            },
        );
    }
    group.finish();
}

fn bench_hnsw_search_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_search_latency");
    let dim = 128;
    let mut index = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default());
    for i in 0..10_000u64 {
        let vector = generate_vector(dim, i);
        index.insert(i, &vector);
    }
    let query = generate_vector(dim, 99_999);

    for k in [10usize, 50, 100] {
        group.bench_with_input(BenchmarkId::new("top_k", k), &k, |bencher, &k| {
            bencher.iter(|| black_box(index.search(&query, k, DistanceMetric::Cosine)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hnsw_insert, bench_hnsw_search_latency);
criterion_main!(benches);
