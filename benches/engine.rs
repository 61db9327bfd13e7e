//! Criterion benchmarks for the vortex engine.
//!
//! Run with:
//!   cargo bench
//!   cargo bench --features parallel
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vortex::engine::{Engine, EngineConfig};
use vortex::market::AssetRecord;

fn snapshot(count: usize) -> Vec<AssetRecord> {
    (0..count)
        .map(|k| AssetRecord {
            symbol: format!("A{k}"),
            price_change_24h: (k % 16) as f32,
            volume: 1e6 * (k as f64 + 1.0) * 7.0,
            sentiment: if k % 3 == 0 { Some(0.8) } else { None },
            ..Default::default()
        })
        .collect()
}

/// Benchmark process() with varying network sizes.
fn bench_process_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_size");

    for size in [256, 512, 1024, 3500].iter() {
        let connectivity = (*size as f64).sqrt() as usize;
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("snapshot20", size), size, |b, &size| {
            let mut engine = Engine::new(EngineConfig::with_size(size, connectivity).with_seed(42));
            let records = snapshot(20);
            b.iter(|| black_box(engine.process(&records)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_process_sizes);
criterion_main!(benches);
