//! Rotation simulator throughput: hit resolution alone and the full
//! simulate + render + chunk pipeline.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use shinobi::battle::{build_report, simulate, MAX_BLOCK_CHARS};

fn bench_rotation(c: &mut Criterion) {
    let damages: Vec<i64> = vec![120, 80, -15, 300, 45];
    let health = 50_000;
    let events = simulate(&damages, health).events.len() as u64;

    let mut group = c.benchmark_group("rotation");
    group.throughput(Throughput::Elements(events));

    group.bench_function("simulate", |b| {
        b.iter(|| simulate(black_box(&damages), black_box(health)))
    });

    group.bench_function("simulate_and_chunk", |b| {
        b.iter(|| {
            let outcome = simulate(black_box(&damages), black_box(health));
            build_report(&outcome, MAX_BLOCK_CHARS)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_rotation);
criterion_main!(benches);
