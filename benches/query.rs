use criterion::{black_box, BatchSize, BenchmarkId, Criterion};
use criterion::{criterion_group, criterion_main};
use tempfile::tempdir;

use flowstore::{LogStore, MemoryStore, Reading, Repository};

const READINGS_PER_ITER: i64 = 10_000;

fn day_of_readings() -> Vec<Reading> {
    (0..86_400_i64).map(|s| Reading::new(s * 1_000, s % 97 + 1)).collect()
}

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    group.bench_function("memory", |b| {
        let readings: Vec<Reading> = (0..READINGS_PER_ITER)
            .map(|s| Reading::new(s * 1_000, 5))
            .collect();
        b.iter_batched(
            || Repository::new(MemoryStore::new()),
            |repo| repo.store("bench-meter", black_box(&readings)).expect("store"),
            BatchSize::LargeInput,
        );
    });
    group.bench_function("log", |b| {
        let readings: Vec<Reading> = (0..READINGS_PER_ITER)
            .map(|s| Reading::new(s * 1_000, 5))
            .collect();
        b.iter_batched(
            || {
                let dir = tempdir().expect("tempdir");
                let repo = Repository::new(LogStore::open(dir.path()).expect("open"));
                (dir, repo)
            },
            |(_dir, repo)| repo.store("bench-meter", black_box(&readings)).expect("store"),
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let repo = Repository::new(MemoryStore::new());
    repo.store("bench-meter", &day_of_readings()).expect("seed");

    let mut group = c.benchmark_group("query");
    for &hours in &[1_i64, 6, 24] {
        group.bench_with_input(BenchmarkId::from_parameter(hours), &hours, |b, &hours| {
            let end = 86_399_000;
            let start = end - hours * 3_600_000 + 1_000;
            b.iter(|| {
                let got = repo.query("bench-meter", start, end).expect("query");
                black_box(got.len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_store, bench_query);
criterion_main!(benches);
