//! Basic benchmarks for the `hive` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::iter;
use std::time::Instant;

use criterion::{Criterion, criterion_group, criterion_main};
use hive::{Cursor, Hive};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

type TestItem = usize;
const TEST_VALUE: TestItem = 1024;

/// Builds a hive of 10k items with every other item erased, the sparse case the skipfield is
/// there for.
fn half_erased_hive() -> Hive<TestItem> {
    let mut hive = Hive::new();

    let cursors: Vec<Cursor> = (0..10_000).map(|_| hive.emplace(TEST_VALUE)).collect();

    for cursor in cursors.into_iter().step_by(2) {
        hive.erase(cursor);
    }

    hive
}

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("hive_basic");

    group.bench_function("build_empty", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(Hive::<TestItem>::new()));
            }

            start.elapsed()
        });
    });

    group.bench_function("emplace_first", |b| {
        b.iter_custom(|iters| {
            let mut hives = iter::repeat_with(Hive::<TestItem>::new)
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let start = Instant::now();

            for hive in &mut hives {
                _ = black_box(hive.emplace(black_box(TEST_VALUE)));
            }

            start.elapsed()
        });
    });

    group.bench_function("emplace_into_erased_slot", |b| {
        b.iter_custom(|iters| {
            let mut hives = iter::repeat_with(half_erased_hive)
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let start = Instant::now();

            for hive in &mut hives {
                _ = black_box(hive.emplace(black_box(TEST_VALUE)));
            }

            start.elapsed()
        });
    });

    group.bench_function("read_one", |b| {
        b.iter_custom(|iters| {
            let mut hive = Hive::<TestItem>::new();
            let cursor = hive.emplace(TEST_VALUE);

            let start = Instant::now();

            for _ in 0..iters {
                _ = black_box(hive.get(black_box(cursor)));
            }

            start.elapsed()
        });
    });

    group.bench_function("erase_one", |b| {
        b.iter_custom(|iters| {
            let mut hives = iter::repeat_with(Hive::<TestItem>::new)
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let cursors = hives
                .iter_mut()
                .map(|hive| hive.emplace(TEST_VALUE))
                .collect::<Vec<_>>();

            let start = Instant::now();

            for (hive, cursor) in hives.iter_mut().zip(cursors) {
                _ = black_box(hive.erase(cursor));
            }

            start.elapsed()
        });
    });

    group.finish();

    let mut group = c.benchmark_group("hive_slow");

    group.bench_function("emplace_10k", |b| {
        b.iter_custom(|iters| {
            let mut hives = iter::repeat_with(Hive::<TestItem>::new)
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let start = Instant::now();

            for hive in &mut hives {
                for _ in 0..10_000 {
                    _ = black_box(hive.emplace(black_box(TEST_VALUE)));
                }
            }

            start.elapsed()
        });
    });

    group.bench_function("iterate_10k_dense", |b| {
        let hive: Hive<TestItem> = iter::repeat_n(TEST_VALUE, 10_000).collect();

        b.iter(|| black_box(hive.iter().sum::<usize>()));
    });

    group.bench_function("iterate_10k_half_erased", |b| {
        let hive = half_erased_hive();

        b.iter(|| black_box(hive.iter().sum::<usize>()));
    });

    group.bench_function("iterate_mut_10k_half_erased", |b| {
        let mut hive = half_erased_hive();

        b.iter(|| {
            for value in &mut hive {
                *value = black_box(value.wrapping_add(1));
            }
        });
    });

    group.bench_function("cursor_walk_10k_half_erased", |b| {
        let hive = half_erased_hive();

        b.iter(|| {
            let mut cursor = hive.begin();

            while !cursor.is_end() {
                cursor = black_box(hive.advance(cursor));
            }
        });
    });

    group.finish();
}
