//! Criterion benchmarks for the binomial heap
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench binomial_bench
//!
//! # Only the meld group
//! cargo bench --bench binomial_bench -- meld
//! ```

use binomial_heap::BinomialHeap;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::hint::black_box;

const SIZES: [usize; 3] = [1 << 8, 1 << 12, 1 << 16];

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }

    fn next_key(&mut self) -> i64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 33) as i64
    }
}

fn filled(n: usize, seed: u64) -> BinomialHeap<usize> {
    let mut rng = Lcg::new(seed);
    let mut heap = BinomialHeap::new();
    for i in 0..n {
        heap.insert(rng.next_key(), i).unwrap();
    }
    heap
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for n in SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(filled(n, 7)));
        });
    }
    group.finish();
}

fn bench_delete_min(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete_min_drain");
    for n in SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || filled(n, 11),
                |mut heap| {
                    while let Some(item) = heap.delete_min() {
                        black_box(item);
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_decrease_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("decrease_key");
    for n in SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let mut heap = BinomialHeap::new();
                    let handles: Vec<_> = (0..n)
                        .map(|i| heap.insert(i64::MAX / 2, i).unwrap())
                        .collect();
                    (heap, handles)
                },
                |(mut heap, handles)| {
                    for (i, handle) in handles.iter().enumerate().rev() {
                        heap.decrease_key(handle, 1 + i as i64).unwrap();
                    }
                    black_box(heap.find_min().map(|(k, _)| k));
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_meld(c: &mut Criterion) {
    let mut group = c.benchmark_group("meld");
    for n in SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || (filled(n, 3), filled(n / 16, 5)),
                |(mut big, small)| {
                    big.meld(small);
                    black_box(big.tree_count());
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_delete_min,
    bench_decrease_key,
    bench_meld
);
criterion_main!(benches);
