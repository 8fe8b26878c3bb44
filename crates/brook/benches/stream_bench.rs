//! Benchmarks for the lazy stream engine.
//!
//! Includes:
//! - Cauchy products of random series (sparse and dense caches)
//! - Cauchy and Dirichlet inversion
//! - Composition and infinite products

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

use brook::prelude::*;

/// A dense series with random small integer coefficients and a unit
/// constant term.
fn random_series(rng: &mut ChaCha8Rng, len: usize) -> StreamRef<Q> {
    let mut coeffs: Vec<Q> = (0..len).map(|_| Q::from_integer(rng.gen_range(-50..50))).collect();
    coeffs[0] = Q::one();
    Arc::new(ExactStream::polynomial(coeffs, 0).unwrap())
}

/// Coefficients read through a closure so that nothing is known in closed
/// form.
fn lazy_series(rng: &mut ChaCha8Rng, len: usize, sparse: bool) -> StreamRef<Q> {
    let coeffs: Vec<i64> = (0..len).map(|_| rng.gen_range(-50..50)).collect();
    FunctionStream::new(
        move |n| {
            usize::try_from(n)
                .ok()
                .and_then(|i| coeffs.get(i))
                .map_or_else(Q::zero, |&c| Q::from_integer(c))
        },
        sparse,
        0,
    )
    .into_ref()
}

fn bench_cauchy_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("cauchy_mul");

    for precision in [16i64, 64, 128] {
        for sparse in [true, false] {
            let label = if sparse { "sparse" } else { "dense" };
            group.bench_with_input(BenchmarkId::new(label, precision), &precision, |b, &p| {
                let mut rng = ChaCha8Rng::seed_from_u64(42);
                let f = lazy_series(&mut rng, 64, sparse);
                let g = lazy_series(&mut rng, 64, sparse);
                b.iter(|| {
                    let product = CauchyMulStream::new(f.clone(), g.clone(), sparse);
                    black_box(product.get(p).unwrap())
                });
            });
        }
    }

    group.finish();
}

fn bench_inverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("inverse");

    for precision in [16i64, 64, 128] {
        group.bench_with_input(BenchmarkId::new("cauchy", precision), &precision, |b, &p| {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            let f = random_series(&mut rng, 8);
            b.iter(|| {
                let inverse = CauchyInverseStream::new(f.clone());
                black_box(inverse.get(p).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("dirichlet", precision), &precision, |b, &p| {
            let ones: StreamRef<Q> = Arc::new(ExactStream::new(Vec::new(), Q::one(), Some(1), 1).unwrap());
            b.iter(|| {
                let mobius = DirichletInverseStream::new(ones.clone(), true);
                black_box(mobius.get(p).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");

    for precision in [8i64, 16, 32] {
        group.bench_with_input(BenchmarkId::new("geometric_of_x_plus_x2", precision), &precision, |b, &p| {
            let geometric: StreamRef<Q> = Arc::new(ExactStream::new(Vec::new(), Q::one(), Some(0), 0).unwrap());
            let inner: StreamRef<Q> = Arc::new(ExactStream::polynomial(vec![Q::one(), Q::one()], 1).unwrap());
            b.iter(|| {
                let h = ComposeStream::new(geometric.clone(), inner.clone(), false).unwrap();
                black_box(h.get(p).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_infinite_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("infinite_product");

    for precision in [10i64, 20, 40] {
        group.bench_with_input(BenchmarkId::new("distinct_partitions", precision), &precision, |b, &p| {
            b.iter(|| {
                let terms = (1..).map(|n| -> StreamRef<Q> { Arc::new(ExactStream::monomial(Q::one(), n).unwrap()) });
                let f = InfiniteProduct::new(terms, false);
                black_box(f.get(p).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(
    stream_benches,
    bench_cauchy_product,
    bench_inverse,
    bench_composition,
    bench_infinite_product,
);

criterion_main!(stream_benches);
