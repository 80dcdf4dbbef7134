use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fq_math::prelude::*;
use num_traits::One;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn field(config: PoolConfig) -> FqMontgomery {
    // Fixed seed keeps runs comparable.
    let rng = shared_rng(ChaCha20Rng::seed_from_u64(0x5eed));
    let q = (BigUint::one() << 255usize) - 19u32;
    FqMontgomery::with_config(rng, &q, config).expect("valid modulus")
}

fn bench_mul(c: &mut Criterion) {
    let mut group = c.benchmark_group("mul");
    for (name, config) in [("pooled", PoolConfig::default()), ("unpooled", PoolConfig::disabled())] {
        let f = field(config);
        let a = f.random_element();
        let b = f.random_element();
        group.bench_with_input(BenchmarkId::new("copy", name), &(a, b), |bench, (a, b)| {
            bench.iter(|| {
                let product = black_box(a).mul(black_box(b));
                product.recycle();
            });
        });
    }
    group.finish();
}

fn bench_mul_in_place(c: &mut Criterion) {
    let f = field(PoolConfig::default());
    let mut acc = f.random_element();
    let b = f.random_element();
    c.bench_function("mul_mut", |bench| {
        bench.iter(|| {
            acc.mul_mut(black_box(&b));
        });
    });
}

fn bench_double_reduce(c: &mut Criterion) {
    let f = field(PoolConfig::default());
    let a = f.random_element();
    let b = f.random_element();
    c.bench_function("mul_double_reduce", |bench| {
        bench.iter(|| {
            let wide = black_box(&a).mul_double(black_box(&b));
            let reduced = wide.reduce();
            wide.recycle();
            reduced.recycle();
        });
    });
}

fn bench_invert(c: &mut Criterion) {
    let f = field(PoolConfig::default());
    let a = f.random_element();
    c.bench_function("invert", |bench| {
        bench.iter(|| {
            let inverse = black_box(&a).invert().expect("nonzero");
            inverse.recycle();
        });
    });
}

fn bench_random(c: &mut Criterion) {
    let f = field(PoolConfig::default());
    c.bench_function("random_element", |bench| {
        bench.iter(|| f.random_element().recycle());
    });
}

criterion_group!(
    benches,
    bench_mul,
    bench_mul_in_place,
    bench_double_reduce,
    bench_invert,
    bench_random
);
criterion_main!(benches);
