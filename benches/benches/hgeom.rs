use criterion::{black_box, criterion_group, criterion_main, Criterion};
use popsim_math::hgeom;
use popsim_rng::Mt19937_64;

pub fn hgeom_benchmarks(c: &mut Criterion) {
    let n = 1_000;

    c.bench_function("hgeom(total=100_000, good=40_000, sample=5_000) x1000", |b| {
        let mut mt = Mt19937_64::new(0);
        b.iter(|| {
            let mut sum = 0u64;
            for _ in 0..n {
                sum += hgeom(&mut mt, black_box(100_000), black_box(40_000), black_box(5_000));
            }
            black_box(sum)
        })
    });

    c.bench_function("hgeom(total=1_000, good=500, sample=10) x1000", |b| {
        let mut mt = Mt19937_64::new(1);
        b.iter(|| {
            let mut sum = 0u64;
            for _ in 0..n {
                sum += hgeom(&mut mt, black_box(1_000), black_box(500), black_box(10));
            }
            black_box(sum)
        })
    });
}

criterion_group! {
    name = hgeom_benches;
    config = Criterion::default().sample_size(200);
    targets = hgeom_benchmarks
}
criterion_main!(hgeom_benches);
