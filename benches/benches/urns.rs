// Compares the four urn flavors' `sample` cost at a fixed population/color
// count, the way maybenot-simulator/benches/lookup_bench.rs compares two
// lookup data structures.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use popsim_urn::{AliasUrn, ArrayUrn, BstUrn, LinearUrn, Urn};

const NCOLORS: u32 = 1_000;
const PER_COLOR: u64 = 100;

fn fill<U: Urn>(mut urn: U) -> U {
    for c in 0..NCOLORS {
        urn.cinsert(c, PER_COLOR).unwrap();
    }
    urn
}

fn sample_loop<U: Urn>(urn: &mut U, n: usize) -> u64 {
    let mut sum = 0u64;
    for _ in 0..n {
        sum += u64::from(urn.sample().unwrap());
    }
    black_box(sum)
}

pub fn urn_benchmarks(c: &mut Criterion) {
    let n = 10_000;

    c.bench_function("ArrayUrn::sample", |b| {
        let mut urn = fill(ArrayUrn::new(1, NCOLORS).unwrap());
        b.iter(|| sample_loop(&mut urn, black_box(n)))
    });

    c.bench_function("LinearUrn::sample", |b| {
        let mut urn = fill(LinearUrn::new(2, NCOLORS).unwrap());
        b.iter(|| sample_loop(&mut urn, black_box(n)))
    });

    c.bench_function("BstUrn::sample", |b| {
        let mut urn = fill(BstUrn::new(3, NCOLORS).unwrap());
        b.iter(|| sample_loop(&mut urn, black_box(n)))
    });

    c.bench_function("AliasUrn::sample", |b| {
        let mut urn = fill(AliasUrn::new(4, NCOLORS, 0.8, 1.5).unwrap());
        b.iter(|| sample_loop(&mut urn, black_box(n)))
    });
}

criterion_group!(urns, urn_benchmarks);
criterion_main!(urns);
