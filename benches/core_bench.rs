use coprime_pairs::{CountingEngine, EvalMode, PrimalityOracle};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn engines() -> (CountingEngine, CountingEngine) {
    let oracle = Arc::new(PrimalityOracle::with_limit(100_000));
    (
        CountingEngine::new(oracle.clone()),
        CountingEngine::new(oracle).with_mode(EvalMode::Fast),
    )
}

fn bench_g(c: &mut Criterion) {
    let (strict, fast) = engines();
    c.bench_function("g(40086, 67) strict", |b| {
        b.iter(|| strict.g(black_box(40_086), black_box(67)).unwrap());
    });
    c.bench_function("g(40086, 67) fast", |b| {
        b.iter(|| fast.g(black_box(40_086), black_box(67)).unwrap());
    });
    c.bench_function("g(10^12, 99991) strict", |b| {
        b.iter(|| {
            strict
                .g(black_box(1_000_000_000_000), black_box(99_991))
                .unwrap()
        });
    });
}

fn bench_bruteforce(c: &mut Criterion) {
    let (strict, _) = engines();
    c.bench_function("count_bruteforce(40086, 67)", |b| {
        b.iter(|| {
            strict
                .count_bruteforce(black_box(40_086), black_box(67))
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_g, bench_bruteforce);
criterion_main!(benches);
