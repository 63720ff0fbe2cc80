//! Matcher scan benchmarks.
//!
//! Run with: `cargo bench -p waymark-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use waymark_router::{Matcher, MatcherKind, MatcherSet};

fn build_set(num_literals: usize) -> MatcherSet<usize> {
    let mut set = MatcherSet::new();
    set.insert(Matcher::new(MatcherKind::UnsignedInt, usize::MAX - 1));
    set.insert(Matcher::new(MatcherKind::String, usize::MAX));
    for i in 0..num_literals {
        set.insert(Matcher::new(MatcherKind::literal(format!("resource{i}")), i));
    }
    set
}

fn bench_literal_hit(c: &mut Criterion) {
    let set = build_set(100);

    c.bench_function("literal_hit", |b| {
        b.iter(|| black_box(set.first_match(black_box("/resource50/items"))));
    });
}

fn bench_capture_fallthrough(c: &mut Criterion) {
    let set = build_set(100);

    c.bench_function("capture_fallthrough", |b| {
        b.iter(|| black_box(set.first_match(black_box("/12345/items"))));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_size");

    for size in [10, 100, 1000] {
        let set = build_set(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(set.first_match(black_box("/not-a-literal"))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_literal_hit,
    bench_capture_fallthrough,
    bench_scaling
);
criterion_main!(benches);
