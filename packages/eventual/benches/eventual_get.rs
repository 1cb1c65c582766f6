#![expect(missing_docs, reason = "benchmarks")]

use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use eventual::{EventualValue, Timeout};

fn entrypoint(c: &mut Criterion) {
    let mut g = c.benchmark_group("eventual_get");

    g.bench_function("resolved_fast_path", |b| {
        let value = EventualValue::new();
        value.set(42_u64);

        b.iter(|| black_box(value.get(black_box(Timeout::Bounded(Duration::from_millis(20))))));
    });

    g.bench_function("unresolved_immediate", |b| {
        let value = EventualValue::<u64>::new();

        b.iter(|| black_box(value.get(black_box(Timeout::Immediate))));
    });

    g.bench_function("set_without_waiters", |b| {
        b.iter(|| {
            let value = EventualValue::new();
            value.set(black_box(42_u64));
            black_box(value)
        });
    });

    g.finish();
}

criterion_group!(benches, entrypoint);
criterion_main!(benches);
