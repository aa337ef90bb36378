//! Criterion micro-benchmarks for broker publish and drain.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rsim_bench::{bench_type, fan_out_broker};
use rsim_core::{Message, Payload, Priority};

/// Benchmark: publish one message to 100 subscribers.
fn bench_publish_fan_out(c: &mut Criterion) {
    c.bench_function("publish_fan_out_100", |b| {
        b.iter_batched(
            || fan_out_broker(100, 1).0,
            |mut broker| {
                black_box(broker.publish(Message::signal(bench_type(0))));
                broker
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: publish 1000 mixed-priority messages, then drain.
fn bench_publish_drain_1k(c: &mut Criterion) {
    let (mut broker, _) = fan_out_broker(20, 4);
    c.bench_function("publish_drain_1k", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let priority = Priority::ALL[i % Priority::COUNT];
                broker.publish(Message::from_parts(bench_type(i % 4), priority, Payload::Empty));
            }
            let mut delivered = 0usize;
            broker.drain_batch(|_, _, _| delivered += 1);
            black_box(delivered)
        });
    });
}

/// Benchmark: drain with 10K attached components but only one active.
fn bench_sparse_drain(c: &mut Criterion) {
    let (mut broker, ids) = fan_out_broker(10_000, 0);
    broker.subscribe(ids[4_321], bench_type(0)).unwrap();
    c.bench_function("drain_sparse_10k_idle", |b| {
        b.iter(|| {
            broker.publish(Message::signal(bench_type(0)));
            black_box(broker.drain_batch(|_, _, _| {}))
        });
    });
}

criterion_group!(
    benches,
    bench_publish_fan_out,
    bench_publish_drain_1k,
    bench_sparse_drain,
);
criterion_main!(benches);
