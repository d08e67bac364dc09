//! Benchmarks for queue hand-off and pool submission throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strand::prelude::*;

fn queue_push_pop(c: &mut Criterion) {
    let queue = BlockingQueue::new();

    c.bench_function("queue_push_pop", |b| {
        b.iter(|| {
            queue.push(black_box(1u64));
            black_box(queue.pop())
        });
    });
}

fn pool_submit_get(c: &mut Criterion) {
    let pool = WorkerPool::new(&Config::default()).unwrap();

    c.bench_function("pool_submit_get", |b| {
        b.iter(|| pool.submit(|| black_box(21) * 2).get().unwrap());
    });
}

fn pool_submit_burst(c: &mut Criterion) {
    let pool = WorkerPool::new(&Config::default()).unwrap();

    c.bench_function("pool_submit_burst_100", |b| {
        b.iter(|| {
            let tasks: Vec<_> = (0..100).map(|i| pool.submit(move || i)).collect();
            for task in &tasks {
                task.wait();
            }
        });
    });
}

criterion_group!(benches, queue_push_pop, pool_submit_get, pool_submit_burst);
criterion_main!(benches);
