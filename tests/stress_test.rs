//! Stress tests for the queue and pool under contention.

use strand::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn stress_queue_no_loss() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 5_000;
    const TOTAL: usize = PRODUCERS * PER_PRODUCER;

    let queue = Arc::new(BlockingQueue::new());
    let claimed = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.push(p * PER_PRODUCER + i);
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let claimed = Arc::clone(&claimed);
            thread::spawn(move || {
                let mut seen = Vec::new();
                while claimed.fetch_add(1, Ordering::Relaxed) < TOTAL {
                    seen.push(queue.pop().unwrap());
                }
                seen
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }

    let mut all: Vec<usize> = consumers
        .into_iter()
        .flat_map(|c| c.join().unwrap())
        .collect();
    all.sort_unstable();

    // Every pushed item popped exactly once.
    assert_eq!(all, (0..TOTAL).collect::<Vec<_>>());
}

#[test]
fn stress_queue_fifo_per_producer() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 5_000;

    let queue = Arc::new(BlockingQueue::new());

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    queue.push((p, seq));
                }
            })
        })
        .collect();

    // One consumer observes the global pop order.
    let mut last_seq = [None::<usize>; PRODUCERS];
    for _ in 0..PRODUCERS * PER_PRODUCER {
        let (p, seq) = queue.pop().unwrap();
        if let Some(prev) = last_seq[p] {
            assert!(seq > prev, "producer {} reordered: {} after {}", p, seq, prev);
        }
        last_seq[p] = Some(seq);
    }

    for producer in producers {
        producer.join().unwrap();
    }
    assert!(queue.is_empty());
}

#[test]
fn stress_many_small_tasks() {
    let config = Config::builder().num_threads(4).build().unwrap();
    let pool = WorkerPool::new(&config).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    const TASKS: usize = 10_000;
    let tasks: Vec<_> = (0..TASKS)
        .map(|_| {
            let counter = Arc::clone(&counter);
            pool.submit(move || counter.fetch_add(1, Ordering::Relaxed))
        })
        .collect();

    for task in &tasks {
        task.wait();
    }

    assert_eq!(counter.load(Ordering::Relaxed), TASKS);
    assert_eq!(pool.tasks_executed(), TASKS as u64);
}

#[test]
fn stress_deep_continuation_chain() {
    let config = Config::builder().num_threads(2).build().unwrap();
    let pool = WorkerPool::new(&config).unwrap();

    let mut task = pool.submit(|| 0u64);
    for _ in 0..1_000 {
        task = task.then_apply(|n| n + 1);
    }

    assert_eq!(task.get().unwrap(), 1_000);
}

#[test]
fn stress_concurrent_registration_and_completion() {
    // Hammers the race between then_apply registration and the upstream
    // becoming ready.
    let config = Config::builder().num_threads(4).build().unwrap();
    let pool = WorkerPool::new(&config).unwrap();

    for round in 0..200 {
        let task = pool.submit(move || round);
        let chains: Vec<_> = (0..4).map(|_| task.then_apply(|n| n + 1)).collect();
        for chain in chains {
            assert_eq!(chain.get().unwrap(), round + 1);
        }
    }
}

#[test]
#[ignore] // Run with --ignored flag
fn stress_pool_churn() {
    for _ in 0..100 {
        let config = Config::builder().num_threads(4).build().unwrap();
        let pool = WorkerPool::new(&config).unwrap();
        let tasks: Vec<_> = (0..64).map(|i| pool.submit(move || i)).collect();
        for (i, task) in tasks.iter().enumerate() {
            assert_eq!(task.get().unwrap(), i);
        }
    }
}
