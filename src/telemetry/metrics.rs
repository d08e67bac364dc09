//! Metrics collection for pool monitoring.

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Pool metrics collector.
#[derive(Debug)]
pub struct Metrics {
    tasks_executed: AtomicU64,
    tasks_panicked: AtomicU64,

    // Time from submission to a worker picking the task up, and time
    // spent inside the task body.
    wait_histogram: RwLock<Histogram<u64>>,
    run_histogram: RwLock<Histogram<u64>>,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        // 3 significant figures, max one hour in nanoseconds
        let histogram =
            || Histogram::new_with_max(3_600_000_000_000, 3).expect("histogram bounds are static");

        Self {
            tasks_executed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            wait_histogram: RwLock::new(histogram()),
            run_histogram: RwLock::new(histogram()),
            start_time: Instant::now(),
        }
    }

    /// Record one finished task: time spent queued and time spent running.
    pub fn record_task_execution(&self, wait_ns: u64, run_ns: u64) {
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);

        if let Some(mut hist) = self.wait_histogram.try_write() {
            let _ = hist.record(wait_ns);
        }
        if let Some(mut hist) = self.run_histogram.try_write() {
            let _ = hist.record(run_ns);
        }
    }

    /// Record a task whose body unwound.
    pub fn record_task_panic(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let wait = self.wait_histogram.read();
        let run = self.run_histogram.read();

        MetricsSnapshot {
            uptime: self.start_time.elapsed(),
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            avg_run_ns: if run.len() > 0 { run.mean() as u64 } else { 0 },
            p50_run_ns: run.value_at_quantile(0.50),
            p95_run_ns: run.value_at_quantile(0.95),
            p99_run_ns: run.value_at_quantile(0.99),
            max_run_ns: run.max(),
            avg_wait_ns: if wait.len() > 0 { wait.mean() as u64 } else { 0 },
            p95_wait_ns: wait.value_at_quantile(0.95),
        }
    }

    /// Reset all counters and histograms.
    pub fn reset(&self) {
        self.tasks_executed.store(0, Ordering::Relaxed);
        self.tasks_panicked.store(0, Ordering::Relaxed);

        if let Some(mut hist) = self.wait_histogram.try_write() {
            hist.reset();
        }
        if let Some(mut hist) = self.run_histogram.try_write() {
            hist.reset();
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a pool's metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub tasks_executed: u64,
    pub tasks_panicked: u64,
    pub avg_run_ns: u64,
    pub p50_run_ns: u64,
    pub p95_run_ns: u64,
    pub p99_run_ns: u64,
    pub max_run_ns: u64,
    pub avg_wait_ns: u64,
    pub p95_wait_ns: u64,
}

impl MetricsSnapshot {
    /// Completed tasks per second of pool uptime.
    pub fn tasks_per_second(&self) -> f64 {
        let seconds = self.uptime.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.tasks_executed as f64 / seconds
    }
}
