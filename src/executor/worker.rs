// worker thread loop

use super::task::Task;
use crate::queue::BlockingQueue;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(feature = "telemetry")]
use crate::telemetry::Metrics;
#[cfg(feature = "telemetry")]
use std::time::Instant;

pub type WorkerId = usize;

// per-worker counters
pub(crate) struct WorkerState {
    pub tasks_executed: AtomicU64,
    pub tasks_panicked: AtomicU64,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            tasks_executed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
        }
    }
}

pub(crate) struct Worker {
    pub id: WorkerId,
    pub state: Arc<WorkerState>,
    #[cfg(feature = "telemetry")]
    pub metrics: Option<Arc<Metrics>>,
}

impl Worker {
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            state: Arc::new(WorkerState::new()),
            #[cfg(feature = "telemetry")]
            metrics: None,
        }
    }

    #[cfg(feature = "telemetry")]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    // main loop
    pub fn run(&self, queue: Arc<BlockingQueue<Task>>, shutdown: Arc<AtomicBool>) {
        loop {
            if shutdown.load(Ordering::Acquire) {
                break;
            }

            match queue.pop() {
                Some(task) => self.execute_task(task),
                // cancelled wait; the loop re-checks the shutdown flag
                None => continue,
            }
        }
    }

    fn execute_task(&self, task: Task) {
        let id = task.id;

        #[cfg(feature = "telemetry")]
        let wait_ns = task.spawn_time.elapsed().as_nanos() as u64;
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        // Futures capture panics in their own completion path; this outer
        // catch covers fire-and-forget bodies and keeps the worker alive.
        let result = catch_unwind(AssertUnwindSafe(|| task.execute()));

        match result {
            Ok(()) => {
                #[cfg(feature = "telemetry")]
                if let Some(ref metrics) = self.metrics {
                    metrics.record_task_execution(wait_ns, start.elapsed().as_nanos() as u64);
                }
            }
            Err(_) => {
                self.state.tasks_panicked.fetch_add(1, Ordering::Relaxed);
                eprintln!("worker {}: task {:?} panicked", self.id, id);
                #[cfg(feature = "telemetry")]
                if let Some(ref metrics) = self.metrics {
                    metrics.record_task_panic();
                }
            }
        }

        self.state.tasks_executed.fetch_add(1, Ordering::Relaxed);
    }
}
