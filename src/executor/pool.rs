use super::task::Task;
use super::worker::{Worker, WorkerState};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::future::TaskFuture;
use crate::queue::BlockingQueue;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[cfg(feature = "telemetry")]
use crate::telemetry::Metrics;

/// Fixed-size pool of worker threads fed by one shared blocking queue.
///
/// Workers pop and run tasks until [`shutdown`](Self::shutdown); a worker
/// killed by a non-unwinding fault is not replaced.
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    queue: Arc<BlockingQueue<Task>>,
    shutdown: Arc<AtomicBool>,
    num_threads: usize,
    #[cfg(feature = "telemetry")]
    metrics: Arc<Metrics>,
}

struct WorkerHandle {
    thread: Option<JoinHandle<()>>,
    state: Arc<WorkerState>,
}

impl WorkerPool {
    /// Spawns `config.worker_threads()` workers sharing one queue.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let queue = Arc::new(BlockingQueue::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        #[cfg(feature = "telemetry")]
        let metrics = Arc::new(Metrics::new());

        let mut workers = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let worker = Worker::new(id);

            #[cfg(feature = "telemetry")]
            let worker = worker.with_metrics(Arc::clone(&metrics));

            let state = Arc::clone(&worker.state);
            let queue_clone = Arc::clone(&queue);
            let shutdown_clone = Arc::clone(&shutdown);
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let thread = builder
                .spawn(move || worker.run(queue_clone, shutdown_clone))
                .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;

            workers.push(WorkerHandle {
                thread: Some(thread),
                state,
            });
        }

        Ok(Self {
            workers,
            queue,
            shutdown,
            num_threads,
            #[cfg(feature = "telemetry")]
            metrics,
        })
    }

    /// Wraps `f` in a task, queues it, and returns the result handle.
    /// Never blocks.
    pub fn submit<T, F>(&self, f: F) -> TaskFuture<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        TaskFuture::submit_to(&self.queue, f)
    }

    /// Fire-and-forget execution without a result handle.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Task::new(f));
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Tasks finished across all workers, panicked ones included.
    pub fn tasks_executed(&self) -> u64 {
        self.workers
            .iter()
            .map(|w| w.state.tasks_executed.load(Ordering::Relaxed))
            .sum()
    }

    /// Tasks whose bodies unwound, across all workers.
    pub fn tasks_panicked(&self) -> u64 {
        self.workers
            .iter()
            .map(|w| w.state.tasks_panicked.load(Ordering::Relaxed))
            .sum()
    }

    /// Latency and throughput counters for this pool.
    #[cfg(feature = "telemetry")]
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Stops the pool without waiting.
    ///
    /// Sets the shutdown flag and cancels every blocked pop so idle workers
    /// wake and exit. Running tasks finish; tasks still queued are
    /// abandoned and never run.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.queue.close();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads)
            .field("shutdown", &self.shutdown.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_submit_and_get() {
        let config = Config::builder().num_threads(2).build().unwrap();
        let pool = WorkerPool::new(&config).unwrap();

        assert_eq!(pool.num_threads(), 2);
        assert_eq!(pool.submit(|| 40 + 2).get().unwrap(), 42);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = Config {
            num_threads: Some(0),
            ..Config::default()
        };
        assert!(WorkerPool::new(&config).is_err());
    }

    #[test]
    fn test_execute_runs_in_submission_order() {
        let config = Config::builder().num_threads(1).build().unwrap();
        let pool = WorkerPool::new(&config).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }

        // Single worker: this task runs after the four above.
        let observed = {
            let counter = Arc::clone(&counter);
            pool.submit(move || counter.load(Ordering::Relaxed))
        };
        assert_eq!(observed.get().unwrap(), 4);
        assert_eq!(pool.tasks_executed(), 5);
    }

    #[test]
    fn test_panic_counter() {
        let config = Config::builder().num_threads(1).build().unwrap();
        let pool = WorkerPool::new(&config).unwrap();

        let failed: TaskFuture<()> = pool.submit(|| panic!("broken"));
        assert!(failed.get().is_err());

        // The future path captures the panic before the worker's outer
        // catch sees it; only bare execute() bodies trip that counter.
        pool.execute(|| panic!("unobserved"));
        let fence = pool.submit(|| ());
        fence.get().unwrap();

        assert_eq!(pool.tasks_panicked(), 1);
    }
}
