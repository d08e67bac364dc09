//! Type-erased unit of work.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// One queued computation. The body is consumed by whichever worker pops it.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    func: Box<dyn FnOnce() + Send + 'static>,
    pub(crate) spawn_time: Instant,
}

impl Task {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            func: Box::new(f),
            spawn_time: Instant::now(),
        }
    }

    /// Runs the body, consuming the task.
    pub fn execute(self) {
        (self.func)();
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("spawn_time", &self.spawn_time)
            .finish()
    }
}
