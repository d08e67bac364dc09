//! Caller-facing handles to task results.
//!
//! A [`TaskFuture`] tracks one submitted computation through the
//! `Pending -> Running -> Ready` lifecycle, blocks `get` callers on a
//! condvar, and holds continuations registered before the result arrived.

use crate::error::{Error, Result};
use crate::executor::panic::{self, PanicInfo};
use crate::executor::Task;
use crate::queue::BlockingQueue;
use parking_lot::{Condvar, Mutex};
use std::cell::UnsafeCell;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

/// Observable lifecycle of a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Queued, not yet picked up by a worker.
    Pending,
    /// A worker is executing the body.
    Running,
    /// Finished, with a value or a captured panic.
    Ready,
}

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const READY: u8 = 2;

type Outcome<T> = std::result::Result<T, PanicInfo>;

/// Shared completion state between a future's handles and the worker that
/// runs its task.
pub(crate) struct FutureState<T> {
    state: AtomicU8,
    // Written exactly once, before the Release store of READY. Readable
    // without a lock by any thread that observed READY with Acquire.
    outcome: UnsafeCell<Option<Outcome<T>>>,
    // Guards the dependents list and backs the completion condvar.
    dependents: Mutex<Vec<Task>>,
    done: Condvar,
    // Weak: queued tasks hold the states of their futures, so a strong
    // reference here would cycle through the queue and leak abandoned
    // tasks after pool teardown.
    queue: Weak<BlockingQueue<Task>>,
}

// All mutation goes through the dependents lock or the publish-once outcome
// protocol above; shared `&T` reads require `T: Sync`, and the outcome is
// written from a worker thread, hence `T: Send`.
unsafe impl<T: Send + Sync> Sync for FutureState<T> {}

impl<T> FutureState<T> {
    fn new(queue: Weak<BlockingQueue<Task>>) -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(PENDING),
            outcome: UnsafeCell::new(None),
            dependents: Mutex::new(Vec::new()),
            done: Condvar::new(),
            queue,
        })
    }

    fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    fn mark_running(&self) {
        debug_assert_eq!(self.state.load(Ordering::Relaxed), PENDING);
        self.state.store(RUNNING, Ordering::Release);
    }

    /// Publishes the outcome, wakes waiters, and flushes registered
    /// dependents back to the pool queue.
    fn complete(&self, outcome: Outcome<T>) {
        let mut dependents = self.dependents.lock();
        debug_assert!(!self.is_ready());
        // Safety: single writer, and nothing reads the slot until READY is
        // published below.
        unsafe { *self.outcome.get() = Some(outcome) };
        self.state.store(READY, Ordering::Release);
        self.done.notify_all();
        let flushed = mem::take(&mut *dependents);
        drop(dependents);

        for task in flushed {
            self.enqueue(task);
        }
    }

    /// Pushes `task` to the pool queue, or drops it when the pool is
    /// already gone (the task is then abandoned, like any queued task at
    /// shutdown).
    fn enqueue(&self, task: Task) {
        if let Some(queue) = self.queue.upgrade() {
            queue.push(task);
        }
    }

    /// # Safety
    ///
    /// Callable only after `is_ready()` has returned true.
    unsafe fn outcome_ref(&self) -> &Outcome<T> {
        (*self.outcome.get())
            .as_ref()
            .expect("ready future has an outcome")
    }
}

impl<T: Send + Sync + 'static> FutureState<T> {
    /// Wraps `body` into the type-erased task that will complete this
    /// future when a worker runs it.
    fn completion_task<F>(self: &Arc<Self>, body: F) -> Task
    where
        F: FnOnce() -> Outcome<T> + Send + 'static,
    {
        let state = Arc::clone(self);
        Task::new(move || {
            state.mark_running();
            state.complete(body());
        })
    }
}

/// Handle to the eventual result of a submitted task.
///
/// Handles are cheap to clone; every clone observes the same task.
pub struct TaskFuture<T> {
    state: Arc<FutureState<T>>,
}

impl<T> Clone for TaskFuture<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Send + Sync + 'static> TaskFuture<T> {
    /// Queues `f` and returns the handle to its result.
    pub(crate) fn submit_to<F>(queue: &Arc<BlockingQueue<Task>>, f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let state = FutureState::new(Arc::downgrade(queue));
        let task = state.completion_task(move || panic::capture(f));
        queue.push(task);
        TaskFuture { state }
    }

    /// Whether the task has finished, successfully or with a captured
    /// panic. Never blocks.
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Current lifecycle state. Never blocks.
    pub fn state(&self) -> TaskState {
        match self.state.state.load(Ordering::Acquire) {
            PENDING => TaskState::Pending,
            RUNNING => TaskState::Running,
            _ => TaskState::Ready,
        }
    }

    /// Blocks the calling thread until the task is ready.
    ///
    /// The caller performs no work on behalf of the task; it parks on a
    /// condvar until the running worker signals completion.
    pub fn wait(&self) {
        if self.state.is_ready() {
            return;
        }
        let mut dependents = self.state.dependents.lock();
        while !self.state.is_ready() {
            self.state.done.wait(&mut dependents);
        }
    }

    /// Blocks until ready, then returns the value or the captured panic.
    ///
    /// Note the caller hangs forever if the worker executing this task was
    /// killed by a non-unwinding fault before completing it; dead workers
    /// are not replaced and their tasks are not recovered.
    pub fn get(&self) -> Result<T>
    where
        T: Clone,
    {
        self.wait();
        // Safety: wait() returns only after READY was published.
        match unsafe { self.state.outcome_ref() } {
            Ok(value) => Ok(value.clone()),
            Err(cause) => Err(Error::TaskPanicked(cause.clone())),
        }
    }

    /// Non-blocking variant of [`get`](Self::get).
    pub fn try_get(&self) -> Option<Result<T>>
    where
        T: Clone,
    {
        if !self.state.is_ready() {
            return None;
        }
        // Safety: readiness was just observed.
        Some(match unsafe { self.state.outcome_ref() } {
            Ok(value) => Ok(value.clone()),
            Err(cause) => Err(Error::TaskPanicked(cause.clone())),
        })
    }

    /// Chains `f` onto this task's result, returning the future of
    /// `f(&result)`.
    ///
    /// The continuation goes through the pool queue like any other task:
    /// immediately if this future is already ready, otherwise when the
    /// completing worker flushes the dependents list. If this task
    /// panicked, `f` is never invoked and the returned future completes
    /// with the same cause.
    pub fn then_apply<U, F>(&self, f: F) -> TaskFuture<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(&T) -> U + Send + 'static,
    {
        let next = FutureState::<U>::new(Weak::clone(&self.state.queue));
        let upstream = Arc::clone(&self.state);
        let task = next.completion_task(move || {
            debug_assert!(upstream.is_ready());
            // Safety: dependents are flushed (or submitted directly) only
            // after the upstream outcome is published.
            match unsafe { upstream.outcome_ref() } {
                Ok(value) => panic::capture(move || f(value)),
                Err(cause) => Err(cause.clone()),
            }
        });

        // Registration races with the upstream completing: check, take the
        // dependents lock, and check again under it before appending --
        // the same discipline the queue uses for its empty transition.
        if self.state.is_ready() {
            self.state.enqueue(task);
        } else {
            let mut dependents = self.state.dependents.lock();
            if self.state.is_ready() {
                drop(dependents);
                self.state.enqueue(task);
            } else {
                dependents.push(task);
            }
        }

        TaskFuture { state: next }
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for TaskFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFuture")
            .field("state", &self.state())
            .finish()
    }
}
