//! strand - a small fixed-size task-execution runtime.
//!
//! A pool of worker threads pulls user computations off a blocking
//! two-lock FIFO queue and exposes each result as a [`TaskFuture`] that
//! supports blocking reads and chained continuations.
//!
//! # Quick Start
//!
//! ```no_run
//! use strand::prelude::*;
//!
//! // Initialize the global runtime
//! strand::init().unwrap();
//!
//! let task = strand::spawn(|| 6 * 7);
//! let doubled = task.then_apply(|n| n * 2);
//!
//! assert_eq!(task.get().unwrap(), 42);
//! assert_eq!(doubled.get().unwrap(), 84);
//!
//! strand::shutdown();
//! ```
//!
//! Pools can also be owned directly via [`WorkerPool::new`], without the
//! global layer.
//!
//! # Guarantees
//!
//! - Strict FIFO hand-off: a single worker runs tasks in submission order.
//! - Panics in task bodies are captured per task and surfaced to every
//!   `get` caller; chains built with `then_apply` propagate the failure
//!   without running downstream code.
//! - `shutdown` never blocks; tasks still queued at that point are
//!   abandoned, tasks already running finish.
//!
//! # Features
//!
//! - `telemetry` (default): latency histograms and counters per pool.

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod future;
pub mod prelude;
pub mod queue;
pub mod runtime;

#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::WorkerPool;
pub use future::{TaskFuture, TaskState};
pub use runtime::{init, init_with_config, shutdown, spawn};
