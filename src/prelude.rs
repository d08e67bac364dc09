//! One-stop imports for the common API surface.

pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::{PanicInfo, WorkerPool};
pub use crate::future::{TaskFuture, TaskState};
pub use crate::queue::BlockingQueue;
pub use crate::runtime::Runtime;
pub use crate::{init, init_with_config, shutdown, spawn};

#[cfg(feature = "telemetry")]
pub use crate::telemetry::{Metrics, MetricsSnapshot};
