//! Panic capture for user-supplied task bodies.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A panic caught from a task body, reduced to its message.
#[derive(Debug, Clone)]
pub struct PanicInfo {
    message: String,
}

impl PanicInfo {
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };

        Self { message }
    }

    /// The panic message extracted from the payload.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PanicInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Runs `f`, converting an unwind into a captured [`PanicInfo`].
///
/// Only unwinding panics are caught. Aborts, stack overflows, and other
/// non-recoverable failures take the calling thread down.
pub(crate) fn capture<R, F>(f: F) -> Result<R, PanicInfo>
where
    F: FnOnce() -> R,
{
    catch_unwind(AssertUnwindSafe(f)).map_err(PanicInfo::from_payload)
}
