use crate::executor::panic::PanicInfo;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("runtime not initialized")]
    NotInitialized,

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("task panicked: {0}")]
    TaskPanicked(PanicInfo),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    /// The captured panic, when this error came out of a task body.
    pub fn panic_info(&self) -> Option<&PanicInfo> {
        match self {
            Error::TaskPanicked(info) => Some(info),
            _ => None,
        }
    }
}
