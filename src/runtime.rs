use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::WorkerPool;
use crate::future::TaskFuture;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A worker pool plus the config it was built from.
pub struct Runtime {
    pool: Arc<WorkerPool>,
    config: Config,
}

impl Runtime {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(&config)?;

        Ok(Self {
            pool: Arc::new(pool),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("num_threads", &self.pool.num_threads())
            .finish()
    }
}

// Global runtime for the simple API
static GLOBAL_RUNTIME: RwLock<Option<Arc<Runtime>>> = RwLock::new(None);

/// Installs a global runtime with the default configuration.
pub fn init() -> Result<()> {
    init_with_config(Config::default())
}

/// Installs a global runtime with `config`.
pub fn init_with_config(config: Config) -> Result<()> {
    let mut runtime = GLOBAL_RUNTIME.write();

    if runtime.is_some() {
        return Err(Error::AlreadyInitialized);
    }

    *runtime = Some(Arc::new(Runtime::new(config)?));
    Ok(())
}

/// The installed global runtime.
pub fn current() -> Result<Arc<Runtime>> {
    GLOBAL_RUNTIME
        .read()
        .as_ref()
        .cloned()
        .ok_or(Error::NotInitialized)
}

/// Submits `f` to the global pool.
///
/// Panics when the runtime has not been initialized.
pub fn spawn<T, F>(f: F) -> TaskFuture<T>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    current()
        .expect("strand runtime not initialized - call strand::init() first")
        .pool()
        .submit(f)
}

/// Tears down the global runtime.
///
/// The pool's workers are joined as its last handle goes away; running
/// tasks finish, queued tasks are abandoned.
pub fn shutdown() {
    let mut runtime = GLOBAL_RUNTIME.write();
    *runtime = None;
}
