use crate::error::{Error, Result};

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of worker threads; defaults to the number of logical CPUs.
    pub num_threads: Option<usize>,
    /// Prefix for worker thread names, suffixed with the worker index.
    pub thread_name_prefix: String,
    /// Stack size per worker thread, in bytes.
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "strand-worker".to_string(),
            stack_size: Some(2 * 1024 * 1024),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("num_threads too large (max 1024)"));
            }
        }

        if self.thread_name_prefix.is_empty() {
            return Err(Error::config("thread_name_prefix must not be empty"));
        }

        Ok(())
    }

    /// Resolved worker count.
    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::default().worker_threads() >= 1);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let result = Config::builder().num_threads(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_too_many_threads_rejected() {
        let result = Config::builder().num_threads(4096).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_roundtrip() {
        let config = Config::builder()
            .num_threads(3)
            .thread_name_prefix("test-worker")
            .stack_size(1024 * 1024)
            .build()
            .unwrap();

        assert_eq!(config.worker_threads(), 3);
        assert_eq!(config.thread_name_prefix, "test-worker");
        assert_eq!(config.stack_size, Some(1024 * 1024));
    }
}
