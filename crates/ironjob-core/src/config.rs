//! Worker configuration.
//!
//! Every field has a default, so `{}` is a valid config file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Queue to pull from.
    pub queue: String,

    /// Number of concurrent pull workers.
    pub workers: usize,

    /// Attempts allowed per job; 0 means unlimited.
    pub max_tries: u32,

    /// Sleep between polls when the queue is empty.
    pub poll_interval_ms: u64,

    pub retry: RetryPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue: "default".to_string(),
            workers: 1,
            max_tries: 0,
            poll_interval_ms: 500,
            retry: RetryPolicy::default(),
        }
    }
}

impl WorkerConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.is_empty() {
            return Err(ConfigError::Invalid("queue must not be empty".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 0.0 {
            return Err(ConfigError::Invalid(
                "retry.multiplier must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Has a job on its `attempts`-th attempt exhausted its tries?
    pub fn exceeds_max_tries(&self, attempts: u64) -> bool {
        self.max_tries > 0 && attempts > u64::from(self.max_tries)
    }
}
