//! Worker configuration management
//!
//! Configuration structures and validation for harvest workers, with a
//! builder for programmatic construction and presets for tests.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::workers;
use crate::errors::{HarvestError, HarvestResult};

/// Configuration for harvest workers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Upper bound on concurrent workers; fewer are spawned for short queues
    pub worker_count: usize,
    /// Total attempts per candidate, the first one included
    pub max_retries: u32,
    /// Fixed delay between attempts
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// Upper bound on a single fetch
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
    /// Channel buffer size for worker events
    pub event_buffer_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            max_retries: workers::MAX_RETRIES,
            retry_delay: workers::RETRY_DELAY,
            fetch_timeout: workers::FETCH_TIMEOUT,
            event_buffer_size: workers::EVENT_BUFFER_SIZE,
        }
    }
}

impl WorkerConfig {
    /// Configuration without delays, for tests
    pub fn for_testing() -> Self {
        Self {
            worker_count: 4,
            retry_delay: Duration::ZERO,
            fetch_timeout: Duration::from_secs(5),
            event_buffer_size: 64,
            ..Default::default()
        }
    }

    /// Validate configuration values and return errors for invalid settings
    pub fn validate(&self) -> HarvestResult<()> {
        if self.worker_count == 0 {
            return Err(HarvestError::Configuration(
                "Worker count cannot be zero".to_string(),
            ));
        }

        if self.worker_count > workers::MAX_WORKER_COUNT {
            return Err(HarvestError::Configuration(format!(
                "Worker count ({}) exceeds maximum ({})",
                self.worker_count,
                workers::MAX_WORKER_COUNT
            )));
        }

        if self.max_retries == 0 {
            return Err(HarvestError::Configuration(
                "max_retries must allow at least one attempt".to_string(),
            ));
        }

        if self.fetch_timeout.is_zero() {
            return Err(HarvestError::Configuration(
                "Fetch timeout must be greater than zero".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(HarvestError::Configuration(
                "Event buffer size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for WorkerConfig
#[derive(Debug, Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers
    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    /// Set total attempts per candidate
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set delay between attempts
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Set fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> HarvestResult<WorkerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
