//! Configuration structures for the run coordinator
//!
//! Gathers everything one run needs besides the fetch and extract
//! implementations: worker and discovery tunables, the origin base URL,
//! reporting intervals, shutdown behaviour and output locations.

use std::path::PathBuf;
use std::time::Duration;

use crate::app::frontier::DiscoveryConfig;
use crate::app::output::check_output_path;
use crate::app::worker::WorkerConfig;
use crate::constants::{coordinator, files, origin, progress};

/// Configuration for the run coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub worker: WorkerConfig,
    pub discovery: DiscoveryConfig,
    /// Origin that notice ids are resolved against
    pub base_url: String,
    /// How often progress is logged
    pub progress_interval: Duration,
    /// Processed candidates between milestone log lines; 0 disables them
    pub milestone_every: usize,
    /// Maximum time to wait for workers after a shutdown request
    pub shutdown_timeout: Duration,
    /// Install Ctrl-C and SIGTERM handlers for the duration of a harvest
    pub listen_for_signals: bool,
    pub output_path: PathBuf,
    /// Directory receiving the failed URL list
    pub failure_log_dir: PathBuf,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            worker: WorkerConfig::default(),
            discovery: DiscoveryConfig::default(),
            base_url: origin::BASE_URL.to_string(),
            progress_interval: progress::LOG_INTERVAL,
            milestone_every: progress::MILESTONE_EVERY,
            shutdown_timeout: coordinator::SHUTDOWN_TIMEOUT,
            listen_for_signals: true,
            output_path: PathBuf::from(files::DEFAULT_OUTPUT_PATH),
            failure_log_dir: PathBuf::from("."),
        }
    }
}

impl CoordinatorConfig {
    /// Configuration for in-process tests: no delays, no signal handlers
    pub fn for_testing(output_dir: &std::path::Path) -> Self {
        Self {
            worker: WorkerConfig::for_testing(),
            discovery: DiscoveryConfig::for_testing(),
            progress_interval: Duration::from_millis(50),
            milestone_every: 0,
            shutdown_timeout: Duration::from_secs(5),
            listen_for_signals: false,
            output_path: output_dir.join(files::DEFAULT_OUTPUT_PATH),
            failure_log_dir: output_dir.to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker.worker_count = count;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.worker.validate().map_err(|e| e.to_string())?;
        self.discovery.validate()?;

        if self.progress_interval.is_zero() {
            return Err("Progress interval cannot be zero".to_string());
        }
        if self.shutdown_timeout.is_zero() {
            return Err("Shutdown timeout cannot be zero".to_string());
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(format!("Base URL '{}' is not a valid URL", self.base_url));
        }
        check_output_path(&self.output_path).map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CoordinatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
        assert_eq!(config.progress_interval, Duration::from_secs(10));
        assert!(config.listen_for_signals);
    }

    #[test]
    fn test_builder_methods() {
        let config = CoordinatorConfig::default()
            .with_worker_count(8)
            .with_base_url("http://127.0.0.1:9999/prop65")
            .with_shutdown_timeout(Duration::from_secs(2));

        assert_eq!(config.worker.worker_count, 8);
        assert_eq!(config.base_url, "http://127.0.0.1:9999/prop65");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CoordinatorConfig {
            progress_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config = CoordinatorConfig::default().with_base_url("not a url");
        assert!(config.validate().is_err());

        config = CoordinatorConfig::default().with_worker_count(0);
        assert!(config.validate().is_err());

        config = CoordinatorConfig::default().with_output_path("notices.json");
        assert!(config.validate().is_err());

        config = CoordinatorConfig::default().with_output_path("notices.xlsx");
        assert!(config.validate().is_ok());
    }
}
