//! Configuration management for Notice Harvester
//!
//! This module provides unified configuration management with multi-source
//! loading and zero-config defaults. Every section is optional in the TOML
//! file; missing values fall back to the built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{
    check_output_path, ClientConfig, CoordinatorConfig, DiscoveryConfig, PartitionBounds,
    WorkerConfig,
};
use crate::constants::{coordinator, files, logging, partitions, progress};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client and origin settings
    pub client: ClientConfig,
    /// Worker pool settings
    pub worker: WorkerConfig,
    /// Frontier discovery settings
    pub discovery: DiscoveryConfig,
    /// Reporting and shutdown settings
    pub run: RunSettings,
    /// Output locations
    pub output: OutputSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Known id range of each year
    pub partitions: Vec<PartitionEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            worker: WorkerConfig::default(),
            discovery: DiscoveryConfig::default(),
            run: RunSettings::default(),
            output: OutputSettings::default(),
            logging: LoggingConfig::default(),
            partitions: partitions::DEFAULT_BOUNDS
                .iter()
                .map(|&(year, start, end)| PartitionEntry { year, start, end })
                .collect(),
        }
    }
}

/// Progress reporting and shutdown behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// How often progress is logged
    #[serde(with = "humantime_serde")]
    pub progress_interval: Duration,
    /// Processed notices between milestone log lines (0 disables)
    pub milestone_every: usize,
    /// Grace period for in-flight notices after Ctrl-C
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            progress_interval: progress::LOG_INTERVAL,
            milestone_every: progress::MILESTONE_EVERY,
            shutdown_timeout: coordinator::SHUTDOWN_TIMEOUT,
        }
    }
}

/// Where results are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output file; `.csv`, `.tsv`, `.txt` or `.xlsx`
    pub path: PathBuf,
    /// Directory receiving `failed_urls_*.txt`
    pub failure_log_dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(files::DEFAULT_OUTPUT_PATH),
            failure_log_dir: PathBuf::from("."),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level: error, warn, info, debug or trace
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// One `[[partitions]]` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionEntry {
    pub year: u16,
    pub start: u32,
    pub end: u32,
}

impl AppConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the first file found among
    /// `./notice_harvester.toml` and the user config directory is used, or
    /// the defaults when there is none.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_CONFIG_FILE)];
        if let Some(user_config) = Self::default_config_path() {
            search_paths.push(user_config);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        if let Some(path) = &found {
            debug!("Found config file: {}", path.display());
        }
        found
    }

    /// Per-user config file location, when the platform has one
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::CONFIG_DIR_NAME).join(files::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Check every section, collecting all problems
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.client.validate() {
            errors.push(format!("client: {}", e));
        }
        if let Err(e) = self.worker.validate() {
            errors.push(format!("worker: {}", e));
        }
        if let Err(e) = self.discovery.validate() {
            errors.push(format!("discovery: {}", e));
        }
        if self.run.progress_interval.is_zero() {
            errors.push("run: progress_interval must be greater than zero".to_string());
        }
        if self.run.shutdown_timeout.is_zero() {
            errors.push("run: shutdown_timeout must be greater than zero".to_string());
        }
        if let Err(e) = check_output_path(&self.output.path) {
            errors.push(format!("output: {}", e));
        }
        for entry in &self.partitions {
            if entry.start == 0 || entry.start > entry.end {
                errors.push(format!(
                    "partitions: {} has invalid range {}..={}",
                    entry.year, entry.start, entry.end
                ));
            }
        }
        if !matches!(
            self.logging.level.to_lowercase().as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            errors.push(format!("logging: unknown level '{}'", self.logging.level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }

    /// Partition bounds table for candidate generation
    pub fn partition_bounds(&self) -> PartitionBounds {
        self.partitions
            .iter()
            .fold(PartitionBounds::new(), |bounds, entry| {
                bounds.with_partition(entry.year, entry.start, entry.end)
            })
    }

    /// Runtime coordinator configuration built from the file sections
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            worker: self.worker.clone(),
            discovery: self.discovery.clone(),
            base_url: self.client.base_url.clone(),
            progress_interval: self.run.progress_interval,
            milestone_every: self.run.milestone_every,
            shutdown_timeout: self.run.shutdown_timeout,
            listen_for_signals: true,
            output_path: self.output.path.clone(),
            failure_log_dir: self.output.failure_log_dir.clone(),
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Default configuration file content with a short header
    pub fn generate_default_config_content() -> ConfigResult<String> {
        let body = Self::default().to_toml()?;
        Ok(format!(
            "# Notice Harvester configuration\n\
             # Every value is optional; removed entries fall back to the defaults below.\n\
             # Durations accept human readable values such as \"500ms\", \"5s\" or \"2m\".\n\n{}",
            body
        ))
    }

    /// Write the default configuration to `path`
    ///
    /// An existing file is left alone unless `force` is set.
    pub async fn write_default(path: &Path, force: bool) -> ConfigResult<PathBuf> {
        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "path".to_string(),
                value: path.display().to_string(),
                reason: "file exists, pass --force to overwrite".to_string(),
            });
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, Self::generate_default_config_content()?).await?;
        info!("Wrote default configuration to {}", path.display());
        Ok(path.to_path_buf())
    }
}
