//! Prelude module for Notice Harvester Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use notice_harvester::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use notice_harvester::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let fetcher = Arc::new(HttpFetcher::new(&config.client)?);
//!     let extractor = Arc::new(NoticePageExtractor::new()?);
//!     let coordinator = Coordinator::new(config.coordinator_config(), fetcher, extractor);
//!
//!     let request = RunRequest {
//!         compare: Some(PathBuf::from("previous.csv")),
//!         ..Default::default()
//!     };
//!     let report = coordinator.run(&request, &config.partition_bounds()).await?;
//!     println!("{} notices written", report.written);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Configuration
pub use crate::config::AppConfig;

// Essential app components that are used in most integrations
pub use crate::app::{
    ClientConfig,
    // Core orchestration
    Coordinator,
    CoordinatorConfig,
    DiscoveryConfig,
    // Pipeline seams
    Extractor,
    Fetcher,
    FrontierDiscoverer,
    HttpFetcher,
    NoticePageExtractor,
    WorkerConfig,

    // Data types
    NoticeId,
    PartitionBounds,
    Record,
    RecordStatus,
    RunMode,
    RunReport,
    RunRequest,
    Snapshot,

    // Pipeline functions
    load_snapshot,
    reconcile,
    write_records,
};

// Commonly used constants
pub use crate::constants::{BASE_URL, DEFAULT_RATE_LIMIT_RPS, DEFAULT_WORKER_COUNT, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
