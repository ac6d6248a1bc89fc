//! Core application logic for Notice Harvester
//!
//! This module contains the harvesting pipeline: the origin HTTP client, the
//! notice page extractor, frontier discovery, the candidate queue and worker
//! pool, result aggregation, reconciliation against a previous snapshot, and
//! the coordinator tying them together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notice_harvester::app::{
//!     ClientConfig, DiscoveryConfig, FrontierDiscoverer, HttpFetcher, BASE_URL,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Arc::new(HttpFetcher::new(&ClientConfig::default())?);
//! let discoverer = FrontierDiscoverer::new(fetcher, BASE_URL, DiscoveryConfig::default());
//!
//! let frontier = discoverer.discover(2024, 1).await;
//! println!("Highest notice in {}: {}", frontier.year, frontier.highest_valid);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod client;
pub mod coordinator;
pub mod extract;
pub mod frontier;
pub mod models;
pub mod output;
pub mod queue;
pub mod reconcile;
pub mod selection;
pub mod snapshot;
pub mod tabular;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main public API
pub use crate::constants::BASE_URL;
pub use aggregator::{FailedCandidate, FailureLog, HarvestBatch, ResultAggregator};
pub use client::{ClientConfig, Fetcher, HttpFetcher};
pub use coordinator::{
    Coordinator, CoordinatorConfig, HarvestOutcome, ProgressEstimate, ProgressObserver,
    RunProgress, RunReport, ShutdownSignal,
};
pub use extract::{Extractor, NoticePageExtractor};
pub use frontier::{DiscoveryConfig, Frontier, FrontierDiscoverer, ProbeOutcome};
pub use models::{Category, NoticeId, PartitionBounds, Record, RecordStatus};
pub use output::{check_output_path, column_layout, notify, write_records};
pub use queue::{CandidateQueue, QueueStats};
pub use reconcile::{reconcile, ChangeCounts, Changeset, Classification};
pub use selection::{select_mode, RunMode, RunRequest};
pub use snapshot::{load_snapshot, Snapshot};
pub use tabular::{read_rows, read_url_list, TabularFormat, UrlColumn};
pub use worker::{WorkerConfig, WorkerPool};
