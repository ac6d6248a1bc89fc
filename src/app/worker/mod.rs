//! Harvest worker system for concurrent candidate processing
//!
//! A fixed set of workers drains the shared candidate queue. Each worker owns
//! the candidate it claimed until it reaches a terminal outcome, and reports
//! every outcome on a channel consumed by the result aggregator.
//!
//! # Key Features
//!
//! - **Bounded concurrency**: at most `worker_count` fetches in flight, and
//!   never more workers than candidates
//! - **Retry with fixed delay**: transient fetch and extraction failures are
//!   retried up to `max_retries` total attempts
//! - **Absent pages are not failures**: a 404/410 closes the candidate at once
//! - **Graceful shutdown**: workers stop claiming new candidates but finish
//!   the one in hand
//!
//! # Module Organization
//!
//! - [`config`] - Worker configuration with validation and builder
//! - [`types`] - Worker events and counters
//! - [`core`] - Individual worker implementation
//! - [`pool`] - Worker pool management and coordination
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notice_harvester::app::client::{ClientConfig, HttpFetcher};
//! use notice_harvester::app::extract::NoticePageExtractor;
//! use notice_harvester::app::queue::CandidateQueue;
//! use notice_harvester::app::worker::{WorkerConfig, WorkerPool};
//!
//! # async fn example(urls: Vec<url::Url>) -> Result<(), Box<dyn std::error::Error>> {
//! let queue = CandidateQueue::new();
//! queue.add_bulk(urls).await;
//!
//! let fetcher = Arc::new(HttpFetcher::new(&ClientConfig::default())?);
//! let extractor = Arc::new(NoticePageExtractor::new()?);
//! let mut pool = WorkerPool::new(WorkerConfig::default(), queue, fetcher, extractor);
//!
//! let (events_tx, mut events_rx) = tokio::sync::mpsc::channel(1024);
//! pool.start(events_tx).await?;
//! while let Some(event) = events_rx.recv().await {
//!     println!("{:?}", event);
//! }
//! let totals = pool.wait().await;
//! println!("{} harvested", totals.harvested);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod pool;
pub mod types;

#[cfg(test)]
mod tests;

pub use self::core::HarvestWorker;
pub use config::{WorkerConfig, WorkerConfigBuilder};
pub use pool::{PoolState, WorkerPool};
pub use types::{WorkerEvent, WorkerResult, WorkerStats};
