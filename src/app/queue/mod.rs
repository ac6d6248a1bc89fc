//! Candidate queue for concurrent harvesting
//!
//! A single FIFO queue holds every candidate URL of a run. Workers claim
//! candidates one at a time, so no candidate is ever processed by two workers,
//! and report the final outcome back to the queue.
//!
//! # Features
//!
//! - **Deduplication**: a URL is queued at most once per run
//! - **Exclusive claims**: a claimed candidate belongs to one worker until it
//!   is marked harvested, absent or failed
//! - **Statistics**: counters for progress reporting and completion detection
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use notice_harvester::app::queue::CandidateQueue;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = CandidateQueue::new();
//! queue
//!     .add_candidate(Url::parse("https://oag.ca.gov/prop65/60-Day-Notice-2020-00001")?)
//!     .await;
//!
//! while let Some(candidate) = queue.next_candidate(1).await {
//!     // fetch and extract...
//!     queue.mark_harvested(candidate.url(), 1).await?;
//! }
//! assert!(queue.is_finished().await);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod state;
pub mod types;

pub use self::core::CandidateQueue;
pub use types::{Candidate, CandidateStatus, QueueStats};

#[cfg(test)]
mod tests;
