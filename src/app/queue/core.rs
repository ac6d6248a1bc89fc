//! Core candidate queue implementation

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::errors::{HarvestError, HarvestResult};

use super::state::QueueState;
use super::types::{Candidate, CandidateStatus, QueueStats};

/// FIFO queue of candidates shared by all workers
///
/// Each candidate is handed to exactly one worker. Workers report the final
/// outcome back so the queue can tell when a run is finished.
#[derive(Debug, Clone, Default)]
pub struct CandidateQueue {
    state: Arc<Mutex<QueueState>>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a URL, returning `false` if it was already queued
    pub async fn add_candidate(&self, url: Url) -> bool {
        self.state.lock().await.add(Candidate::new(url))
    }

    /// Add many URLs at once, returning how many were new
    pub async fn add_bulk(&self, urls: impl IntoIterator<Item = Url>) -> usize {
        let mut state = self.state.lock().await;
        let mut submitted = 0;
        let mut added = 0;
        for url in urls {
            submitted += 1;
            if state.add(Candidate::new(url)) {
                added += 1;
            }
        }
        info!(
            "Queued {}/{} candidates ({} duplicates skipped)",
            added,
            submitted,
            submitted - added
        );
        added
    }

    /// Claim the next pending candidate, or `None` once the queue is drained
    pub async fn next_candidate(&self, worker_id: usize) -> Option<Candidate> {
        let lock_start = std::time::Instant::now();
        let mut state = self.state.lock().await;
        let waited = lock_start.elapsed();
        if waited > Duration::from_millis(10) {
            debug!("Queue lock contention detected: {:?} wait time", waited);
        }

        let candidate = state.claim_next(worker_id)?;
        debug!("Worker {} claimed {}", worker_id, candidate.key());
        Some(candidate)
    }

    /// Record a successful harvest
    pub async fn mark_harvested(&self, url: &Url, attempts: u32) -> HarvestResult<()> {
        self.finish(url, attempts, CandidateStatus::Harvested { attempts })
            .await
    }

    /// Record that the origin reported the page missing
    pub async fn mark_absent(&self, url: &Url, attempts: u32) -> HarvestResult<()> {
        self.finish(url, attempts, CandidateStatus::Absent).await
    }

    /// Record that every attempt failed
    pub async fn mark_failed(&self, url: &Url, attempts: u32, error: &str) -> HarvestResult<()> {
        self.finish(
            url,
            attempts,
            CandidateStatus::Failed {
                attempts,
                error: error.to_string(),
            },
        )
        .await
    }

    async fn finish(&self, url: &Url, attempts: u32, status: CandidateStatus) -> HarvestResult<()> {
        let mut state = self.state.lock().await;
        if state.finish(url.as_str(), attempts, status) {
            Ok(())
        } else {
            Err(HarvestError::CandidateNotFound {
                url: url.to_string(),
            })
        }
    }

    /// Copy of a tracked candidate
    pub async fn candidate(&self, url: &Url) -> Option<Candidate> {
        self.state.lock().await.get(url.as_str()).cloned()
    }

    pub async fn stats(&self) -> QueueStats {
        self.state.lock().await.stats().clone()
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending_count()
    }

    pub async fn is_finished(&self) -> bool {
        self.state.lock().await.stats().is_finished()
    }
}
