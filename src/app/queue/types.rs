//! Core data structures for the candidate queue
//!
//! This module defines the candidate work item, its lifecycle status and the
//! queue statistics snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Status of a candidate in the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStatus {
    /// Waiting to be claimed by a worker
    Pending,
    /// Claimed by a worker
    InProgress {
        worker_id: usize,
        started_at: DateTime<Utc>,
    },
    /// Fetched and extracted successfully
    Harvested { attempts: u32 },
    /// The origin reported the page missing
    Absent,
    /// Every attempt failed
    Failed { attempts: u32, error: String },
}

impl CandidateStatus {
    /// Check if the candidate reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CandidateStatus::Harvested { .. } | CandidateStatus::Absent | CandidateStatus::Failed { .. }
        )
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CandidateStatus::Pending)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, CandidateStatus::InProgress { .. })
    }
}

/// A URL to harvest together with its attempt bookkeeping
///
/// Owned by exactly one worker while in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    url: Url,
    /// Attempts made so far
    pub attempts: u32,
    /// Last error observed, if any
    pub last_error: Option<String>,
    /// Current status
    pub status: CandidateStatus,
}

impl Candidate {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            attempts: 0,
            last_error: None,
            status: CandidateStatus::Pending,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Queue key of this candidate
    pub fn key(&self) -> &str {
        self.url.as_str()
    }

    /// Mark as claimed by a worker
    pub fn mark_in_progress(&mut self, worker_id: usize) {
        self.status = CandidateStatus::InProgress {
            worker_id,
            started_at: Utc::now(),
        };
    }
}

/// Snapshot of queue counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Unique candidates ever added
    pub total_added: usize,
    /// Additions rejected as duplicates
    pub duplicates: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub harvested: usize,
    pub absent: usize,
    pub failed: usize,
    /// Attempts beyond the first, across all candidates
    pub retries: u64,
}

impl QueueStats {
    /// Candidates in a terminal state
    pub fn processed(&self) -> usize {
        self.harvested + self.absent + self.failed
    }

    /// True when every added candidate reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.pending == 0 && self.in_progress == 0
    }

    /// Fraction of candidates processed, 0.0 to 100.0
    pub fn completion_percentage(&self) -> f64 {
        if self.total_added == 0 {
            100.0
        } else {
            self.processed() as f64 / self.total_added as f64 * 100.0
        }
    }
}
