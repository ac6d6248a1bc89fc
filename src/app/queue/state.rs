//! Internal state management for the candidate queue

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use super::types::{Candidate, CandidateStatus, QueueStats};

/// Internal state of the candidate queue
#[derive(Debug, Default)]
pub struct QueueState {
    /// Keys of pending candidates in FIFO order
    pending: VecDeque<String>,
    /// All candidates indexed by URL
    candidates: HashMap<String, Candidate>,
    stats: QueueStats,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate, returning false for a duplicate URL
    pub fn add(&mut self, candidate: Candidate) -> bool {
        let key = candidate.key().to_string();
        if self.candidates.contains_key(&key) {
            self.stats.duplicates += 1;
            debug!("Skipping duplicate candidate: {}", key);
            return false;
        }
        self.candidates.insert(key.clone(), candidate);
        self.pending.push_back(key);
        self.stats.total_added += 1;
        self.stats.pending += 1;
        true
    }

    /// Claim the oldest pending candidate for `worker_id`
    pub fn claim_next(&mut self, worker_id: usize) -> Option<Candidate> {
        let key = self.pending.pop_front()?;
        let candidate = self.candidates.get_mut(&key)?;
        candidate.mark_in_progress(worker_id);
        self.stats.pending -= 1;
        self.stats.in_progress += 1;
        Some(candidate.clone())
    }

    /// Move a claimed candidate to a terminal status
    ///
    /// Returns false if the URL is unknown.
    pub fn finish(&mut self, key: &str, attempts: u32, status: CandidateStatus) -> bool {
        let Some(candidate) = self.candidates.get_mut(key) else {
            return false;
        };
        if candidate.status.is_in_progress() {
            self.stats.in_progress -= 1;
        } else if candidate.status.is_pending() {
            self.stats.pending -= 1;
            self.pending.retain(|k| k != key);
        } else if candidate.status.is_terminal() {
            debug!("Candidate {} already finished, ignoring", key);
            return true;
        }

        match &status {
            CandidateStatus::Harvested { .. } => self.stats.harvested += 1,
            CandidateStatus::Absent => self.stats.absent += 1,
            CandidateStatus::Failed { error, .. } => {
                self.stats.failed += 1;
                candidate.last_error = Some(error.clone());
            }
            CandidateStatus::Pending | CandidateStatus::InProgress { .. } => {}
        }
        self.stats.retries += u64::from(attempts.saturating_sub(1));
        candidate.attempts = attempts;
        candidate.status = status;
        true
    }

    pub fn get(&self, key: &str) -> Option<&Candidate> {
        self.candidates.get(key)
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
