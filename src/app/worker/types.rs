//! Worker type definitions
//!
//! Events sent from workers to the result aggregator, and per-worker counters.

use serde::Serialize;

use crate::app::models::Record;
use crate::errors::HarvestResult;

/// Outcome reported by a worker for one candidate
///
/// `Harvested`, `Absent` and `Failed` are terminal and sent exactly once per
/// candidate; `Retrying` is informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Harvested {
        worker_id: usize,
        record: Record,
        attempts: u32,
    },
    Absent {
        worker_id: usize,
        url: String,
    },
    Failed {
        worker_id: usize,
        url: String,
        attempts: u32,
        error: String,
    },
    Retrying {
        worker_id: usize,
        url: String,
        attempt: u32,
        error: String,
    },
}

impl WorkerEvent {
    /// True for events that close out a candidate
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerEvent::Retrying { .. })
    }

    pub fn worker_id(&self) -> usize {
        match self {
            WorkerEvent::Harvested { worker_id, .. }
            | WorkerEvent::Absent { worker_id, .. }
            | WorkerEvent::Failed { worker_id, .. }
            | WorkerEvent::Retrying { worker_id, .. } => *worker_id,
        }
    }
}

/// Counters kept by a single worker, summed by the pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub harvested: u64,
    pub absent: u64,
    pub failed: u64,
    pub retries: u64,
}

impl WorkerStats {
    /// Candidates this worker finished
    pub fn processed(&self) -> u64 {
        self.harvested + self.absent + self.failed
    }

    /// Add another worker's counters
    pub fn merge(&mut self, other: &WorkerStats) {
        self.harvested += other.harvested;
        self.absent += other.absent;
        self.failed += other.failed;
        self.retries += other.retries;
    }
}

/// Result type returned by worker tasks
pub type WorkerResult<T> = HarvestResult<T>;
