//! Result aggregation
//!
//! Workers never touch shared result collections. Every outcome travels over
//! an mpsc channel to a single collector task, which owns the growing batch of
//! records, the failure log and the list of absent candidates, and keeps the
//! shared run counters current. The collector finishes when the last worker
//! drops its sender.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::coordinator::stats::SharedProgress;
use crate::app::models::Record;
use crate::app::worker::WorkerEvent;
use crate::constants::{files, progress};
use crate::errors::OutputResult;

/// A candidate whose every attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCandidate {
    pub url: String,
    pub attempts: u32,
    pub error: String,
}

/// Ordered, duplicate-free list of failed candidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureLog {
    entries: Vec<FailedCandidate>,
    seen: HashSet<String>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure; a URL already present is ignored
    pub fn push(&mut self, url: impl Into<String>, attempts: u32, error: impl Into<String>) -> bool {
        let url = url.into();
        if !self.seen.insert(url.clone()) {
            debug!("Failure for {} already recorded", url);
            return false;
        }
        self.entries.push(FailedCandidate {
            url,
            attempts,
            error: error.into(),
        });
        true
    }

    pub fn entries(&self) -> &[FailedCandidate] {
        &self.entries
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.url.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write one URL per line to a timestamped file in `dir`
    ///
    /// Returns `None` without touching the filesystem when the log is empty.
    pub fn write_to(&self, dir: &Path) -> OutputResult<Option<PathBuf>> {
        if self.is_empty() {
            return Ok(None);
        }
        std::fs::create_dir_all(dir)?;
        let name = format!(
            "{}{}.txt",
            files::FAILURE_LOG_PREFIX,
            Local::now().format(files::FAILURE_LOG_TIMESTAMP)
        );
        let path = dir.join(name);
        let mut contents = self.urls().collect::<Vec<_>>().join("\n");
        contents.push('\n');
        std::fs::write(&path, contents)?;
        info!("Wrote {} failed URLs to {}", self.len(), path.display());
        Ok(Some(path))
    }
}

/// Everything a harvest produced
#[derive(Debug, Clone, Default)]
pub struct HarvestBatch {
    /// Extracted records, in completion order
    pub records: Vec<Record>,
    /// Candidates that exhausted their attempts
    pub failures: FailureLog,
    /// Candidates the origin reported missing
    pub absent: Vec<String>,
}

impl HarvestBatch {
    /// Candidates with a terminal outcome
    pub fn processed(&self) -> usize {
        self.records.len() + self.failures.len() + self.absent.len()
    }
}

/// Single consumer of worker events
pub struct ResultAggregator {
    events: mpsc::Receiver<WorkerEvent>,
    total: usize,
    milestone_every: usize,
    progress: Option<SharedProgress>,
}

impl ResultAggregator {
    /// Create the event channel and its collector
    pub fn channel(buffer: usize, total: usize) -> (mpsc::Sender<WorkerEvent>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (
            tx,
            Self {
                events: rx,
                total,
                milestone_every: progress::MILESTONE_EVERY,
                progress: None,
            },
        )
    }

    /// Log a milestone every `n` processed candidates; 0 disables milestones
    pub fn with_milestone_every(mut self, n: usize) -> Self {
        self.milestone_every = n;
        self
    }

    /// Keep `progress` updated with every terminal outcome
    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run the collector on its own task
    pub fn spawn(self) -> JoinHandle<HarvestBatch> {
        tokio::spawn(self.collect())
    }

    /// Consume events until every sender is dropped
    pub async fn collect(mut self) -> HarvestBatch {
        let mut batch = HarvestBatch::default();

        while let Some(event) = self.events.recv().await {
            match event {
                WorkerEvent::Harvested { record, .. } => {
                    batch.records.push(record);
                    if let Some(progress) = &self.progress {
                        progress.write().await.record_success();
                    }
                }
                WorkerEvent::Absent { url, .. } => {
                    batch.absent.push(url);
                    if let Some(progress) = &self.progress {
                        progress.write().await.record_absent();
                    }
                }
                WorkerEvent::Failed {
                    url,
                    attempts,
                    error,
                    ..
                } => {
                    warn!("Failed after {} attempts: {} ({})", attempts, url, error);
                    batch.failures.push(url, attempts, error);
                    if let Some(progress) = &self.progress {
                        progress.write().await.record_failure();
                    }
                }
                WorkerEvent::Retrying {
                    url,
                    attempt,
                    error,
                    worker_id,
                } => {
                    debug!(
                        "Worker {} retrying {} after attempt {}: {}",
                        worker_id, url, attempt, error
                    );
                    continue;
                }
            }

            let processed = batch.processed();
            if self.milestone_every > 0 && processed % self.milestone_every == 0 {
                info!(
                    "MILESTONE: {}/{} candidates processed ({} records, {} failed, {} absent)",
                    processed,
                    self.total,
                    batch.records.len(),
                    batch.failures.len(),
                    batch.absent.len()
                );
            }
        }

        debug!("Result aggregator finished with {} outcomes", batch.processed());
        batch
    }
}
