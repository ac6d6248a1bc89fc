//! Run statistics tracking and reporting
//!
//! [`RunProgress`] holds the live counters of a harvest, shared between the
//! result collector (the only writer) and the progress monitor. [`RunReport`]
//! is the final summary of a run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::app::reconcile::ChangeCounts;

/// Live counters of a harvest
#[derive(Debug, Clone)]
pub struct RunProgress {
    /// Candidates queued for this run
    pub total: usize,
    /// Candidates with a terminal outcome
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub absent: usize,
    pub started: Instant,
}

/// Progress counters shared across tasks
pub type SharedProgress = Arc<RwLock<RunProgress>>;

impl RunProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            succeeded: 0,
            failed: 0,
            absent: 0,
            started: Instant::now(),
        }
    }

    pub fn shared(total: usize) -> SharedProgress {
        Arc::new(RwLock::new(Self::new(total)))
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
        self.processed += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
        self.processed += 1;
    }

    pub fn record_absent(&mut self) {
        self.absent += 1;
        self.processed += 1;
    }

    pub fn completion_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.processed as f64 / self.total as f64) * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Selection mode that produced the candidates
    pub mode: String,
    pub candidates: usize,
    pub harvested: usize,
    pub failed: usize,
    pub absent: usize,
    /// Reconciliation counts; absent when no snapshot was given
    pub changes: Option<ChangeCounts>,
    /// Records written to the output file
    pub written: usize,
    pub output_path: Option<PathBuf>,
    pub failure_log: Option<PathBuf>,
    /// Output or failure log writes that failed after harvesting
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub write_errors: Vec<String>,
    /// Candidates never attempted because the run was interrupted
    pub not_attempted: usize,
    pub interrupted: bool,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl RunReport {
    pub fn new(mode: impl Into<String>, candidates: usize) -> Self {
        Self {
            mode: mode.into(),
            candidates,
            harvested: 0,
            failed: 0,
            absent: 0,
            changes: None,
            written: 0,
            output_path: None,
            failure_log: None,
            write_errors: Vec::new(),
            not_attempted: 0,
            interrupted: false,
            duration: Duration::ZERO,
        }
    }

    /// True when every candidate reached a terminal outcome without failing
    /// and every artifact was written
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && !self.interrupted && self.write_errors.is_empty()
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &std::path::Path) -> crate::errors::OutputResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
