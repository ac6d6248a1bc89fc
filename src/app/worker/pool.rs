//! Worker pool management and coordination
//!
//! The pool spawns `min(worker_count, pending candidates)` workers over a
//! shared queue, fetcher and extractor, and manages their lifecycle: start,
//! waiting for the queue to drain, and graceful shutdown with a bounded grace
//! period.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::config::WorkerConfig;
use super::core::HarvestWorker;
use super::types::{WorkerEvent, WorkerResult, WorkerStats};
use crate::app::client::Fetcher;
use crate::app::extract::Extractor;
use crate::app::queue::CandidateQueue;
use crate::errors::HarvestError;

/// Current state of the worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Pool has been created but not started
    Created,
    /// Pool is running with active workers
    Running,
    /// Shutdown was requested; workers finish their current candidate
    ShuttingDown,
    /// All workers have exited
    Stopped,
}

/// Pool managing a set of harvest workers
pub struct WorkerPool<F: Fetcher, E: Extractor> {
    config: WorkerConfig,
    queue: CandidateQueue,
    fetcher: Arc<F>,
    extractor: Arc<E>,
    tasks: JoinSet<WorkerResult<WorkerStats>>,
    shutdown_senders: Vec<mpsc::Sender<()>>,
    totals: WorkerStats,
    failures: usize,
    state: PoolState,
}

impl<F: Fetcher, E: Extractor> WorkerPool<F, E> {
    /// Create a new worker pool
    pub fn new(
        config: WorkerConfig,
        queue: CandidateQueue,
        fetcher: Arc<F>,
        extractor: Arc<E>,
    ) -> Self {
        Self {
            config,
            queue,
            fetcher,
            extractor,
            tasks: JoinSet::new(),
            shutdown_senders: Vec::new(),
            totals: WorkerStats::default(),
            failures: 0,
            state: PoolState::Created,
        }
    }

    /// Spawn the workers, returning how many were started
    ///
    /// Takes ownership of `events`; the channel closes once every worker
    /// has exited.
    pub async fn start(&mut self, events: mpsc::Sender<WorkerEvent>) -> WorkerResult<usize> {
        if self.state != PoolState::Created {
            return Err(HarvestError::InvalidState {
                expected: "Created".to_string(),
                found: format!("{:?}", self.state),
            });
        }
        self.config.validate()?;

        let pending = self.queue.pending_count().await;
        let worker_count = self.config.worker_count.min(pending);
        info!(
            "Starting {} workers for {} candidates",
            worker_count, pending
        );

        for worker_id in 1..=worker_count {
            let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
            let worker = HarvestWorker::new(
                worker_id,
                self.config.clone(),
                self.queue.clone(),
                Arc::clone(&self.fetcher),
                Arc::clone(&self.extractor),
                events.clone(),
                shutdown_rx,
            );
            self.tasks.spawn(worker.run());
            self.shutdown_senders.push(shutdown_tx);
        }

        self.state = if worker_count == 0 {
            PoolState::Stopped
        } else {
            PoolState::Running
        };
        Ok(worker_count)
    }

    /// Ask every worker to stop after its current candidate
    pub fn request_shutdown(&mut self) {
        if self.state != PoolState::Running {
            return;
        }
        self.state = PoolState::ShuttingDown;
        info!("Requesting shutdown of {} workers", self.shutdown_senders.len());
        for shutdown_tx in &self.shutdown_senders {
            // A closed channel means the worker already exited
            let _ = shutdown_tx.try_send(());
        }
    }

    /// Wait for every worker to exit
    ///
    /// Cancel safe: counters gathered before cancellation are kept.
    pub async fn wait(&mut self) -> WorkerStats {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(Ok(stats)) => self.totals.merge(&stats),
                Ok(Err(e)) => {
                    self.failures += 1;
                    error!("Worker exited with error: {}", e);
                }
                Err(e) => {
                    self.failures += 1;
                    error!("Worker task panicked or was cancelled: {}", e);
                }
            }
        }
        self.state = PoolState::Stopped;
        debug!("All workers stopped");
        self.totals
    }

    /// Request shutdown and wait up to `grace` for workers to exit
    ///
    /// Workers still running after the grace period are aborted.
    pub async fn shutdown(&mut self, grace: Duration) -> WorkerStats {
        self.request_shutdown();
        if tokio::time::timeout(grace, self.wait()).await.is_err() {
            warn!(
                "Workers did not stop within {:?}; aborting {} remaining",
                grace,
                self.tasks.len()
            );
            self.tasks.abort_all();
            self.wait().await;
        }
        self.totals
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    /// Workers that ended with an error or panic
    pub fn failed_workers(&self) -> usize {
        self.failures
    }
}
