//! Core harvest worker implementation
//!
//! A worker repeatedly claims the next candidate from the shared queue, fetches
//! and extracts it, and reports the outcome. Absent pages are reported at once;
//! transient fetch failures and extraction failures are retried after a fixed
//! delay until the attempt budget is spent. Shutdown is only honoured between
//! candidates, so an in-flight candidate is always finished.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::config::WorkerConfig;
use super::types::{WorkerEvent, WorkerResult, WorkerStats};
use crate::app::client::Fetcher;
use crate::app::extract::Extractor;
use crate::app::models::Record;
use crate::app::queue::{Candidate, CandidateQueue};
use crate::errors::{ExtractionError, HarvestError};

/// Why a single attempt did not produce a record
#[derive(Debug)]
enum AttemptError {
    /// The page does not exist; never retried
    Absent,
    /// Worth another attempt
    Retryable(String),
}

/// Individual harvest worker
pub struct HarvestWorker<F: Fetcher, E: Extractor> {
    id: usize,
    config: WorkerConfig,
    queue: CandidateQueue,
    fetcher: Arc<F>,
    extractor: Arc<E>,
    events: mpsc::Sender<WorkerEvent>,
    shutdown_rx: mpsc::Receiver<()>,
    stats: WorkerStats,
}

impl<F: Fetcher, E: Extractor> HarvestWorker<F, E> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        config: WorkerConfig,
        queue: CandidateQueue,
        fetcher: Arc<F>,
        extractor: Arc<E>,
        events: mpsc::Sender<WorkerEvent>,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            id,
            config,
            queue,
            fetcher,
            extractor,
            events,
            shutdown_rx,
            stats: WorkerStats::default(),
        }
    }

    /// Run until the queue is drained or shutdown is requested
    pub async fn run(mut self) -> WorkerResult<WorkerStats> {
        info!("Worker {} starting", self.id);

        loop {
            if self.check_shutdown() {
                info!("Worker {} received shutdown signal", self.id);
                break;
            }

            let Some(candidate) = self.queue.next_candidate(self.id).await else {
                debug!("Worker {} found queue drained", self.id);
                break;
            };

            self.process_candidate(candidate).await?;
        }

        info!(
            "Worker {} finished: {} harvested, {} absent, {} failed",
            self.id, self.stats.harvested, self.stats.absent, self.stats.failed
        );
        Ok(self.stats)
    }

    /// Drive one candidate to a terminal outcome
    async fn process_candidate(&mut self, mut candidate: Candidate) -> WorkerResult<()> {
        loop {
            candidate.attempts += 1;
            debug!(
                "Worker {} processing {} (attempt {}/{})",
                self.id,
                candidate.url(),
                candidate.attempts,
                self.config.max_retries
            );

            match self.attempt(&candidate).await {
                Ok(record) => {
                    self.queue
                        .mark_harvested(candidate.url(), candidate.attempts)
                        .await?;
                    self.stats.harvested += 1;
                    return self
                        .emit(WorkerEvent::Harvested {
                            worker_id: self.id,
                            record,
                            attempts: candidate.attempts,
                        })
                        .await;
                }
                Err(AttemptError::Absent) => {
                    debug!("Worker {}: {} does not exist", self.id, candidate.url());
                    self.queue
                        .mark_absent(candidate.url(), candidate.attempts)
                        .await?;
                    self.stats.absent += 1;
                    return self
                        .emit(WorkerEvent::Absent {
                            worker_id: self.id,
                            url: candidate.key().to_string(),
                        })
                        .await;
                }
                Err(AttemptError::Retryable(reason)) => {
                    candidate.last_error = Some(reason.clone());

                    if candidate.attempts >= self.config.max_retries {
                        warn!(
                            "Worker {} giving up on {} after {} attempts: {}",
                            self.id,
                            candidate.url(),
                            candidate.attempts,
                            reason
                        );
                        self.queue
                            .mark_failed(candidate.url(), candidate.attempts, &reason)
                            .await?;
                        self.stats.failed += 1;
                        return self
                            .emit(WorkerEvent::Failed {
                                worker_id: self.id,
                                url: candidate.key().to_string(),
                                attempts: candidate.attempts,
                                error: reason,
                            })
                            .await;
                    }

                    warn!(
                        "Worker {}: attempt {}/{} for {} failed: {}. Retrying in {:?}",
                        self.id,
                        candidate.attempts,
                        self.config.max_retries,
                        candidate.url(),
                        reason,
                        self.config.retry_delay
                    );
                    self.stats.retries += 1;
                    self.report_retry(&candidate, reason);
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }

    /// One fetch and extract attempt
    async fn attempt(&self, candidate: &Candidate) -> Result<Record, AttemptError> {
        let fetch = self.fetcher.fetch(candidate.url());
        let body = match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) if e.is_absent() => return Err(AttemptError::Absent),
            Ok(Err(e)) => return Err(AttemptError::Retryable(e.to_string())),
            Err(_) => {
                return Err(AttemptError::Retryable(format!(
                    "fetch timed out after {:?}",
                    self.config.fetch_timeout
                )))
            }
        };

        let extractor = Arc::clone(&self.extractor);
        let link = candidate.key().to_string();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&link, &body))
            .await
            .unwrap_or_else(|e| {
                Err(ExtractionError::Aborted {
                    link: candidate.key().to_string(),
                    reason: e.to_string(),
                })
            });

        extracted.map_err(|e| AttemptError::Retryable(e.to_string()))
    }

    /// Send a terminal event; the aggregator must see every one
    async fn emit(&self, event: WorkerEvent) -> WorkerResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| HarvestError::ChannelClosed)
    }

    /// Report a retry without blocking on a full channel
    fn report_retry(&self, candidate: &Candidate, error: String) {
        let event = WorkerEvent::Retrying {
            worker_id: self.id,
            url: candidate.key().to_string(),
            attempt: candidate.attempts,
            error,
        };
        if let Err(mpsc::error::TrySendError::Full(_)) = self.events.try_send(event) {
            debug!("Worker {} event channel full, skipping retry report", self.id);
        }
    }

    /// Check if shutdown signal was received
    fn check_shutdown(&mut self) -> bool {
        match self.shutdown_rx.try_recv() {
            Ok(()) => true,
            Err(mpsc::error::TryRecvError::Empty) => false,
            Err(mpsc::error::TryRecvError::Disconnected) => true,
        }
    }
}
