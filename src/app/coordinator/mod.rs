//! Run orchestration and progress coordination
//!
//! The coordinator is the control plane of a run. It resolves the candidate
//! set for the selected mode (probing partition frontiers when asked), drives
//! the worker pool over a fresh queue while the result aggregator and the
//! progress monitor run beside it, and handles graceful shutdown. Once the
//! pool has drained it reconciles the batch against the comparison snapshot
//! and writes the output and the failure log.
//!
//! # Architecture
//!
//! - [`config`] - Configuration structures and validation
//! - [`stats`] - Live run counters and the final report
//! - [`progress`] - Rate and ETA estimation, periodic monitoring
//! - [`signals`] - Shutdown broadcast and OS signal handling
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notice_harvester::app::{
//!     ClientConfig, Coordinator, CoordinatorConfig, HttpFetcher, NoticePageExtractor,
//!     PartitionBounds, RunRequest,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Arc::new(HttpFetcher::new(&ClientConfig::default())?);
//! let extractor = Arc::new(NoticePageExtractor::new()?);
//! let coordinator = Coordinator::new(CoordinatorConfig::default(), fetcher, extractor);
//!
//! let request = RunRequest {
//!     years: Some((2024, 2024)),
//!     ..Default::default()
//! };
//! let report = coordinator.run(&request, &PartitionBounds::defaults()).await?;
//! println!("Harvested {} notices", report.harvested);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod progress;
pub mod signals;
pub mod stats;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tracing::{error, info, warn};
use url::Url;

use crate::app::aggregator::{HarvestBatch, ResultAggregator};
use crate::app::client::Fetcher;
use crate::app::extract::Extractor;
use crate::app::frontier::FrontierDiscoverer;
use crate::app::models::PartitionBounds;
use crate::app::output::{notify, write_records};
use crate::app::queue::CandidateQueue;
use crate::app::reconcile::reconcile;
use crate::app::selection::{select_mode, RunMode, RunRequest};
use crate::app::snapshot::load_snapshot;
use crate::app::worker::WorkerPool;
use crate::errors::{HarvestError, HarvestResult, Result};

pub use config::CoordinatorConfig;
pub use progress::{estimate, estimate_at, ProgressEstimate, ProgressMonitor, ProgressObserver};
pub use signals::ShutdownSignal;
pub use stats::{RunProgress, RunReport, SharedProgress};

/// What a harvest of one candidate set produced
#[derive(Debug, Clone, Default)]
pub struct HarvestOutcome {
    pub batch: HarvestBatch,
    /// A shutdown was requested before the queue drained
    pub interrupted: bool,
    /// Candidates still pending when the pool stopped
    pub not_attempted: usize,
}

/// Main coordinator for a harvesting run
pub struct Coordinator<F: Fetcher, E: Extractor> {
    config: CoordinatorConfig,
    fetcher: Arc<F>,
    extractor: Arc<E>,
    shutdown: ShutdownSignal,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl<F: Fetcher, E: Extractor> Coordinator<F, E> {
    pub fn new(config: CoordinatorConfig, fetcher: Arc<F>, extractor: Arc<E>) -> Self {
        Self {
            config,
            fetcher,
            extractor,
            shutdown: ShutdownSignal::new(),
            observers: Vec::new(),
        }
    }

    /// Forward progress samples to `observer` during harvests
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Handle that stops a running harvest when triggered
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Frontier discoverer sharing this coordinator's fetcher
    pub fn discoverer(&self) -> FrontierDiscoverer<F> {
        FrontierDiscoverer::new(
            Arc::clone(&self.fetcher),
            self.config.base_url.clone(),
            self.config.discovery.clone(),
        )
    }

    /// Run the mode selected by `request`
    pub async fn run(&self, request: &RunRequest, bounds: &PartitionBounds) -> Result<RunReport> {
        let mode = select_mode(request);
        self.run_mode(mode, request.compare.as_deref(), bounds).await
    }

    /// Resolve, harvest, reconcile and write one run
    ///
    /// The configuration, output path and snapshot are checked before any
    /// request is made, so a bad setup fails the run without touching the
    /// network. Once harvesting has started, write failures are recorded in
    /// the report instead of failing the run.
    pub async fn run_mode(
        &self,
        mode: RunMode,
        compare: Option<&Path>,
        bounds: &PartitionBounds,
    ) -> Result<RunReport> {
        let started = Instant::now();
        self.config
            .validate()
            .map_err(HarvestError::Configuration)?;
        info!("Run mode: {}", mode.name());

        let snapshot = match compare {
            Some(path) => Some(load_snapshot(path)?),
            None => None,
        };

        let discoverer = self.discoverer();
        let urls = mode
            .candidates(bounds, snapshot.as_ref(), &discoverer, &self.config.base_url)
            .await?;
        info!("Resolved {} candidate URLs", urls.len());

        let mut report = RunReport::new(mode.name(), urls.len());
        let outcome = self.harvest(urls).await?;
        let HarvestOutcome {
            batch,
            interrupted,
            not_attempted,
        } = outcome;

        report.harvested = batch.records.len();
        report.failed = batch.failures.len();
        report.absent = batch.absent.len();
        report.interrupted = interrupted;
        report.not_attempted = not_attempted;

        let (records, include_status) = match &snapshot {
            Some(snapshot) => {
                let changeset = reconcile(batch.records, snapshot);
                report.changes = Some(changeset.counts());
                if changeset.is_empty() {
                    info!("No changes against the snapshot; no output written");
                }
                (changeset.records, true)
            }
            None => (batch.records, false),
        };

        // Failed URLs are kept even when the output cannot be written
        match batch.failures.write_to(&self.config.failure_log_dir) {
            Ok(log) => report.failure_log = log,
            Err(e) => {
                error!("Could not write the failure log: {}", e);
                report.write_errors.push(format!("failure log: {}", e));
            }
        }

        if !records.is_empty() {
            match write_records(&self.config.output_path, &records, include_status) {
                Ok(path) => {
                    notify(&path, records.len());
                    report.written = records.len();
                    report.output_path = Some(path);
                }
                Err(e) => {
                    error!(
                        "Could not write {} records to {}: {}",
                        records.len(),
                        self.config.output_path.display(),
                        e
                    );
                    report
                        .write_errors
                        .push(format!("{}: {}", self.config.output_path.display(), e));
                }
            }
        } else if snapshot.is_none() {
            warn!("No records harvested; no output written");
        }

        report.duration = started.elapsed();

        info!(
            "Run finished in {:?}: {} harvested, {} failed, {} absent, {} written",
            report.duration, report.harvested, report.failed, report.absent, report.written
        );
        if interrupted {
            warn!(
                "Run was interrupted; {} candidates were not attempted",
                not_attempted
            );
        }
        Ok(report)
    }

    /// Harvest `urls` with the worker pool
    ///
    /// Unparseable URLs are skipped with a warning. On shutdown the workers
    /// finish their current candidate; whatever was collected is returned.
    pub async fn harvest(&self, urls: Vec<String>) -> HarvestResult<HarvestOutcome> {
        let queue = CandidateQueue::new();
        let parsed: Vec<Url> = urls
            .iter()
            .filter_map(|raw| match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Skipping invalid URL '{}': {}", raw, e);
                    None
                }
            })
            .collect();
        let total = queue.add_bulk(parsed).await;

        let mut shutdown_rx = self.shutdown.subscribe();
        let progress = RunProgress::shared(total);

        let (events, aggregator) =
            ResultAggregator::channel(self.config.worker.event_buffer_size, total);
        let collector = aggregator
            .with_milestone_every(self.config.milestone_every)
            .with_progress(Arc::clone(&progress))
            .spawn();

        let mut pool = WorkerPool::new(
            self.config.worker.clone(),
            queue.clone(),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.extractor),
        );
        pool.start(events).await?;

        let (stop_monitor, monitor_stopped) = oneshot::channel();
        let monitor = self
            .observers
            .iter()
            .fold(
                ProgressMonitor::new(Arc::clone(&progress), self.config.progress_interval),
                |monitor, observer| monitor.with_observer(Arc::clone(observer)),
            )
            .spawn(monitor_stopped);

        let listener = self
            .config
            .listen_for_signals
            .then(|| self.shutdown.listen_for_os_signals());

        let interrupted = tokio::select! {
            _ = pool.wait() => false,
            _ = shutdown_rx.recv() => {
                info!("Shutdown requested; waiting up to {:?} for workers", self.config.shutdown_timeout);
                pool.shutdown(self.config.shutdown_timeout).await;
                true
            }
        };

        if let Some(listener) = listener {
            listener.abort();
        }
        if pool.failed_workers() > 0 {
            error!("{} workers ended abnormally", pool.failed_workers());
        }

        let batch = collector.await.map_err(|e| HarvestError::TaskFailed {
            task: "result aggregator".to_string(),
            reason: e.to_string(),
        })?;

        let _ = stop_monitor.send(());
        if let Err(e) = monitor.await {
            warn!("Progress monitor ended abnormally: {}", e);
        }

        let not_attempted = queue.stats().await.pending;
        Ok(HarvestOutcome {
            batch,
            interrupted,
            not_attempted,
        })
    }
}
