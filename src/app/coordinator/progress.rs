//! Progress estimation and monitoring
//!
//! [`estimate`] turns elapsed time and a processed count into a rate, time
//! remaining and completion time. The [`ProgressMonitor`] samples the shared
//! run counters on an interval, logs the estimate and forwards it to any
//! registered observers (such as the CLI progress bar).

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::stats::{RunProgress, SharedProgress};
use crate::constants::progress;

/// Throughput and ETA derived from progress so far
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEstimate {
    /// Candidates processed per minute
    pub rate_per_minute: f64,
    pub elapsed: Duration,
    /// Unknown until something has been processed
    pub remaining: Option<Duration>,
    pub completion: Option<DateTime<Local>>,
}

impl ProgressEstimate {
    pub fn elapsed_display(&self) -> String {
        format_hms(self.elapsed)
    }

    pub fn remaining_display(&self) -> String {
        self.remaining
            .map(format_hms)
            .unwrap_or_else(|| progress::UNKNOWN.to_string())
    }

    pub fn completion_display(&self) -> String {
        self.completion
            .map(|at| at.format("%H:%M on %Y-%m-%d").to_string())
            .unwrap_or_else(|| progress::UNKNOWN.to_string())
    }
}

/// Format a duration as `HH:MM:SS`; hours are not wrapped
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Estimate progress of a run started at `start`
pub fn estimate(start: Instant, processed: usize, total: usize) -> ProgressEstimate {
    estimate_at(start.elapsed(), Local::now(), processed, total)
}

/// Estimate progress given the elapsed time and the current wall clock
pub fn estimate_at(
    elapsed: Duration,
    now: DateTime<Local>,
    processed: usize,
    total: usize,
) -> ProgressEstimate {
    let seconds = elapsed.as_secs_f64();
    if processed == 0 || seconds <= 0.0 {
        return ProgressEstimate {
            rate_per_minute: 0.0,
            elapsed,
            remaining: None,
            completion: None,
        };
    }

    let rate_per_minute = processed as f64 / seconds * 60.0;
    let left = total.saturating_sub(processed) as f64;
    let remaining = Duration::from_secs_f64(left / rate_per_minute * 60.0);
    let completion = chrono::Duration::from_std(remaining)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta));

    ProgressEstimate {
        rate_per_minute,
        elapsed,
        remaining: Some(remaining),
        completion,
    }
}

/// Receives periodic progress samples
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &RunProgress, estimate: &ProgressEstimate);

    fn on_finish(&self, _progress: &RunProgress) {}
}

/// Periodic sampler of [`RunProgress`]
pub struct ProgressMonitor {
    progress: SharedProgress,
    log_interval: Duration,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

/// How often observers are refreshed between log lines
const OBSERVER_TICK: Duration = Duration::from_millis(500);

impl ProgressMonitor {
    pub fn new(progress: SharedProgress, log_interval: Duration) -> Self {
        Self {
            progress,
            log_interval,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Sample until `stop` fires or its sender is dropped
    pub fn spawn(self, mut stop: oneshot::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let tick = if self.observers.is_empty() {
                self.log_interval
            } else {
                self.log_interval.min(OBSERVER_TICK)
            };
            let mut ticker = tokio::time::interval(tick.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            let mut last_log = Instant::now();

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => {
                        let snapshot = self.progress.read().await.clone();
                        let estimate = estimate(snapshot.started, snapshot.processed, snapshot.total);

                        if last_log.elapsed() >= self.log_interval {
                            log_progress(&snapshot, &estimate);
                            last_log = Instant::now();
                        }
                        for observer in &self.observers {
                            observer.on_progress(&snapshot, &estimate);
                        }
                    }
                }
            }

            let snapshot = self.progress.read().await.clone();
            for observer in &self.observers {
                observer.on_finish(&snapshot);
            }
            debug!("Progress monitor stopped");
        })
    }
}

fn log_progress(snapshot: &RunProgress, estimate: &ProgressEstimate) {
    info!(
        "Progress: {}/{} ({:.1}%) | {:.1}/min | elapsed {} | remaining {} | done at {}",
        snapshot.processed,
        snapshot.total,
        snapshot.completion_percentage(),
        estimate.rate_per_minute,
        estimate.elapsed_display(),
        estimate.remaining_display(),
        estimate.completion_display()
    );
}
