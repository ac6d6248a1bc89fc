//! Terminal progress display for harvest runs
//!
//! Renders the coordinator's progress samples with an indicatif bar when
//! stderr is a terminal and falls back to plain periodic lines otherwise.
//! The display is a [`ProgressObserver`], so it never talks to workers
//! directly; it only sees [`RunProgress`] snapshots.

use std::io::IsTerminal;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

use crate::app::coordinator::{ProgressEstimate, ProgressObserver, RunProgress};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Draw a progress bar when stderr is a terminal
    pub enable_progress_bars: bool,
    /// Minimum gap between plain text lines
    pub text_interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            text_interval: Duration::from_secs(10),
        }
    }
}

/// Progress bar or text reporter for one harvest
pub struct ProgressDisplay {
    bar: Option<ProgressBar>,
    text_interval: Duration,
    last_line: Mutex<Option<Instant>>,
}

impl ProgressDisplay {
    pub fn new(config: ProgressConfig) -> Self {
        let bar = (config.enable_progress_bars && std::io::stderr().is_terminal()).then(|| {
            let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            match ProgressStyle::default_bar().template(BAR_TEMPLATE) {
                Ok(style) => bar.set_style(style.progress_chars("##-")),
                Err(e) => debug!("Falling back to default bar style: {}", e),
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });

        Self {
            bar,
            text_interval: config.text_interval,
            last_line: Mutex::new(None),
        }
    }

    /// True when drawing a bar rather than text lines
    pub fn is_interactive(&self) -> bool {
        self.bar.is_some()
    }

    /// One-line status shown next to the bar
    pub fn status_message(progress: &RunProgress, estimate: &ProgressEstimate) -> String {
        format!(
            "{} ok, {} failed, {} absent | {:.1}/min | ETA {}",
            progress.succeeded,
            progress.failed,
            progress.absent,
            estimate.rate_per_minute,
            estimate.remaining_display()
        )
    }

    fn text_line_due(&self) -> bool {
        let Ok(mut last) = self.last_line.lock() else {
            return false;
        };
        let due = last.map_or(true, |at| at.elapsed() >= self.text_interval);
        if due {
            *last = Some(Instant::now());
        }
        due
    }
}

impl ProgressObserver for ProgressDisplay {
    fn on_progress(&self, progress: &RunProgress, estimate: &ProgressEstimate) {
        let message = Self::status_message(progress, estimate);
        match &self.bar {
            Some(bar) => {
                bar.set_length(progress.total as u64);
                bar.set_position(progress.processed as u64);
                bar.set_message(message);
            }
            None => {
                if self.text_line_due() {
                    eprintln!(
                        "Progress: {}/{} notices ({:.1}%) {}",
                        progress.processed,
                        progress.total,
                        progress.completion_percentage(),
                        message
                    );
                }
            }
        }
    }

    fn on_finish(&self, progress: &RunProgress) {
        match &self.bar {
            Some(bar) => bar.finish_with_message(format!(
                "{} harvested, {} failed, {} absent",
                progress.succeeded, progress.failed, progress.absent
            )),
            None => eprintln!(
                "Harvest finished: {}/{} notices processed",
                progress.processed, progress.total
            ),
        }
    }
}
