//! Frontier discovery
//!
//! Notice ids within a year are dense and sequential, but the highest issued id
//! is not published anywhere. The discoverer probes ids upward from a starting
//! point and stops once it has seen a configurable number of consecutive
//! absent ids, reporting the last id that resolved.
//!
//! Transient failures are not counted as absences: the probe is paused and
//! repeated. With a repeat bound configured, an id that never settles ends
//! discovery early with whatever frontier was found so far.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::client::Fetcher;
use crate::app::models::NoticeId;
use crate::constants::discovery;

/// Tunables of frontier discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Consecutive absent ids that end discovery
    pub absence_threshold: u32,
    /// Pause between probes
    #[serde(with = "humantime_serde")]
    pub probe_delay: Duration,
    /// Pause before repeating a probe that failed transiently
    #[serde(with = "humantime_serde")]
    pub transient_pause: Duration,
    /// Transient repeats allowed per id before discovery gives up; unbounded when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_transient_retries: Option<u32>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            absence_threshold: discovery::DEFAULT_ABSENCE_THRESHOLD,
            probe_delay: discovery::DEFAULT_PROBE_DELAY,
            transient_pause: discovery::DEFAULT_TRANSIENT_PAUSE,
            max_transient_retries: None,
        }
    }
}

impl DiscoveryConfig {
    /// Configuration without pauses, for tests
    pub fn for_testing() -> Self {
        Self {
            probe_delay: Duration::ZERO,
            transient_pause: Duration::ZERO,
            max_transient_retries: Some(5),
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.absence_threshold == 0 {
            return Err("absence_threshold must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Outcome of probing a single id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Valid,
    Absent,
    Transient(String),
}

/// Result of discovering one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frontier {
    pub year: u16,
    /// First id probed
    pub start: u32,
    /// Highest id that resolved, or `probe_start - 1` when none did
    pub highest_valid: u32,
    /// Ids probed, repeats of transient probes not included
    pub probed: u32,
    /// Probed ids that resolved
    pub found: u32,
}

impl Frontier {
    /// True when at least one probed id resolved
    pub fn found_any(&self) -> bool {
        self.found > 0
    }
}

/// Probes sequential ids to find the end of a partition
pub struct FrontierDiscoverer<F: Fetcher> {
    fetcher: Arc<F>,
    base_url: String,
    config: DiscoveryConfig,
}

impl<F: Fetcher> FrontierDiscoverer<F> {
    pub fn new(fetcher: Arc<F>, base_url: impl Into<String>, config: DiscoveryConfig) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            config,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Probe a single id once
    pub async fn probe(&self, id: NoticeId) -> ProbeOutcome {
        let link = id.url(&self.base_url);
        let url = match Url::parse(&link) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot probe {}: invalid URL ({})", link, e);
                return ProbeOutcome::Absent;
            }
        };
        match self.fetcher.fetch(&url).await {
            Ok(_) => ProbeOutcome::Valid,
            Err(e) if e.is_absent() => ProbeOutcome::Absent,
            Err(e) => ProbeOutcome::Transient(e.to_string()),
        }
    }

    /// Probe an id, repeating transient failures per configuration
    ///
    /// Only returns `Transient` once the repeat bound is exhausted.
    async fn probe_settled(&self, id: NoticeId) -> ProbeOutcome {
        let mut repeats = 0;
        loop {
            match self.probe(id).await {
                ProbeOutcome::Transient(reason) => {
                    if self
                        .config
                        .max_transient_retries
                        .is_some_and(|max| repeats >= max)
                    {
                        return ProbeOutcome::Transient(reason);
                    }
                    repeats += 1;
                    warn!(
                        "Transient failure probing {} ({}), pausing before repeat {}",
                        id, reason, repeats
                    );
                    tokio::time::sleep(self.config.transient_pause).await;
                }
                settled => return settled,
            }
        }
    }

    /// Find the highest valid id of `year`, probing upward from `probe_start`
    pub async fn discover(&self, year: u16, probe_start: u32) -> Frontier {
        let threshold = self.config.absence_threshold.max(1);
        let mut highest_valid = probe_start.saturating_sub(1);
        let mut consecutive_absent = 0;
        let mut probed = 0;
        let mut found = 0;
        let mut sequence = probe_start;

        info!("Discovering frontier of {} from id {}", year, probe_start);

        while consecutive_absent < threshold {
            if probed > 0 && !self.config.probe_delay.is_zero() {
                tokio::time::sleep(self.config.probe_delay).await;
            }

            let id = NoticeId::new(year, sequence);
            let outcome = self.probe_settled(id).await;
            probed += 1;

            match outcome {
                ProbeOutcome::Valid => {
                    debug!("Probe {} valid", id);
                    highest_valid = sequence;
                    found += 1;
                    consecutive_absent = 0;
                }
                ProbeOutcome::Transient(reason) => {
                    warn!(
                        "Probe of {} kept failing ({}); stopping discovery of {} at {}",
                        id, reason, year, highest_valid
                    );
                    break;
                }
                ProbeOutcome::Absent => {
                    consecutive_absent += 1;
                    debug!(
                        "Probe {} absent ({}/{} consecutive)",
                        id, consecutive_absent, threshold
                    );
                }
            }

            sequence = match sequence.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        info!(
            "Frontier of {} is {} after {} probes",
            year, highest_valid, probed
        );

        Frontier {
            year,
            start: probe_start,
            highest_valid,
            probed,
            found,
        }
    }

    /// Discover several partitions one after another
    ///
    /// Sequential so the probe delay bounds the overall request rate.
    pub async fn discover_all(
        &self,
        starts: impl IntoIterator<Item = (u16, u32)>,
    ) -> BTreeMap<u16, Frontier> {
        let mut frontiers = BTreeMap::new();
        for (year, start) in starts {
            frontiers.insert(year, self.discover(year, start).await);
        }
        frontiers
    }
}
