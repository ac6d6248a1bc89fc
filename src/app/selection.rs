//! Candidate selection
//!
//! A run harvests one of five candidate sets, picked from the request in
//! priority order: an explicit URL list, the links of a comparison snapshot,
//! a year range with fixed bounds, a year range whose end is discovered, or
//! the built-in fallback list.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use super::client::Fetcher;
use super::frontier::FrontierDiscoverer;
use super::models::{NoticeId, PartitionBounds};
use super::snapshot::Snapshot;
use super::tabular::{read_url_list, UrlColumn};
use crate::constants::origin;
use crate::errors::{ConfigError, ConfigResult};

/// What the user asked to harvest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Inclusive range of years
    pub years: Option<(u16, u16)>,
    /// Snapshot to reconcile against
    pub compare: Option<PathBuf>,
    /// Explicit URL list
    pub input: Option<PathBuf>,
    /// Column of the URL list holding the links
    pub input_column: UrlColumn,
    /// Probe past known partition ends
    pub auto_discover: bool,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            years: None,
            compare: None,
            input: None,
            input_column: UrlColumn::default(),
            auto_discover: true,
        }
    }
}

/// How candidate URLs are derived
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunMode {
    ExplicitList { path: PathBuf, column: UrlColumn },
    SnapshotDriven { auto_discover: bool },
    RangeGenerated { start: u16, end: u16 },
    RangeAutoDiscovered { start: u16, end: u16 },
    Fallback,
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::ExplicitList { .. } => "explicit-list",
            RunMode::SnapshotDriven { .. } => "snapshot-driven",
            RunMode::RangeGenerated { .. } => "range-generated",
            RunMode::RangeAutoDiscovered { .. } => "range-auto-discovered",
            RunMode::Fallback => "fallback",
        }
    }

    /// Resolve the candidate URLs of this mode
    ///
    /// Probing happens only in the discovering modes. Snapshot-driven runs
    /// need the loaded snapshot.
    pub async fn candidates<F: Fetcher>(
        &self,
        bounds: &PartitionBounds,
        snapshot: Option<&Snapshot>,
        discoverer: &FrontierDiscoverer<F>,
        base_url: &str,
    ) -> ConfigResult<Vec<String>> {
        let urls = match self {
            RunMode::ExplicitList { path, column } => read_url_list(path, column)?,
            RunMode::SnapshotDriven { auto_discover } => {
                let snapshot = snapshot.ok_or_else(|| ConfigError::InvalidValue {
                    field: "compare".to_string(),
                    value: String::new(),
                    reason: "snapshot-driven runs need a loaded snapshot".to_string(),
                })?;
                let mut urls: Vec<String> = snapshot.links().map(str::to_string).collect();
                if *auto_discover {
                    let starts = snapshot
                        .frontier_by_partition()
                        .into_iter()
                        .map(|(year, max_seq)| (year, max_seq.saturating_add(1)));
                    for (year, frontier) in discoverer.discover_all(starts).await {
                        if !frontier.found_any() {
                            continue;
                        }
                        info!(
                            "Found notices {}..={} of {} beyond the snapshot",
                            frontier.start, frontier.highest_valid, year
                        );
                        urls.extend(
                            (frontier.start..=frontier.highest_valid)
                                .map(|seq| NoticeId::new(year, seq).url(base_url)),
                        );
                    }
                }
                urls
            }
            RunMode::RangeGenerated { start, end } => bounds
                .generate_ids(*start..=*end)
                .iter()
                .map(|id| id.url(base_url))
                .collect(),
            RunMode::RangeAutoDiscovered { start, end } => {
                let starts = (*start..=*end).map(|year| {
                    let probe_start = match bounds.end_id(year) {
                        Some(end_id) => end_id.saturating_add(1),
                        None => bounds.start_id(year),
                    };
                    (year, probe_start)
                });
                let frontiers = discoverer.discover_all(starts).await;

                let mut urls = Vec::new();
                for (year, frontier) in frontiers {
                    let last = frontier
                        .highest_valid
                        .max(bounds.end_id(year).unwrap_or(0));
                    let first = bounds.start_id(year);
                    if last < first {
                        warn!("No notices found for {}", year);
                        continue;
                    }
                    urls.extend((first..=last).map(|seq| NoticeId::new(year, seq).url(base_url)));
                }
                urls
            }
            RunMode::Fallback => origin::FALLBACK_NOTICE_IDS
                .iter()
                .filter_map(|id| match id.parse::<NoticeId>() {
                    Ok(id) => Some(id.url(base_url)),
                    Err(e) => {
                        warn!("Skipping malformed fallback id {}: {}", id, e);
                        None
                    }
                })
                .collect(),
        };

        Ok(dedup_preserving_order(urls))
    }
}

fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

/// Pick the run mode for a request
pub fn select_mode(request: &RunRequest) -> RunMode {
    if let Some(path) = &request.input {
        return RunMode::ExplicitList {
            path: path.clone(),
            column: request.input_column.clone(),
        };
    }
    if request.compare.is_some() {
        return RunMode::SnapshotDriven {
            auto_discover: request.auto_discover,
        };
    }
    match request.years {
        Some((start, end)) if request.auto_discover => RunMode::RangeAutoDiscovered { start, end },
        Some((start, end)) => RunMode::RangeGenerated { start, end },
        None => RunMode::Fallback,
    }
}
