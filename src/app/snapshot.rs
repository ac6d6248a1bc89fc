//! Comparison snapshot of previously harvested records
//!
//! A snapshot is a prior output file loaded read-only and keyed by notice link.
//! It is the base for reconciliation and, in snapshot-driven runs, the source
//! of candidate URLs and per-year discovery starting points.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use super::models::NoticeId;
use super::tabular::read_rows;
use crate::constants::columns;
use crate::errors::{ConfigError, ConfigResult};

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"https?://[^\s\)\]>"]+"#).expect("link pattern is a valid regex")
    })
}

/// Pull the first URL out of a link cell
///
/// Handles bare URLs, markdown links (`[text](url)`) and URLs embedded in
/// surrounding text. Parseable URLs come back in the same normalized form
/// harvested records are keyed by.
pub fn extract_link(cell: &str) -> Option<String> {
    link_pattern().find(cell.trim()).map(|m| {
        let raw = m.as_str();
        Url::parse(raw)
            .map(String::from)
            .unwrap_or_else(|_| raw.to_string())
    })
}

/// Previously harvested records keyed by link
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    rows: HashMap<String, HashMap<String, String>>,
    order: Vec<String>,
}

impl Snapshot {
    /// Load a snapshot from a CSV, TSV or Excel file
    ///
    /// The link column is the one headed `link` (any case), or the first
    /// column. Rows without a URL in the link column are skipped; when a link
    /// repeats, the first row wins.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut rows = read_rows(path)?.into_iter();
        let headers: Vec<String> = rows
            .next()
            .unwrap_or_default()
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(String::is_empty) {
            return Err(ConfigError::MissingLinkColumn {
                path: path.to_path_buf(),
            });
        }
        let link_column = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(columns::LINK))
            .unwrap_or(0);
        debug!(
            "Using column '{}' of {} as link column",
            headers[link_column],
            path.display()
        );

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            let Some(link) = row.get(link_column).and_then(|cell| extract_link(cell)) else {
                skipped += 1;
                continue;
            };
            let values = headers
                .iter()
                .enumerate()
                .filter(|(i, name)| *i != link_column && !name.is_empty())
                .map(|(i, name)| {
                    let value = row.get(i).cloned().unwrap_or_default();
                    (name.clone(), value)
                })
                .collect();
            records.push((link, values));
        }

        if skipped > 0 {
            warn!(
                "Skipped {} rows without a link in {}",
                skipped,
                path.display()
            );
        }

        let snapshot = Self::from_rows(records);
        info!(
            "Loaded snapshot of {} records from {}",
            snapshot.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// Build a snapshot from `(link, columns)` rows
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, HashMap<String, String>)>,
    {
        let mut snapshot = Self::default();
        for (link, values) in rows {
            if snapshot.rows.contains_key(&link) {
                debug!("Duplicate snapshot link {}, keeping first row", link);
                continue;
            }
            snapshot.order.push(link.clone());
            snapshot.rows.insert(link, values);
        }
        snapshot
    }

    pub fn get(&self, link: &str) -> Option<&HashMap<String, String>> {
        self.rows.get(link)
    }

    /// Stored value of `column` for `link`; missing values read as empty
    pub fn value(&self, link: &str, column: &str) -> &str {
        self.rows
            .get(link)
            .and_then(|row| row.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn contains(&self, link: &str) -> bool {
        self.rows.contains_key(link)
    }

    /// Links in file order
    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Highest known sequence per year among links that parse as notice ids
    pub fn frontier_by_partition(&self) -> BTreeMap<u16, u32> {
        let mut frontier = BTreeMap::new();
        for id in self.links().filter_map(NoticeId::from_link) {
            frontier
                .entry(id.year)
                .and_modify(|max: &mut u32| *max = (*max).max(id.sequence))
                .or_insert(id.sequence);
        }
        frontier
    }
}

/// Load the comparison snapshot at `path`
pub fn load_snapshot(path: &Path) -> ConfigResult<Snapshot> {
    Snapshot::load(path)
}
