//! Data models for Notice Harvester
//!
//! This module defines the core data structures shared by every stage of the
//! pipeline: notice identifiers, partition bounds, record categories and the
//! extracted [`Record`] itself.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{columns, origin, partitions};
use crate::errors::{ExtractionError, ExtractionResult};

/// Identifier of a single notice: a partition (year) and a sequence number
///
/// Displays as `{year}-{sequence:05}`, the form used in notice URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoticeId {
    pub year: u16,
    pub sequence: u32,
}

impl NoticeId {
    pub fn new(year: u16, sequence: u32) -> Self {
        Self { year, sequence }
    }

    /// Build the page URL of this notice under `base_url`
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}{}",
            base_url.trim_end_matches('/'),
            origin::NOTICE_PATH_PREFIX,
            self
        )
    }

    /// Recover the identifier from a notice link
    ///
    /// Accepts any string whose last path segment looks like
    /// `60-Day-Notice-YYYY-NNNNN`; trailing slashes are ignored.
    pub fn from_link(link: &str) -> Option<Self> {
        let segment = link.trim().trim_end_matches('/').rsplit('/').next()?;
        let id = segment.strip_prefix(origin::NOTICE_PATH_PREFIX)?;
        id.parse().ok()
    }
}

impl fmt::Display for NoticeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:0width$}",
            self.year,
            self.sequence,
            width = origin::SEQUENCE_WIDTH
        )
    }
}

impl FromStr for NoticeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, sequence) = s
            .split_once('-')
            .ok_or_else(|| format!("'{}' is not of the form YYYY-NNNNN", s))?;
        let year = year
            .parse::<u16>()
            .map_err(|e| format!("invalid year in '{}': {}", s, e))?;
        let sequence = sequence
            .parse::<u32>()
            .map_err(|e| format!("invalid sequence in '{}': {}", s, e))?;
        Ok(Self { year, sequence })
    }
}

/// Known inclusive id range of a single partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRange {
    pub start: u32,
    pub end: u32,
}

/// Per-year start and end ids used to generate candidates
///
/// Passed into the orchestrator as an immutable value; never global state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionBounds {
    ranges: BTreeMap<u16, PartitionRange>,
}

impl PartitionBounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds shipped with the application
    pub fn defaults() -> Self {
        partitions::DEFAULT_BOUNDS
            .iter()
            .fold(Self::new(), |bounds, &(year, start, end)| {
                bounds.with_partition(year, start, end)
            })
    }

    /// Add or replace the range of one partition
    pub fn with_partition(mut self, year: u16, start: u32, end: u32) -> Self {
        self.ranges.insert(year, PartitionRange { start, end });
        self
    }

    pub fn range(&self, year: u16) -> Option<PartitionRange> {
        self.ranges.get(&year).copied()
    }

    /// First id of a partition, defaulting to 1 for unknown years
    pub fn start_id(&self, year: u16) -> u32 {
        self.range(year).map(|r| r.start).unwrap_or(1)
    }

    /// Last known id of a partition, if any
    pub fn end_id(&self, year: u16) -> Option<u32> {
        self.range(year).map(|r| r.end)
    }

    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.ranges.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Every id between start and end of each known partition within `years`
    ///
    /// Years without bounds are skipped.
    pub fn generate_ids(&self, years: RangeInclusive<u16>) -> Vec<NoticeId> {
        if years.is_empty() {
            return Vec::new();
        }
        self.ranges
            .range(years)
            .flat_map(|(&year, range)| {
                (range.start..=range.end).map(move |sequence| NoticeId::new(year, sequence))
            })
            .collect()
    }
}

/// Logical grouping of extracted fields
///
/// Repeated sections carry their 1-based ordinal. Ordering follows output
/// column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Main,
    CivilComplaint,
    Settlement(u8),
    CorrectedSettlement(u8),
    Judgment(u8),
}

impl Category {
    /// Prefix prepended to field names when flattening to columns
    pub fn column_prefix(&self) -> String {
        match self {
            Category::Main => String::new(),
            Category::CivilComplaint => "Civil_Complaint_".to_string(),
            Category::Settlement(n) => format!("Settlement_{}_", n),
            Category::Judgment(n) => format!("Judgment_{}_", n),
            Category::CorrectedSettlement(n) => format!("Corrected_Settlement_{}_", n),
        }
    }

    /// Flat column name of `field` within this category
    pub fn column_name(&self, field: &str) -> String {
        format!("{}{}", self.column_prefix(), field)
    }

    /// Field names this category carries in the fixed layout
    pub fn layout_fields(&self) -> &'static [&'static str] {
        match self {
            Category::Main => columns::MAIN_FIELDS,
            Category::CivilComplaint => columns::CIVIL_COMPLAINT_FIELDS,
            Category::Settlement(_) | Category::CorrectedSettlement(_) => {
                columns::SETTLEMENT_FIELDS
            }
            Category::Judgment(_) => columns::JUDGMENT_FIELDS,
        }
    }
}

/// Classification of a record relative to a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    New,
    Updated,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::New => write!(f, "New"),
            RecordStatus::Updated => write!(f, "Updated"),
        }
    }
}

/// Structured content extracted from one notice page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    link: String,
    categories: BTreeMap<Category, BTreeMap<String, String>>,
    status: Option<RecordStatus>,
}

impl Record {
    /// Create an empty record for `link`
    pub fn new(link: impl Into<String>) -> ExtractionResult<Self> {
        let link = link.into().trim().to_string();
        if link.is_empty() {
            return Err(ExtractionError::EmptyLink);
        }
        Ok(Self {
            link,
            categories: BTreeMap::new(),
            status: None,
        })
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn status(&self) -> Option<RecordStatus> {
        self.status
    }

    /// Tag the record with its reconciliation outcome
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set a field value, creating the category if needed
    pub fn insert(
        &mut self,
        category: Category,
        field: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.categories
            .entry(category)
            .or_default()
            .insert(field.into(), value.into());
    }

    pub fn field(&self, category: Category, field: &str) -> Option<&str> {
        self.categories
            .get(&category)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.categories.contains_key(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.keys().copied()
    }

    /// All `(column, value)` pairs in category order
    ///
    /// The identifier is not part of the flat view; a field literally named
    /// `link` is skipped as well.
    pub fn flat_fields(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.categories.iter().flat_map(|(category, fields)| {
            fields
                .iter()
                .filter(|(field, _)| field.as_str() != columns::LINK)
                .map(move |(field, value)| (category.column_name(field), value.as_str()))
        })
    }
}
