//! Reconciliation of freshly harvested records against a snapshot
//!
//! A record is new when its link is unknown to the snapshot and updated when
//! at least one of its non-empty values differs from the stored one. Values
//! are compared after the same normalization the output writer applies, so a
//! run reconciled against its own output finds nothing to report.
//!
//! A value that became empty on the origin is not treated as a change.

use serde::Serialize;
use tracing::{debug, info};

use super::models::{Record, RecordStatus};
use super::output::normalize_value;
use super::snapshot::Snapshot;

/// Classification of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    New,
    Updated,
    Unchanged,
}

/// New and updated records of a run
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    /// Records to write, tagged with their status, in batch order
    pub records: Vec<Record>,
    pub new_count: usize,
    pub updated_count: usize,
    pub unchanged_count: usize,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            new: self.new_count,
            updated: self.updated_count,
            unchanged: self.unchanged_count,
        }
    }
}

/// Counters of a changeset, for summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCounts {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Compare one record with the snapshot
pub fn classify(record: &Record, snapshot: &Snapshot) -> Classification {
    let link = record.link();
    if !snapshot.contains(link) {
        return Classification::New;
    }

    let changed = record.flat_fields().find(|(column, value)| {
        let fresh = normalize_value(column, value);
        if fresh.is_empty() {
            return false;
        }
        fresh != normalize_value(column, snapshot.value(link, column))
    });

    match changed {
        Some((column, _)) => {
            debug!("{} changed in column '{}'", link, column);
            Classification::Updated
        }
        None => Classification::Unchanged,
    }
}

/// Keep only new and updated records, tagging each with its status
pub fn reconcile(records: Vec<Record>, snapshot: &Snapshot) -> Changeset {
    let mut changeset = Changeset::default();

    for record in records {
        match classify(&record, snapshot) {
            Classification::New => {
                changeset.new_count += 1;
                changeset.records.push(record.with_status(RecordStatus::New));
            }
            Classification::Updated => {
                changeset.updated_count += 1;
                changeset
                    .records
                    .push(record.with_status(RecordStatus::Updated));
            }
            Classification::Unchanged => changeset.unchanged_count += 1,
        }
    }

    info!(
        "Reconciled against {} snapshot records: {} new, {} updated, {} unchanged",
        snapshot.len(),
        changeset.new_count,
        changeset.updated_count,
        changeset.unchanged_count
    );
    changeset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::Category;
    use std::collections::HashMap;

    const LINK: &str = "https://n.test/60-Day-Notice-2020-00001";

    fn snapshot(values: &[(&str, &str)]) -> Snapshot {
        let row: HashMap<String, String> = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Snapshot::from_rows([(LINK.to_string(), row)])
    }

    fn fresh(values: &[(Category, &str, &str)]) -> Record {
        let mut record = Record::new(LINK).unwrap();
        for (category, field, value) in values {
            record.insert(*category, *field, *value);
        }
        record
    }

    #[test]
    fn test_unknown_link_is_new() {
        let record = Record::new("https://n.test/60-Day-Notice-2020-00002").unwrap();
        let changeset = reconcile(vec![record], &snapshot(&[]));

        assert_eq!(changeset.len(), 1);
        assert_eq!(changeset.records[0].status(), Some(RecordStatus::New));
        assert_eq!(changeset.new_count, 1);
    }

    #[test]
    fn test_single_difference_is_updated() {
        let snap = snapshot(&[("AG Number", "2020-00001"), ("Source", "Toys")]);
        let record = fresh(&[
            (Category::Main, "AG Number", "2020-00001"),
            (Category::Main, "Source", "Cookware"),
        ]);

        assert_eq!(classify(&record, &snap), Classification::Updated);
        let changeset = reconcile(vec![record], &snap);
        assert_eq!(changeset.records[0].status(), Some(RecordStatus::Updated));
        assert_eq!(changeset.updated_count, 1);
    }

    #[test]
    fn test_identical_record_is_excluded() {
        let snap = snapshot(&[("AG Number", "2020-00001"), ("Source", "Toys")]);
        let record = fresh(&[
            (Category::Main, "AG Number", "2020-00001"),
            (Category::Main, "Source", " Toys "),
        ]);

        let changeset = reconcile(vec![record], &snap);
        assert!(changeset.is_empty());
        assert_eq!(changeset.unchanged_count, 1);
    }

    #[test]
    fn test_empty_fresh_value_is_not_a_change() {
        let snap = snapshot(&[("Source", "Toys")]);
        let record = fresh(&[(Category::Main, "Source", "")]);
        assert_eq!(classify(&record, &snap), Classification::Unchanged);
    }

    #[test]
    fn test_value_missing_from_snapshot_is_a_change() {
        let snap = snapshot(&[("AG Number", "2020-00001")]);
        let record = fresh(&[(Category::Settlement(1), "Case Name", "People v. Acme")]);
        assert_eq!(classify(&record, &snap), Classification::Updated);
    }

    #[test]
    fn test_monetary_values_compare_normalized() {
        let snap = snapshot(&[("Settlement_1_Total Payments", "1234.0")]);
        let record = fresh(&[(Category::Settlement(1), "Total Payments", "$1,234.00")]);
        assert_eq!(classify(&record, &snap), Classification::Unchanged);
    }
}
