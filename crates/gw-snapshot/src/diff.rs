//! Snapshot comparison.

use std::collections::{BTreeMap, BTreeSet};

use crate::cell::Cell;
use crate::snapshot::{Record, Snapshot, SnapshotKind};

/// One differing field of a modified record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Field name.
    pub field: String,
    /// Previous value (`None` if the field was absent).
    pub old: Option<Cell>,
    /// Current value (`None` if the field disappeared).
    pub new: Option<Cell>,
}

/// A record present in both snapshots with different fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Modification<R> {
    /// Identity key.
    pub key: String,
    /// Record from the previous snapshot.
    pub old: R,
    /// Record from the current snapshot.
    pub new: R,
    /// Differing fields, sorted by name.
    pub changes: Vec<FieldChange>,
}

/// Structured difference between two snapshots of one kind.
///
/// Every key of either snapshot appears in exactly one of `added`,
/// `removed`, `modified` and `unchanged`. All lists are sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeReport<R> {
    /// Kind of both snapshots.
    pub kind: SnapshotKind,
    /// Records only in the current snapshot.
    pub added: Vec<R>,
    /// Records only in the previous snapshot.
    pub removed: Vec<R>,
    /// Records in both with differing fields.
    pub modified: Vec<Modification<R>>,
    /// Keys of records identical in both.
    pub unchanged: Vec<String>,
    /// No previous snapshot existed.
    pub first_run: bool,
}

impl<R> ChangeReport<R> {
    /// Whether nothing was added, removed or modified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Whether the report should trigger a notification.
    ///
    /// A first run seeds the baseline and is never reported.
    #[must_use]
    pub fn has_reportable_changes(&self) -> bool {
        !self.first_run && !self.is_empty()
    }

    /// Number of added, removed and modified records.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Compare a snapshot against the previous one.
///
/// Records are matched by [`Record::key`]; a key repeated within one
/// snapshot resolves to its last occurrence. Record order never affects the
/// result. Without a previous snapshot every record is reported as added and
/// `first_run` is set.
#[must_use]
pub fn diff<R: Record>(previous: Option<&Snapshot<R>>, current: &Snapshot<R>) -> ChangeReport<R> {
    let current_by_key = index(current);

    let Some(previous) = previous else {
        return ChangeReport {
            kind: current.kind,
            added: current_by_key.into_values().cloned().collect(),
            removed: Vec::new(),
            modified: Vec::new(),
            unchanged: Vec::new(),
            first_run: true,
        };
    };
    let previous_by_key = index(previous);

    let keys: BTreeSet<&str> = previous_by_key
        .keys()
        .chain(current_by_key.keys())
        .copied()
        .collect();

    let mut report = ChangeReport {
        kind: current.kind,
        added: Vec::new(),
        removed: Vec::new(),
        modified: Vec::new(),
        unchanged: Vec::new(),
        first_run: false,
    };

    for key in keys {
        match (previous_by_key.get(key), current_by_key.get(key)) {
            (None, Some(new)) => report.added.push((*new).clone()),
            (Some(old), None) => report.removed.push((*old).clone()),
            (Some(old), Some(new)) => {
                let changes = field_changes(*old, *new);
                if changes.is_empty() {
                    report.unchanged.push(key.to_owned());
                } else {
                    report.modified.push(Modification {
                        key: key.to_owned(),
                        old: (*old).clone(),
                        new: (*new).clone(),
                        changes,
                    });
                }
            }
            (None, None) => {}
        }
    }

    report
}

fn index<R: Record>(snapshot: &Snapshot<R>) -> BTreeMap<&str, &R> {
    snapshot.records.iter().map(|r| (r.key(), r)).collect()
}

fn field_changes<R: Record>(old: &R, new: &R) -> Vec<FieldChange> {
    let old_fields = old.fields();
    let new_fields = new.fields();
    let names: BTreeSet<&String> = old_fields.keys().chain(new_fields.keys()).collect();

    names
        .into_iter()
        .filter_map(|name| {
            let before = old_fields.get(name);
            let after = new_fields.get(name);
            (before != after).then(|| FieldChange {
                field: name.clone(),
                old: before.cloned(),
                new: after.cloned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::results::ResultRecord;

    fn record(code: &str, grade: &str) -> ResultRecord {
        ResultRecord {
            key: code.to_owned(),
            course_code: Some(code.to_owned()),
            course_name: Some(format!("Course {code}")),
            semester: Some(Cell::Number(3.0)),
            grade: Some(Cell::parse(grade)),
            other: BTreeMap::from([("credits".to_owned(), Cell::Number(4.0))]),
        }
    }

    fn snapshot(records: Vec<ResultRecord>) -> Snapshot<ResultRecord> {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        Snapshot::at(records, at)
    }

    fn keys(records: &[ResultRecord]) -> Vec<&str> {
        records.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn test_first_run_reports_everything_added() {
        let current = snapshot(vec![record("CS102", "B"), record("CS101", "A")]);
        let report = diff(None, &current);

        assert!(report.first_run);
        assert_eq!(keys(&report.added), vec!["CS101", "CS102"]);
        assert!(!report.has_reportable_changes());
    }

    #[test]
    fn test_grade_change() {
        let previous = snapshot(vec![record("CS101", "B"), record("MA101", "A")]);
        let current = snapshot(vec![record("CS101", "A"), record("MA101", "A")]);
        let report = diff(Some(&previous), &current);

        assert_eq!(report.modified.len(), 1);
        let modification = &report.modified[0];
        assert_eq!(modification.key, "CS101");
        assert_eq!(
            modification.changes,
            vec![FieldChange {
                field: "grade".to_owned(),
                old: Some(Cell::Text("B".to_owned())),
                new: Some(Cell::Text("A".to_owned())),
            }]
        );
        assert_eq!(report.unchanged, vec!["MA101"]);
        assert!(report.has_reportable_changes());
    }

    #[test]
    fn test_reordered_records_are_unchanged() {
        let previous = snapshot(vec![record("CS101", "A"), record("CS102", "B")]);
        let current = snapshot(vec![record("CS102", "B"), record("CS101", "A")]);
        let report = diff(Some(&previous), &current);

        assert!(report.is_empty());
        assert_eq!(report.unchanged, vec!["CS101", "CS102"]);
    }

    #[test]
    fn test_order_invariance() {
        let previous = snapshot(vec![record("A1", "B"), record("B2", "C"), record("C3", "A")]);
        let current = snapshot(vec![record("D4", "A"), record("B2", "B"), record("A1", "B")]);

        let mut shuffled_prev = previous.clone();
        shuffled_prev.records.reverse();
        let mut shuffled_curr = current.clone();
        shuffled_curr.records.rotate_left(1);

        assert_eq!(
            diff(Some(&previous), &current),
            diff(Some(&shuffled_prev), &shuffled_curr)
        );
    }

    #[test]
    fn test_idempotent() {
        let previous = snapshot(vec![record("A1", "B"), record("B2", "C")]);
        let current = snapshot(vec![record("A1", "A"), record("C3", "C")]);
        assert_eq!(diff(Some(&previous), &current), diff(Some(&previous), &current));
    }

    #[test]
    fn test_partition() {
        let previous = snapshot(vec![record("A1", "B"), record("B2", "C"), record("C3", "A")]);
        let current = snapshot(vec![record("A1", "B"), record("B2", "A"), record("D4", "O")]);
        let report = diff(Some(&previous), &current);

        assert_eq!(keys(&report.added), vec!["D4"]);
        assert_eq!(keys(&report.removed), vec!["C3"]);
        assert_eq!(
            report.modified.iter().map(|m| m.key.as_str()).collect::<Vec<_>>(),
            vec!["B2"]
        );
        assert_eq!(report.unchanged, vec!["A1"]);

        let mut all: Vec<&str> = keys(&report.added);
        all.extend(keys(&report.removed));
        all.extend(report.modified.iter().map(|m| m.key.as_str()));
        all.extend(report.unchanged.iter().map(String::as_str));
        all.sort_unstable();
        assert_eq!(all, vec!["A1", "B2", "C3", "D4"]);
        assert_eq!(report.change_count(), 3);
    }

    #[test]
    fn test_numeric_normalization() {
        let mut old = record("CS101", "A");
        old.other.insert("credits".to_owned(), Cell::parse("4.0"));
        let new = record("CS101", "A");
        let report = diff(Some(&snapshot(vec![old])), &snapshot(vec![new]));
        assert!(report.is_empty());
    }

    #[test]
    fn test_field_added_and_removed() {
        let old = record("CS101", "A");
        let mut new = record("CS101", "A");
        new.other.clear();
        new.other.insert("result".to_owned(), Cell::parse("PASS"));

        let report = diff(Some(&snapshot(vec![old])), &snapshot(vec![new]));
        assert_eq!(
            report.modified[0].changes,
            vec![
                FieldChange {
                    field: "credits".to_owned(),
                    old: Some(Cell::Number(4.0)),
                    new: None,
                },
                FieldChange {
                    field: "result".to_owned(),
                    old: None,
                    new: Some(Cell::Text("PASS".to_owned())),
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let previous = snapshot(vec![record("CS101", "B")]);
        let current = snapshot(vec![record("CS101", "C"), record("CS101", "B")]);
        let report = diff(Some(&previous), &current);
        assert!(report.is_empty());
        assert_eq!(report.unchanged, vec!["CS101"]);
    }
}
