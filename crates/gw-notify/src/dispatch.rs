//! Whether a cycle notifies, and with what.

use chrono::{DateTime, Utc};
use gw_snapshot::{ChangeReport, Record, Snapshot};

use crate::message::{Notification, changes_notification, snapshot_notification};

/// How a cycle decides to notify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Notify only on reportable changes.
    #[default]
    Normal,
    /// Always send the full current state.
    ForceSnapshot,
}

/// Outcome of the dispatch decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing worth sending.
    Nothing,
    /// Diff summary covering both kinds.
    Changes(Notification),
    /// Full current-state message.
    Snapshot(Notification),
}

impl Dispatch {
    /// The message to send, if any.
    #[must_use]
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Self::Nothing => None,
            Self::Changes(notification) | Self::Snapshot(notification) => Some(notification),
        }
    }
}

/// Decide what to send after a cycle.
///
/// First-run reports count as no change, so seeding a baseline is silent in
/// [`RunMode::Normal`].
#[must_use]
pub fn decide<A: Record, B: Record>(
    mode: RunMode,
    results: (&ChangeReport<A>, &Snapshot<A>),
    attendance: (&ChangeReport<B>, &Snapshot<B>),
    at: DateTime<Utc>,
) -> Dispatch {
    match mode {
        RunMode::ForceSnapshot => {
            Dispatch::Snapshot(snapshot_notification(results.1, attendance.1, at))
        }
        RunMode::Normal
            if results.0.has_reportable_changes() || attendance.0.has_reportable_changes() =>
        {
            Dispatch::Changes(changes_notification(results.0, attendance.0, at))
        }
        RunMode::Normal => Dispatch::Nothing,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;
    use gw_snapshot::{AttendanceRecord, Cell, ResultRecord, diff};
    use pretty_assertions::assert_eq;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 30, 0).unwrap()
    }

    fn results(grade: &str) -> Snapshot<ResultRecord> {
        let record = ResultRecord {
            key: "CS101".to_owned(),
            course_code: Some("CS101".to_owned()),
            course_name: None,
            semester: None,
            grade: Some(Cell::parse(grade)),
            other: BTreeMap::new(),
        };
        Snapshot::at(vec![record], at())
    }

    fn attendance() -> Snapshot<AttendanceRecord> {
        let record = AttendanceRecord {
            key: "CS101".to_owned(),
            course_or_category: "CS101".to_owned(),
            attended: Some(Cell::Number(30.0)),
            total: Some(Cell::Number(32.0)),
            percentage: None,
            other: BTreeMap::new(),
        };
        Snapshot::at(vec![record], at())
    }

    #[test]
    fn test_no_changes_sends_nothing() {
        let (r, a) = (results("A"), attendance());
        let dispatch = decide(
            RunMode::Normal,
            (&diff(Some(&r), &r), &r),
            (&diff(Some(&a), &a), &a),
            at(),
        );
        assert_eq!(dispatch, Dispatch::Nothing);
        assert_eq!(dispatch.notification(), None);
    }

    #[test]
    fn test_first_run_sends_nothing() {
        let (r, a) = (results("A"), attendance());
        let dispatch = decide(
            RunMode::Normal,
            (&diff(None, &r), &r),
            (&diff(None, &a), &a),
            at(),
        );
        assert_eq!(dispatch, Dispatch::Nothing);
    }

    #[test]
    fn test_changes_in_one_kind_send_combined_message() {
        let (old, new, a) = (results("B"), results("A"), attendance());
        let dispatch = decide(
            RunMode::Normal,
            (&diff(Some(&old), &new), &new),
            (&diff(Some(&a), &a), &a),
            at(),
        );
        assert!(matches!(dispatch, Dispatch::Changes(_)), "got {dispatch:?}");
        let notification = dispatch.notification().unwrap();
        assert!(notification.body.contains("Updated result: CS101\n  grade: B -> A"));
        assert!(notification.body.contains("Attendance changes: none detected"));
    }

    #[test]
    fn test_force_snapshot_ignores_diff() {
        let (r, a) = (results("A"), attendance());
        let dispatch = decide(
            RunMode::ForceSnapshot,
            (&diff(Some(&r), &r), &r),
            (&diff(None, &a), &a),
            at(),
        );
        assert!(matches!(dispatch, Dispatch::Snapshot(_)), "got {dispatch:?}");
        let notification = dispatch.notification().unwrap();
        assert_eq!(notification.subject, "Portal snapshot");
        assert!(notification.body.contains("   attended: 30"));
    }
}
