//! Plain-text notification bodies.

use chrono::{DateTime, Utc};
use gw_snapshot::{Cell, ChangeReport, Record, Snapshot, SnapshotKind};

/// Subject of the combined change notification.
pub const CHANGES_SUBJECT: &str = "Attendance/results updated";
/// Subject of the full snapshot notification.
pub const SNAPSHOT_SUBJECT: &str = "Portal snapshot";
/// Subject of the login notice.
pub const LOGIN_SUBJECT: &str = "Portal login successful";

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Subject line.
    pub subject: String,
    /// Plain-text body, newline-terminated.
    pub body: String,
}

impl Notification {
    fn new(subject: &str, lines: &[String]) -> Self {
        let body = lines.join("\n").trim().to_owned() + "\n";
        Self {
            subject: subject.to_owned(),
            body,
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    format!("Timestamp: {}", at.format("%Y-%m-%d %H:%M:%S UTC"))
}

fn section_title(kind: SnapshotKind) -> &'static str {
    match kind {
        SnapshotKind::Results => "Result",
        SnapshotKind::Attendance => "Attendance",
    }
}

fn value(cell: Option<&Cell>) -> String {
    cell.map_or_else(|| "(none)".to_owned(), ToString::to_string)
}

/// Render one report as a titled section.
fn change_section<R: Record>(report: &ChangeReport<R>) -> Vec<String> {
    let title = section_title(report.kind);
    let label = report.kind.record_label();

    if !report.has_reportable_changes() {
        return vec![format!("{title} changes: none detected during this run.")];
    }

    let mut lines = vec![format!("{title} changes:")];
    for record in &report.added {
        lines.push(format!("New {label}: {}", record.key()));
        for (field, cell) in record.fields() {
            lines.push(format!("  {field}: {cell}"));
        }
        lines.push(String::new());
    }
    for record in &report.removed {
        lines.push(format!("Removed {label}: {}", record.key()));
        lines.push(String::new());
    }
    for modification in &report.modified {
        lines.push(format!("Updated {label}: {}", modification.key));
        for change in &modification.changes {
            lines.push(format!(
                "  {}: {} -> {}",
                change.field,
                value(change.old.as_ref()),
                value(change.new.as_ref())
            ));
        }
        lines.push(String::new());
    }
    lines
}

/// Combined change notification covering both kinds.
#[must_use]
pub fn changes_notification<A: Record, B: Record>(
    results: &ChangeReport<A>,
    attendance: &ChangeReport<B>,
    at: DateTime<Utc>,
) -> Notification {
    let mut lines = vec![
        "Attendance/results updated.".to_owned(),
        timestamp(at),
        String::new(),
    ];
    lines.extend(change_section(results));
    lines.push(String::new());
    lines.extend(change_section(attendance));
    Notification::new(CHANGES_SUBJECT, &lines)
}

fn snapshot_section<R: Record>(snapshot: &Snapshot<R>) -> Vec<String> {
    let title = match snapshot.kind {
        SnapshotKind::Results => "Results:",
        SnapshotKind::Attendance => "Attendance:",
    };
    let mut lines = vec![title.to_owned()];
    if snapshot.records.is_empty() {
        lines.push(format!(
            "  No {} records were parsed.",
            snapshot.kind.record_label()
        ));
        return lines;
    }

    for (index, record) in snapshot.records.iter().enumerate() {
        lines.push(format!("{}. ({})", index + 1, record.key()));
        for (field, cell) in record.fields() {
            lines.push(format!("   {field}: {cell}"));
        }
        lines.push(String::new());
    }
    lines
}

/// Full current-state notification.
#[must_use]
pub fn snapshot_notification<A: Record, B: Record>(
    results: &Snapshot<A>,
    attendance: &Snapshot<B>,
    at: DateTime<Utc>,
) -> Notification {
    let mut lines = vec![
        "Current portal snapshot.".to_owned(),
        timestamp(at),
        String::new(),
    ];
    lines.extend(snapshot_section(results));
    lines.push(String::new());
    lines.extend(snapshot_section(attendance));
    Notification::new(SNAPSHOT_SUBJECT, &lines)
}

/// Notice that the portal login worked.
#[must_use]
pub fn login_notification(at: DateTime<Utc>) -> Notification {
    Notification::new(
        LOGIN_SUBJECT,
        &["Login to the portal succeeded.".to_owned(), timestamp(at)],
    )
}
