//! Portal tables as structured snapshots, and the diff between them.
//!
//! Parsers turn the results and attendance pages into [`Snapshot`]s of
//! typed records; [`diff`] compares a snapshot against the previous one and
//! produces a deterministic [`ChangeReport`].
//!
//! # Example
//!
//! ```ignore
//! use gw_snapshot::{diff, parse_results};
//!
//! let current = parse_results(&html, "DgResult")?;
//! let report = diff(previous.as_ref(), &current);
//! if report.has_reportable_changes() {
//!     // notify
//! }
//! ```

mod attendance;
mod cell;
mod diff;
mod error;
mod results;
mod snapshot;
mod table;

pub use attendance::{AttendanceRecord, parse_attendance};
pub use cell::{Cell, normalize_text};
pub use diff::{ChangeReport, FieldChange, Modification, diff};
pub use error::SnapshotError;
pub use results::{ResultRecord, parse_results};
pub use snapshot::{Record, Snapshot, SnapshotKind};
pub use table::{ColumnMap, FieldSpec, HtmlTable, find_table, normalize_header};
