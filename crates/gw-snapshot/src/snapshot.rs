//! Snapshot and record types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;

/// Which portal table a snapshot was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// Academic results.
    Results,
    /// Attendance.
    Attendance,
}

impl SnapshotKind {
    /// Stem used for the persisted baseline and lock files.
    #[must_use]
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Results => "results",
            Self::Attendance => "attendance",
        }
    }

    /// Singular noun for one record of this kind.
    #[must_use]
    pub fn record_label(self) -> &'static str {
        match self {
            Self::Results => "result",
            Self::Attendance => "attendance entry",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// A parsed table row with a stable identity.
pub trait Record: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned {
    /// Kind of snapshot this record belongs to.
    const KIND: SnapshotKind;

    /// Identity key used to match records across snapshots.
    fn key(&self) -> &str;

    /// Non-key fields by name. Absent cells are left out.
    fn fields(&self) -> BTreeMap<String, Cell>;
}

/// Point-in-time capture of one portal table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<R> {
    /// Kind tag, checked when a persisted baseline is loaded.
    pub kind: SnapshotKind,
    /// When the page was parsed.
    pub captured_at: DateTime<Utc>,
    /// Records in page order.
    pub records: Vec<R>,
}

impl<R: Record> Snapshot<R> {
    /// Snapshot captured now.
    #[must_use]
    pub fn new(records: Vec<R>) -> Self {
        Self::at(records, Utc::now())
    }

    /// Snapshot with an explicit capture time.
    #[must_use]
    pub fn at(records: Vec<R>, captured_at: DateTime<Utc>) -> Self {
        Self {
            kind: R::KIND,
            captured_at,
            records,
        }
    }

    /// Look up a record by key (last occurrence wins).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&R> {
        self.records.iter().rev().find(|r| r.key() == key)
    }
}
