//! Attendance table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cell::Cell;
use crate::error::SnapshotError;
use crate::snapshot::{Record, Snapshot, SnapshotKind};
use crate::table::{ColumnMap, FieldSpec, find_table};

const COURSE: &str = "course_or_category";
const ATTENDED: &str = "attended";
const TOTAL: &str = "total";
const PERCENTAGE: &str = "percentage";

const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: COURSE,
        aliases: &[
            "course_or_category",
            "course_code",
            "course",
            "subject_code",
            "subject",
            "category",
        ],
        default_position: Some(0),
    },
    FieldSpec {
        name: ATTENDED,
        aliases: &[
            "attended",
            "present",
            "total_present",
            "hours_attended",
            "classes_attended",
            "present_hours",
        ],
        default_position: None,
    },
    FieldSpec {
        name: TOTAL,
        aliases: &[
            "total",
            "total_hours",
            "total_classes",
            "conducted",
            "hours_conducted",
            "classes_conducted",
        ],
        default_position: None,
    },
    FieldSpec {
        name: PERCENTAGE,
        aliases: &[
            "percentage",
            "percent",
            "pct",
            "attendance",
            "attendance_percentage",
            "percentage_of_attendance",
        ],
        default_position: None,
    },
];

/// One row of the attendance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Identity key: the course or category, or `row_<n>` when blank.
    pub key: String,
    /// Course code or attendance category as shown.
    pub course_or_category: String,
    /// Hours or classes attended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attended: Option<Cell>,
    /// Hours or classes conducted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Cell>,
    /// Attendance percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Cell>,
    /// Remaining columns by normalized header.
    #[serde(default)]
    pub other: BTreeMap<String, Cell>,
}

impl Record for AttendanceRecord {
    const KIND: SnapshotKind = SnapshotKind::Attendance;

    fn key(&self) -> &str {
        &self.key
    }

    fn fields(&self) -> BTreeMap<String, Cell> {
        let mut fields = self.other.clone();
        for (name, value) in [
            (ATTENDED, &self.attended),
            (TOTAL, &self.total),
            (PERCENTAGE, &self.percentage),
        ] {
            if let Some(value) = value {
                fields.insert(name.to_owned(), value.clone());
            }
        }
        fields
    }
}

/// Parse the attendance table into a snapshot.
///
/// # Errors
///
/// - [`SnapshotError::TableNotFound`] if the table is missing
/// - [`SnapshotError::Parse`] if no column is recognizable or the table has
///   no data rows
pub fn parse_attendance(
    html: &str,
    table_id: &str,
) -> Result<Snapshot<AttendanceRecord>, SnapshotError> {
    let table = find_table(html, table_id)?;
    let columns = ColumnMap::build(&table.headers, FIELDS);
    if columns.is_empty() {
        return Err(SnapshotError::Parse(format!(
            "unexpected headers in attendance table '{table_id}': {:?}",
            table.headers
        )));
    }
    if table.rows.is_empty() {
        return Err(SnapshotError::Parse(format!(
            "no attendance rows in table '{table_id}'"
        )));
    }

    let records: Vec<_> = table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let course_or_category = columns.text(row, COURSE).unwrap_or_default().to_owned();
            let key = if course_or_category.is_empty() {
                format!("row_{}", index + 1)
            } else {
                course_or_category.clone()
            };
            AttendanceRecord {
                key,
                course_or_category,
                attended: columns.cell(row, ATTENDED),
                total: columns.cell(row, TOTAL),
                percentage: columns.cell(row, PERCENTAGE),
                other: columns.other_fields(row),
            }
        })
        .collect();

    debug!(count = records.len(), "Parsed attendance records");
    Ok(Snapshot::new(records))
}
