//! Academic results table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cell::Cell;
use crate::error::SnapshotError;
use crate::snapshot::{Record, Snapshot, SnapshotKind};
use crate::table::{ColumnMap, FieldSpec, find_table};

const COURSE_CODE: &str = "course_code";
const COURSE_NAME: &str = "course_name";
const SEMESTER: &str = "semester";
const GRADE: &str = "grade";

const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: SEMESTER,
        aliases: &["semester", "sem"],
        default_position: Some(0),
    },
    FieldSpec {
        name: COURSE_CODE,
        aliases: &["course_code", "code", "subject_code", "sub_code", "paper_code"],
        default_position: Some(1),
    },
    FieldSpec {
        name: COURSE_NAME,
        aliases: &[
            "course_title",
            "course_name",
            "course",
            "title",
            "subject",
            "subject_name",
            "subject_title",
        ],
        default_position: Some(2),
    },
    FieldSpec {
        name: GRADE,
        aliases: &["grade", "grade_remark", "grade_obtained", "grade_point_remark"],
        default_position: Some(4),
    },
];

/// One course row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Identity key: `semester|course code` (the course title stands in for
    /// a missing code; the semester is left out when the table has none).
    pub key: String,
    /// Course code, when the table has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    /// Course title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    /// Semester the course belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<Cell>,
    /// Grade or remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Cell>,
    /// Remaining columns (credits, result, ...) by normalized header.
    #[serde(default)]
    pub other: BTreeMap<String, Cell>,
}

impl Record for ResultRecord {
    const KIND: SnapshotKind = SnapshotKind::Results;

    fn key(&self) -> &str {
        &self.key
    }

    fn fields(&self) -> BTreeMap<String, Cell> {
        let mut fields = self.other.clone();
        if let Some(name) = &self.course_name {
            fields.insert(COURSE_NAME.to_owned(), Cell::Text(name.clone()));
        }
        if let Some(semester) = &self.semester {
            fields.insert(SEMESTER.to_owned(), semester.clone());
        }
        if let Some(grade) = &self.grade {
            fields.insert(GRADE.to_owned(), grade.clone());
        }
        fields
    }
}

/// Parse the results table into a snapshot.
///
/// # Errors
///
/// - [`SnapshotError::TableNotFound`] if the table is missing
/// - [`SnapshotError::Parse`] if no column is recognizable or no row yields
///   a record
pub fn parse_results(html: &str, table_id: &str) -> Result<Snapshot<ResultRecord>, SnapshotError> {
    let table = find_table(html, table_id)?;
    let columns = ColumnMap::build(&table.headers, FIELDS);
    if columns.position(COURSE_CODE).is_none() && columns.position(COURSE_NAME).is_none() {
        return Err(SnapshotError::Parse(format!(
            "unexpected headers in results table '{table_id}': {:?}",
            table.headers
        )));
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for (index, row) in table.rows.iter().enumerate() {
        let course_code = non_empty(columns.text(row, COURSE_CODE));
        let course_name = non_empty(columns.text(row, COURSE_NAME));
        let semester = columns.cell(row, SEMESTER).filter(|c| !c.is_blank());

        // A retaken course repeats its code in a later semester.
        let key = match (course_code.as_ref().or(course_name.as_ref()), &semester) {
            (Some(id), Some(semester)) => format!("{semester}|{id}"),
            (Some(id), None) => id.clone(),
            (None, _) => {
                warn!(row = index + 1, "Skipping result row without course code or title");
                continue;
            }
        };

        records.push(ResultRecord {
            key,
            course_code,
            course_name,
            semester,
            grade: columns.cell(row, GRADE),
            other: columns.other_fields(row),
        });
    }

    if records.is_empty() {
        return Err(SnapshotError::Parse(format!(
            "no result rows in table '{table_id}'"
        )));
    }

    debug!(count = records.len(), "Parsed result records");
    Ok(Snapshot::new(records))
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.is_empty()).map(str::to_owned)
}
