//! HTML table extraction and header-to-field mapping.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::cell::{Cell, normalize_text};
use crate::error::SnapshotError;

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("static selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("static selector"));

/// Text content of one `<table>`: a header row and data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTable {
    /// Whitespace-normalized header cell texts.
    pub headers: Vec<String>,
    /// Whitespace-normalized data cell texts, one vector per row.
    pub rows: Vec<Vec<String>>,
}

/// Find `<table id="...">` and read its rows.
///
/// Only rows belonging to this table are read; rows of nested tables are
/// ignored. The first row is the header. Later rows without any `<td>`
/// (spacers, repeated headers) are skipped.
///
/// # Errors
///
/// - [`SnapshotError::TableNotFound`] if no table has the id
/// - [`SnapshotError::Parse`] if the table has no rows at all
pub fn find_table(html: &str, table_id: &str) -> Result<HtmlTable, SnapshotError> {
    let document = Html::parse_document(html);
    let table = document
        .select(&TABLE)
        .find(|t| t.value().id() == Some(table_id))
        .ok_or_else(|| SnapshotError::TableNotFound(table_id.to_owned()))?;

    let mut rows = table
        .select(&ROW)
        .filter(|row| owning_table(*row) == Some(table));

    let header = rows
        .next()
        .ok_or_else(|| SnapshotError::Parse(format!("table '{table_id}' has no rows")))?;
    let headers = cells(header).map(cell_text).collect();

    let rows = rows
        .filter(|row| cells(*row).any(|c| c.value().name() == "td"))
        .map(|row| cells(row).map(cell_text).collect())
        .collect();

    Ok(HtmlTable { headers, rows })
}

fn owning_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

fn cells(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "td" | "th"))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    normalize_text(&cell.text().collect::<String>())
}

/// Normalize header text into a field name: `"Grade / Remark"` becomes
/// `grade_remark`. Returns an empty string for blank headers.
#[must_use]
pub fn normalize_header(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// A typed field a parser wants to locate in a table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name.
    pub name: &'static str,
    /// Normalized header texts that identify the field.
    pub aliases: &'static [&'static str],
    /// Column used when the header is ambiguous or blank.
    pub default_position: Option<usize>,
}

/// Header-to-field lookup, built once per parsed table.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    columns: Vec<String>,
    assigned: BTreeMap<&'static str, usize>,
}

impl ColumnMap {
    /// Resolve every field spec against the header row.
    ///
    /// A field takes the single column whose header matches one of its
    /// aliases. Its default position is used only when several headers match
    /// or when no header matches and the header at that position is blank.
    #[must_use]
    pub fn build(headers: &[String], fields: &[FieldSpec]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut assigned: BTreeMap<&'static str, usize> = BTreeMap::new();

        for field in fields {
            let matches: Vec<usize> = normalized
                .iter()
                .enumerate()
                .filter(|(_, h)| field.aliases.contains(&h.as_str()))
                .map(|(i, _)| i)
                .collect();

            let position = match matches.as_slice() {
                [single] => Some(*single),
                [] => field
                    .default_position
                    .filter(|&p| normalized.get(p).is_some_and(String::is_empty)),
                [first, ..] => {
                    debug!(field = field.name, ?matches, "ambiguous header");
                    field
                        .default_position
                        .filter(|&p| p < normalized.len())
                        .or(Some(*first))
                }
            };

            if let Some(position) = position
                && !assigned.values().any(|&p| p == position)
            {
                assigned.insert(field.name, position);
            }
        }

        let mut used = HashSet::new();
        let columns = normalized
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let name = if name.is_empty() {
                    format!("column_{}", i + 1)
                } else {
                    name
                };
                if used.insert(name.clone()) {
                    name
                } else {
                    format!("{name}_{}", i + 1)
                }
            })
            .collect();

        Self { columns, assigned }
    }

    /// Whether no field could be located.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Column index of a field.
    #[must_use]
    pub fn position(&self, field: &str) -> Option<usize> {
        self.assigned.get(field).copied()
    }

    /// Raw text of a field in a row, if the column exists in that row.
    #[must_use]
    pub fn text<'r>(&self, row: &'r [String], field: &str) -> Option<&'r str> {
        self.position(field)
            .and_then(|p| row.get(p))
            .map(String::as_str)
    }

    /// Normalized value of a field in a row.
    #[must_use]
    pub fn cell(&self, row: &[String], field: &str) -> Option<Cell> {
        self.text(row, field).map(Cell::parse)
    }

    /// Cells of the columns no field claimed, named by their header.
    ///
    /// Cells beyond the header row's width are named `column_<n>`.
    #[must_use]
    pub fn other_fields(&self, row: &[String]) -> BTreeMap<String, Cell> {
        row.iter()
            .enumerate()
            .filter(|(i, _)| !self.assigned.values().any(|p| p == i))
            .map(|(i, text)| {
                let name = self
                    .columns
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("column_{}", i + 1));
                (name, Cell::parse(text))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec {
            name: "code",
            aliases: &["course_code", "code"],
            default_position: Some(0),
        },
        FieldSpec {
            name: "grade",
            aliases: &["grade", "grade_remark"],
            default_position: Some(2),
        },
    ];

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|&n| n.to_owned()).collect()
    }

    #[test]
    fn test_find_table() {
        let html = r#"<table id="DgResult">
            <tr><td>Course Code</td><td>Grade</td></tr>
            <tr><td> CS101 </td><td>A</td></tr>
            <tr><td>MA102</td><td>B&nbsp;</td></tr>
        </table>"#;
        let table = find_table(html, "DgResult").unwrap();
        assert_eq!(table.headers, vec!["Course Code", "Grade"]);
        assert_eq!(table.rows, vec![vec!["CS101", "A"], vec!["MA102", "B"]]);
    }

    #[test]
    fn test_find_table_missing() {
        let err = find_table("<table id=\"Other\"></table>", "DgResult").unwrap_err();
        assert!(matches!(err, SnapshotError::TableNotFound(id) if id == "DgResult"));
    }

    #[test]
    fn test_find_table_without_rows() {
        let err = find_table("<table id=\"DgResult\"></table>", "DgResult").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }

    #[test]
    fn test_nested_tables_and_spacers_ignored() {
        let html = r#"<table id="T">
            <tr><th>Code</th><th>Grade</th></tr>
            <tr><th colspan="2">Semester 1</th></tr>
            <tr><td>CS101</td><td><table><tr><td>inner</td></tr></table>A</td></tr>
        </table>"#;
        let table = find_table(html, "T").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "CS101");
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Grade / Remark"), "grade_remark");
        assert_eq!(normalize_header("  Course\u{a0}Code "), "course_code");
        assert_eq!(normalize_header("%"), "");
    }

    #[test]
    fn test_column_map_by_alias() {
        let map = ColumnMap::build(&headers(&["Semester", "Course Code", "Grade"]), FIELDS);
        assert_eq!(map.position("code"), Some(1));
        assert_eq!(map.position("grade"), Some(2));
    }

    #[test]
    fn test_column_map_ambiguous_uses_default() {
        let map = ColumnMap::build(&headers(&["Code", "Course Code", "Grade"]), FIELDS);
        assert_eq!(map.position("code"), Some(0));
    }

    #[test]
    fn test_column_map_blank_header_uses_default() {
        let map = ColumnMap::build(&headers(&["Code", "Title", ""]), FIELDS);
        assert_eq!(map.position("grade"), Some(2));
    }

    #[test]
    fn test_column_map_no_silent_positional_guess() {
        let map = ColumnMap::build(&headers(&["Code", "Title", "Credits"]), FIELDS);
        assert_eq!(map.position("grade"), None);
    }

    #[test]
    fn test_column_map_unrecognized() {
        let map = ColumnMap::build(&headers(&["Foo", "Bar"]), FIELDS);
        assert!(map.is_empty());
    }

    #[test]
    fn test_other_fields() {
        let map = ColumnMap::build(&headers(&["Semester", "Code", "Grade", ""]), FIELDS);
        let row = headers(&["3", "CS101", "A", "x", "extra"]);
        let other = map.other_fields(&row);
        assert_eq!(
            other.into_iter().collect::<Vec<_>>(),
            vec![
                ("column_4".to_owned(), Cell::parse("x")),
                ("column_5".to_owned(), Cell::parse("extra")),
                ("semester".to_owned(), Cell::Number(3.0)),
            ]
        );
    }
}
