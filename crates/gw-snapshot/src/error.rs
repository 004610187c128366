/// Table parsing failure.
///
/// Both variants mean the page no longer looks the way the parser expects,
/// so no baseline should be touched.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// No `<table>` with the configured id.
    #[error("table '{0}' not found (portal layout changed or session expired?)")]
    TableNotFound(String),
    /// Table found but unusable.
    #[error("parse error: {0}")]
    Parse(String),
}
