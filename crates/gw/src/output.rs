//! Terminal reporting for checks.

use console::{Style, Term};
use gw_notify::Dispatch;

use crate::cycle::CycleOutcome;
use crate::error::CliError;

/// Writes check summaries and failures to stderr.
pub(crate) struct Output {
    term: Term,
    sent: Style,
    hint: Style,
    failure: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            sent: Style::new().green(),
            hint: Style::new().yellow(),
            failure: Style::new().red(),
        }
    }

    /// Plain status line.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Summarize a finished check.
    pub(crate) fn outcome(&self, outcome: &CycleOutcome) {
        for kind in &outcome.seeded {
            self.info(&format!("Baseline seeded for {kind}"));
        }
        match &outcome.dispatch {
            Dispatch::Nothing => self.info("No changes detected"),
            Dispatch::Changes(_) => self.styled(
                &self.sent,
                &format!(
                    "Sent change notification ({} result, {} attendance changes)",
                    outcome.result_changes, outcome.attendance_changes
                ),
            ),
            Dispatch::Snapshot(_) => self.styled(&self.sent, "Sent snapshot notification"),
        }
    }

    /// Report a failed check with its remediation hint.
    pub(crate) fn failure(&self, err: &CliError) {
        self.styled(&self.failure, &format!("Error: {err}"));
        self.styled(&self.hint, &format!("Hint: {}", err.hint()));
    }

    fn styled(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}
