//! One check: login, fetch both pages, compare with baselines, notify.

use chrono::Utc;
use gw_baseline::{
    BaselineSlot, BaselineSlotExt, BaselineStore, FileBaselineStore, StateError,
};
use gw_config::Config;
use gw_notify::{Dispatch, Notifier, RunMode, SmtpNotifier, decide, login_notification};
use gw_portal::{HttpTransport, PortalClient};
use gw_snapshot::{
    ChangeReport, Record, Snapshot, SnapshotKind, diff, parse_attendance, parse_results,
};
use tracing::{error, info, warn};

use crate::error::CliError;

/// What a successful check did.
#[derive(Debug)]
pub(crate) struct CycleOutcome {
    pub(crate) result_changes: usize,
    pub(crate) attendance_changes: usize,
    /// Kinds whose baseline was written for the first time.
    pub(crate) seeded: Vec<SnapshotKind>,
    pub(crate) dispatch: Dispatch,
}

/// Run a check against the live portal, the state directory and the SMTP
/// relay named in `config`.
pub(crate) fn check_once(config: &Config, mode: RunMode) -> Result<CycleOutcome, CliError> {
    let notifier = SmtpNotifier::new(&config.mail)?;
    let client = PortalClient::from_config(&config.portal);
    let store = FileBaselineStore::new(config.state_resolved.dir.clone());

    run_cycle(&client, config, &store, &notifier, mode)
        .inspect_err(|e| error!("Check failed: {e}"))
}

/// Run one check over explicit collaborators.
///
/// Both pages are fetched and parsed, and both baselines locked and
/// compared, before either baseline is written. A failed login, an
/// unrecognizable page or an unreadable state directory therefore leaves
/// every baseline as it was, and the same change is found again next time.
///
/// Once a baseline has been replaced its change will not be seen again, so
/// the notification goes out whenever at least one write landed, even if
/// the other failed. A delivery failure is reported but the new baselines
/// stay.
pub(crate) fn run_cycle<T, S, N>(
    client: &PortalClient<T>,
    config: &Config,
    store: &S,
    notifier: &N,
    mode: RunMode,
) -> Result<CycleOutcome, CliError>
where
    T: HttpTransport,
    S: BaselineStore + ?Sized,
    N: Notifier + ?Sized,
{
    let portal = &config.portal;
    let mut session = client.login(&config.credentials)?;

    if config.mail.notify_on_login
        && let Err(e) = notifier.send(&login_notification(Utc::now()))
    {
        warn!("Login notice not delivered: {e}");
    }

    let results_page = session.fetch_page(&portal.results_path)?;
    let results = parse_results(&results_page, &portal.results_table)?;
    let attendance_page = session.fetch_page(&portal.attendance_path)?;
    let attendance = parse_attendance(&attendance_page, &portal.attendance_table)?;

    // Fixed lock order: results, then attendance.
    let results_slot = store.lock(SnapshotKind::Results)?;
    let attendance_slot = store.lock(SnapshotKind::Attendance)?;
    let result_report = compare(&*results_slot, &results)?;
    let attendance_report = compare(&*attendance_slot, &attendance)?;

    let dispatch = decide(
        mode,
        (&result_report, &results),
        (&attendance_report, &attendance),
        Utc::now(),
    );

    let writes = [
        results_slot.store(&results),
        attendance_slot.store(&attendance),
    ];
    let committed = writes.iter().any(Result::is_ok);
    let write_error = writes.into_iter().find_map(Result::err);

    if let Some(err) = write_error {
        if committed
            && let Some(notification) = dispatch.notification()
            && let Err(e) = notifier.send(notification)
        {
            warn!("Notification for the committed baseline not delivered: {e}");
        }
        return Err(err.into());
    }

    if let Some(notification) = dispatch.notification() {
        notifier.send(notification)?;
    }

    let seeded = [
        (result_report.first_run, SnapshotKind::Results),
        (attendance_report.first_run, SnapshotKind::Attendance),
    ]
    .into_iter()
    .filter_map(|(first_run, kind)| first_run.then_some(kind))
    .collect();

    Ok(CycleOutcome {
        result_changes: result_report.change_count(),
        attendance_changes: attendance_report.change_count(),
        seeded,
        dispatch,
    })
}

/// Diff `current` against the baseline held by a locked slot.
fn compare<R: Record>(
    slot: &dyn BaselineSlot,
    current: &Snapshot<R>,
) -> Result<ChangeReport<R>, StateError> {
    let previous = slot.load::<R>()?;
    let report = diff(previous.as_ref(), current);

    if report.first_run {
        info!(kind = %R::KIND, records = current.records.len(), "Seeding baseline");
    } else {
        info!(
            kind = %R::KIND,
            added = report.added.len(),
            removed = report.removed.len(),
            modified = report.modified.len(),
            "Compared with baseline"
        );
    }
    Ok(report)
}
