//! Command handlers for the `sprig` binary.

pub mod add;
pub mod backup;
pub mod done;
pub mod edit;
pub mod list;
pub mod rm;
pub mod similar;
pub mod suggest;

use crate::output::CliError;
use sprig_core::error::ErrorCode;
use sprig_core::ledger::TaskLedger;
use sprig_core::model::task::TaskId;
use sprig_core::reconcile::ReconcileReport;

/// Resolve a user-supplied id prefix against the ledger. Exactly one
/// match is required; none or several are blocking errors.
pub fn resolve_prefix(ledger: &TaskLedger, prefix: &str) -> Result<TaskId, CliError> {
    let matches: Vec<&TaskId> = ledger
        .sorted()
        .into_iter()
        .map(|record| &record.id)
        .filter(|id| id.as_str().starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(CliError::new(
            ErrorCode::TaskNotFound,
            format!("no task id starts with '{prefix}'"),
        )),
        [only] => Ok((*only).clone()),
        many => Err(CliError::new(
            ErrorCode::AmbiguousId,
            format!("prefix '{prefix}' matches {} tasks", many.len()),
        )),
    }
}

/// One warning line summarizing skipped rows, or `None` for a clean pass.
#[must_use]
pub fn skip_summary(report: &ReconcileReport) -> Option<String> {
    if report.is_clean() {
        return None;
    }
    let detail: Vec<String> = report
        .skipped
        .iter()
        .map(|row| format!("'{}' ({})", row.name, row.reason))
        .collect();
    Some(format!(
        "{} row(s) skipped: {}",
        report.skipped.len(),
        detail.join(", ")
    ))
}
