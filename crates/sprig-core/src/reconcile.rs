//! Diff reconciliation against the task ledger.
//!
//! A [`Diff`] carries three independent, possibly-empty parts collected
//! from one editing pass: partial field overrides keyed by task id, a
//! batch of brand-new rows, and a set of ids to delete. [`reconcile`]
//! applies all three against a pre-diff ledger and returns a new
//! canonical ledger plus a report of rows it had to skip.
//!
//! Failure policy is partial, not all-or-nothing: a malformed new row is
//! excluded and reported while every other part of the diff still
//! applies. The one fatal case is a diff referencing an id the pre-diff
//! ledger does not contain; that is a caller bug, and the call aborts
//! with the ledger untouched.

use crate::ledger::TaskLedger;
use crate::model::suggestion::SuggestionCandidate;
use crate::model::task::{Priority, Status, TaskId, TaskKind, TaskMeta, TaskRecord};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Partial field overrides for one existing record. Only fields the user
/// actually touched are `Some`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub status: Option<Status>,
    pub kind: Option<TaskKind>,
    pub priority: Option<Priority>,
    /// A blank override clears the project.
    pub project: Option<String>,
}

impl TaskPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.kind.is_none()
            && self.priority.is_none()
            && self.project.is_none()
    }
}

/// A brand-new row: no id and no timestamps until accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub status: Status,
    pub kind: TaskKind,
    pub priority: Priority,
    pub project: Option<String>,
}

impl NewTask {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::default(),
            kind: TaskKind::default(),
            priority: Priority::default(),
            project: None,
        }
    }
}

impl From<SuggestionCandidate> for NewTask {
    fn from(candidate: SuggestionCandidate) -> Self {
        Self {
            name: candidate.name,
            status: Status::Open,
            kind: candidate.kind,
            priority: candidate.priority,
            project: candidate.project,
        }
    }
}

/// The three-part edit description applied to the ledger in one pass.
///
/// `edited` and `deleted` reference ids present in the pre-diff ledger;
/// `deleted` has set semantics, so naming an id twice is one removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff {
    pub edited: BTreeMap<TaskId, TaskPatch>,
    pub added: Vec<NewTask>,
    pub deleted: BTreeSet<TaskId>,
}

impl Diff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edited.is_empty() && self.added.is_empty() && self.deleted.is_empty()
    }
}

/// One row the engine refused to apply, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub name: String,
    pub reason: String,
}

/// Non-blocking diagnostics from one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub skipped: Vec<SkippedRow>,
}

impl ReconcileReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, name: &str, reason: &str) {
        warn!(row = name, reason, "skipping row during reconciliation");
        self.skipped.push(SkippedRow {
            name: name.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Contract violations that abort the whole reconciliation call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("diff references unknown task id '{0}'")]
    UnknownId(TaskId),
}

/// Apply `diff` to `ledger`, producing a new canonical ledger.
///
/// Timestamps: a patch touching `status` stamps `meta.edited_at = now`
/// on that record (touching any other field alone does not); every
/// accepted new row gets `created_at` and `meta.edited_at` set to `now`
/// unconditionally.
///
/// # Errors
///
/// [`ReconcileError::UnknownId`] if `edited` or `deleted` references an
/// id missing from the pre-diff ledger. The input ledger is never
/// mutated; on success the result is an independent collection.
pub fn reconcile(
    ledger: &TaskLedger,
    diff: &Diff,
    now: DateTime<Utc>,
) -> Result<(TaskLedger, ReconcileReport), ReconcileError> {
    // Resolve every referenced id against the pre-diff ledger up front so
    // a contract violation aborts before any part of the diff applies.
    for id in diff.edited.keys().chain(diff.deleted.iter()) {
        if !ledger.contains(id) {
            return Err(ReconcileError::UnknownId(id.clone()));
        }
    }

    let mut next = ledger.snapshot();
    let mut report = ReconcileReport::default();

    for (id, patch) in &diff.edited {
        // Validate before touching the record: a bad rename leaves the
        // whole patch unapplied, including the timestamp stamp.
        if let Some(name) = &patch.name
            && name.trim().is_empty()
        {
            let current = ledger.get(id).map_or("", |r| r.name.as_str());
            report.skip(current, "edit renames task to an empty name");
            continue;
        }

        let Some(record) = next.get_mut(id) else {
            // Unreachable after the resolution pass above.
            return Err(ReconcileError::UnknownId(id.clone()));
        };
        apply_patch(record, patch, now);
    }

    for row in &diff.added {
        let record = materialize(row, now);
        if let Err(err) = record.validate() {
            report.skip(&row.name, &err.to_string());
            continue;
        }
        next.insert(record);
    }

    for id in &diff.deleted {
        next.remove(id);
    }

    debug!(
        edited = diff.edited.len(),
        added = diff.added.len(),
        deleted = diff.deleted.len(),
        skipped = report.skipped.len(),
        "reconciled diff"
    );

    Ok((next, report))
}

fn apply_patch(record: &mut TaskRecord, patch: &TaskPatch, now: DateTime<Utc>) {
    // Presence of a status override is the only trigger for an edit
    // timestamp refresh; stamp before applying the rest.
    if patch.status.is_some() {
        record.meta.edited_at = now;
    }
    if let Some(status) = patch.status {
        record.status = status;
    }
    if let Some(name) = &patch.name {
        record.name = name.trim().to_string();
    }
    if let Some(kind) = patch.kind {
        record.kind = kind;
    }
    if let Some(priority) = patch.priority {
        record.meta.priority = priority;
    }
    if let Some(project) = &patch.project {
        record.meta.project = normalize_project(project);
    }
}

fn materialize(row: &NewTask, now: DateTime<Utc>) -> TaskRecord {
    TaskRecord {
        id: TaskId::mint(),
        name: row.name.trim().to_string(),
        status: row.status,
        kind: row.kind,
        meta: TaskMeta {
            priority: row.priority,
            project: row.project.as_deref().and_then(normalize_project),
            edited_at: now,
        },
        created_at: now,
    }
}

fn normalize_project(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
