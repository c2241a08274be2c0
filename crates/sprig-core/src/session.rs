//! Per-session context owning the ledger and its store.
//!
//! Lifecycle is owned by the caller: one `Session` per user session,
//! loaded once (or on forced refresh), mutated synchronously through the
//! reconciliation engine, and persisted only by an explicit [`Session::commit`].
//! There is no background flush. Concurrent sessions over one store are
//! last-writer-wins at full-table granularity.

use crate::ledger::{LoadReport, TaskLedger};
use crate::model::suggestion::SuggestionCandidate;
use crate::reconcile::{Diff, NewTask, ReconcileReport, reconcile};
use crate::store::TaskStore;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::info;

pub struct Session {
    store: TaskStore,
    ledger: TaskLedger,
    load_report: LoadReport,
}

impl Session {
    /// Open the store at `path` and load the ledger.
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(TaskStore::open(path)?)
    }

    /// Build a session over an already-open store.
    pub fn new(store: TaskStore) -> Result<Self> {
        let (records, load_report) = store.load_all().context("load task ledger")?;
        if load_report.dropped > 0 {
            info!(
                dropped = load_report.dropped,
                "ledger loaded with invalid rows dropped"
            );
        }
        Ok(Self {
            store,
            ledger: TaskLedger::from_records(records),
            load_report,
        })
    }

    /// Forced reload from the store, discarding uncommitted changes.
    pub fn refresh(&mut self) -> Result<()> {
        let (records, load_report) = self.store.load_all().context("reload task ledger")?;
        self.ledger = TaskLedger::from_records(records);
        self.load_report = load_report;
        Ok(())
    }

    #[must_use]
    pub const fn ledger(&self) -> &TaskLedger {
        &self.ledger
    }

    /// Diagnostics from the most recent load.
    #[must_use]
    pub const fn load_report(&self) -> LoadReport {
        self.load_report
    }

    /// Apply one diff to the in-memory ledger. Does not persist; call
    /// [`Session::commit`] to write the result.
    ///
    /// # Errors
    ///
    /// Contract violations (unknown ids) abort with the ledger untouched.
    pub fn apply_edits(&mut self, diff: &Diff) -> Result<ReconcileReport> {
        let (next, report) = reconcile(&self.ledger, diff, Utc::now())?;
        self.ledger = next;
        Ok(report)
    }

    /// Append accepted suggestions through the normal reconcile path.
    pub fn accept_suggestions(
        &mut self,
        suggestions: Vec<SuggestionCandidate>,
    ) -> Result<ReconcileReport> {
        let diff = Diff {
            added: suggestions.into_iter().map(NewTask::from).collect(),
            ..Diff::default()
        };
        self.apply_edits(&diff)
    }

    /// Persist the canonical collection with a full-table replace.
    pub fn commit(&mut self) -> Result<usize> {
        let sorted = self.ledger.sorted();
        self.store
            .replace_all(sorted)
            .context("commit task ledger")
    }

    /// Snapshot the persisted table (not the in-memory ledger).
    pub fn backup(&mut self) -> Result<usize> {
        self.store.backup()
    }

    /// Replace the persisted table with the backup snapshot and reload.
    pub fn restore(&mut self) -> Result<usize> {
        let restored = self.store.restore()?;
        self.refresh()?;
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::model::suggestion::SuggestionCandidate;
    use crate::model::task::Status;
    use crate::reconcile::{Diff, NewTask, TaskPatch};
    use crate::store::TaskStore;
    use std::collections::BTreeMap;

    fn session() -> Session {
        Session::new(TaskStore::open_in_memory().expect("open store")).expect("session")
    }

    fn add(session: &mut Session, name: &str) {
        let diff = Diff {
            added: vec![NewTask::named(name)],
            ..Diff::default()
        };
        session.apply_edits(&diff).expect("apply");
    }

    #[test]
    fn apply_edits_mutates_memory_only_until_commit() {
        let mut session = session();
        add(&mut session, "water plants");
        assert_eq!(session.ledger().len(), 1);

        // Nothing persisted yet.
        session.refresh().expect("refresh");
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn commit_persists_across_reload() {
        let mut session = session();
        add(&mut session, "water plants");
        add(&mut session, "file taxes");
        assert_eq!(session.commit().expect("commit"), 2);

        session.refresh().expect("refresh");
        assert_eq!(session.ledger().len(), 2);
        assert_eq!(session.load_report().loaded, 2);
    }

    #[test]
    fn accept_suggestions_appends_open_tasks() {
        let mut session = session();
        let report = session
            .accept_suggestions(vec![
                SuggestionCandidate::named("buy milk"),
                SuggestionCandidate::named("  "),
            ])
            .expect("accept");

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(session.ledger().len(), 1);
        assert_eq!(session.ledger().open_task_names(), vec!["buy milk"]);
    }

    #[test]
    fn edit_then_commit_roundtrips_status() {
        let mut session = session();
        add(&mut session, "water plants");
        let id = session.ledger().sorted()[0].id.clone();

        let diff = Diff {
            edited: BTreeMap::from([(
                id.clone(),
                TaskPatch {
                    status: Some(Status::Done),
                    ..TaskPatch::default()
                },
            )]),
            ..Diff::default()
        };
        session.apply_edits(&diff).expect("apply");
        session.commit().expect("commit");
        session.refresh().expect("refresh");

        assert_eq!(
            session.ledger().get(&id).expect("kept").status,
            Status::Done
        );
    }

    #[test]
    fn restore_reloads_the_snapshot() {
        let mut session = session();
        add(&mut session, "keep me");
        session.commit().expect("commit");
        session.backup().expect("backup");

        add(&mut session, "scratch");
        session.commit().expect("commit");
        assert_eq!(session.ledger().len(), 2);

        session.restore().expect("restore");
        assert_eq!(session.ledger().len(), 1);
        assert_eq!(session.ledger().open_task_names(), vec!["keep me"]);
    }
}
