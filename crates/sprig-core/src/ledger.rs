//! The canonical in-memory collection of task records.
//!
//! Records live in an arena keyed by [`TaskId`]; the ordered view is
//! computed on read, sorted by `(status, created_at, id)` so open tasks
//! precede done tasks and ties break by creation time. Order carries no
//! meaning across loads and is never persisted.

use crate::model::task::{TaskId, TaskRecord};
use std::collections::HashMap;

/// Source of truth between load and commit. Mutated only through the
/// reconciliation engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskLedger {
    records: HashMap<TaskId, TaskRecord>,
}

/// Diagnostics from a full-table load: how many raw rows were dropped
/// because they failed structural validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub dropped: usize,
}

impl TaskLedger {
    /// Build a ledger from already-validated records.
    #[must_use]
    pub fn from_records(records: Vec<TaskRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
        }
    }

    /// A deep, independent copy for safe mutation.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.records.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.records.contains_key(id)
    }

    pub(crate) fn get_mut(&mut self, id: &TaskId) -> Option<&mut TaskRecord> {
        self.records.get_mut(id)
    }

    pub(crate) fn insert(&mut self, record: TaskRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub(crate) fn remove(&mut self, id: &TaskId) -> Option<TaskRecord> {
        self.records.remove(id)
    }

    /// The canonical ordered view: open before done, then by creation
    /// time, then by id for full determinism.
    #[must_use]
    pub fn sorted(&self) -> Vec<&TaskRecord> {
        let mut view: Vec<&TaskRecord> = self.records.values().collect();
        view.sort_by(|a, b| {
            a.status
                .cmp(&b.status)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        view
    }

    /// Names of every open task, in canonical order. Used exclusively as
    /// the candidate pool for deduplication.
    #[must_use]
    pub fn open_task_names(&self) -> Vec<String> {
        self.sorted()
            .into_iter()
            .filter(|record| !record.status.is_done())
            .map(|record| record.name.clone())
            .collect()
    }
}
