use crate::model::task::{Priority, TaskKind};
use serde::{Deserialize, Serialize};

/// A machine-proposed task not yet accepted into the ledger.
///
/// The field names mirror the extraction service's JSON contract
/// (`{name, type, priority, project}`). Candidates carry no timestamps;
/// those are stamped when the row is accepted through reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionCandidate {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: TaskKind,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub project: Option<String>,
}

impl SuggestionCandidate {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::default(),
            priority: Priority::default(),
            project: None,
        }
    }
}
