//! `sprig list` — show the canonical task view.

use crate::output::{OutputMode, render_success};
use clap::Args;
use serde::Serialize;
use sprig_core::model::task::TaskRecord;
use sprig_core::session::Session;
use std::fmt::Write as _;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Include completed tasks (open-only by default).
    #[arg(short, long)]
    pub all: bool,
}

/// Stable JSON projection of one task row.
#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: String,
    pub name: String,
    pub status: String,
    pub kind: String,
    pub priority: String,
    pub project: Option<String>,
    pub created_at: String,
    pub edited_at: String,
}

impl From<&TaskRecord> for TaskView {
    fn from(record: &TaskRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name.clone(),
            status: record.status.to_string(),
            kind: record.kind.to_string(),
            priority: record.meta.priority.to_string(),
            project: record.meta.project.clone(),
            created_at: record.created_at.to_rfc3339(),
            edited_at: record.meta.edited_at.to_rfc3339(),
        }
    }
}

pub fn run_list(
    args: &ListArgs,
    session: &Session,
    output: OutputMode,
) -> anyhow::Result<ExitCode> {
    let rows: Vec<TaskView> = session
        .ledger()
        .sorted()
        .into_iter()
        .filter(|record| args.all || !record.status.is_done())
        .map(TaskView::from)
        .collect();

    render_success(output, &rows, &render_table(&rows))?;
    Ok(ExitCode::SUCCESS)
}

fn render_table(rows: &[TaskView]) -> String {
    if rows.is_empty() {
        return "no tasks".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:<4} {:<8} {:<32} {:<8} {}",
        "ID", "DONE", "PRIORITY", "TASK", "KIND", "PROJECT"
    );
    for row in rows {
        let check = if row.status == "done" { "[x]" } else { "[ ]" };
        let _ = writeln!(
            out,
            "{:<10} {:<4} {:<8} {:<32} {:<8} {}",
            short_id(&row.id),
            check,
            row.priority,
            row.name,
            row.kind,
            row.project.as_deref().unwrap_or("-"),
        );
    }
    out.pop();
    out
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::{TaskView, render_table, short_id};

    fn view(name: &str, status: &str) -> TaskView {
        TaskView {
            id: "0123456789abcdef".to_string(),
            name: name.to_string(),
            status: status.to_string(),
            kind: "Personal".to_string(),
            priority: "Medium".to_string(),
            project: None,
            created_at: "2024-03-01T10:00:00+00:00".to_string(),
            edited_at: "2024-03-01T10:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn table_marks_done_rows() {
        let table = render_table(&[view("open one", "open"), view("done one", "done")]);
        assert!(table.contains("[ ]"));
        assert!(table.contains("[x]"));
        assert!(table.contains("open one"));
    }

    #[test]
    fn empty_ledger_renders_placeholder() {
        assert_eq!(render_table(&[]), "no tasks");
    }

    #[test]
    fn short_id_truncates_safely() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
