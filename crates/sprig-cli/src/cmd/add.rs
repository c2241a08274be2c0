//! `sprig add` — append one task through the reconcile path.

use crate::cmd::skip_summary;
use crate::output::{OutputMode, render_success, render_warning};
use clap::Args;
use serde_json::json;
use sprig_core::model::task::{Priority, TaskKind};
use sprig_core::reconcile::{Diff, NewTask};
use sprig_core::session::Session;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task name.
    pub name: String,

    /// Task kind: personal, work, or family.
    #[arg(short, long, default_value = "personal")]
    pub kind: TaskKind,

    /// Priority: low, medium, or high.
    #[arg(short, long, default_value = "medium")]
    pub priority: Priority,

    /// Optional project label.
    #[arg(long)]
    pub project: Option<String>,
}

pub fn run_add(
    args: &AddArgs,
    session: &mut Session,
    output: OutputMode,
) -> anyhow::Result<ExitCode> {
    let diff = Diff {
        added: vec![NewTask {
            kind: args.kind,
            priority: args.priority,
            project: args.project.clone(),
            ..NewTask::named(&args.name)
        }],
        ..Diff::default()
    };

    let before: std::collections::HashSet<_> = session
        .ledger()
        .sorted()
        .into_iter()
        .map(|record| record.id.clone())
        .collect();

    let report = session.apply_edits(&diff)?;
    if let Some(summary) = skip_summary(&report) {
        render_warning(output, &summary)?;
        return Ok(ExitCode::FAILURE);
    }
    session.commit()?;

    let added = session
        .ledger()
        .sorted()
        .into_iter()
        .find(|record| !before.contains(&record.id))
        .map(|record| record.id.to_string())
        .unwrap_or_default();
    let short = added.get(..8).unwrap_or(added.as_str());
    let human = format!("added '{}' ({short})", args.name.trim());
    render_success(
        output,
        &json!({ "added": { "id": added, "name": args.name.trim() } }),
        &human,
    )?;
    Ok(ExitCode::SUCCESS)
}
