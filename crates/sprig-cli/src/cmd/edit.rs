//! `sprig edit` — patch individual fields on one task.

use crate::cmd::{resolve_prefix, skip_summary};
use crate::output::{OutputMode, render_error, render_success, render_warning};
use clap::Args;
use serde_json::json;
use sprig_core::model::task::{Priority, Status, TaskKind};
use sprig_core::reconcile::{Diff, TaskPatch};
use sprig_core::session::Session;
use std::collections::BTreeMap;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Task id or unique prefix.
    pub id: String,

    /// New name.
    #[arg(short, long)]
    pub name: Option<String>,

    /// New status: open or done.
    #[arg(short, long)]
    pub status: Option<Status>,

    /// New kind: personal, work, or family.
    #[arg(short, long)]
    pub kind: Option<TaskKind>,

    /// New priority: low, medium, or high.
    #[arg(short, long)]
    pub priority: Option<Priority>,

    /// New project label. An empty string clears it.
    #[arg(long)]
    pub project: Option<String>,
}

impl EditArgs {
    fn patch(&self) -> TaskPatch {
        TaskPatch {
            name: self.name.clone(),
            status: self.status,
            kind: self.kind,
            priority: self.priority,
            project: self.project.clone(),
        }
    }

    const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.kind.is_none()
            && self.priority.is_none()
            && self.project.is_none()
    }
}

pub fn run_edit(
    args: &EditArgs,
    session: &mut Session,
    output: OutputMode,
) -> anyhow::Result<ExitCode> {
    if args.is_empty() {
        render_warning(output, "nothing to change; pass at least one field flag")?;
        return Ok(ExitCode::FAILURE);
    }

    let id = match resolve_prefix(session.ledger(), &args.id) {
        Ok(id) => id,
        Err(error) => {
            render_error(output, &error)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let diff = Diff {
        edited: BTreeMap::from([(id.clone(), args.patch())]),
        ..Diff::default()
    };
    let report = session.apply_edits(&diff)?;
    if let Some(summary) = skip_summary(&report) {
        render_warning(output, &summary)?;
        return Ok(ExitCode::FAILURE);
    }
    session.commit()?;

    let name = session
        .ledger()
        .get(&id)
        .map(|record| record.name.clone())
        .unwrap_or_default();
    render_success(
        output,
        &json!({ "edited": id.to_string() }),
        &format!("updated '{name}'"),
    )?;
    Ok(ExitCode::SUCCESS)
}
