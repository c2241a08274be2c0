//! `sprig done` — flip a task to completed (or back).

use crate::cmd::resolve_prefix;
use crate::output::{OutputMode, render_error, render_success};
use clap::Args;
use serde_json::json;
use sprig_core::model::task::Status;
use sprig_core::reconcile::{Diff, TaskPatch};
use sprig_core::session::Session;
use std::collections::BTreeMap;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Task id or unique prefix.
    pub id: String,

    /// Reopen instead of completing.
    #[arg(long)]
    pub reopen: bool,
}

pub fn run_done(
    args: &DoneArgs,
    session: &mut Session,
    output: OutputMode,
) -> anyhow::Result<ExitCode> {
    let id = match resolve_prefix(session.ledger(), &args.id) {
        Ok(id) => id,
        Err(error) => {
            render_error(output, &error)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let status = if args.reopen {
        Status::Open
    } else {
        Status::Done
    };
    let diff = Diff {
        edited: BTreeMap::from([(
            id.clone(),
            TaskPatch {
                status: Some(status),
                ..TaskPatch::default()
            },
        )]),
        ..Diff::default()
    };
    session.apply_edits(&diff)?;
    session.commit()?;

    let name = session
        .ledger()
        .get(&id)
        .map(|record| record.name.clone())
        .unwrap_or_default();
    render_success(
        output,
        &json!({ "id": id.to_string(), "status": status.to_string() }),
        &format!("'{name}' is now {status}"),
    )?;
    Ok(ExitCode::SUCCESS)
}
