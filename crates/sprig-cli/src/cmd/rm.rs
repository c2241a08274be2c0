//! `sprig rm` — delete a task from the ledger.

use crate::cmd::resolve_prefix;
use crate::output::{OutputMode, render_error, render_success};
use clap::Args;
use serde_json::json;
use sprig_core::reconcile::Diff;
use sprig_core::session::Session;
use std::collections::BTreeSet;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Task id or unique prefix.
    pub id: String,
}

pub fn run_rm(
    args: &RmArgs,
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

    let name = session
        .ledger()
        .get(&id)
        .map(|record| record.name.clone())
        .unwrap_or_default();
    let diff = Diff {
        deleted: BTreeSet::from([id.clone()]),
        ..Diff::default()
    };
    session.apply_edits(&diff)?;
    session.commit()?;

    render_success(
        output,
        &json!({ "deleted": id.to_string() }),
        &format!("deleted '{name}'"),
    )?;
    Ok(ExitCode::SUCCESS)
}
