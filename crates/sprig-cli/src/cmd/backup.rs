//! `sprig backup` / `sprig restore` — single-slot store snapshots.

use crate::output::{CliError, OutputMode, render_error, render_success};
use serde_json::json;
use sprig_core::error::ErrorCode;
use sprig_core::session::Session;
use std::process::ExitCode;

pub fn run_backup(session: &mut Session, output: OutputMode) -> anyhow::Result<ExitCode> {
    let count = session.backup()?;
    render_success(
        output,
        &json!({ "backed_up": count }),
        &format!("backed up {count} task(s)"),
    )?;
    Ok(ExitCode::SUCCESS)
}

pub fn run_restore(session: &mut Session, output: OutputMode) -> anyhow::Result<ExitCode> {
    match session.restore() {
        Ok(count) => {
            render_success(
                output,
                &json!({ "restored": count }),
                &format!("restored {count} task(s)"),
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) if error.to_string().contains("no backup snapshot") => {
            render_error(
                output,
                &CliError::new(ErrorCode::NoBackupFound, error.to_string()),
            )?;
            Ok(ExitCode::FAILURE)
        }
        Err(error) => Err(error),
    }
}
