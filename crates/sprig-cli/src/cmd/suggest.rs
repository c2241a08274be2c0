//! `sprig suggest` — extract task candidates from free-form notes and
//! screen them against the open ledger before offering them.

use crate::cmd::skip_summary;
use crate::output::{OutputMode, render_success, render_warning};
use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use sprig_core::config::Config;
use sprig_core::session::Session;
use sprig_semantic::dedupe::DedupeGate;
use sprig_semantic::extract::RemoteExtractor;
use sprig_semantic::provider::{CachedProvider, RemoteEmbedder};
use sprig_semantic::suggest::suggest_new_tasks;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Notes file to read; stdin when omitted.
    pub file: Option<PathBuf>,

    /// Append the surviving suggestions to the ledger.
    #[arg(long)]
    pub accept: bool,
}

fn read_notes(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read notes from stdin")?;
            Ok(text)
        }
    }
}

pub fn run_suggest(
    args: &SuggestArgs,
    config: &Config,
    session: &mut Session,
    output: OutputMode,
) -> Result<ExitCode> {
    let notes = read_notes(args.file.as_ref())?;
    let extractor = RemoteExtractor::from_config(&config.extract);
    let gate = DedupeGate::new(
        CachedProvider::new(RemoteEmbedder::from_config(&config.semantic)),
        config.semantic.threshold,
    );
    let open_names = session.ledger().open_task_names();

    let suggestions = suggest_new_tasks(&extractor, &gate, &open_names, &notes)?;
    if suggestions.is_empty() {
        render_success(output, &json!({ "suggestions": [] }), "no new tasks found")?;
        return Ok(ExitCode::SUCCESS);
    }

    if args.accept {
        let count = suggestions.len();
        let report = session.accept_suggestions(suggestions)?;
        if let Some(summary) = skip_summary(&report) {
            render_warning(output, &summary)?;
        }
        session.commit()?;
        render_success(
            output,
            &json!({ "accepted": count - report.skipped.len() }),
            &format!("added {} suggested task(s)", count - report.skipped.len()),
        )?;
        return Ok(ExitCode::SUCCESS);
    }

    let human = suggestions
        .iter()
        .map(|s| format!("- {} [{} / {}]", s.name, s.kind, s.priority))
        .collect::<Vec<_>>()
        .join("\n");
    render_success(output, &json!({ "suggestions": suggestions }), &human)?;
    Ok(ExitCode::SUCCESS)
}
