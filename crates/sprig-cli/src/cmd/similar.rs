//! `sprig similar` — rank open tasks by semantic closeness to a query.

use crate::output::{OutputMode, render_success};
use anyhow::Result;
use clap::Args;
use serde_json::json;
use sprig_core::config::Config;
use sprig_core::session::Session;
use sprig_semantic::provider::{CachedProvider, RemoteEmbedder};
use sprig_semantic::similar::find_similar;
use std::fmt::Write as _;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct SimilarArgs {
    /// Free-text query.
    pub query: String,

    /// Maximum number of matches to show.
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Minimum cosine similarity to count as a match.
    #[arg(short, long)]
    pub threshold: Option<f32>,
}

pub fn run_similar(
    args: &SimilarArgs,
    config: &Config,
    session: &Session,
    output: OutputMode,
) -> Result<ExitCode> {
    let provider = CachedProvider::new(RemoteEmbedder::from_config(&config.semantic));
    let open_names = session.ledger().open_task_names();
    let matches = find_similar(
        &provider,
        &args.query,
        &open_names,
        args.top_k.unwrap_or(config.semantic.top_k),
        args.threshold.unwrap_or(config.semantic.threshold),
    )?;

    let human = if matches.is_empty() {
        "no similar tasks".to_string()
    } else {
        let mut out = String::new();
        for entry in &matches {
            let _ = writeln!(out, "{:.3}  {}", entry.score, entry.text);
        }
        out.pop();
        out
    };
    render_success(output, &json!({ "matches": matches }), &human)?;
    Ok(ExitCode::SUCCESS)
}
