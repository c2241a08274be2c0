#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use sprig_core::config::{Config, load_config};
use sprig_core::session::Session;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sprig: reconciling task ledger",
    long_about = None
)]
struct Cli {
    /// Database file (overrides the config path).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Add a task",
        after_help = "EXAMPLES:\n    # Add a personal task\n    sprig add \"water the plants\"\n\n    # Add a high-priority work task\n    sprig add \"file the report\" --kind work --priority high"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        about = "List tasks in canonical order",
        after_help = "EXAMPLES:\n    # Open tasks only\n    sprig list\n\n    # Everything, machine-readable\n    sprig list --all --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Mark a task done (or reopen it)",
        after_help = "EXAMPLES:\n    # Complete by id prefix\n    sprig done 3f2a\n\n    # Undo\n    sprig done 3f2a --reopen"
    )]
    Done(cmd::done::DoneArgs),

    #[command(
        about = "Edit fields on a task",
        after_help = "EXAMPLES:\n    # Rename\n    sprig edit 3f2a --name \"water the garden\"\n\n    # Clear the project label\n    sprig edit 3f2a --project \"\""
    )]
    Edit(cmd::edit::EditArgs),

    #[command(
        about = "Delete a task",
        after_help = "EXAMPLES:\n    sprig rm 3f2a"
    )]
    Rm(cmd::rm::RmArgs),

    #[command(
        about = "Suggest tasks extracted from free-form notes",
        after_help = "EXAMPLES:\n    # Preview suggestions from a notes file\n    sprig suggest notes.md\n\n    # Pipe from stdin and append survivors\n    cat diary.txt | sprig suggest --accept"
    )]
    Suggest(cmd::suggest::SuggestArgs),

    #[command(
        about = "Rank open tasks by semantic closeness to a query",
        after_help = "EXAMPLES:\n    sprig similar \"groceries\" -k 3"
    )]
    Similar(cmd::similar::SimilarArgs),

    #[command(about = "Snapshot the task table")]
    Backup,

    #[command(about = "Replace the task table with the snapshot")]
    Restore,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SPRIG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "sprig=debug,info"
        } else {
            "sprig=info,warn"
        })
    });

    let format = env::var("SPRIG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn open_session(cli: &Cli, config: &Config) -> anyhow::Result<Session> {
    let path = cli
        .db
        .clone()
        .unwrap_or_else(|| config.store.resolve_path());
    Session::open(&path)
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let output = cli.output_mode();
    let config = load_config(cli.config.as_deref())?;
    let mut session = open_session(&cli, &config)?;

    match cli.command {
        Commands::Add(ref args) => cmd::add::run_add(args, &mut session, output),
        Commands::List(ref args) => cmd::list::run_list(args, &session, output),
        Commands::Done(ref args) => cmd::done::run_done(args, &mut session, output),
        Commands::Edit(ref args) => cmd::edit::run_edit(args, &mut session, output),
        Commands::Rm(ref args) => cmd::rm::run_rm(args, &mut session, output),
        Commands::Suggest(ref args) => {
            cmd::suggest::run_suggest(args, &config, &mut session, output)
        }
        Commands::Similar(ref args) => {
            cmd::similar::run_similar(args, &config, &session, output)
        }
        Commands::Backup => cmd::backup::run_backup(&mut session, output),
        Commands::Restore => cmd::backup::run_restore(&mut session, output),
    }
}
