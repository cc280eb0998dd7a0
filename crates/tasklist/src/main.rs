//! CLI entry point for tasklist.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tasklist_app::{AppConfig, SyncController};
use tasklist_core::{FilterMode, TaskId};
use tasklist_remote::HttpTaskGateway;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use console::ConsolePrompt;

mod commands;
mod console;

/// Task list synchronized with a remote REST collection.
#[derive(Parser, Debug)]
#[command(
    name = "tasklist",
    version,
    about = "tasklist: manage a task list stored on a remote /todoList collection"
)]
struct Cli {
    /// Configuration file (defaults to ./tasklist.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server base URL, overriding configuration and environment.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks, newest first.
    Ls {
        /// all, active or completed (defaults to `[view] default_filter`).
        #[arg(long)]
        filter: Option<FilterMode>,
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },

    /// Create a task.
    Add { name: String },

    /// Flip the completion flag of a task.
    Toggle { id: TaskId },

    /// Rename a task.
    Rename { id: TaskId, name: String },

    /// Delete a task after confirmation.
    Rm {
        id: TaskId,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LsFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let Cli {
        config,
        base_url,
        cmd,
    } = Cli::parse();

    install_tracing();

    let config = resolve_config(config.as_deref(), base_url)?;
    let gateway = HttpTaskGateway::new(&config.gateway_config()).context("failed to build HTTP client")?;
    let prompt = ConsolePrompt::new(assume_yes(&cmd));
    let controller = SyncController::with_filter(gateway, prompt, config.view.default_filter);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(commands::run(cmd, &controller))
}

fn resolve_config(path: Option<&std::path::Path>, base_url: Option<String>) -> Result<AppConfig> {
    let mut config = AppConfig::load(path)?;
    if let Some(url) = base_url {
        config.remote.base_url = url;
        config.validate().context("invalid --base-url")?;
    }
    Ok(config)
}

const fn assume_yes(cmd: &Command) -> bool {
    matches!(cmd, Command::Rm { yes: true, .. })
}

fn install_tracing() {
    // RUST_LOG is honored; INFO by default.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
