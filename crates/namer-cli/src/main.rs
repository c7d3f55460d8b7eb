//! namer: mint and retire AI4Math dataset filenames.
//!
//! Commands: add, rm, status

mod commands;
mod config;
mod prompt;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use namer_core::NamerError;
use namer_vault::{ShutdownSignal, INTERRUPTED_EXIT_CODE};

use crate::commands::{AddArgs, Context, RmArgs, StatusArgs};
use crate::config::Config;
use crate::prompt::Prompter;

#[derive(Parser)]
#[command(name = "namer")]
#[command(version)]
#[command(about = "Mint and retire AI4Math dataset filenames")]
struct Cli {
    /// Dataset root holding the contributor folders (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Skip git pull/commit/push
    #[arg(long, global = true)]
    no_sync: bool,

    /// Print the result as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Add a new file under the next free sequence number
    Add(AddArgs),
    /// Remove a file and renumber the rest of its series
    #[command(alias = "remove")]
    Rm(RmArgs),
    /// Show counters and gaps for a contributor
    Status(StatusArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let namer_err = err.downcast_ref::<NamerError>();
            if let Some(report) = namer_err.and_then(NamerError::rollback_report) {
                if !report.is_empty() {
                    eprint!("{report}");
                }
            }
            eprintln!("error: {err:#}");
            match namer_err {
                Some(NamerError::Interrupted { .. }) => {
                    ExitCode::from(INTERRUPTED_EXIT_CODE as u8)
                }
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("resolving current directory")?,
    };
    let config = Config::load(&root)?;

    let shutdown = ShutdownSignal::new();
    shutdown
        .install()
        .context("installing signal handlers")?;

    let ctx = Context {
        root,
        config,
        sync: !cli.no_sync,
        json: cli.json,
        shutdown,
    };
    tracing::debug!(root = %ctx.root.display(), sync = ctx.sync, "starting");

    let stdin = io::stdin();
    let mut prompt = Prompter::new(stdin.lock(), io::stderr());

    match cli.command {
        Commands::Add(args) => commands::add(&ctx, args, &mut prompt),
        Commands::Rm(args) => commands::remove(&ctx, args, &mut prompt),
        Commands::Status(args) => commands::status(&ctx, args, &mut prompt),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("NAMER_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
