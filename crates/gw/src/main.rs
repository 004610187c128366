//! gradewatch CLI - grade and attendance watcher.
//!
//! Provides commands for:
//! - `run`: Check the portal once and notify on changes
//! - `watch`: Check the portal on a fixed interval until interrupted

mod commands;
mod cycle;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{RunArgs, WatchArgs};
use output::Output;

/// gradewatch - notify when portal results or attendance change.
#[derive(Parser)]
#[command(name = "gw", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover gradewatch.toml).
    #[arg(short, long, global = true, env = "GRADEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the portal once.
    Run(RunArgs),
    /// Check the portal repeatedly.
    Watch(WatchArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Run(args) => args.execute(cli.config.as_deref()),
        Commands::Watch(args) => args.execute(cli.config.as_deref()),
    };

    if let Err(err) = result {
        output.failure(&err);
        std::process::exit(1);
    }
}
