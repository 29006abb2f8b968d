//! Command-line interface for the `csi` crate.
//!
//! Subcommands are implemented in separate files (modules) under `src/bin/csi/`:
//! - `resolve_cmd.rs`
//! - `classify_cmd.rs`
//!
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name="csi", version=env!("CARGO_PKG_VERSION"), about="Cleavage site identification from cassette insertion reads", disable_help_subcommand=true)]
struct Cli {
    /// Log per-stage progress (debug level).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve cleavage sites for every consensus read and summarise them.
    Resolve(resolve_cmd::ResolveCmd),
    /// Classify a top/bottom break pair.
    Classify(classify_cmd::ClassifyCmd),
}

#[path = "csi/resolve_cmd.rs"] mod resolve_cmd;
#[path = "csi/classify_cmd.rs"] mod classify_cmd;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    match cli.command {
        Command::Resolve(cmd) => resolve_cmd::run(cmd),
        Command::Classify(cmd) => classify_cmd::run(cmd),
    }
}
