//! CLI subcommand implementation. Use via `csi classify`.
use anyhow::Result;
use clap::Args;
use csi::*;

/// Options for the `classify` subcommand.
#[derive(Debug, Args)]
pub struct ClassifyCmd {
    /// Top-strand break position.
    #[arg(long)]
    pub top: usize,
    /// Bottom-strand break position.
    #[arg(long)]
    pub bottom: usize,
    /// The pair spans the origin of a circular reference.
    #[arg(long)]
    pub split: bool,
}

pub fn run(cmd: ClassifyCmd) -> Result<()> {
    println!("{}", classify(cmd.top, cmd.bottom, cmd.split));
    Ok(())
}
