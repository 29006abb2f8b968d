//! CLI subcommand implementation. Use via `csi resolve`.
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use csi::*;

/// Options for the `resolve` subcommand.
#[derive(Debug, Args)]
pub struct ResolveCmd {
    /// FASTA file with the reference sequence (first record is used).
    #[arg(long, value_name="FILE")]
    pub reference: PathBuf,
    /// FASTA file with the inserted cassette (first record is used).
    #[arg(long, value_name="FILE")]
    pub cassette: PathBuf,
    /// Multi-FASTA file of consensus reads to resolve.
    #[arg(long, value_name="FILE")]
    pub consensus: PathBuf,
    /// Length of the exact-match search window.
    #[arg(long, default_value_t=20)]
    pub num_bases: usize,
    /// Minimum alignment quality (score / window length).
    #[arg(long, default_value_t=1.0)]
    pub min_quality: f64,
    /// Maximum separation of top and bottom break positions.
    #[arg(long, default_value_t=10)]
    pub max_gap: usize,
    /// Half-width of the local sequence reported around each break.
    #[arg(long, default_value_t=1)]
    pub local_r: usize,
    /// Reference bases shown either side of a rendered break.
    #[arg(long, default_value_t=3)]
    pub extra_nt: usize,
    /// Quality floor for the split-detection midpoint anchor.
    #[arg(long, default_value_t=0.75)]
    pub midpoint_min_quality: f64,
    /// Treat reference and reads as linear molecules.
    #[arg(long)]
    pub linear: bool,
    /// Widen the search window while the cassette start is ambiguous.
    #[arg(long)]
    pub widen: bool,
    /// Upper bound for the widened window (default: cassette length).
    #[arg(long)]
    pub max_num_bases: Option<usize>,
    /// Worker threads.
    #[arg(long, default_value_t=1)]
    pub threads: usize,
    /// Aligner match score.
    #[arg(long, default_value_t=1.0)]
    pub match_score: f64,
    /// Aligner mismatch score (negative).
    #[arg(long, default_value_t=-1.0, allow_negative_numbers=true)]
    pub mismatch: f64,
    /// Gap open score (negative).
    #[arg(long, default_value_t=-1.0, allow_negative_numbers=true)]
    pub gapopen: f64,
    /// Gap extension score (negative).
    #[arg(long, default_value_t=-1.0, allow_negative_numbers=true)]
    pub gapextend: f64,
    /// Write the per-site summary CSV here.
    #[arg(long)]
    pub summary: Option<PathBuf>,
    /// Write the per-read results CSV here.
    #[arg(long)]
    pub individual: Option<PathBuf>,
}

fn read_fasta(path: &Path) -> Result<Vec<FastaRecord>> {
    let mut s = String::new();
    File::open(path).with_context(|| format!("open FASTA: {}", path.display()))?.read_to_string(&mut s)?;
    let recs = parse_fasta(&s);
    if recs.is_empty() { anyhow::bail!("no FASTA records in {}", path.display()); }
    Ok(recs)
}

fn first_sequence(path: &Path) -> Result<Sequence> {
    let rec = read_fasta(path)?.swap_remove(0);
    Sequence::new(&rec.seq).with_context(|| format!("sequence {} in {}", rec.id, path.display()))
}

pub fn run(cmd: ResolveCmd) -> Result<()> {
    let reference = first_sequence(&cmd.reference)?;
    let cassette = first_sequence(&cmd.cassette)?;
    let tests = read_fasta(&cmd.consensus)?
        .into_iter()
        .map(TestRecord::try_from)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("consensus reads in {}", cmd.consensus.display()))?;

    let config = Config {
        num_bases: cmd.num_bases,
        min_quality: cmd.min_quality,
        max_gap: cmd.max_gap,
        local_r: cmd.local_r,
        extra_nt: cmd.extra_nt,
        midpoint_min_quality: cmd.midpoint_min_quality,
        circular: !cmd.linear,
        max_num_bases: cmd.max_num_bases,
        threads: cmd.threads,
        aligner: AlignerParams {
            match_score: cmd.match_score,
            mismatch_score: cmd.mismatch,
            open_gap_score: cmd.gapopen,
            extend_gap_score: cmd.gapextend,
        },
    };
    let searcher = SequenceSearcher::new(config)?;
    let report = run_batch(&searcher, &reference, &cassette, &tests, cmd.widen)?;

    println!("RESULTS:");
    println!("Full sequence frequency:\n");
    print!("{}", frequency_table(&reference, &report.frequencies, cmd.extra_nt));
    println!("Summary of errors:\n");
    print!("{}", error_summary(&report.errors, report.processed()));

    if let Some(path) = &cmd.summary {
        let f = File::create(path).with_context(|| format!("create summary: {}", path.display()))?;
        write_summary_csv(f, &reference, &report.frequencies, &report.errors, cmd.local_r, cmd.extra_nt)?;
    }
    if let Some(path) = &cmd.individual {
        let f = File::create(path).with_context(|| format!("create individual: {}", path.display()))?;
        write_individual_csv(f, &reference, &report, cmd.local_r, cmd.extra_nt)?;
    }
    Ok(())
}
