//! Common helpers shared by the pipeline: the crate error type and a minimal
//! FASTA parser used by the command-line front end and the tests.
//!
//! ## FASTA
//! The parser is intentionally permissive and suitable for small/medium files
//! such as plasmid references, cassettes and consensus reads. It supports
//! multi-record inputs, keeps the full header text after the identifier, and
//! uppercases the sequence letters.
//!
//! ## Examples
//! ```rust
//! use csi::parse_fasta;
//! let recs = parse_fasta(">ref pUC19 backbone
//! ACGT
//! >cass
//! ggcc
//! ");
//! assert_eq!(recs.len(), 2);
//! assert_eq!(recs[0].description, "pUC19 backbone");
//! assert_eq!(recs[1].seq, "GGCC");
//! ```
//!

/// Errors that can be returned by the algorithms in this crate.
///
/// These are precondition violations. Per-sequence resolution outcomes such as
/// "cassette not found" are reported through
/// [`FailureKind`](crate::FailureKind) instead.
#[derive(thiserror::Error, Debug)]
pub enum CsiError {
    /// Returned when sequence input is empty or contains non-nucleotide symbols.
    #[error("invalid sequence input: {0}")]
    InvalidSequence(String),
    /// Returned when a configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Returned when a CSV report cannot be written.
    #[error("csv output error: {0}")]
    Csv(#[from] csv::Error),
    /// Returned when an output stream cannot be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Returned when the batch worker pool cannot be started.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A simple in-memory FASTA record parsed by [`parse_fasta`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FastaRecord {
    /// Identifier from the FASTA header (first word after '>').
    pub id: String,
    /// Remainder of the header line after the identifier (may be empty).
    pub description: String,
    /// Raw sequence (uppercase). Symbols are validated later by
    /// [`Sequence::new`](crate::Sequence::new).
    pub seq: String,
}

/// Parse a minimal FASTA string into a vector of [`FastaRecord`].
///
/// *Lines starting with `>` start a new record.* All other lines are appended
/// (without spaces) to the current sequence. Sequences are uppercased.
/// Records with an empty header are kept with an empty `id`.
///
/// ## Panics
/// This function does not panic.
pub fn parse_fasta(text: &str) -> Vec<FastaRecord> {
    let mut out: Vec<FastaRecord> = vec![];
    let mut header: Option<(String, String)> = None;
    let mut seq = String::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix('>') {
            if let Some((id, description)) = header.take() {
                out.push(FastaRecord { id, description, seq: seq.to_ascii_uppercase() });
            }
            seq.clear();
            let rest = rest.trim();
            let (id, description) = match rest.split_once(char::is_whitespace) {
                Some((id, desc)) => (id.to_string(), desc.trim().to_string()),
                None => (rest.to_string(), String::new()),
            };
            header = Some((id, description));
        } else {
            seq.extend(line.chars().filter(|c| !c.is_whitespace()));
        }
    }
    if let Some((id, description)) = header {
        out.push(FastaRecord { id, description, seq: seq.to_ascii_uppercase() });
    }
    out
}
