//! Per-sequence failure taxonomy and the error-counting sink.
//!
//! A failed resolution never aborts a batch. The resolver hands the failure
//! kind to an [`ErrorSink`] (if one is attached) and returns
//! [`CleavageResult::Failed`](crate::CleavageResult::Failed).
use std::collections::BTreeMap;
use std::fmt;

/// Why a test sequence could not be resolved to a cleavage site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// No quality-passing alignment for a cassette boundary.
    CassetteNotFound,
    /// The two cassette boundaries were found in different orientations.
    CassetteEndsMismatch,
    /// A cassette-adjacent window could not be anchored on the reference.
    TestNotFoundInReference,
    /// The two reference anchors disagree on orientation.
    TestEndsMismatch,
    /// Top and bottom sites are farther apart than `max_gap`.
    MaxGapExceeded,
    /// The split-detection anchor could not be placed on the reference.
    MidpointNotFound,
    /// The 5' overhang reads differently on the two sides of the cassette.
    OverhangMismatch,
    /// The cassette boundary stayed ambiguous up to the widening ceiling.
    AmbiguousMatch,
}

impl FailureKind {
    pub const ALL: [FailureKind; 8] = [
        FailureKind::CassetteNotFound,
        FailureKind::CassetteEndsMismatch,
        FailureKind::TestNotFoundInReference,
        FailureKind::TestEndsMismatch,
        FailureKind::MaxGapExceeded,
        FailureKind::MidpointNotFound,
        FailureKind::OverhangMismatch,
        FailureKind::AmbiguousMatch,
    ];

    /// Stable machine-readable label.
    pub fn code(self) -> &'static str {
        match self {
            FailureKind::CassetteNotFound => "CASSETTE_NOT_FOUND",
            FailureKind::CassetteEndsMismatch => "CASSETTE_ENDS_MISMATCH",
            FailureKind::TestNotFoundInReference => "TEST_NOT_FOUND_IN_REFERENCE",
            FailureKind::TestEndsMismatch => "TEST_ENDS_MISMATCH",
            FailureKind::MaxGapExceeded => "MAX_GAP_EXCEEDED",
            FailureKind::MidpointNotFound => "MIDPOINT_NOT_FOUND",
            FailureKind::OverhangMismatch => "OVERHANG_MISMATCH",
            FailureKind::AmbiguousMatch => "AMBIGUOUS_MATCH",
        }
    }

    /// Human-readable description used in summaries.
    pub fn description(self) -> &'static str {
        match self {
            FailureKind::CassetteNotFound => "Cassette not found in consensus",
            FailureKind::CassetteEndsMismatch => "Cassette ends RC mismatch",
            FailureKind::TestNotFoundInReference => "Consensus not found in reference",
            FailureKind::TestEndsMismatch => "Consensus ends RC mismatch",
            FailureKind::MaxGapExceeded => "Maximum gap exceeded",
            FailureKind::MidpointNotFound => "Midpoint not found",
            FailureKind::OverhangMismatch => "5' overhang mismatch",
            FailureKind::AmbiguousMatch => "Ambiguous cassette match",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Receives one event per failed resolution.
pub trait ErrorSink {
    fn record(&mut self, kind: FailureKind);
}

/// Counts failures per kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorStore {
    counts: BTreeMap<FailureKind, usize>,
}

impl ErrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: FailureKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Counts for every kind, including zeros, in taxonomy order.
    pub fn breakdown(&self) -> Vec<(FailureKind, usize)> {
        FailureKind::ALL.iter().map(|&k| (k, self.count(k))).collect()
    }

    /// Fold another store into this one.
    pub fn merge(&mut self, other: &ErrorStore) {
        for (&k, &v) in &other.counts {
            *self.counts.entry(k).or_insert(0) += v;
        }
    }
}

impl ErrorSink for ErrorStore {
    fn record(&mut self, kind: FailureKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }
}

impl ErrorSink for Vec<FailureKind> {
    fn record(&mut self, kind: FailureKind) {
        self.push(kind);
    }
}
