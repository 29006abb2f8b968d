//! # csi
//!
//! Cleavage-site identification for DNA insertion experiments.
//!
//! A known *cassette* is inserted into a *reference* (typically a circular
//! plasmid) at the point where the reference was cut. Given a sequenced read
//! of the product, this crate finds the cassette in the read, anchors the
//! flanking read sequence back onto the reference, and reports the top- and
//! bottom-strand break positions that produced the insertion.
//!
//! ## Pipeline
//! All searches use one local aligner ([`Aligner`], Smith–Waterman with
//! affine gaps) and one acceptance rule: an alignment passes if its
//! [`quality`] (score divided by query length) reaches `min_quality`.
//!
//! - [`locate`] finds cassette boundaries in the read and anchors read
//!   windows onto the reference, trying both strands.
//! - [`SequenceSearcher`] runs the full resolution and returns a
//!   [`CleavageResult`]: a [`CleavageSite`] or the [`FailureKind`] that
//!   stopped it.
//! - [`classify`] turns a site into a [`BreakType`].
//! - [`FrequencyMap`] and [`run_batch`] aggregate many reads.
//!
//! Circular molecules are handled with wraparound slicing
//! ([`Sequence::get_seq`]); positions are always reported in `[0, len)`.
//!
//! ### Example
//! ```
//! use csi::{classify, BreakType};
//! assert_eq!(classify(12, 12, false), BreakType::Blunt);
//! assert_eq!(classify(14, 12, false), BreakType::ThreePrimeOverhang);
//! assert_eq!(classify(14, 12, true), BreakType::FivePrimeOverhang);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod batch;
pub mod classify;
pub mod common;
pub mod ends;
pub mod errors;
pub mod frequency;
pub mod locate;
pub mod quality;
pub mod report;
pub mod searcher;
pub mod sequence;
pub mod water;

pub use batch::{run_batch, BatchReport, RecordResult, TestRecord};
pub use classify::{classify, local_sequences, site_gap, BreakType, CleavageSite};
pub use common::{parse_fasta, CsiError, FastaRecord};
pub use ends::{CassetteEnd, EndMarker};
pub use errors::{ErrorSink, ErrorStore, FailureKind};
pub use frequency::FrequencyMap;
pub use locate::{Anchor, SearchParams};
pub use quality::quality;
pub use report::{error_summary, frequency_table, render_break, write_individual_csv, write_summary_csv};
pub use searcher::{resolve, CleavageResult, Config, SequenceSearcher};
pub use sequence::Sequence;
pub use water::{Aligner, AlignerParams, Alignment};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_resolve_matches_searcher() {
        let reference = Sequence::new("TTTACCCACTCTGCCAAACTCCAGCGCGGTCAGTTCCATCACCCTAAGTAACCGAATAAT").unwrap();
        let cassette = Sequence::new("GCGTTCGCTCTATT").unwrap();
        let r = reference.as_str();
        let test = Sequence::new(&format!("{}{}{}", &r[..25], cassette, &r[29..])).unwrap();
        let cfg = Config { num_bases: 8, ..Default::default() };
        let a = resolve(&reference, &cassette, &test, &cfg).unwrap();
        let b = SequenceSearcher::new(cfg).unwrap().resolve(&reference, &cassette, &test).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.site().map(|s| s.break_type()), Some(BreakType::ThreePrimeOverhang));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = SequenceSearcher::new(Config { min_quality: -0.1, ..Default::default() }).unwrap_err();
        assert!(matches!(err, CsiError::InvalidConfig(_)));
    }
}
