//! Cleavage-site resolution: from a reference, a cassette and one test read
//! to a pair of strand break positions on the reference.
//!
//! The pipeline runs strictly in order and stops at the first failing stage:
//!
//! 1. find the cassette start in the read (both orientations, best wins);
//! 2. find the cassette end in the orientation chosen in step 1;
//! 3. anchor the read window just before the cassette onto the reference;
//! 4. anchor the read window just after the cassette onto the reference;
//! 5. derive top and bottom break positions and check their separation;
//! 6. decide whether the pair spans the origin by anchoring the read
//!    midpoint opposite the insertion;
//! 7. for 5' overhangs, check that the overhang reads the same on both
//!    sides of the cassette.
//!
//! Repeats can give several equally good hits for a cassette boundary or an
//! anchor. Steps 1 to 4 keep all of them, and step 5 takes the
//! orientation-consistent combination whose break positions lie closest
//! together (the earliest combination on ties).
//!
//! ### Example
//! ```rust
//! use csi::{Config, SequenceSearcher, Sequence, CleavageResult};
//! let reference = Sequence::new("TTTACCCACTCTGCCAAACTCCAGCGCGGTCAGTTCCATCACCCTAAGTAACCGAATAAT").unwrap();
//! let cassette = Sequence::new("GCGTTCGCTCTATT").unwrap();
//! let test = Sequence::new(&format!("{}{}{}", &reference.as_str()[..25], cassette, &reference.as_str()[25..])).unwrap();
//! let searcher = SequenceSearcher::new(Config { num_bases: 8, ..Default::default() }).unwrap();
//! let result = searcher.resolve(&reference, &cassette, &test).unwrap();
//! assert_eq!(result.site().map(|s| (s.top, s.bottom, s.split)), Some((25, 25, false)));
//! ```
use log::debug;

use crate::classify::{classify, site_gap, BreakType, CleavageSite};
use crate::common::CsiError;
use crate::ends::{CassetteEnd, EndMarker};
use crate::errors::{ErrorSink, FailureKind};
use crate::locate::{
    anchor_candidates, best_cassette_end_candidates, cassette_end_candidates, locate_cassette_end,
    locate_target_in_reference, Anchor, SearchParams,
};
use crate::sequence::Sequence;
use crate::water::{Aligner, AlignerParams, Alignment};

/// Run configuration for cleavage-site resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Length of the exact-match search window.
    pub num_bases: usize,
    /// Acceptance floor for every alignment, in `[0, 1]` (1 = exact match).
    pub min_quality: f64,
    /// Maximum permitted separation of top and bottom sites.
    ///
    /// On circular runs the separation is the short way round the origin
    /// (see [`site_gap`]), so sites `2` and `58` on a 60 bp reference are 4
    /// apart. Linear runs use the plain difference.
    pub max_gap: usize,
    /// Half-width of the local sequences reported around each site.
    pub local_r: usize,
    /// Reference bases shown either side of a site when rendering it.
    pub extra_nt: usize,
    /// Quality floor for the midpoint anchor; the lower of this and
    /// `min_quality` is used.
    pub midpoint_min_quality: f64,
    /// Treat reference and test reads as circular molecules.
    pub circular: bool,
    /// Upper bound for `num_bases` when widening an ambiguous cassette hit.
    /// `None` means the cassette length.
    pub max_num_bases: Option<usize>,
    /// Worker threads for batch runs (1 = run on the calling thread).
    pub threads: usize,
    /// Scoring used by the local aligner.
    pub aligner: AlignerParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_bases: 20,
            min_quality: 1.0,
            max_gap: 10,
            local_r: 1,
            extra_nt: 3,
            midpoint_min_quality: 0.75,
            circular: true,
            max_num_bases: None,
            threads: 1,
            aligner: AlignerParams::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), CsiError> {
        if self.num_bases == 0 {
            return Err(CsiError::InvalidConfig("num_bases must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.min_quality) {
            return Err(CsiError::InvalidConfig(format!(
                "min_quality must be within [0, 1] (got {})",
                self.min_quality
            )));
        }
        if !(0.0..=1.0).contains(&self.midpoint_min_quality) {
            return Err(CsiError::InvalidConfig(format!(
                "midpoint_min_quality must be within [0, 1] (got {})",
                self.midpoint_min_quality
            )));
        }
        if self.max_num_bases.is_some_and(|m| m < self.num_bases) {
            return Err(CsiError::InvalidConfig("max_num_bases must be >= num_bases".into()));
        }
        if self.threads == 0 {
            return Err(CsiError::InvalidConfig("threads must be > 0".into()));
        }
        self.aligner.validate()
    }

    fn search_params(&self, num_bases: usize) -> SearchParams {
        SearchParams { num_bases, min_quality: self.min_quality, circular: self.circular }
    }
}

/// Outcome of resolving one test sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CleavageResult {
    Resolved(CleavageSite),
    Failed(FailureKind),
}

impl CleavageResult {
    pub fn site(&self) -> Option<&CleavageSite> {
        match self {
            CleavageResult::Resolved(site) => Some(site),
            CleavageResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            CleavageResult::Resolved(_) => None,
            CleavageResult::Failed(kind) => Some(*kind),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, CleavageResult::Resolved(_))
    }
}

/// Sink that drops every event.
struct Discard;

impl ErrorSink for Discard {
    fn record(&mut self, _kind: FailureKind) {}
}

/// Resolves cleavage sites with one fixed configuration and aligner.
#[derive(Clone, Debug)]
pub struct SequenceSearcher {
    config: Config,
    aligner: Aligner,
}

impl SequenceSearcher {
    pub fn new(config: Config) -> Result<Self, CsiError> {
        config.validate()?;
        let aligner = Aligner::new(config.aligner.clone());
        Ok(Self { config, aligner })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn aligner(&self) -> &Aligner {
        &self.aligner
    }

    /// Resolve one test sequence.
    pub fn resolve(&self, reference: &Sequence, cassette: &Sequence, test: &Sequence) -> Result<CleavageResult, CsiError> {
        self.resolve_with_sink(reference, cassette, test, &mut Discard)
    }

    /// Resolve one test sequence, reporting a failure kind to `sink`.
    pub fn resolve_with_sink(
        &self,
        reference: &Sequence,
        cassette: &Sequence,
        test: &Sequence,
        sink: &mut dyn ErrorSink,
    ) -> Result<CleavageResult, CsiError> {
        check_inputs(reference, cassette, test)?;
        let result = self.run(reference, cassette, test, self.config.num_bases)?;
        Ok(report(result, sink))
    }

    /// Like [`resolve`](Self::resolve), but widen the search window while the
    /// cassette start matches at more than one position.
    ///
    /// `num_bases` grows by one per round up to `max_num_bases` (or the
    /// cassette length). If the hit is still ambiguous at the ceiling the
    /// result is [`FailureKind::AmbiguousMatch`].
    pub fn resolve_widening(&self, reference: &Sequence, cassette: &Sequence, test: &Sequence) -> Result<CleavageResult, CsiError> {
        self.resolve_widening_with_sink(reference, cassette, test, &mut Discard)
    }

    pub fn resolve_widening_with_sink(
        &self,
        reference: &Sequence,
        cassette: &Sequence,
        test: &Sequence,
        sink: &mut dyn ErrorSink,
    ) -> Result<CleavageResult, CsiError> {
        check_inputs(reference, cassette, test)?;
        let ceiling = self
            .config
            .max_num_bases
            .unwrap_or(cassette.len())
            .min(cassette.len())
            .max(self.config.num_bases);
        let mut num_bases = self.config.num_bases;
        loop {
            let positions = self.distinct_start_hits(cassette, test, num_bases)?;
            if positions <= 1 {
                let result = self.run(reference, cassette, test, num_bases)?;
                return Ok(report(result, sink));
            }
            if num_bases >= ceiling {
                debug!("cassette start still matches {positions} positions at num_bases {num_bases}");
                return Ok(report(CleavageResult::Failed(FailureKind::AmbiguousMatch), sink));
            }
            num_bases += 1;
            debug!("cassette start matches {positions} positions, widening to {num_bases}");
        }
    }

    /// Number of distinct test positions sharing the best cassette-start score.
    fn distinct_start_hits(&self, cassette: &Sequence, test: &Sequence, num_bases: usize) -> Result<usize, CsiError> {
        let params = self.config.search_params(num_bases);
        let Some((hits, _)) = best_cassette_end_candidates(&self.aligner, cassette, test, CassetteEnd::Start, &params)? else {
            return Ok(0);
        };
        let mut starts: Vec<usize> = hits.iter().map(|a| a.target_start()).collect();
        starts.sort_unstable();
        starts.dedup();
        Ok(starts.len())
    }

    fn run(&self, reference: &Sequence, cassette: &Sequence, test: &Sequence, num_bases: usize) -> Result<CleavageResult, CsiError> {
        use CleavageResult::Failed;

        let cfg = &self.config;
        let params = cfg.search_params(num_bases);
        let aligner = &self.aligner;

        debug!("finding cassette start in test sequence");
        let (starts, rc1) =
            best_cassette_end_candidates(aligner, cassette, test, CassetteEnd::Start, &params)?.unwrap_or_default();

        debug!("finding cassette end in test sequence");
        let ends = cassette_end_candidates(aligner, cassette, test, EndMarker::new(CassetteEnd::End, rc1), &params)?;

        // The end search is pinned to the start's orientation; the other
        // orientation is only consulted to tell a mismatch from a miss.
        if !starts.is_empty() && ends.is_empty() {
            let flipped = EndMarker::new(CassetteEnd::End, rc1).flipped();
            if locate_cassette_end(aligner, cassette, test, flipped, &params)?.is_some() {
                return Ok(Failed(FailureKind::CassetteEndsMismatch));
            }
        }
        if starts.is_empty() || ends.is_empty() {
            return Ok(Failed(FailureKind::CassetteNotFound));
        }

        debug!("anchoring cassette-adjacent test sequence in reference");
        let before = starts
            .iter()
            .map(|c| anchor_candidates(aligner, reference, test, &c.path, num_bases, &params))
            .collect::<Result<Vec<_>, _>>()?;
        let after = ends
            .iter()
            .map(|c| anchor_candidates(aligner, reference, test, &c.path, 0, &params))
            .collect::<Result<Vec<_>, _>>()?;
        let pairing = match closest_pairing(&starts, &ends, &before, &after, reference.len(), cfg.circular) {
            Ok(p) => p,
            Err(kind) => return Ok(Failed(kind)),
        };
        let Pairing { cass1, cass2, anchor1, anchor2, top, bottom, gap } = pairing;

        if gap > cfg.max_gap {
            debug!("cleavage site gap ({gap}) exceeds maximum permitted ({})", cfg.max_gap);
            return Ok(Failed(FailureKind::MaxGapExceeded));
        }

        let split = if cfg.circular {
            match self.midpoint_in_reference(reference, test, cass1.target_start(), cass2.target_end(), num_bases)? {
                Some(mid) => (top < mid) != (bottom < mid),
                None => return Ok(Failed(FailureKind::MidpointNotFound)),
            }
        } else {
            false
        };

        if classify(top, bottom, split) == BreakType::FivePrimeOverhang {
            let cut1 = anchor1.test_pos + num_bases as isize;
            let cut2 = anchor2.test_pos;
            let (o1, o2) = overhangs(test, cut1, cut2, gap, cfg.circular);
            if o1.is_none() || o1 != o2 {
                debug!("mismatch in 5' overhang ({o1:?}, {o2:?})");
                return Ok(Failed(FailureKind::OverhangMismatch));
            }
        }

        Ok(CleavageResult::Resolved(CleavageSite::new(top, bottom, split)))
    }

    /// Reference position of the read region opposite the cassette.
    fn midpoint_in_reference(
        &self,
        reference: &Sequence,
        test: &Sequence,
        cass_start: usize,
        cass_end: usize,
        num_bases: usize,
    ) -> Result<Option<usize>, CsiError> {
        let n = test.len() as isize;
        let outside = (cass_start as isize - cass_end as isize).rem_euclid(n);
        if outside < num_bases as isize {
            debug!("no room outside the cassette for a midpoint window");
            return Ok(None);
        }
        let pos = cass_end as isize + (outside - num_bases as isize) / 2;
        let params = SearchParams {
            num_bases,
            min_quality: self.config.min_quality.min(self.config.midpoint_min_quality),
            circular: true,
        };
        let found = locate_target_in_reference(&self.aligner, reference, test, pos, &params)?;
        Ok(found.map(|(a, rc)| if rc { a.target_end() } else { a.target_start() }))
    }
}

/// One cassette start, one cassette end and the anchors next to them.
struct Pairing<'a> {
    cass1: &'a Alignment,
    cass2: &'a Alignment,
    anchor1: &'a Anchor,
    anchor2: &'a Anchor,
    top: usize,
    bottom: usize,
    gap: usize,
}

/// The orientation-consistent combination of cassette hits and their anchors
/// with the smallest site gap; the first one found wins ties.
///
/// `before[i]` holds the anchors for `starts[i]`, `after[j]` those for
/// `ends[j]`.
fn closest_pairing<'a>(
    starts: &'a [Alignment],
    ends: &'a [Alignment],
    before: &'a [Vec<Anchor>],
    after: &'a [Vec<Anchor>],
    ref_len: usize,
    circular: bool,
) -> Result<Pairing<'a>, FailureKind> {
    let mut anchored = false;
    let mut closest: Option<Pairing<'a>> = None;
    for (cass1, anchors1) in starts.iter().zip(before) {
        for (cass2, anchors2) in ends.iter().zip(after) {
            if anchors1.is_empty() || anchors2.is_empty() {
                continue;
            }
            anchored = true;
            for anchor1 in anchors1 {
                for anchor2 in anchors2.iter().filter(|a| a.reverse_complement == anchor1.reverse_complement) {
                    // Reverse complementing swaps which anchor sees the 5' side.
                    let (top, bottom) = if anchor1.reverse_complement {
                        (anchor1.alignment.target_start(), anchor2.alignment.target_end())
                    } else {
                        (anchor2.alignment.target_start(), anchor1.alignment.target_end())
                    };
                    let gap = site_gap(top, bottom, ref_len, circular);
                    if closest.as_ref().map_or(true, |c| gap < c.gap) {
                        closest = Some(Pairing { cass1, cass2, anchor1, anchor2, top, bottom, gap });
                    }
                }
            }
        }
    }
    if !anchored {
        return Err(FailureKind::TestNotFoundInReference);
    }
    let closest = closest.ok_or(FailureKind::TestEndsMismatch)?;
    debug!(
        "sites {} and {} from cassette hits at test {} and {}",
        closest.top,
        closest.bottom,
        closest.cass1.target_start(),
        closest.cass2.target_end()
    );
    Ok(closest)
}

/// Resolve one test sequence with a one-off searcher.
pub fn resolve(reference: &Sequence, cassette: &Sequence, test: &Sequence, config: &Config) -> Result<CleavageResult, CsiError> {
    SequenceSearcher::new(config.clone())?.resolve(reference, cassette, test)
}

fn check_inputs(reference: &Sequence, cassette: &Sequence, test: &Sequence) -> Result<(), CsiError> {
    if reference.is_empty() {
        return Err(CsiError::InvalidSequence("empty reference".into()));
    }
    if cassette.is_empty() {
        return Err(CsiError::InvalidSequence("empty cassette".into()));
    }
    if test.is_empty() {
        return Err(CsiError::InvalidSequence("empty test sequence".into()));
    }
    Ok(())
}

fn report(result: CleavageResult, sink: &mut dyn ErrorSink) -> CleavageResult {
    match result {
        CleavageResult::Failed(kind) => {
            debug!("resolution failed: {}", kind.description());
            sink.record(kind);
        }
        CleavageResult::Resolved(site) => {
            debug!("resolved top {} bottom {} split {}", site.top, site.bottom, site.split);
        }
    }
    result
}

/// The `len` bases before `cut1` and after `cut2` in the read.
fn overhangs(test: &Sequence, cut1: isize, cut2: isize, len: usize, circular: bool) -> (Option<Sequence>, Option<Sequence>) {
    let len = len as isize;
    if circular {
        (test.get_seq(cut1 - len, cut1), test.get_seq(cut2, cut2 + len))
    } else {
        let before = if cut1 - len >= 0 { test.slice((cut1 - len) as usize, cut1 as usize) } else { None };
        let after = if cut2 >= 0 { test.slice(cut2 as usize, (cut2 + len) as usize) } else { None };
        (before, after)
    }
}
