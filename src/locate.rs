//! Locating cassette boundaries in a test read and anchoring read windows
//! onto the reference.
//!
//! Both searches run the same aligner over the two strands: the cassette (or
//! the read window) as given and its reverse complement, keeping the strand
//! with the higher score. Ties go to the sense strand. Within the chosen
//! strand every quality-passing hit that shares the top score is a
//! candidate; the `locate_*` and `find_*` functions return the first one,
//! the `*_candidates` functions return them all so the caller can pick among
//! equally good placements.
//!
//! For circular sequences the target is extended across its origin before
//! aligning and every reported target coordinate is folded back into
//! `[0, len)`.
use log::debug;

use crate::common::CsiError;
use crate::ends::{CassetteEnd, EndMarker};
use crate::quality::{co_optimal, filter_by_quality, quality};
use crate::sequence::Sequence;
use crate::water::{Aligner, Alignment};

/// The knobs shared by every search stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchParams {
    /// Length of the search window.
    pub num_bases: usize,
    /// Minimum quality an alignment must reach to be considered.
    pub min_quality: f64,
    /// Treat test and reference as circular molecules.
    pub circular: bool,
}

/// A read window anchored onto the reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Anchor {
    /// Best alignment of the window (or its reverse complement) in reference
    /// coordinates.
    pub alignment: Alignment,
    /// Whether the reverse complement of the window produced `alignment`.
    pub reverse_complement: bool,
    /// Start of the window in the test read.
    pub test_pos: isize,
}

/// Every quality-passing co-optimal alignment of a cassette boundary window
/// against `test`, in test coordinates.
pub fn cassette_end_hits(
    aligner: &Aligner,
    cassette: &Sequence,
    test: &Sequence,
    marker: EndMarker,
    params: &SearchParams,
) -> Result<Vec<Alignment>, CsiError> {
    if cassette.is_empty() || test.is_empty() {
        return Err(CsiError::InvalidSequence("empty cassette or test sequence".into()));
    }
    // Flip the whole cassette so start/end stay defined on the flipped molecule.
    let oriented = if marker.is_reverse_complement() {
        cassette.reverse_complement()
    } else {
        cassette.clone()
    };
    let w = params.num_bases.min(oriented.len());
    let window = match marker.end() {
        CassetteEnd::Start => &oriented.as_bytes()[..w],
        CassetteEnd::End => &oriented.as_bytes()[oriented.len() - w..],
    };

    let hits = if params.circular {
        let target = test.extended(w.saturating_sub(1));
        aligner
            .align(target.as_bytes(), window)?
            .into_iter()
            .map(|a| a.fold_target(test.len()))
            .collect()
    } else {
        aligner.align(test.as_bytes(), window)?
    };
    Ok(filter_by_quality(hits, params.min_quality))
}

/// Top-scoring hits of one cassette boundary (in one orientation) in `test`.
pub fn cassette_end_candidates(
    aligner: &Aligner,
    cassette: &Sequence,
    test: &Sequence,
    marker: EndMarker,
    params: &SearchParams,
) -> Result<Vec<Alignment>, CsiError> {
    let hits = cassette_end_hits(aligner, cassette, test, marker, params)?;
    let found = co_optimal(&hits);
    if let Some(a) = found.first() {
        debug!("{marker:?}: score {:.2} at test {} ({} co-optimal)", a.score, a.target_start(), found.len());
    }
    Ok(found)
}

/// Best alignment of one cassette boundary (in one orientation) in `test`.
pub fn locate_cassette_end(
    aligner: &Aligner,
    cassette: &Sequence,
    test: &Sequence,
    marker: EndMarker,
    params: &SearchParams,
) -> Result<Option<Alignment>, CsiError> {
    Ok(cassette_end_candidates(aligner, cassette, test, marker, params)?.into_iter().next())
}

/// Top-scoring hits of boundary `end` in the better orientation, and whether
/// that orientation is the reverse complement.
pub fn best_cassette_end_candidates(
    aligner: &Aligner,
    cassette: &Sequence,
    test: &Sequence,
    end: CassetteEnd,
    params: &SearchParams,
) -> Result<Option<(Vec<Alignment>, bool)>, CsiError> {
    let sense = cassette_end_candidates(aligner, cassette, test, EndMarker::new(end, false), params)?;
    let rc = cassette_end_candidates(aligner, cassette, test, EndMarker::new(end, true), params)?;
    Ok(pick_orientation(sense, rc))
}

/// Search both orientations of the cassette for boundary `end` and keep the
/// better one. Returns the alignment and whether it came from the reverse
/// complement.
pub fn locate_best_cassette_end(
    aligner: &Aligner,
    cassette: &Sequence,
    test: &Sequence,
    end: CassetteEnd,
    params: &SearchParams,
) -> Result<Option<(Alignment, bool)>, CsiError> {
    let found = best_cassette_end_candidates(aligner, cassette, test, end, params)?;
    Ok(found.and_then(|(hits, rc)| hits.into_iter().next().map(|a| (a, rc))))
}

/// Top-scoring placements of `test[anchor_position .. anchor_position +
/// num_bases]`, or of its reverse complement, in `reference`.
///
/// Returns `None` if the window cannot be extracted or neither orientation
/// reaches `min_quality`.
pub fn target_candidates_in_reference(
    aligner: &Aligner,
    reference: &Sequence,
    test: &Sequence,
    anchor_position: isize,
    params: &SearchParams,
) -> Result<Option<(Vec<Alignment>, bool)>, CsiError> {
    let Some(window) = extract_window(test, anchor_position, params) else {
        debug!("no test window at {anchor_position}");
        return Ok(None);
    };
    if window.is_empty() {
        return Ok(None);
    }
    let sense = co_optimal_in_reference(aligner, reference, &window, params)?;
    let rc = co_optimal_in_reference(aligner, reference, &window.reverse_complement(), params)?;
    Ok(pick_orientation(sense, rc))
}

/// Extract `test[anchor_position .. anchor_position + num_bases]` and find
/// it, or its reverse complement, in `reference`.
pub fn locate_target_in_reference(
    aligner: &Aligner,
    reference: &Sequence,
    test: &Sequence,
    anchor_position: isize,
    params: &SearchParams,
) -> Result<Option<(Alignment, bool)>, CsiError> {
    let found = target_candidates_in_reference(aligner, reference, test, anchor_position, params)?;
    Ok(found.and_then(|(hits, rc)| hits.into_iter().next().map(|a| (a, rc))))
}

/// Anchor every breakpoint of a cassette-boundary alignment (shifted back by
/// `search_offset`) and keep every anchor sharing the highest score.
///
/// Anchors come out in breakpoint order, then reference order.
pub fn anchor_candidates(
    aligner: &Aligner,
    reference: &Sequence,
    test: &Sequence,
    path: &[(usize, usize)],
    search_offset: usize,
    params: &SearchParams,
) -> Result<Vec<Anchor>, CsiError> {
    let mut top: Vec<Anchor> = Vec::new();
    for &(t, _) in path {
        let pos = t as isize - search_offset as isize;
        let Some((hits, reverse_complement)) =
            target_candidates_in_reference(aligner, reference, test, pos, params)?
        else {
            continue;
        };
        let Some(score) = hits.first().map(|a| a.score) else {
            continue;
        };
        match top.first().map(|a| a.alignment.score) {
            Some(current) if score < current => continue,
            Some(current) if score > current => top.clear(),
            None | Some(_) => {}
        }
        top.extend(hits.into_iter().map(|alignment| Anchor { alignment, reverse_complement, test_pos: pos }));
    }
    top.retain(|a| a.alignment.score > 0.0 && quality(&a.alignment) >= params.min_quality);
    for a in &top {
        debug!(
            "anchor at test {}: score {:.2} ({}) -> reference {}..{}",
            a.test_pos,
            a.alignment.score,
            if a.reverse_complement { "reverse complement" } else { "sense" },
            a.alignment.target_start(),
            a.alignment.target_end()
        );
    }
    Ok(top)
}

/// The first of [`anchor_candidates`]: highest score, earliest breakpoint.
pub fn find_best_target_in_ref(
    aligner: &Aligner,
    reference: &Sequence,
    test: &Sequence,
    path: &[(usize, usize)],
    search_offset: usize,
    params: &SearchParams,
) -> Result<Option<Anchor>, CsiError> {
    Ok(anchor_candidates(aligner, reference, test, path, search_offset, params)?.into_iter().next())
}

fn extract_window(test: &Sequence, pos: isize, params: &SearchParams) -> Option<Sequence> {
    let end = pos + params.num_bases as isize;
    if params.circular {
        test.get_seq(pos, end)
    } else if pos < 0 {
        None
    } else {
        test.slice(pos as usize, end as usize)
    }
}

fn co_optimal_in_reference(
    aligner: &Aligner,
    reference: &Sequence,
    query: &Sequence,
    params: &SearchParams,
) -> Result<Vec<Alignment>, CsiError> {
    let hits = if params.circular {
        let target = reference.extended(query.len().saturating_sub(1));
        aligner
            .align(target.as_bytes(), query.as_bytes())?
            .into_iter()
            .map(|a| a.fold_target(reference.len()))
            .collect()
    } else {
        aligner.align(reference.as_bytes(), query.as_bytes())?
    };
    let hits = filter_by_quality(hits, params.min_quality);
    Ok(co_optimal(&hits))
}

/// Only one orientation found: it wins. Both found: reverse complement must
/// score strictly higher to win.
fn pick_orientation(sense: Vec<Alignment>, rc: Vec<Alignment>) -> Option<(Vec<Alignment>, bool)> {
    let score = |hits: &[Alignment]| hits.first().map(|a| a.score);
    match (score(&sense), score(&rc)) {
        (None, None) => None,
        (Some(_), None) => Some((sense, false)),
        (None, Some(_)) => Some((rc, true)),
        (Some(s), Some(r)) => {
            if r > s { Some((rc, true)) } else { Some((sense, false)) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(s: &str) -> Sequence {
        Sequence::new(s).unwrap()
    }

    fn params(num_bases: usize, circular: bool) -> SearchParams {
        SearchParams { num_bases, min_quality: 1.0, circular }
    }

    #[test]
    fn start_and_end_windows() {
        let cass = seq("GCGTTCGCTCTATT");
        let test = seq("AAAAGCGTTCGCTCTATTAAAA");
        let p = params(6, false);
        let a = Aligner::default();
        let s = locate_cassette_end(&a, &cass, &test, EndMarker::StartSense, &p).unwrap().unwrap();
        assert_eq!(s.path, vec![(4, 0), (10, 6)]);
        let e = locate_cassette_end(&a, &cass, &test, EndMarker::EndSense, &p).unwrap().unwrap();
        assert_eq!(e.path, vec![(12, 0), (18, 6)]);
    }

    #[test]
    fn reverse_complement_uses_flipped_cassette() {
        let cass = seq("GCGTTCGCTCTATT");
        // reverse_complement(cass) = AATAGAGCGAACGC
        let test = seq("CCCCAATAGAGCGAACGCCCCC");
        let a = Aligner::default();
        let p = params(6, false);
        let (hit, rc) = locate_best_cassette_end(&a, &cass, &test, CassetteEnd::Start, &p)
            .unwrap()
            .unwrap();
        assert!(rc);
        assert_eq!(hit.target_start(), 4);
        let (hit, rc) = locate_best_cassette_end(&a, &cass, &test, CassetteEnd::End, &p)
            .unwrap()
            .unwrap();
        assert!(rc);
        assert_eq!(hit.target_end(), 18);
    }

    #[test]
    fn window_across_test_origin_is_found_when_circular() {
        let cass = seq("GCGTTCGCTCTATT");
        // Cassette start split across the origin: "CGCTCTATT...GCGTT"
        let test = seq("CGCTCTATTAAAAAAAAAGCGTT");
        let a = Aligner::default();
        assert!(locate_cassette_end(&a, &cass, &test, EndMarker::StartSense, &params(8, false))
            .unwrap()
            .is_none());
        let hit = locate_cassette_end(&a, &cass, &test, EndMarker::StartSense, &params(8, true))
            .unwrap()
            .unwrap();
        assert_eq!(hit.path, vec![(18, 0), (3, 8)]);
    }

    #[test]
    fn anchor_prefers_sense_on_palindromes() {
        let reference = seq("TTTTGAATTCTTTT");
        let test = seq("GAATTC");
        let a = Aligner::default();
        let (hit, rc) = locate_target_in_reference(&a, &reference, &test, 0, &params(6, false))
            .unwrap()
            .unwrap();
        assert!(!rc);
        assert_eq!(hit.path, vec![(4, 0), (10, 6)]);
    }

    #[test]
    fn anchor_falls_back_to_reverse_complement() {
        let reference = seq("TTACCCACTCTGCCAAAC");
        // reverse complement of "CACTCTGC"
        let test = seq("GCAGAGTG");
        let a = Aligner::default();
        let (hit, rc) = locate_target_in_reference(&a, &reference, &test, 0, &params(8, false))
            .unwrap()
            .unwrap();
        assert!(rc);
        assert_eq!(hit.path, vec![(5, 0), (13, 8)]);
    }

    #[test]
    fn window_out_of_range_on_linear_test() {
        let reference = seq("TTACCCACTCTGCCAAAC");
        let test = seq("CACTCTGC");
        let a = Aligner::default();
        assert!(locate_target_in_reference(&a, &reference, &test, -2, &params(8, false))
            .unwrap()
            .is_none());
    }

    #[test]
    fn best_breakpoint_is_selected() {
        let reference = seq("TTACCCACTCTGCCAAAC");
        let test = seq("GGGGGGGGCACTCTGCGG");
        let a = Aligner::default();
        // Breakpoint 16 shifted by 8 hits the flank; breakpoint 2 does not.
        let anchor = find_best_target_in_ref(&a, &reference, &test, &[(2, 0), (16, 6)], 8, &params(8, false))
            .unwrap()
            .unwrap();
        assert_eq!(anchor.test_pos, 8);
        assert!(!anchor.reverse_complement);
        assert_eq!(anchor.alignment.path, vec![(5, 0), (13, 8)]);
    }

    #[test]
    fn repeated_window_yields_every_placement() {
        let reference = seq("AAACCCGGGTTTAAACCCGGGTTT");
        let test = seq("CCCGGG");
        let a = Aligner::default();
        let (hits, rc) = target_candidates_in_reference(&a, &reference, &test, 0, &params(6, true))
            .unwrap()
            .unwrap();
        assert!(!rc);
        let starts: Vec<_> = hits.iter().map(|h| h.target_start()).collect();
        assert_eq!(starts, vec![3, 15]);
        let (first, _) = locate_target_in_reference(&a, &reference, &test, 0, &params(6, true))
            .unwrap()
            .unwrap();
        assert_eq!(first.target_start(), 3);
    }

    #[test]
    fn equally_good_breakpoints_are_all_kept() {
        let reference = seq("TTACCCACTCTGCCAAAC");
        // The same flank sits before both breakpoints.
        let test = seq("CACTCTGCGGCACTCTGCGG");
        let a = Aligner::default();
        let p = params(8, false);
        let anchors = anchor_candidates(&a, &reference, &test, &[(8, 0), (18, 6)], 8, &p).unwrap();
        let positions: Vec<_> = anchors.iter().map(|x| x.test_pos).collect();
        assert_eq!(positions, vec![0, 10]);
        let best = find_best_target_in_ref(&a, &reference, &test, &[(8, 0), (18, 6)], 8, &p)
            .unwrap()
            .unwrap();
        assert_eq!(best, anchors[0]);
    }
}
