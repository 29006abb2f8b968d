//! Alignment quality: score normalized by the full query length.
//!
//! With the default scoring a quality of `1.0` means the whole query matched
//! without mismatches or gaps.
use crate::water::Alignment;

/// `score / query_len`, or `0.0` for a zero-length query.
pub fn quality(alignment: &Alignment) -> f64 {
    if alignment.query_len == 0 {
        return 0.0;
    }
    alignment.score / alignment.query_len as f64
}

/// Keep only alignments whose quality is at least `min_quality`.
pub fn filter_by_quality(alignments: Vec<Alignment>, min_quality: f64) -> Vec<Alignment> {
    alignments.into_iter().filter(|a| quality(a) >= min_quality).collect()
}

/// The highest-scoring alignment; the earliest one wins ties.
///
/// Returns `None` for an empty list or when the best score is not positive.
pub fn best(alignments: &[Alignment]) -> Option<&Alignment> {
    let mut top: Option<&Alignment> = None;
    for a in alignments {
        if top.map_or(true, |t| a.score > t.score) {
            top = Some(a);
        }
    }
    top.filter(|a| a.score > 0.0)
}

/// Every alignment sharing the top score, in input order.
///
/// Empty when the list is empty or the top score is not positive. The first
/// element, when present, is the one [`best`] picks.
pub fn co_optimal(alignments: &[Alignment]) -> Vec<Alignment> {
    let Some(top) = best(alignments) else {
        return Vec::new();
    };
    alignments.iter().filter(|a| a.score == top.score).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(score: f64, query_len: usize, start: usize) -> Alignment {
        Alignment { score, query_len, path: vec![(start, 0), (start + query_len, query_len)] }
    }

    #[test]
    fn perfect_match_is_one() {
        assert_eq!(quality(&aln(20.0, 20, 0)), 1.0);
        assert_eq!(quality(&aln(15.0, 20, 0)), 0.75);
        assert_eq!(quality(&aln(0.0, 0, 0)), 0.0);
    }

    #[test]
    fn filter_drops_low_quality() {
        let kept = filter_by_quality(vec![aln(20.0, 20, 0), aln(19.0, 20, 5)], 1.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].target_start(), 0);
        assert!(filter_by_quality(Vec::new(), 0.5).is_empty());
    }

    #[test]
    fn best_prefers_first_on_ties() {
        let list = vec![aln(5.0, 6, 3), aln(6.0, 6, 10), aln(6.0, 6, 20)];
        assert_eq!(best(&list).unwrap().target_start(), 10);
    }

    #[test]
    fn best_of_nothing() {
        assert!(best(&[]).is_none());
        assert!(best(&[aln(0.0, 6, 0)]).is_none());
    }

    #[test]
    fn co_optimal_keeps_every_tie_in_order() {
        let list = vec![aln(6.0, 6, 20), aln(5.0, 6, 3), aln(6.0, 6, 10)];
        let starts: Vec<_> = co_optimal(&list).iter().map(|a| a.target_start()).collect();
        assert_eq!(starts, vec![20, 10]);
        assert_eq!(co_optimal(&list)[0], *best(&list).unwrap());
        assert!(co_optimal(&[aln(0.0, 6, 0)]).is_empty());
    }
}
