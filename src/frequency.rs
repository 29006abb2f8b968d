//! Frequency of resolved cleavage sites across a batch.
use std::collections::HashMap;

use crate::classify::CleavageSite;
use crate::searcher::CleavageResult;

/// Counts per distinct `(top, bottom, split)` site. Failed results are
/// ignored; they are tallied by [`ErrorStore`](crate::errors::ErrorStore).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyMap {
    counts: HashMap<CleavageSite, usize>,
}

impl FrequencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, result: &CleavageResult) {
        if let CleavageResult::Resolved(site) = result {
            *self.counts.entry(*site).or_insert(0) += 1;
        }
    }

    pub fn get(&self, site: &CleavageSite) -> usize {
        self.counts.get(site).copied().unwrap_or(0)
    }

    /// Number of successful results accumulated.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of distinct sites.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sites by descending count. Equal counts are ordered by site so the
    /// view is deterministic.
    pub fn sorted(&self) -> Vec<(CleavageSite, usize)> {
        let mut rows: Vec<_> = self.counts.iter().map(|(&s, &c)| (s, c)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        rows
    }
}

impl<'a> Extend<&'a CleavageResult> for FrequencyMap {
    fn extend<I: IntoIterator<Item = &'a CleavageResult>>(&mut self, iter: I) {
        for r in iter {
            self.accumulate(r);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;

    #[test]
    fn aggregation() {
        let a = CleavageSite::new(100, 100, false);
        let b = CleavageSite::new(205, 198, false);
        let mut freq = FrequencyMap::new();
        freq.extend(&[
            CleavageResult::Resolved(a),
            CleavageResult::Resolved(b),
            CleavageResult::Failed(FailureKind::MaxGapExceeded),
            CleavageResult::Resolved(a),
        ]);
        assert_eq!(freq.get(&a), 2);
        assert_eq!(freq.get(&b), 1);
        assert_eq!(freq.total(), 3);
        assert_eq!(freq.sorted(), vec![(a, 2), (b, 1)]);
    }

    #[test]
    fn ties_sort_by_site() {
        let mut freq = FrequencyMap::new();
        freq.accumulate(&CleavageResult::Resolved(CleavageSite::new(9, 9, false)));
        freq.accumulate(&CleavageResult::Resolved(CleavageSite::new(3, 5, false)));
        let sites: Vec<_> = freq.sorted().into_iter().map(|(s, _)| s.top).collect();
        assert_eq!(sites, vec![3, 9]);
    }

    #[test]
    fn failures_leave_the_map_untouched() {
        let mut freq = FrequencyMap::new();
        freq.accumulate(&CleavageResult::Failed(FailureKind::CassetteNotFound));
        assert!(freq.is_empty());
        assert_eq!(freq, FrequencyMap::new());
    }
}
