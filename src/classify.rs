//! Break geometry of a resolved cleavage site, and the reference context
//! around it.
use std::fmt;

use crate::sequence::Sequence;

/// A resolved pair of strand break positions on the reference.
///
/// `top` is the break on the top strand and `bottom` the break on the bottom
/// strand, both as positions between bases. `split` marks a pair whose short
/// arc crosses the origin of the circular reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CleavageSite {
    pub top: usize,
    pub bottom: usize,
    pub split: bool,
}

impl CleavageSite {
    pub fn new(top: usize, bottom: usize, split: bool) -> Self {
        Self { top, bottom, split }
    }

    pub fn break_type(&self) -> BreakType {
        classify(self.top, self.bottom, self.split)
    }
}

/// Geometric type of a double-strand break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BreakType {
    ThreePrimeOverhang,
    Blunt,
    FivePrimeOverhang,
}

impl BreakType {
    pub fn label(self) -> &'static str {
        match self {
            BreakType::ThreePrimeOverhang => "3' overhang",
            BreakType::Blunt => "Blunt end",
            BreakType::FivePrimeOverhang => "5' overhang",
        }
    }
}

impl fmt::Display for BreakType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a break. An origin-spanning pair (`split`) is equivalent to the
/// opposite-signed non-spanning pair, so it inverts the comparison.
pub fn classify(top: usize, bottom: usize, split: bool) -> BreakType {
    if top == bottom {
        BreakType::Blunt
    } else if (bottom < top) != split {
        BreakType::ThreePrimeOverhang
    } else {
        BreakType::FivePrimeOverhang
    }
}

/// Distance between two sites; on a circular reference the shorter arc.
pub fn site_gap(top: usize, bottom: usize, len: usize, circular: bool) -> usize {
    let d = top.abs_diff(bottom);
    if circular && len > 0 {
        let d = d % len;
        d.min(len - d)
    } else {
        d
    }
}

/// `local_r` reference bases either side of each site. The bottom-strand
/// sequence is read 5'→3' on the bottom strand (reverse complemented).
pub fn local_sequences(reference: &Sequence, site: &CleavageSite, local_r: usize) -> (Sequence, Sequence) {
    let around = |pos: usize| {
        let p = pos as isize;
        let r = local_r as isize;
        reference.get_seq(p - r, p + r).unwrap_or_default()
    };
    (around(site.top), around(site.bottom).reverse_complement())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blunt_regardless_of_split() {
        assert_eq!(classify(10, 10, false), BreakType::Blunt);
        assert_eq!(classify(10, 10, true), BreakType::Blunt);
    }

    #[test]
    fn split_inverts_overhang() {
        assert_eq!(classify(29, 25, false), BreakType::ThreePrimeOverhang);
        assert_eq!(classify(25, 29, false), BreakType::FivePrimeOverhang);
        assert_eq!(classify(2, 58, true), BreakType::ThreePrimeOverhang);
        assert_eq!(classify(58, 2, true), BreakType::FivePrimeOverhang);
    }

    #[test]
    fn circular_gap_takes_short_arc() {
        assert_eq!(site_gap(2, 58, 60, true), 4);
        assert_eq!(site_gap(2, 58, 60, false), 56);
        assert_eq!(site_gap(25, 29, 60, true), 4);
    }

    #[test]
    fn local_sequences_wrap() {
        let reference = Sequence::new("AACCGGTTAC").unwrap();
        let (t, b) = local_sequences(&reference, &CleavageSite::new(4, 0, true), 1);
        assert_eq!(t.as_str(), "CG");
        // "CA" across the origin, reverse complemented
        assert_eq!(b.as_str(), "TG");
    }

    #[test]
    fn labels() {
        assert_eq!(BreakType::Blunt.to_string(), "Blunt end");
        assert_eq!(CleavageSite::new(3, 5, false).break_type(), BreakType::FivePrimeOverhang);
    }
}
