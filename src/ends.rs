//! Which cassette boundary a search is looking for.

/// The boundary of the cassette being searched for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CassetteEnd {
    /// The first `num_bases` of the (oriented) cassette.
    Start,
    /// The last `num_bases` of the (oriented) cassette.
    End,
}

/// A cassette boundary in a fixed orientation.
///
/// Reverse-complement markers refer to the boundaries of the flipped
/// molecule: `StartReverseComplement` is the first `num_bases` of
/// `reverse_complement(cassette)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndMarker {
    StartSense,
    StartReverseComplement,
    EndSense,
    EndReverseComplement,
}

impl EndMarker {
    pub fn new(end: CassetteEnd, reverse_complement: bool) -> Self {
        match (end, reverse_complement) {
            (CassetteEnd::Start, false) => EndMarker::StartSense,
            (CassetteEnd::Start, true) => EndMarker::StartReverseComplement,
            (CassetteEnd::End, false) => EndMarker::EndSense,
            (CassetteEnd::End, true) => EndMarker::EndReverseComplement,
        }
    }

    pub fn end(self) -> CassetteEnd {
        match self {
            EndMarker::StartSense | EndMarker::StartReverseComplement => CassetteEnd::Start,
            EndMarker::EndSense | EndMarker::EndReverseComplement => CassetteEnd::End,
        }
    }

    pub fn is_reverse_complement(self) -> bool {
        matches!(self, EndMarker::StartReverseComplement | EndMarker::EndReverseComplement)
    }

    /// The same boundary in the other orientation.
    pub fn flipped(self) -> Self {
        EndMarker::new(self.end(), !self.is_reverse_complement())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_round_trip() {
        for end in [CassetteEnd::Start, CassetteEnd::End] {
            for rc in [false, true] {
                let m = EndMarker::new(end, rc);
                assert_eq!(m.end(), end);
                assert_eq!(m.is_reverse_complement(), rc);
                assert_eq!(m.flipped().flipped(), m);
                assert_ne!(m.flipped(), m);
            }
        }
    }
}
