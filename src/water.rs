//! Smith–Waterman local alignment with affine gaps, returning every
//! co-optimal alignment.
//!
//! This is the pairwise aligner the cleavage-site pipeline is built on. Scores
//! are additive (`match_score` > 0, everything else ≤ 0) and kept as `f64` so
//! fractional knobs stay exact. The defaults (+1 match, −1 mismatch, −1 gap
//! open and extend) make a perfect hit of a query score exactly its length.
//!
//! Unlike a single-traceback aligner, [`Aligner::align`] returns one
//! [`Alignment`] per DP cell that reaches the maximum score: a query that
//! occurs twice in the target yields two alignments, in ascending order of
//! target end position.
//!
//! ### Example
//! ```rust
//! use csi::{Aligner, AlignerParams};
//! let aligner = Aligner::new(AlignerParams::default());
//! let hits = aligner.align(b"ACGTTACGT", b"ACGT").unwrap();
//! assert_eq!(hits.len(), 2);
//! assert_eq!(hits[1].path, vec![(5, 0), (9, 4)]);
//! ```
use crate::common::CsiError;

/// Scoring parameters for the local aligner.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignerParams {
    /// Score added per matched base.
    pub match_score: f64,
    /// Score added per mismatched base.
    pub mismatch_score: f64,
    /// Score added for the first position of a gap.
    pub open_gap_score: f64,
    /// Score added for each further position of a gap.
    pub extend_gap_score: f64,
}

impl Default for AlignerParams {
    fn default() -> Self {
        Self {
            match_score: 1.0,
            mismatch_score: -1.0,
            open_gap_score: -1.0,
            extend_gap_score: -1.0,
        }
    }
}

impl AlignerParams {
    pub(crate) fn validate(&self) -> Result<(), CsiError> {
        let finite = [self.match_score, self.mismatch_score, self.open_gap_score, self.extend_gap_score]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(CsiError::InvalidConfig("aligner scores must be finite".into()));
        }
        if self.match_score <= 0.0 {
            return Err(CsiError::InvalidConfig(format!(
                "match_score must be positive (got {})",
                self.match_score
            )));
        }
        if self.mismatch_score > 0.0 || self.open_gap_score > 0.0 || self.extend_gap_score > 0.0 {
            return Err(CsiError::InvalidConfig(
                "mismatch and gap scores must not be positive".into(),
            ));
        }
        Ok(())
    }
}

/// A local alignment of a query against a target.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    /// Alignment score.
    pub score: f64,
    /// Length of the full query that was aligned (not only the aligned part).
    pub query_len: usize,
    /// Breakpoints as `(target, query)` positions, start first and end last.
    /// Ends are exclusive. A breakpoint is added wherever the alignment
    /// switches between aligned columns, gaps in the query and gaps in the
    /// target.
    pub path: Vec<(usize, usize)>,
}

impl Alignment {
    /// Target position where the alignment starts.
    pub fn target_start(&self) -> usize {
        self.path.first().map(|p| p.0).unwrap_or(0)
    }

    /// Target position one past the alignment end.
    pub fn target_end(&self) -> usize {
        self.path.last().map(|p| p.0).unwrap_or(0)
    }

    /// Map every target coordinate into `[0, len)`; used after aligning
    /// against an origin-extended circular target.
    pub(crate) fn fold_target(mut self, len: usize) -> Self {
        if len > 0 {
            for p in &mut self.path {
                p.0 %= len;
            }
        }
        self
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Op {
    Match,
    /// Target base against a gap in the query.
    Del,
    /// Query base against a gap in the target.
    Ins,
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    H,
    E,
    F,
}

/// A configured local aligner. Stateless per call; share it freely.
#[derive(Clone, Debug, Default)]
pub struct Aligner {
    params: AlignerParams,
}

impl Aligner {
    pub fn new(params: AlignerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AlignerParams {
        &self.params
    }

    fn pair(&self, x: u8, y: u8) -> f64 {
        if x == y { self.params.match_score } else { self.params.mismatch_score }
    }

    /// Align `query` against `target` and return all co-optimal alignments.
    ///
    /// Returns an empty vector when no positive-scoring alignment exists.
    pub fn align(&self, target: &[u8], query: &[u8]) -> Result<Vec<Alignment>, CsiError> {
        if target.is_empty() || query.is_empty() {
            return Err(CsiError::InvalidSequence("cannot align an empty sequence".into()));
        }
        let n = target.len();
        let m = query.len();
        let go = self.params.open_gap_score;
        let ge = self.params.extend_gap_score;

        let neg_inf = f64::NEG_INFINITY;
        // H=best, E=gap in target (move left), F=gap in query (move up)
        let mut h = vec![vec![0f64; m + 1]; n + 1];
        let mut e = vec![vec![neg_inf; m + 1]; n + 1];
        let mut f = vec![vec![neg_inf; m + 1]; n + 1];
        let mut best = 0f64;

        for i in 1..=n {
            for j in 1..=m {
                e[i][j] = (h[i][j - 1] + go).max(e[i][j - 1] + ge);
                f[i][j] = (h[i - 1][j] + go).max(f[i - 1][j] + ge);
                let diag = h[i - 1][j - 1] + self.pair(target[i - 1], query[j - 1]);
                let val = 0f64.max(diag).max(e[i][j]).max(f[i][j]);
                h[i][j] = val;
                if val > best {
                    best = val;
                }
            }
        }
        if best <= 0.0 {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for i in 1..=n {
            for j in 1..=m {
                if h[i][j] != best {
                    continue;
                }
                // Traceback until the local score falls to 0.
                let (mut ti, mut tj) = (i, j);
                let mut state = State::H;
                let mut ops: Vec<Op> = Vec::new();
                while ti > 0 && tj > 0 {
                    match state {
                        State::H => {
                            let here = h[ti][tj];
                            if here <= 0.0 {
                                break;
                            }
                            let diag = h[ti - 1][tj - 1] + self.pair(target[ti - 1], query[tj - 1]);
                            if here == diag {
                                ops.push(Op::Match);
                                ti -= 1;
                                tj -= 1;
                            } else if here == f[ti][tj] {
                                state = State::F;
                            } else {
                                state = State::E;
                            }
                        }
                        State::F => {
                            ops.push(Op::Del);
                            if f[ti][tj] == h[ti - 1][tj] + go {
                                state = State::H;
                            }
                            ti -= 1;
                        }
                        State::E => {
                            ops.push(Op::Ins);
                            if e[ti][tj] == h[ti][tj - 1] + go {
                                state = State::H;
                            }
                            tj -= 1;
                        }
                    }
                }
                ops.reverse();
                out.push(Alignment { score: best, query_len: m, path: build_path(ti, tj, &ops) });
            }
        }
        Ok(out)
    }
}

/// Collapse a forward list of operations into breakpoints.
fn build_path(start_t: usize, start_q: usize, ops: &[Op]) -> Vec<(usize, usize)> {
    let mut path = vec![(start_t, start_q)];
    let (mut t, mut q) = (start_t, start_q);
    for (k, op) in ops.iter().enumerate() {
        match op {
            Op::Match => { t += 1; q += 1; }
            Op::Del => t += 1,
            Op::Ins => q += 1,
        }
        if ops.get(k + 1) != Some(op) {
            path.push((t, q));
        }
    }
    path
}
