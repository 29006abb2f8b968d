//! Nucleotide sequences and circular (wrap-safe) slicing.
//!
//! A [`Sequence`] is an immutable, uppercased string of IUPAC nucleotide codes.
//! References are plasmids, so most coordinate arithmetic in this crate treats
//! them as circular: [`Sequence::get_seq`] reads across the origin by
//! concatenating tail and head, and refuses requests that would need to cycle
//! past the bounds it supports.
//!
//! ```rust
//! use csi::Sequence;
//! let s = Sequence::new("acgtt").unwrap();
//! assert_eq!(s.reverse_complement().as_str(), "AACGT");
//! assert_eq!(s.get_seq(3, 7).unwrap().as_str(), "TTAC");
//! ```
use std::fmt;

use crate::common::CsiError;

/// An uppercase nucleotide sequence.
///
/// Two sequences are equal iff their normalized strings match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Sequence(String);

impl Sequence {
    /// Normalize `s` to uppercase and validate it.
    ///
    /// Accepts `A`, `C`, `G`, `T` and the IUPAC ambiguity codes sequencers
    /// emit (`N`, `R`, `Y`, ...). `U` is read as `T`. Whitespace is dropped.
    pub fn new(s: &str) -> Result<Self, CsiError> {
        let mut out = String::with_capacity(s.len());
        for (i, c) in s.chars().filter(|c| !c.is_whitespace()).enumerate() {
            let u = c.to_ascii_uppercase();
            match u {
                'A' | 'C' | 'G' | 'T' | 'N' | 'R' | 'Y' | 'S' | 'W' | 'K' | 'M' | 'B' | 'D'
                | 'H' | 'V' => out.push(u),
                'U' => out.push('T'),
                _ => {
                    return Err(CsiError::InvalidSequence(format!(
                        "unexpected symbol {c:?} at position {i}"
                    )))
                }
            }
        }
        Ok(Self(out))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Linear slice `[start, end)`. Returns `None` when out of bounds.
    pub fn slice(&self, start: usize, end: usize) -> Option<Sequence> {
        self.0.get(start..end).map(|s| Sequence(s.to_string()))
    }

    /// Base-wise complement (no reversal).
    pub fn complement(&self) -> Sequence {
        Sequence(self.0.bytes().map(|b| complement_base(b) as char).collect())
    }

    pub fn reverse(&self) -> Sequence {
        Sequence(self.0.chars().rev().collect())
    }

    pub fn reverse_complement(&self) -> Sequence {
        Sequence(self.0.bytes().rev().map(|b| complement_base(b) as char).collect())
    }

    /// Wrap-safe slice `[pos1, pos2)` of a circular sequence.
    ///
    /// Positions may run below zero (reading the tail before the head) or past
    /// the end (reading the head after the tail). Returns `None` for an empty
    /// sequence, for `pos2 < pos1`, when `pos1 < -len` or `pos2 > 2 * len`,
    /// and when the slice would be longer than the sequence itself.
    pub fn get_seq(&self, pos1: isize, pos2: isize) -> Option<Sequence> {
        let n = self.len() as isize;
        if n == 0 || pos2 < pos1 || pos1 < -n || pos2 > 2 * n || pos2 - pos1 > n {
            return None;
        }
        let bytes = self.as_bytes();
        let s = (pos1..pos2).map(|k| bytes[k.rem_euclid(n) as usize] as char).collect();
        Some(Sequence(s))
    }

    /// Copy of the sequence with its first `k` bases (capped at one full
    /// length) appended, so windows crossing the origin align contiguously.
    pub(crate) fn extended(&self, k: usize) -> Sequence {
        let k = k.min(self.len());
        let mut s = String::with_capacity(self.len() + k);
        s.push_str(&self.0);
        s.push_str(&self.0[..k]);
        Sequence(s)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sequence {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Complement of a single IUPAC nucleotide code; unknown bytes map to `N`.
pub fn complement_base(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'S' => b'S',
        b'W' => b'W',
        _ => b'N',
    }
}
