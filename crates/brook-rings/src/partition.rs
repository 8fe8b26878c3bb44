//! Integer partitions.
//!
//! Partitions index the power-sum basis of symmetric functions. They are
//! stored as weakly decreasing sequences of positive parts.

use smallvec::SmallVec;
use std::fmt;

/// An integer partition with weakly decreasing positive parts.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Partition(SmallVec<[u32; 8]>);

impl Partition {
    /// Creates a partition from parts in any order. Zero parts are dropped.
    #[must_use]
    pub fn new(parts: impl IntoIterator<Item = u32>) -> Self {
        let mut parts: SmallVec<[u32; 8]> = parts.into_iter().filter(|&p| p > 0).collect();
        parts.sort_unstable_by(|a, b| b.cmp(a));
        Self(parts)
    }

    /// The empty partition of 0.
    #[must_use]
    pub fn empty() -> Self {
        Self(SmallVec::new())
    }

    /// Builds a partition from a multiplicity vector: `exp[i]` copies of
    /// the part `i + 1`.
    #[must_use]
    pub fn from_exp(exp: &[u32]) -> Self {
        let mut parts = SmallVec::new();
        for (i, &m) in exp.iter().enumerate().rev() {
            let part = i as u32 + 1;
            parts.extend(std::iter::repeat(part).take(m as usize));
        }
        Self(parts)
    }

    /// The sum of the parts.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.0.iter().sum()
    }

    /// The number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the empty partition.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The parts in weakly decreasing order.
    #[must_use]
    pub fn parts(&self) -> &[u32] {
        &self.0
    }

    /// Multiplicities: entry `i` counts the parts equal to `i + 1`.
    #[must_use]
    pub fn to_exp(&self) -> Vec<u32> {
        let largest = self.0.first().copied().unwrap_or(0) as usize;
        let mut exp = vec![0; largest];
        for &p in &self.0 {
            exp[p as usize - 1] += 1;
        }
        exp
    }

    /// Multiplies every part by `k`.
    #[must_use]
    pub fn stretch(&self, k: u32) -> Self {
        Self(self.0.iter().map(|&p| p * k).collect())
    }

    /// The partition whose parts are those of both operands.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut parts = SmallVec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            if self.0[i] >= other.0[j] {
                parts.push(self.0[i]);
                i += 1;
            } else {
                parts.push(other.0[j]);
                j += 1;
            }
        }
        parts.extend_from_slice(&self.0[i..]);
        parts.extend_from_slice(&other.0[j..]);
        Self(parts)
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0.as_slice())
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
