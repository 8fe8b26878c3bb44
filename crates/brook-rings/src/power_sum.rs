//! Symmetric functions in the power-sum basis.
//!
//! An element is a finite linear combination of power sums `p_λ` with
//! coefficients in a ring R. Power sums multiply by concatenating their
//! partitions: `p_λ p_μ = p_{λ ∪ μ}`.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::partition::Partition;
use crate::traits::{CommutativeRing, Ring, VariableRaising};

/// A symmetric function expanded in power sums.
///
/// Zero coefficients are never stored.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct PowerSum<R: Ring> {
    terms: BTreeMap<Partition, R>,
}

impl<R: Ring> PowerSum<R> {
    /// The single term `c * p_λ`.
    #[must_use]
    pub fn monomial(partition: Partition, c: R) -> Self {
        let mut terms = BTreeMap::new();
        if !c.is_zero() {
            terms.insert(partition, c);
        }
        Self { terms }
    }

    /// The power sum `p_λ` with coefficient one.
    #[must_use]
    pub fn p(parts: impl IntoIterator<Item = u32>) -> Self {
        Self::monomial(Partition::new(parts), R::one())
    }

    /// Sums the given terms, combining equal partitions.
    #[must_use]
    pub fn from_terms(terms: impl IntoIterator<Item = (Partition, R)>) -> Self {
        let mut result = Self::zero();
        for (partition, c) in terms {
            result.add_term(partition, c);
        }
        result
    }

    fn add_term(&mut self, partition: Partition, c: R) {
        if c.is_zero() {
            return;
        }
        match self.terms.remove(&partition) {
            Some(existing) => {
                let sum = existing + c;
                if !sum.is_zero() {
                    self.terms.insert(partition, sum);
                }
            }
            None => {
                self.terms.insert(partition, c);
            }
        }
    }

    /// Iterates over the nonzero terms in partition order.
    pub fn terms(&self) -> impl Iterator<Item = (&Partition, &R)> {
        self.terms.iter()
    }

    /// The coefficient of `p_λ`.
    #[must_use]
    pub fn coefficient(&self, partition: &Partition) -> R {
        self.terms.get(partition).cloned().unwrap_or_else(R::zero)
    }

    /// The largest partition size present, or `None` for zero.
    #[must_use]
    pub fn degree(&self) -> Option<u32> {
        self.terms.keys().map(Partition::size).max()
    }

    /// Multiplies every coefficient by `c` from the left.
    #[must_use]
    pub fn scale(&self, c: &R) -> Self {
        Self::from_terms(
            self.terms
                .iter()
                .map(|(la, a)| (la.clone(), c.clone() * a.clone())),
        )
    }
}

impl<R: VariableRaising> PowerSum<R> {
    /// Applies the Adams operation `p_λ ↦ p_{kλ}`, raising the listed
    /// degree-one generators of the coefficients to the k-th power.
    #[must_use]
    pub fn stretch(&self, k: u32, degree_one: &[String]) -> Self {
        Self::from_terms(
            self.terms
                .iter()
                .map(|(la, c)| (la.stretch(k), c.raise_variables(k, degree_one))),
        )
    }
}

impl<R: Ring> Ring for PowerSum<R> {
    fn zero() -> Self {
        Self {
            terms: BTreeMap::new(),
        }
    }

    fn one() -> Self {
        Self::monomial(Partition::empty(), R::one())
    }

    fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    fn is_one(&self) -> bool {
        self.terms.len() == 1
            && self
                .terms
                .get(&Partition::empty())
                .is_some_and(Ring::is_one)
    }

    fn from_i64(n: i64) -> Self {
        Self::monomial(Partition::empty(), R::from_i64(n))
    }

    fn inverse_of_unit(&self) -> Option<Self> {
        if self.terms.len() != 1 {
            return None;
        }
        let c = self.terms.get(&Partition::empty())?;
        c.inverse_of_unit()
            .map(|inv| Self::monomial(Partition::empty(), inv))
    }
}

impl<R: CommutativeRing> CommutativeRing for PowerSum<R> {}

impl<R: VariableRaising> VariableRaising for PowerSum<R> {
    fn generators() -> Vec<String> {
        R::generators()
    }

    fn raise_variables(&self, k: u32, degree_one: &[String]) -> Self {
        Self::from_terms(
            self.terms
                .iter()
                .map(|(la, c)| (la.clone(), c.raise_variables(k, degree_one))),
        )
    }
}

impl<R: Ring> Add for PowerSum<R> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        for (la, c) in rhs.terms {
            self.add_term(la, c);
        }
        self
    }
}

impl<R: Ring> Sub for PowerSum<R> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl<R: Ring> Mul for PowerSum<R> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let mut result = Self::zero();
        for (la, a) in &self.terms {
            for (mu, b) in &rhs.terms {
                result.add_term(la.union(mu), a.clone() * b.clone());
            }
        }
        result
    }
}

impl<R: Ring> Neg for PowerSum<R> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            terms: self.terms.into_iter().map(|(la, c)| (la, -c)).collect(),
        }
    }
}

impl<R: Ring + fmt::Display> fmt::Display for PowerSum<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let terms: Vec<String> = self
            .terms
            .iter()
            .map(|(la, c)| {
                if c.is_one() {
                    format!("p{la}")
                } else {
                    format!("{c}*p{la}")
                }
            })
            .collect();
        write!(f, "{}", terms.join(" + "))
    }
}
