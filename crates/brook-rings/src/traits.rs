//! Algebraic structure traits.
//!
//! These traits describe what the stream engine needs from a coefficient
//! ring. Streams only ever add, subtract, multiply and negate coefficients,
//! test them for zero, and occasionally invert a leading unit.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Add, Mul, Neg, Sub};

/// A ring is a set with addition and multiplication operations.
///
/// # Laws
///
/// - Addition is associative and commutative with identity `zero()`
/// - Multiplication is associative with identity `one()`
/// - Multiplication distributes over addition
/// - Every element has an additive inverse (`neg`)
///
/// Multiplication is *not* assumed to be commutative; see
/// [`CommutativeRing`].
pub trait Ring:
    Clone
    + Eq
    + Hash
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    /// The additive identity.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// Returns true if this is the additive identity.
    fn is_zero(&self) -> bool;

    /// Returns true if this is the multiplicative identity.
    fn is_one(&self) -> bool;

    /// Computes self + self + ... (n times) by doubling.
    fn mul_by_scalar(&self, n: i64) -> Self {
        let mut result = Self::zero();
        let mut base = self.clone();
        let mut k = n.unsigned_abs();

        while k > 0 {
            if k & 1 == 1 {
                result = result + base.clone();
            }
            base = base.clone() + base;
            k >>= 1;
        }

        if n < 0 {
            -result
        } else {
            result
        }
    }

    /// The image of the integer `n` in this ring.
    fn from_i64(n: i64) -> Self {
        Self::one().mul_by_scalar(n)
    }

    /// Computes self^n for non-negative n.
    fn pow(&self, n: u32) -> Self {
        let mut result = Self::one();
        let mut base = self.clone();
        let mut exp = n;

        while exp > 0 {
            if exp & 1 == 1 {
                result = result * base.clone();
            }
            exp >>= 1;
            if exp > 0 {
                base = base.clone() * base;
            }
        }

        result
    }

    /// Returns the two-sided inverse if this element is a unit.
    ///
    /// The default knows no units at all.
    fn inverse_of_unit(&self) -> Option<Self> {
        None
    }
}

/// A commutative ring where multiplication is commutative.
pub trait CommutativeRing: Ring {}

/// A field is a ring where every non-zero element has a multiplicative inverse.
pub trait Field: CommutativeRing {
    /// Computes the multiplicative inverse.
    ///
    /// Returns `None` if the element is zero.
    fn inv(&self) -> Option<Self>;
}

/// Rings with named degree-one generators.
///
/// Plethysm substitutes `v ↦ v^k` for every degree-one generator `v` of
/// the coefficient ring when it stretches a power sum `p_λ` to `p_{kλ}`.
/// Rings without generators keep the default implementation.
pub trait VariableRaising: Ring {
    /// Names of the generators of this ring, including those of its base
    /// rings.
    fn generators() -> Vec<String> {
        Vec::new()
    }

    /// Substitutes `v ↦ v^k` for each generator named in `degree_one`.
    #[must_use]
    fn raise_variables(&self, k: u32, degree_one: &[String]) -> Self {
        let _ = (k, degree_one);
        self.clone()
    }
}
