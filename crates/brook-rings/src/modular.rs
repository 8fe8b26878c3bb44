//! Residue rings Z/NZ.
//!
//! The modulus need not be prime, so these rings can have zero divisors
//! and non-invertible leading coefficients. That makes them useful for
//! exercising the failure paths of series inversion.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::traits::{CommutativeRing, Ring, VariableRaising};

/// An integer modulo the compile-time constant `N` (with `N >= 2`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModRing<const N: u64>(u64);

impl<const N: u64> ModRing<N> {
    /// Creates a residue from an unsigned value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value % N)
    }

    /// Creates a residue from a signed value.
    #[must_use]
    pub fn from_signed(value: i64) -> Self {
        let reduced = i128::from(value).rem_euclid(i128::from(N));
        Self(u64::try_from(reduced).unwrap_or_default())
    }

    /// Returns the canonical representative in `0..N`.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the modulus.
    #[must_use]
    pub const fn modulus() -> u64 {
        N
    }

    /// Computes the inverse with the extended Euclidean algorithm.
    ///
    /// Returns `None` when `gcd(self, N) != 1`.
    #[must_use]
    pub fn inv(self) -> Option<Self> {
        if self.0 == 0 {
            return None;
        }

        let mut t = 0i128;
        let mut new_t = 1i128;
        let mut r = i128::from(N);
        let mut new_r = i128::from(self.0);

        while new_r != 0 {
            let quotient = r / new_r;
            (t, new_t) = (new_t, t - quotient * new_t);
            (r, new_r) = (new_r, r - quotient * new_r);
        }

        if r > 1 {
            return None;
        }

        let t = t.rem_euclid(i128::from(N));
        u64::try_from(t).ok().map(Self)
    }
}

impl<const N: u64> Ring for ModRing<N> {
    fn zero() -> Self {
        Self(0)
    }

    fn one() -> Self {
        Self::new(1)
    }

    fn is_zero(&self) -> bool {
        self.0 == 0
    }

    fn is_one(&self) -> bool {
        self.0 == 1 % N
    }

    fn from_i64(n: i64) -> Self {
        Self::from_signed(n)
    }

    fn inverse_of_unit(&self) -> Option<Self> {
        self.inv()
    }
}

impl<const N: u64> CommutativeRing for ModRing<N> {}
impl<const N: u64> VariableRaising for ModRing<N> {}

impl<const N: u64> Add for ModRing<N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let sum = (u128::from(self.0) + u128::from(rhs.0)) % u128::from(N);
        Self(sum as u64)
    }
}

impl<const N: u64> Sub for ModRing<N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl<const N: u64> Mul for ModRing<N> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let product = (u128::from(self.0) * u128::from(rhs.0)) % u128::from(N);
        Self(product as u64)
    }
}

impl<const N: u64> Neg for ModRing<N> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        if self.0 == 0 {
            Self(0)
        } else {
            Self(N - self.0)
        }
    }
}

impl<const N: u64> From<i64> for ModRing<N> {
    fn from(value: i64) -> Self {
        Self::from_signed(value)
    }
}

impl<const N: u64> fmt::Debug for ModRing<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mod {})", self.0, N)
    }
}

impl<const N: u64> fmt::Display for ModRing<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
