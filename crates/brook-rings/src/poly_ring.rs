//! Polynomial rings R[x].
//!
//! Series over `Polynomial<R>` carry a free parameter in their coefficients,
//! which is what plethysm needs when it raises degree-one variables.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::traits::{CommutativeRing, Ring, VariableRaising};

/// A dense univariate polynomial over a ring R.
///
/// The variable of `Polynomial<R>` is named `x{d}` where `d` is the number
/// of generators of `R`, so nested polynomial rings get `x0`, `x1`, ...
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Polynomial<R: Ring> {
    /// Coefficients in ascending degree order.
    /// Invariant: no trailing zeros; the zero polynomial is empty.
    coeffs: Vec<R>,
}

impl<R: Ring> Polynomial<R> {
    /// Creates a polynomial from coefficients in ascending degree order.
    #[must_use]
    pub fn new(mut coeffs: Vec<R>) -> Self {
        while coeffs.last().is_some_and(Ring::is_zero) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    /// Creates a constant polynomial.
    #[must_use]
    pub fn constant(c: R) -> Self {
        Self::new(vec![c])
    }

    /// Creates the polynomial x.
    #[must_use]
    pub fn x() -> Self {
        Self::new(vec![R::zero(), R::one()])
    }

    /// Creates the monomial c * x^n.
    #[must_use]
    pub fn monomial(c: R, n: usize) -> Self {
        let mut coeffs = vec![R::zero(); n + 1];
        coeffs[n] = c;
        Self::new(coeffs)
    }

    /// Returns the degree, or `None` for the zero polynomial.
    #[must_use]
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    /// Returns the coefficient of x^i.
    #[must_use]
    pub fn coeff(&self, i: usize) -> R {
        self.coeffs.get(i).cloned().unwrap_or_else(R::zero)
    }

    /// Returns all coefficients.
    #[must_use]
    pub fn coeffs(&self) -> &[R] {
        &self.coeffs
    }

    /// Evaluates the polynomial at a point.
    #[must_use]
    pub fn eval(&self, x: &R) -> R {
        self.coeffs
            .iter()
            .rev()
            .fold(R::zero(), |acc, c| acc * x.clone() + c.clone())
    }

    /// Multiplies every coefficient on the left by a scalar.
    #[must_use]
    pub fn scale(&self, c: &R) -> Self {
        Self::new(self.coeffs.iter().map(|x| c.clone() * x.clone()).collect())
    }

    fn zip_with(&self, other: &Self, f: impl Fn(R, R) -> R) -> Self {
        let len = self.coeffs.len().max(other.coeffs.len());
        Self::new((0..len).map(|i| f(self.coeff(i), other.coeff(i))).collect())
    }
}

impl<R: VariableRaising> Polynomial<R> {
    /// The name of this ring's variable.
    #[must_use]
    pub fn variable_name() -> String {
        format!("x{}", R::generators().len())
    }
}

impl<R: Ring> Ring for Polynomial<R> {
    fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    fn one() -> Self {
        Self::constant(R::one())
    }

    fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    fn is_one(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0].is_one()
    }

    fn from_i64(n: i64) -> Self {
        Self::constant(R::from_i64(n))
    }

    fn inverse_of_unit(&self) -> Option<Self> {
        match self.coeffs.as_slice() {
            [c] => c.inverse_of_unit().map(Self::constant),
            _ => None,
        }
    }
}

impl<R: CommutativeRing> CommutativeRing for Polynomial<R> {}

impl<R: VariableRaising> VariableRaising for Polynomial<R> {
    fn generators() -> Vec<String> {
        let mut names = R::generators();
        names.push(Self::variable_name());
        names
    }

    fn raise_variables(&self, k: u32, degree_one: &[String]) -> Self {
        let stretch = if degree_one.contains(&Self::variable_name()) {
            k as usize
        } else {
            1
        };

        let len = self.coeffs.len().saturating_sub(1) * stretch + 1;
        let mut coeffs = vec![R::zero(); len];
        for (i, c) in self.coeffs.iter().enumerate() {
            coeffs[i * stretch] = c.raise_variables(k, degree_one);
        }
        Self::new(coeffs)
    }
}

impl<R: Ring> Add for Polynomial<R> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.zip_with(&rhs, |a, b| a + b)
    }
}

impl<R: Ring> Sub for Polynomial<R> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.zip_with(&rhs, |a, b| a - b)
    }
}

impl<R: Ring> Mul for Polynomial<R> {
    type Output = Self;

    /// Schoolbook multiplication.
    fn mul(self, rhs: Self) -> Self::Output {
        if self.is_zero() || rhs.is_zero() {
            return Self::zero();
        }

        let mut result = vec![R::zero(); self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in rhs.coeffs.iter().enumerate() {
                result[i + j] = result[i + j].clone() + a.clone() * b.clone();
            }
        }

        Self::new(result)
    }
}

impl<R: Ring> Neg for Polynomial<R> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(self.coeffs.into_iter().map(|c| -c).collect())
    }
}

impl<R: Ring + fmt::Display + VariableRaising> fmt::Display for Polynomial<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }

        let var = Self::variable_name();
        let terms: Vec<String> = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(i, c)| match i {
                0 => format!("{c}"),
                1 => format!("({c})*{var}"),
                _ => format!("({c})*{var}^{i}"),
            })
            .collect();

        write!(f, "{}", terms.join(" + "))
    }
}
