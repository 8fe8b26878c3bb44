//! Exact streams and the zero stream.
//!
//! An exact stream is a finite block of initial coefficients followed by a
//! constant tail. It is stored in a canonical form, so equality of exact
//! streams is decidable.

use std::any::Any;
use std::hash::Hasher;

use crate::error::{Result, StreamError};
use crate::order::Valuation;
use crate::stream::{feed, SeriesCoeff, Stream};

/// An eventually constant stream.
///
/// Coefficients at `order .. order + initial.len()` are the initial
/// coefficients, every index from `degree` on carries `constant`, and
/// everything else is zero. In canonical form the first initial
/// coefficient is nonzero, the last one is nonzero, and when the initial
/// block runs right up to `degree` its last entry differs from `constant`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExactStream<R> {
    initial: Vec<R>,
    order: i64,
    degree: i64,
    constant: R,
}

impl<R: SeriesCoeff> ExactStream<R> {
    /// Builds an exact stream and brings it into canonical form.
    ///
    /// `initial` starts at index `order`. Without an explicit `degree`, the
    /// constant tail starts right after the initial coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::ExactDegree`] if the initial coefficients run
    /// past `degree`, and [`StreamError::ZeroExact`] if the stream would be
    /// zero.
    pub fn new(initial: Vec<R>, constant: R, degree: Option<i64>, order: i64) -> Result<Self> {
        let mut initial = initial;
        let mut order = order;
        let end = order + len_i64(&initial);

        let mut degree = match degree {
            Some(d) if !(constant.is_zero() && d > end) => d,
            _ => end,
        };
        if end > degree {
            return Err(StreamError::ExactDegree { degree, end });
        }

        match initial.iter().position(|c| !c.is_zero()) {
            Some(first) => {
                order += len_i64(&initial[..first]);
                initial.drain(..first);

                if order + len_i64(&initial) == degree {
                    while initial.last().is_some_and(|w| *w == constant) {
                        initial.pop();
                        degree -= 1;
                    }
                }
                while initial.last().is_some_and(R::is_zero) {
                    initial.pop();
                }
            }
            None => {
                order = degree;
                initial.clear();
            }
        }

        if initial.is_empty() && constant.is_zero() {
            return Err(StreamError::ZeroExact);
        }

        Ok(Self {
            initial,
            order,
            degree,
            constant,
        })
    }

    /// A stream with finitely many nonzero coefficients starting at `order`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::ZeroExact`] if all coefficients are zero.
    pub fn polynomial(coefficients: Vec<R>, order: i64) -> Result<Self> {
        Self::new(coefficients, R::zero(), None, order)
    }

    /// The monomial `c * z^n`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::ZeroExact`] if `c` is zero.
    pub fn monomial(c: R, n: i64) -> Result<Self> {
        Self::polynomial(vec![c], n)
    }

    /// The coefficient at index `n`.
    #[must_use]
    pub fn coefficient(&self, n: i64) -> R {
        if n >= self.degree {
            return self.constant.clone();
        }
        usize::try_from(n - self.order)
            .ok()
            .and_then(|i| self.initial.get(i))
            .cloned()
            .unwrap_or_else(R::zero)
    }

    /// The canonical initial coefficients.
    #[must_use]
    pub fn initial_coefficients(&self) -> &[R] {
        &self.initial
    }

    /// The index from which every coefficient equals [`Self::constant`].
    #[must_use]
    pub fn degree(&self) -> i64 {
        self.degree
    }

    /// The value of the constant tail.
    #[must_use]
    pub fn constant(&self) -> &R {
        &self.constant
    }

    /// The index of the first nonzero coefficient.
    #[must_use]
    pub fn valuation(&self) -> i64 {
        self.order
    }

    /// The initial block as `(order, coefficients)`, i.e. the Laurent
    /// polynomial `sum c_i z^(order + i)`.
    #[must_use]
    pub fn polynomial_part(&self) -> (i64, Vec<R>) {
        (self.order, self.initial.clone())
    }
}

fn len_i64<T>(values: &[T]) -> i64 {
    i64::try_from(values.len()).unwrap_or(i64::MAX)
}

impl<R: SeriesCoeff> Stream<R> for ExactStream<R> {
    fn get(&self, n: i64) -> Result<R> {
        Ok(self.coefficient(n))
    }

    fn approximate_order(&self) -> Result<Valuation> {
        Ok(Valuation::Finite(self.order))
    }

    fn known_order(&self) -> Option<Valuation> {
        Some(Valuation::Finite(self.order))
    }

    fn order(&self) -> Result<Valuation> {
        Ok(Valuation::Finite(self.order))
    }

    fn is_nonzero(&self) -> bool {
        true
    }

    fn known_ne(&self, other: &dyn Stream<R>) -> bool {
        if let Some(other) = other.as_any().downcast_ref::<Self>() {
            return self != other;
        }
        if other.is_uninitialized() || ZeroStream::is_zero_stream(other) {
            return true;
        }
        let Some(cache) = other.cache() else {
            return false;
        };

        if cache.is_sparse() {
            return cache
                .cached_entries()
                .iter()
                .any(|(i, c)| self.coefficient(*i) != *c);
        }
        match cache.tracker().known() {
            Some(state) if state.true_order => cache
                .cached_entries()
                .iter()
                .any(|(i, c)| self.coefficient(*i) != *c),
            Some(state) => state.approx > Valuation::Finite(self.order),
            None => false,
        }
    }

    fn structural_eq(&self, other: &dyn Stream<R>) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|o| self == o)
    }

    fn structural_hash(&self, state: &mut dyn Hasher) {
        feed("exact", state);
        feed(&self.initial, state);
        feed(&self.degree, state);
        feed(&self.constant, state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The stream with every coefficient zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ZeroStream;

impl ZeroStream {
    /// Whether `s` is a zero stream.
    #[must_use]
    pub fn is_zero_stream<R: SeriesCoeff>(s: &dyn Stream<R>) -> bool {
        s.as_any().is::<ZeroStream>()
    }
}

impl<R: SeriesCoeff> Stream<R> for ZeroStream {
    fn get(&self, _n: i64) -> Result<R> {
        Ok(R::zero())
    }

    fn approximate_order(&self) -> Result<Valuation> {
        Ok(Valuation::Infinity)
    }

    fn known_order(&self) -> Option<Valuation> {
        Some(Valuation::Infinity)
    }

    fn order(&self) -> Result<Valuation> {
        Ok(Valuation::Infinity)
    }

    fn is_nonzero(&self) -> bool {
        false
    }

    fn known_ne(&self, other: &dyn Stream<R>) -> bool {
        !ZeroStream::is_zero_stream(other) && other.is_nonzero()
    }

    fn structural_eq(&self, other: &dyn Stream<R>) -> bool {
        ZeroStream::is_zero_stream(other)
    }

    fn structural_hash(&self, state: &mut dyn Hasher) {
        feed("zero", state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionStream;
    use crate::stream::same_stream;
    use brook_rings::{Ring, Q};

    fn q(n: i64) -> Q {
        Q::from_integer(n)
    }

    fn qs(values: &[i64]) -> Vec<Q> {
        values.iter().map(|&v| q(v)).collect()
    }

    fn canon(initial: &[i64], constant: i64, degree: Option<i64>, order: i64) -> (Vec<Q>, i64, i64, bool) {
        let s = ExactStream::new(qs(initial), q(constant), degree, order).unwrap();
        (
            s.initial_coefficients().to_vec(),
            s.valuation(),
            s.degree(),
            !s.constant().is_zero(),
        )
    }

    fn prefix(s: &dyn Stream<Q>, len: i64) -> Vec<Q> {
        (0..len).map(|n| s.get(n).unwrap()).collect()
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(canon(&[0, 0, 1, 0, 0], 0, None, 0), (qs(&[1]), 2, 3, false));
        assert_eq!(canon(&[0, 0, 1, 0, 0], 0, Some(10), 0), (qs(&[1]), 2, 3, false));
        assert_eq!(canon(&[0, 0, 1, 0, 0], 1, None, 0), (qs(&[1]), 2, 5, true));
        assert_eq!(canon(&[0, 0, 1, 0, 1], 1, Some(10), 0), (qs(&[1, 0, 1]), 2, 10, true));
        assert_eq!(canon(&[0, 0, 1, 0, 1], 1, Some(5), 0), (qs(&[1]), 2, 4, true));
        assert_eq!(canon(&[0, 0, 1, 2, 0, 1], 1, None, 0), (qs(&[1, 2]), 2, 5, true));
        assert_eq!(canon(&[0, 0, 1, 2, 1, 1], 1, None, 0), (qs(&[1, 2]), 2, 4, true));
        assert_eq!(canon(&[0, 0, 1, 2, 1, 1], 1, None, -2), (qs(&[1, 2]), 0, 2, true));
    }

    #[test]
    fn test_constant_run_is_absorbed() {
        assert_eq!(canon(&[1, 1, 1], 1, None, 2), (Vec::new(), 2, 2, true));
    }

    #[test]
    fn test_degree_clamped_without_constant() {
        let s = ExactStream::new(qs(&[1, 2]), Q::zero(), Some(10), 0).unwrap();
        assert_eq!(s.degree(), 2);
    }

    #[test]
    fn test_all_zero_initial_uses_constant() {
        let s = ExactStream::new(qs(&[0, 0]), q(3), Some(4), 0).unwrap();
        assert!(s.initial_coefficients().is_empty());
        assert_eq!(s.valuation(), 4);
        assert_eq!(prefix(&s, 6), qs(&[0, 0, 0, 0, 3, 3]));
    }

    #[test]
    fn test_zero_exact_is_rejected() {
        assert_eq!(
            ExactStream::new(qs(&[0, 0]), Q::zero(), None, 0),
            Err(StreamError::ZeroExact)
        );
        assert_eq!(
            ExactStream::new(qs(&[1, 1, 1]), q(1), Some(2), 0),
            Err(StreamError::ExactDegree { degree: 2, end: 3 })
        );
    }

    #[test]
    fn test_coefficients() {
        let s = ExactStream::new(qs(&[2]), q(1), None, 1).unwrap();
        assert_eq!(prefix(&s, 7), qs(&[0, 2, 1, 1, 1, 1, 1]));

        let s = ExactStream::new(qs(&[1, 2, 1, 0]), q(1), Some(6), 1).unwrap();
        assert_eq!(prefix(&s, 10), qs(&[0, 1, 2, 1, 0, 0, 1, 1, 1, 1]));
        assert_eq!(s.polynomial_part(), (1, qs(&[1, 2, 1])));
    }

    #[test]
    fn test_equality_after_canonicalization() {
        let a = ExactStream::new(qs(&[0, 0, 1, 1, 1]), q(1), None, 0).unwrap();
        let b = ExactStream::new(qs(&[1]), q(1), None, 2).unwrap();
        assert!(same_stream::<Q>(&a, &b));
        assert!(!a.known_ne(&b));

        let c = ExactStream::new(qs(&[2]), q(1), None, 0).unwrap();
        assert!(a.known_ne(&c));
        assert_eq!(crate::stream_hash::<Q>(&a), crate::stream_hash::<Q>(&b));
    }

    #[test]
    fn test_exact_vs_cached_streams() {
        let e = ExactStream::new(qs(&[1]), q(1), None, 0).unwrap();
        let ones = FunctionStream::new(|_| q(1), true, 0);
        ones.get(3).unwrap();
        assert!(!e.known_ne(&ones));

        let twos = FunctionStream::new(|_| q(2), true, 0);
        twos.get(3).unwrap();
        assert!(e.known_ne(&twos));

        let late = FunctionStream::new(|n| q(n), false, 0);
        late.get(0).unwrap();
        // dense, order not yet known but already beyond 0
        assert!(e.known_ne(&late));
    }

    #[test]
    fn test_zero_stream() {
        let z = ZeroStream;
        assert_eq!(Stream::<Q>::get(&z, 5).unwrap(), Q::zero());
        assert_eq!(Stream::<Q>::order(&z).unwrap(), Valuation::Infinity);
        let e = ExactStream::monomial(q(1), 0).unwrap();
        assert!(Stream::<Q>::known_ne(&z, &e));
        assert!(e.known_ne(&z));
        assert!(!Stream::<Q>::known_ne(&z, &ZeroStream));
        assert!(same_stream::<Q>(&z, &ZeroStream));
    }
}
