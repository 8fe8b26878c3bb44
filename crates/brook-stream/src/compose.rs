//! Composition `f(g(z))` of two streams.

use parking_lot::Mutex;
use std::hash::Hasher;
use std::sync::{Arc, OnceLock};

use crate::binary::CauchyMulStream;
use crate::error::{Result, StreamError};
use crate::exact::{ExactStream, ZeroStream};
use crate::inexact::{CachedStream, Operator};
use crate::order::{OrderState, Valuation};
use crate::stream::{feed_node, same_stream, SeriesCoeff, Stream, StreamRef};
use crate::unary::CauchyInverseStream;

/// Composition of `f` with a stream `g`.
///
/// `g` must have positive valuation unless `f` is a polynomial, in which
/// case `f(g)` is the finite sum `sum f[k] g^k` for any `g`.
///
/// Keeps the powers `g, g^2, ...` needed so far, and when `f` has negative
/// order also `g^-1, g^-2, ...`.
pub struct ComposeOp<R: SeriesCoeff> {
    f: StreamRef<R>,
    g: StreamRef<R>,
    sparse: bool,
    /// `(order, coefficients)` of `f` when it is a polynomial or zero.
    polynomial: Option<(i64, Vec<R>)>,
    /// Entry `k` is `g^-k`; entry 0 is the zero stream.
    neg_powers: OnceLock<Vec<StreamRef<R>>>,
    /// Entry `k` is `g^(k+1)`.
    pos_powers: Mutex<Vec<StreamRef<R>>>,
}

/// The stream `f(g)`.
pub type ComposeStream<R> = CachedStream<R, ComposeOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, ComposeOp<R>> {
    /// The composition `f(g)`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::CompositionValuation`] when `f` is not a
    /// polynomial and `g` is already known to have nonpositive valuation.
    /// Otherwise the check happens on first use.
    pub fn new(f: StreamRef<R>, g: StreamRef<R>, sparse: bool) -> Result<Self> {
        let polynomial = f
            .as_any()
            .downcast_ref::<ExactStream<R>>()
            .filter(|e| e.constant().is_zero() && e.valuation() >= 0)
            .map(ExactStream::polynomial_part)
            .or_else(|| ZeroStream::is_zero_stream(f.as_ref()).then(|| (0, Vec::new())));
        if polynomial.is_none() && g.known_order().is_some_and(|v| v <= Valuation::Finite(0)) {
            return Err(StreamError::CompositionValuation);
        }
        let pos_powers = Mutex::new(vec![Arc::clone(&g)]);
        Ok(Self::from_op(
            ComposeOp {
                f,
                g,
                sparse,
                polynomial,
                neg_powers: OnceLock::new(),
                pos_powers,
            },
            sparse,
        ))
    }
}

impl<R: SeriesCoeff> ComposeOp<R> {
    /// `g^k` for `k >= 1`, extending the tower as needed.
    fn pos_power(&self, k: usize) -> StreamRef<R> {
        debug_assert!(k >= 1, "positive powers start at g^1");
        let mut powers = self.pos_powers.lock();
        while powers.len() < k {
            let last = Arc::clone(&powers[powers.len() - 1]);
            powers.push(CauchyMulStream::new(last, Arc::clone(&self.g), self.sparse).into_ref());
            tracing::trace!(power = powers.len(), "composition power grown");
        }
        Arc::clone(&powers[k.max(1) - 1])
    }

    /// The inverse powers `g^-k` for `k` up to `-ord(f)`, built on first
    /// use. The order of `f` only increases, so the first tower covers every
    /// later request.
    fn neg_tower(&self) -> Result<&[StreamRef<R>]> {
        if let Some(tower) = self.neg_powers.get() {
            return Ok(tower.as_slice());
        }
        if self.g.approximate_order()?.is_infinite() {
            return Err(StreamError::NoInverse);
        }
        let count = self.f.approximate_order()?.finite().map_or(0, |v| v.saturating_neg().max(0));
        Ok(self.neg_powers.get_or_init(|| self.build_neg_powers(count)).as_slice())
    }

    fn build_neg_powers(&self, count: i64) -> Vec<StreamRef<R>> {
        let ginv = CauchyInverseStream::new(Arc::clone(&self.g)).into_ref();
        let mut powers: Vec<StreamRef<R>> = vec![Arc::new(ZeroStream), Arc::clone(&ginv)];
        for _ in 1..count {
            let last = Arc::clone(&powers[powers.len() - 1]);
            powers.push(CauchyMulStream::new(last, Arc::clone(&ginv), self.sparse).into_ref());
        }
        tracing::debug!(count, "composition inverse powers built");
        powers
    }

    /// `sum f[k] * g^-k [n]` over `k` in `from..to`, for negative `k`.
    fn negative_part(&self, n: i64, from: i64, to: i64) -> Result<R> {
        if from >= to {
            return Ok(R::zero());
        }
        let tower = self.neg_tower()?;
        let mut c = R::zero();
        for k in from..to {
            let l = self.f.get(k)?;
            if l.is_zero() {
                continue;
            }
            let power = usize::try_from(-k)
                .ok()
                .and_then(|i| tower.get(i))
                .ok_or(StreamError::NoInverse)?;
            c = c + l * power.get(n)?;
        }
        Ok(c)
    }

    /// `sum f[k] g^k [n]` for a polynomial `f`.
    fn polynomial_coefficient(&self, n: i64, order: i64, coefficients: &[R]) -> Result<R> {
        let mut c = R::zero();
        for (k, l) in (order..).zip(coefficients) {
            if l.is_zero() {
                continue;
            }
            if k == 0 {
                if n == 0 {
                    c = c + l.clone();
                }
                continue;
            }
            let power = self.pos_power(usize::try_from(k).unwrap_or(usize::MAX));
            c = c + l.clone() * power.get(n)?;
        }
        Ok(c)
    }
}

/// A lower bound for the order of `sum f[k] g^k` over `k` in `low..=high`.
///
/// The order of `g^k` is bounded by `k * ord(g)`, which is linear in `k`,
/// so the minimum is attained at one end.
fn polynomial_order(low: i64, high: i64, gv: Valuation) -> Valuation {
    let term = |k: i64| {
        if k == 0 {
            Valuation::Finite(0)
        } else {
            Valuation::Finite(k) * gv
        }
    };
    term(low).min(term(high))
}

impl<R: SeriesCoeff> Operator<R> for ComposeOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        let gv = self.g.approximate_order()?;
        if let Some((order, coefficients)) = &self.polynomial {
            if coefficients.is_empty() {
                return Ok(OrderState::exact(Valuation::Infinity));
            }
            let high = order + i64::try_from(coefficients.len()).unwrap_or(i64::MAX) - 1;
            return Ok(OrderState::approximate(polynomial_order(*order, high, gv)));
        }
        if gv <= Valuation::Finite(0) {
            return Err(StreamError::CompositionValuation);
        }
        let fv = self.f.approximate_order()?;
        if fv < Valuation::Finite(0) {
            self.neg_tower()?;
        }
        let order = match (fv, gv) {
            // f(0) is the constant term of f.
            (Valuation::Finite(v), Valuation::Infinity) if v <= 0 => Valuation::Finite(0),
            _ => fv * gv,
        };
        Ok(OrderState::approximate(order))
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        if let Some((order, coefficients)) = &self.polynomial {
            return self.polynomial_coefficient(n, *order, coefficients);
        }
        let Valuation::Finite(fv) = self.f.approximate_order()? else {
            return Ok(R::zero());
        };
        let gv = self.g.approximate_order()?.finite();
        let top = gv.map_or(0, |gv| n.div_euclid(gv));

        if n < 0 {
            return self.negative_part(n, fv, top + 1);
        }

        let mut c = self.negative_part(n, fv, 0)?;
        if n == 0 {
            c = c + self.f.get(0)?;
        }
        for k in fv.max(1)..=top {
            let l = self.f.get(k)?;
            if l.is_zero() {
                continue;
            }
            let power = self.pos_power(usize::try_from(k).unwrap_or(usize::MAX));
            c = c + l * power.get(n)?;
        }
        Ok(c)
    }

    fn same_as(&self, other: &Self) -> bool {
        same_stream(self.f.as_ref(), other.f.as_ref()) && same_stream(self.g.as_ref(), other.g.as_ref())
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        feed_node("compose", &[self.f.as_ref(), self.g.as_ref()], state);
    }

    fn is_uninitialized(&self) -> bool {
        self.f.is_uninitialized() || self.g.is_uninitialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionStream;
    use brook_rings::{Ring, Q};

    fn q(n: i64) -> Q {
        Q::from_integer(n)
    }

    fn qs(v: &[i64]) -> Vec<Q> {
        v.iter().copied().map(q).collect()
    }

    fn values(s: &dyn Stream<Q>, range: std::ops::Range<i64>) -> Vec<Q> {
        range.map(|n| s.get(n).unwrap()).collect()
    }

    fn exact(coefficients: &[i64], order: i64) -> StreamRef<Q> {
        Arc::new(ExactStream::polynomial(qs(coefficients), order).unwrap())
    }

    #[test]
    fn test_fibonacci() {
        // 1 / (1 - x) composed with x + x^2
        let geometric: StreamRef<Q> = Arc::new(ExactStream::new(Vec::new(), Q::one(), Some(0), 0).unwrap());
        for sparse in [true, false] {
            let h = ComposeStream::new(geometric.clone(), exact(&[1, 1], 1), sparse).unwrap();
            assert_eq!(values(&h, 0..10), qs(&[1, 1, 2, 3, 5, 8, 13, 21, 34, 55]));
        }
    }

    #[test]
    fn test_function_composition() {
        let f = FunctionStream::new(q, true, 1).into_ref();
        let g = FunctionStream::new(q, true, 1).into_ref();
        let h = ComposeStream::new(f, g, true).unwrap();
        assert_eq!(h.approximate_order().unwrap(), Valuation::Finite(1));
        assert_eq!(values(&h, 0..10), qs(&[0, 1, 6, 28, 124, 527, 2172, 8755, 34704, 135772]));
    }

    #[test]
    fn test_negative_order() {
        // f = z^-1 + 1, g = z + z^2: f(g) = 1/(z + z^2) + 1 = z^-1 + 1 - 1 + z - z^2 + ...
        let f = exact(&[1, 1], -1);
        let g = exact(&[1, 1], 1);
        let h = ComposeStream::new(f, g, false).unwrap();
        assert_eq!(h.approximate_order().unwrap(), Valuation::Finite(-1));
        assert_eq!(values(&h, -2..4), qs(&[0, 1, 0, 1, -1, 1]));
    }

    #[test]
    fn test_negative_order_read_through_get() {
        // f = z^-1 + 1 with a lower bound of -2 on its order
        let f = FunctionStream::new(
            |n| match n {
                -1 | 0 => q(1),
                _ => q(0),
            },
            true,
            -2,
        )
        .into_ref();
        for sparse in [true, false] {
            let h = ComposeStream::new(f.clone(), exact(&[1, 1], 1), sparse).unwrap();
            assert_eq!(h.get(-1).unwrap(), q(1));
            assert_eq!(h.operator().neg_powers.get().map(Vec::len), Some(3));
            assert_eq!(values(&h, -2..4), qs(&[0, 1, 0, 1, -1, 1]));
        }
    }

    #[test]
    fn test_polynomial_with_constant_term() {
        // 1 + 2z + 3z^2 at g = 1 + z
        let f = exact(&[1, 2, 3], 0);
        let h = ComposeStream::new(f.clone(), exact(&[1, 1], 0), true).unwrap();
        assert_eq!(h.approximate_order().unwrap(), Valuation::Finite(0));
        assert_eq!(values(&h, -1..5), qs(&[0, 6, 8, 3, 0, 0]));

        // the order of g is only found on first use
        let lazy = FunctionStream::new(|n| if (0..=1).contains(&n) { q(1) } else { q(0) }, false, 0).into_ref();
        let h = ComposeStream::new(f, lazy, false).unwrap();
        assert_eq!(values(&h, -1..5), qs(&[0, 6, 8, 3, 0, 0]));
    }

    #[test]
    fn test_polynomial_with_negative_order_g() {
        // z^2 at g = z^-1 + 1
        let h = ComposeStream::new(exact(&[1], 2), exact(&[1, 1], -1), false).unwrap();
        assert_eq!(h.approximate_order().unwrap(), Valuation::Finite(-2));
        assert_eq!(values(&h, -3..2), qs(&[0, 1, 2, 1, 0]));
    }

    #[test]
    fn test_valuation_errors() {
        let geometric: StreamRef<Q> = Arc::new(ExactStream::new(Vec::new(), Q::one(), Some(0), 0).unwrap());
        assert!(matches!(
            ComposeStream::new(geometric, exact(&[1, 1], 0), true),
            Err(StreamError::CompositionValuation)
        ));

        let f = FunctionStream::new(q, true, 1).into_ref();
        let lazy = FunctionStream::new(q, true, 0).into_ref();
        let h = ComposeStream::new(f, lazy, true).unwrap();
        assert_eq!(h.get(2), Err(StreamError::CompositionValuation));
    }

    #[test]
    fn test_compose_with_zero() {
        let f = exact(&[3, 2], 0);
        let zero: StreamRef<Q> = Arc::new(ZeroStream);
        let h = ComposeStream::new(f, zero, true).unwrap();
        assert_eq!(values(&h, 0..3), qs(&[3, 0, 0]));

        // zero at any g, including one of order 0
        let h = ComposeStream::new(Arc::new(ZeroStream), exact(&[1, 1], 0), false).unwrap();
        assert_eq!(h.approximate_order().unwrap(), Valuation::Infinity);
        assert_eq!(values(&h, -2..3), qs(&[0, 0, 0, 0, 0]));
    }
}
