//! Unary operators on a single stream.

use std::hash::Hasher;
use std::sync::{Arc, OnceLock};

use crate::binary::divisors;
use crate::error::{Result, StreamError};
use crate::inexact::{CachedStream, Operator};
use crate::order::{OrderState, Valuation};
use crate::stream::{feed, feed_node, same_stream, SeriesCoeff, Stream, StreamRef};

/// Returns the cached value of `cell`, computing it with `init` on first
/// success. Failures are not cached.
fn once_try<T: Clone>(cell: &OnceLock<T>, init: impl FnOnce() -> Result<T>) -> Result<T> {
    if let Some(value) = cell.get() {
        return Ok(value.clone());
    }
    let value = init()?;
    Ok(cell.get_or_init(|| value).clone())
}

/// Coefficientwise negation.
pub struct NegOp<R: SeriesCoeff> {
    series: StreamRef<R>,
}

/// The stream `-series`.
pub type NegStream<R> = CachedStream<R, NegOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, NegOp<R>> {
    /// The negation of a stream.
    #[must_use]
    pub fn new(series: StreamRef<R>, sparse: bool) -> Self {
        Self::from_op(NegOp { series }, sparse)
    }
}

impl<R: SeriesCoeff> Operator<R> for NegOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        Ok(OrderState::new(
            self.series.approximate_order()?,
            self.series.known_order().is_some(),
        ))
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        Ok(-self.series.get(n)?)
    }

    fn same_as(&self, other: &Self) -> bool {
        same_stream(self.series.as_ref(), other.series.as_ref())
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        feed_node("neg", &[self.series.as_ref()], state);
    }

    fn is_nonzero(&self) -> bool {
        self.series.is_nonzero()
    }

    fn is_uninitialized(&self) -> bool {
        self.series.is_uninitialized()
    }
}

/// Which side the scalar multiplies from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// `scalar * series`
    Left,
    /// `series * scalar`
    Right,
}

/// Multiplication of every coefficient by a fixed scalar.
pub struct ScalarOp<R: SeriesCoeff> {
    series: StreamRef<R>,
    scalar: R,
    side: Side,
}

/// A stream scaled by a ring element.
pub type ScalarStream<R> = CachedStream<R, ScalarOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, ScalarOp<R>> {
    /// The stream `scalar * series`.
    ///
    /// # Errors
    ///
    /// Rejects the scalars zero and one with [`StreamError::ScalarIsZero`]
    /// and [`StreamError::ScalarIsOne`].
    pub fn rmul(series: StreamRef<R>, scalar: R, sparse: bool) -> Result<Self> {
        Self::scaled(series, scalar, Side::Left, sparse)
    }

    /// The stream `series * scalar`.
    ///
    /// # Errors
    ///
    /// Rejects the scalars zero and one, as [`Self::rmul`] does.
    pub fn lmul(series: StreamRef<R>, scalar: R, sparse: bool) -> Result<Self> {
        Self::scaled(series, scalar, Side::Right, sparse)
    }

    fn scaled(series: StreamRef<R>, scalar: R, side: Side, sparse: bool) -> Result<Self> {
        if scalar.is_zero() {
            return Err(StreamError::ScalarIsZero);
        }
        if scalar.is_one() {
            return Err(StreamError::ScalarIsOne);
        }
        Ok(Self::from_op(ScalarOp { series, scalar, side }, sparse))
    }
}

impl<R: SeriesCoeff> Operator<R> for ScalarOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        // Exact only without zero divisors.
        Ok(OrderState::new(
            self.series.approximate_order()?,
            self.series.known_order().is_some(),
        ))
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        let c = self.series.get(n)?;
        Ok(match self.side {
            Side::Left => self.scalar.clone() * c,
            Side::Right => c * self.scalar.clone(),
        })
    }

    fn same_as(&self, other: &Self) -> bool {
        self.side == other.side
            && self.scalar == other.scalar
            && same_stream(self.series.as_ref(), other.series.as_ref())
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        feed_node("scalar", &[self.series.as_ref()], state);
        feed(&self.side, state);
        feed(&self.scalar, state);
    }

    fn is_nonzero(&self) -> bool {
        self.series.is_nonzero()
    }

    fn is_uninitialized(&self) -> bool {
        self.series.is_uninitialized()
    }
}

/// The multiplicative inverse with respect to the Cauchy product.
///
/// Each coefficient depends on all earlier ones, so the cache is always
/// dense.
pub struct CauchyInverseOp<R: SeriesCoeff> {
    series: StreamRef<R>,
    approximate_order: Option<i64>,
    ainv: OnceLock<R>,
}

/// The stream `1 / series`.
pub type CauchyInverseStream<R> = CachedStream<R, CauchyInverseOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, CauchyInverseOp<R>> {
    /// The inverse of `series`, whose leading coefficient must be a unit.
    #[must_use]
    pub fn new(series: StreamRef<R>) -> Self {
        Self::build(series, None)
    }

    /// The inverse with a known lower bound for its order, which avoids
    /// computing the order of `series` up front.
    #[must_use]
    pub fn with_order(series: StreamRef<R>, approximate_order: i64) -> Self {
        Self::build(series, Some(approximate_order))
    }

    fn build(series: StreamRef<R>, approximate_order: Option<i64>) -> Self {
        Self::from_op(
            CauchyInverseOp {
                series,
                approximate_order,
                ainv: OnceLock::new(),
            },
            false,
        )
    }
}

impl<R: SeriesCoeff> CauchyInverseOp<R> {
    fn series_order(&self) -> Result<i64> {
        match self.series.order() {
            Ok(Valuation::Finite(v)) => Ok(v),
            Ok(Valuation::Infinity) | Err(_) => Err(StreamError::NoInverse),
        }
    }

    /// The inverse of the leading coefficient of the operand.
    fn ainv(&self) -> Result<R> {
        once_try(&self.ainv, || {
            let v = self.series_order()?;
            self.series
                .get(v)?
                .inverse_of_unit()
                .ok_or(StreamError::NotInvertible { index: v })
        })
    }
}

impl<R: SeriesCoeff> Operator<R> for CauchyInverseOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        match self.approximate_order {
            Some(order) => Ok(OrderState::approximate(order)),
            None => Ok(OrderState::exact(-self.series_order()?)),
        }
    }

    fn coefficient(&self, n: i64, this: &dyn Stream<R>) -> Result<R> {
        // The operand starts at -v, so this stream starts at v.
        let v = -self.series_order()?;
        let offset = n - v;
        if offset < 0 {
            return Ok(R::zero());
        }
        let ainv = self.ainv()?;
        if offset == 0 {
            return Ok(ainv);
        }
        let mut c = R::zero();
        for k in 0..offset {
            let l = this.get(v + k)?;
            if !l.is_zero() {
                c = c + l * self.series.get(offset - v - k)?;
            }
        }
        Ok(-c * ainv)
    }

    fn same_as(&self, other: &Self) -> bool {
        same_stream(self.series.as_ref(), other.series.as_ref())
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        feed_node("cauchy_invert", &[self.series.as_ref()], state);
    }

    fn is_nonzero(&self) -> bool {
        true
    }

    fn is_uninitialized(&self) -> bool {
        self.series.is_uninitialized()
    }
}

/// The inverse with respect to Dirichlet convolution.
pub struct DirichletInverseOp<R: SeriesCoeff> {
    series: StreamRef<R>,
    ainv: OnceLock<R>,
}

/// The Dirichlet inverse of a stream with a nonzero coefficient at 1.
pub type DirichletInverseStream<R> = CachedStream<R, DirichletInverseOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, DirichletInverseOp<R>> {
    /// The Dirichlet inverse of `series`. The coefficient at index 1 must be
    /// a unit; this is checked on first use.
    #[must_use]
    pub fn new(series: StreamRef<R>, sparse: bool) -> Self {
        Self::from_op(
            DirichletInverseOp {
                series,
                ainv: OnceLock::new(),
            },
            sparse,
        )
    }
}

impl<R: SeriesCoeff> DirichletInverseOp<R> {
    fn ainv(&self) -> Result<R> {
        once_try(&self.ainv, || {
            let lead = self.series.get(1)?;
            if lead.is_zero() {
                return Err(StreamError::DirichletInverseZero);
            }
            lead.inverse_of_unit().ok_or(StreamError::NotInvertible { index: 1 })
        })
    }
}

impl<R: SeriesCoeff> Operator<R> for DirichletInverseOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        if self.series.approximate_order()? > Valuation::Finite(1) {
            return Err(StreamError::DirichletInverseZero);
        }
        Ok(OrderState::exact(1))
    }

    fn coefficient(&self, n: i64, this: &dyn Stream<R>) -> Result<R> {
        let ainv = self.ainv()?;
        if n == 1 {
            return Ok(ainv);
        }
        let mut c = R::zero();
        for k in divisors(n) {
            if k == n {
                continue;
            }
            let l = self.series.get(n / k)?;
            if !l.is_zero() {
                c = c + this.get(k)? * l;
            }
        }
        Ok(-c * ainv)
    }

    fn same_as(&self, other: &Self) -> bool {
        same_stream(self.series.as_ref(), other.series.as_ref())
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        feed_node("dirichlet_invert", &[self.series.as_ref()], state);
    }

    fn is_uninitialized(&self) -> bool {
        self.series.is_uninitialized()
    }
}

/// A coefficient transformation shared between streams.
pub type MapFn<S, R> = Arc<dyn Fn(S) -> R + Send + Sync>;

/// Applies a function to every nonzero coefficient.
///
/// The function must be a function of the coefficient value alone, and
/// streams mapping the same operand with the same function are equal.
pub struct MapCoefficientsOp<S: SeriesCoeff, R> {
    series: StreamRef<S>,
    function: MapFn<S, R>,
    order: Option<OrderState>,
}

/// A stream of transformed coefficients, possibly over another ring.
pub type MapCoefficientsStream<S, R> = CachedStream<R, MapCoefficientsOp<S, R>>;

impl<S: SeriesCoeff, R: SeriesCoeff> CachedStream<R, MapCoefficientsOp<S, R>> {
    /// Maps `function` over the nonzero coefficients of `series`.
    pub fn new(series: StreamRef<S>, function: impl Fn(S) -> R + Send + Sync + 'static, sparse: bool) -> Self {
        Self::from_shared(series, Arc::new(function), sparse, None)
    }

    /// Maps a shared function. `order` overrides the order bound inherited
    /// from `series`.
    pub fn from_shared(series: StreamRef<S>, function: MapFn<S, R>, sparse: bool, order: Option<OrderState>) -> Self {
        Self::from_op(MapCoefficientsOp { series, function, order }, sparse)
    }
}

impl<S: SeriesCoeff, R: SeriesCoeff> Operator<R> for MapCoefficientsOp<S, R> {
    fn initial_order(&self) -> Result<OrderState> {
        match self.order {
            Some(state) => Ok(state),
            None => Ok(OrderState::approximate(self.series.approximate_order()?)),
        }
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        let c = self.series.get(n)?;
        if c.is_zero() {
            return Ok(R::zero());
        }
        Ok((self.function)(c))
    }

    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.function, &other.function) && same_stream(self.series.as_ref(), other.series.as_ref())
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        // The function itself is not hashable.
        feed("map_coefficients", state);
        feed(&crate::stream_hash(self.series.as_ref()), state);
    }

    fn is_uninitialized(&self) -> bool {
        self.series.is_uninitialized()
    }
}

/// Repeated differentiation with respect to the series variable.
pub struct DerivativeOp<R: SeriesCoeff> {
    series: StreamRef<R>,
    shift: u32,
}

/// The `shift`-th derivative of a stream.
pub type DerivativeStream<R> = CachedStream<R, DerivativeOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, DerivativeOp<R>> {
    /// The `shift`-th derivative: the coefficient at `n` is
    /// `(n+1)(n+2)...(n+shift) * series[n + shift]`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::ZeroShift`] for `shift == 0`.
    pub fn new(series: StreamRef<R>, shift: u32, sparse: bool) -> Result<Self> {
        if shift == 0 {
            return Err(StreamError::ZeroShift);
        }
        Ok(Self::from_op(DerivativeOp { series, shift }, sparse))
    }
}

impl<R: SeriesCoeff> Operator<R> for DerivativeOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        let shift = i64::from(self.shift);
        let order = match self.series.approximate_order()? {
            // The constant terms differentiate away, but whether the
            // result vanishes at 0 is not known in advance.
            Valuation::Finite(v) if (0..=shift).contains(&v) => Valuation::Finite(0),
            Valuation::Finite(v) => Valuation::Finite(v - shift),
            Valuation::Infinity => Valuation::Infinity,
        };
        Ok(OrderState::approximate(order))
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        let shift = i64::from(self.shift);
        let c = self.series.get(n + shift)?;
        if c.is_zero() {
            return Ok(c);
        }
        let factor = (1..=shift).fold(R::one(), |acc, k| acc * R::from_i64(n + k));
        Ok(factor * c)
    }

    fn same_as(&self, other: &Self) -> bool {
        self.shift == other.shift && same_stream(self.series.as_ref(), other.series.as_ref())
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        feed_node("derivative", &[self.series.as_ref()], state);
        feed(&self.shift, state);
    }

    fn is_nonzero(&self) -> bool {
        self.series.is_nonzero()
    }

    fn is_uninitialized(&self) -> bool {
        self.series.is_uninitialized()
    }
}
