//! Binary operators: sum, difference, Cauchy product and Dirichlet
//! convolution.

use brook_rings::CommutativeRing;
use std::hash::Hasher;

use crate::error::{Result, StreamError};
use crate::inexact::{CachedStream, Operator};
use crate::order::{OrderState, Valuation};
use crate::stream::{feed, feed_node, same_stream, stream_hash, SeriesCoeff, Stream, StreamRef};

/// The two operands of a binary operator.
pub struct Operands<R: SeriesCoeff> {
    /// Left operand.
    pub left: StreamRef<R>,
    /// Right operand.
    pub right: StreamRef<R>,
}

impl<R: SeriesCoeff> Operands<R> {
    fn new(left: StreamRef<R>, right: StreamRef<R>) -> Self {
        Self { left, right }
    }

    fn same_ordered(&self, other: &Self) -> bool {
        same_stream(self.left.as_ref(), other.left.as_ref()) && same_stream(self.right.as_ref(), other.right.as_ref())
    }

    fn same_unordered(&self, other: &Self) -> bool {
        self.same_ordered(other)
            || (same_stream(self.left.as_ref(), other.right.as_ref())
                && same_stream(self.right.as_ref(), other.left.as_ref()))
    }

    fn hash_ordered(&self, tag: &str, state: &mut dyn Hasher) {
        feed_node(tag, &[self.left.as_ref(), self.right.as_ref()], state);
    }

    fn hash_unordered(&self, tag: &str, state: &mut dyn Hasher) {
        let a = stream_hash(self.left.as_ref());
        let b = stream_hash(self.right.as_ref());
        feed(tag, state);
        feed(&a.min(b), state);
        feed(&a.max(b), state);
    }

    fn is_uninitialized(&self) -> bool {
        self.left.is_uninitialized() || self.right.is_uninitialized()
    }
}

/// Coefficientwise sum.
pub struct AddOp<R: SeriesCoeff>(Operands<R>);

/// The stream `left + right`.
pub type AddStream<R> = CachedStream<R, AddOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, AddOp<R>> {
    /// The sum of two streams.
    #[must_use]
    pub fn new(left: StreamRef<R>, right: StreamRef<R>, sparse: bool) -> Self {
        Self::from_op(AddOp(Operands::new(left, right)), sparse)
    }
}

impl<R: SeriesCoeff> Operator<R> for AddOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        // Cancellation may push the true order higher.
        let order = self.0.left.approximate_order()?.min(self.0.right.approximate_order()?);
        Ok(OrderState::approximate(order))
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        Ok(self.0.left.get(n)? + self.0.right.get(n)?)
    }

    fn same_as(&self, other: &Self) -> bool {
        self.0.same_unordered(&other.0)
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        self.0.hash_unordered("add", state);
    }

    fn is_uninitialized(&self) -> bool {
        self.0.is_uninitialized()
    }
}

/// Coefficientwise difference.
pub struct SubOp<R: SeriesCoeff>(Operands<R>);

/// The stream `left - right`.
pub type SubStream<R> = CachedStream<R, SubOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, SubOp<R>> {
    /// The difference of two streams.
    #[must_use]
    pub fn new(left: StreamRef<R>, right: StreamRef<R>, sparse: bool) -> Self {
        Self::from_op(SubOp(Operands::new(left, right)), sparse)
    }
}

impl<R: SeriesCoeff> Operator<R> for SubOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        let order = self.0.left.approximate_order()?.min(self.0.right.approximate_order()?);
        Ok(OrderState::approximate(order))
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        Ok(self.0.left.get(n)? - self.0.right.get(n)?)
    }

    fn same_as(&self, other: &Self) -> bool {
        self.0.same_ordered(&other.0)
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        self.0.hash_ordered("sub", state);
    }

    fn is_uninitialized(&self) -> bool {
        self.0.is_uninitialized()
    }
}

/// The Cauchy product.
///
/// Coefficients are multiplied in operand order, so the coefficient ring
/// need not be commutative. Only the variable commutes with coefficients.
pub struct CauchyMulOp<R: SeriesCoeff> {
    operands: Operands<R>,
    commutative: bool,
}

/// The stream `left * right`.
pub type CauchyMulStream<R> = CachedStream<R, CauchyMulOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, CauchyMulOp<R>> {
    /// The Cauchy product of two streams.
    #[must_use]
    pub fn new(left: StreamRef<R>, right: StreamRef<R>, sparse: bool) -> Self {
        Self::from_op(
            CauchyMulOp {
                operands: Operands::new(left, right),
                commutative: false,
            },
            sparse,
        )
    }

    /// The Cauchy product over a commutative ring. Such products compare
    /// equal regardless of operand order.
    #[must_use]
    pub fn commutative(left: StreamRef<R>, right: StreamRef<R>, sparse: bool) -> Self
    where
        R: CommutativeRing,
    {
        Self::from_op(
            CauchyMulOp {
                operands: Operands::new(left, right),
                commutative: true,
            },
            sparse,
        )
    }
}

impl<R: SeriesCoeff> Operator<R> for CauchyMulOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        // Exact only over an integral domain.
        let order = self.operands.left.approximate_order()? + self.operands.right.approximate_order()?;
        Ok(OrderState::approximate(order))
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        let Operands { left, right } = &self.operands;
        let (Valuation::Finite(lv), Valuation::Finite(rv)) = (left.approximate_order()?, right.approximate_order()?)
        else {
            return Ok(R::zero());
        };
        let mut c = R::zero();
        for k in lv..=n - rv {
            let l = left.get(k)?;
            if !l.is_zero() {
                c = c + l * right.get(n - k)?;
            }
        }
        Ok(c)
    }

    fn same_as(&self, other: &Self) -> bool {
        if self.commutative != other.commutative {
            return false;
        }
        if self.commutative {
            self.operands.same_unordered(&other.operands)
        } else {
            self.operands.same_ordered(&other.operands)
        }
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        if self.commutative {
            self.operands.hash_unordered("cauchy_mul_commutative", state);
        } else {
            self.operands.hash_ordered("cauchy_mul", state);
        }
    }

    fn is_nonzero(&self) -> bool {
        self.operands.left.is_nonzero() && self.operands.right.is_nonzero()
    }

    fn is_uninitialized(&self) -> bool {
        self.operands.is_uninitialized()
    }
}

/// Dirichlet convolution: the coefficient at `n` is the sum of
/// `left[k] * right[n / k]` over the divisors `k` of `n`.
pub struct DirichletConvolveOp<R: SeriesCoeff>(Operands<R>);

/// The Dirichlet convolution of two streams.
pub type DirichletConvolveStream<R> = CachedStream<R, DirichletConvolveOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, DirichletConvolveOp<R>> {
    /// The Dirichlet convolution of two streams whose orders are at
    /// least 1. The order condition is checked on first use.
    #[must_use]
    pub fn new(left: StreamRef<R>, right: StreamRef<R>, sparse: bool) -> Self {
        Self::from_op(DirichletConvolveOp(Operands::new(left, right)), sparse)
    }
}

impl<R: SeriesCoeff> Operator<R> for DirichletConvolveOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        let lv = self.0.left.approximate_order()?;
        let rv = self.0.right.approximate_order()?;
        if lv <= Valuation::Finite(0) || rv <= Valuation::Finite(0) {
            return Err(StreamError::DirichletOrder);
        }
        Ok(OrderState::approximate(lv * rv))
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        let Operands { left, right } = &self.0;
        let lv = left.approximate_order()?;
        let rv = right.approximate_order()?;
        let mut c = R::zero();
        for k in divisors(n) {
            if lv.exceeds(k) || rv.exceeds(n / k) {
                continue;
            }
            let l = left.get(k)?;
            if !l.is_zero() {
                c = c + l * right.get(n / k)?;
            }
        }
        Ok(c)
    }

    fn same_as(&self, other: &Self) -> bool {
        self.0.same_ordered(&other.0)
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        self.0.hash_ordered("dirichlet_convolve", state);
    }

    fn is_uninitialized(&self) -> bool {
        self.0.is_uninitialized()
    }
}

/// The positive divisors of `n` in increasing order; empty for `n < 1`.
pub(crate) fn divisors(n: i64) -> Vec<i64> {
    if n < 1 {
        return Vec::new();
    }
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut k = 1;
    while k * k <= n {
        if n % k == 0 {
            small.push(k);
            if k * k != n {
                large.push(n / k);
            }
        }
        k += 1;
    }
    small.extend(large.into_iter().rev());
    small
}
