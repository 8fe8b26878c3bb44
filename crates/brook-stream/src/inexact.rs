//! Cached streams driven by a coefficient rule.
//!
//! Every stream whose coefficients are not known in closed form is a
//! [`CachedStream`]: a [`CoefficientCache`] together with an [`Operator`]
//! that knows how to compute one coefficient and the initial order bound.

use std::any::Any;
use std::hash::Hasher;
use std::sync::Arc;

use crate::cache::CoefficientCache;
use crate::error::Result;
use crate::order::{OrderState, Valuation};
use crate::stream::{SeriesCoeff, Stream, StreamRef};

/// The rule behind a cached stream.
pub trait Operator<R: SeriesCoeff>: Send + Sync + 'static {
    /// The approximate order of the stream, computed on first use.
    ///
    /// # Errors
    ///
    /// Domain errors of the operator that depend on operand orders.
    fn initial_order(&self) -> Result<OrderState>;

    /// Computes the coefficient at `n`, which is at least the approximate
    /// order. `this` is the stream being computed, for recursive rules.
    ///
    /// # Errors
    ///
    /// Propagates errors from operand reads.
    fn coefficient(&self, n: i64, this: &dyn Stream<R>) -> Result<R>;

    /// Whether two operators of the same kind have equal parameters and
    /// operands.
    fn same_as(&self, other: &Self) -> bool
    where
        Self: Sized;

    /// Feeds a hash consistent with [`Operator::same_as`].
    fn hash_into(&self, state: &mut dyn Hasher);

    /// Whether the stream is known to be nonzero regardless of its cache.
    fn is_nonzero(&self) -> bool {
        false
    }

    /// Whether the stream depends on an undefined placeholder.
    fn is_uninitialized(&self) -> bool {
        false
    }
}

/// A stream computed by an [`Operator`] and memoized in a
/// [`CoefficientCache`].
pub struct CachedStream<R: SeriesCoeff, Op: Operator<R>> {
    cache: CoefficientCache<R>,
    op: Op,
}

impl<R: SeriesCoeff, Op: Operator<R>> CachedStream<R, Op> {
    pub(crate) fn from_op(op: Op, sparse: bool) -> Self {
        Self {
            cache: CoefficientCache::new(sparse),
            op,
        }
    }

    /// The operator driving this stream.
    pub fn operator(&self) -> &Op {
        &self.op
    }

    /// Wraps the stream in a shared handle.
    #[must_use]
    pub fn into_ref(self) -> StreamRef<R> {
        Arc::new(self)
    }

    fn state(&self) -> Result<OrderState> {
        self.cache.tracker().get_or_init(|| self.op.initial_order())
    }
}

impl<R: SeriesCoeff, Op: Operator<R>> Stream<R> for CachedStream<R, Op> {
    fn get(&self, n: i64) -> Result<R> {
        let state = self.state()?;
        self.cache.fetch(n, state, |k| self.op.coefficient(k, self))
    }

    fn approximate_order(&self) -> Result<Valuation> {
        Ok(self.state()?.approx)
    }

    fn known_order(&self) -> Option<Valuation> {
        self.cache
            .tracker()
            .known()
            .filter(|s| s.true_order)
            .map(|s| s.approx)
    }

    fn order(&self) -> Result<Valuation> {
        let state = self.state()?;
        self.cache.scan_order(state, |k| self.get(k))
    }

    fn is_nonzero(&self) -> bool {
        self.op.is_nonzero() || self.cache.any_nonzero()
    }

    fn is_uninitialized(&self) -> bool {
        self.op.is_uninitialized()
    }

    fn known_ne(&self, other: &dyn Stream<R>) -> bool {
        let Some(theirs) = other.cache() else {
            return other.known_ne(self);
        };
        if self.is_uninitialized() != other.is_uninitialized() {
            return true;
        }
        self.cache.known_ne(theirs)
    }

    fn structural_eq(&self, other: &dyn Stream<R>) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|o| self.op.same_as(&o.op))
    }

    fn structural_hash(&self, state: &mut dyn Hasher) {
        self.op.hash_into(state);
    }

    fn cache(&self) -> Option<&CoefficientCache<R>> {
        Some(&self.cache)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
