//! Source streams: coefficients from a closure, from an iterator, or from a
//! placeholder that is defined later.

use parking_lot::Mutex;
use std::hash::Hasher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::{Result, StreamError};
use crate::inexact::{CachedStream, Operator};
use crate::order::OrderState;
use crate::stream::{feed, SeriesCoeff, Stream, StreamRef};

/// A coefficient function shared between streams.
pub type CoefficientFn<R> = Arc<dyn Fn(i64) -> R + Send + Sync>;

/// Coefficients computed by a function of the index.
pub struct FunctionOp<R> {
    function: CoefficientFn<R>,
    order: OrderState,
}

/// A stream whose coefficient at `n` is `f(n)`.
pub type FunctionStream<R> = CachedStream<R, FunctionOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, FunctionOp<R>> {
    /// A stream of `f(n)` for `n` at or above `approximate_order`.
    pub fn new(
        function: impl Fn(i64) -> R + Send + Sync + 'static,
        sparse: bool,
        approximate_order: i64,
    ) -> Self {
        Self::from_shared(Arc::new(function), sparse, approximate_order, false)
    }

    /// A stream over a shared function. Streams built from the same
    /// function compare equal.
    pub fn from_shared(function: CoefficientFn<R>, sparse: bool, approximate_order: i64, true_order: bool) -> Self {
        Self::from_op(
            FunctionOp {
                function,
                order: OrderState::new(approximate_order, true_order),
            },
            sparse,
        )
    }
}

impl<R: SeriesCoeff> Operator<R> for FunctionOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        Ok(self.order)
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        Ok((self.function)(n))
    }

    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.function, &other.function)
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        feed("function", state);
    }
}

/// Coefficients pulled from an iterator, one per index.
pub struct IteratorOp<R> {
    iter: Mutex<Box<dyn Iterator<Item = R> + Send>>,
    order: OrderState,
}

/// A dense stream fed by an iterator. Once the iterator is exhausted the
/// remaining coefficients are zero.
///
/// The iterator cannot be rewound, so clearing the cache of an iterator
/// stream loses the coefficients already consumed.
pub type IteratorStream<R> = CachedStream<R, IteratorOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, IteratorOp<R>> {
    /// A stream whose coefficients, starting at `approximate_order`, are
    /// the items of `iter`.
    pub fn new(iter: impl Iterator<Item = R> + Send + 'static, approximate_order: i64, true_order: bool) -> Self {
        Self::from_op(
            IteratorOp {
                iter: Mutex::new(Box::new(iter)),
                order: OrderState::new(approximate_order, true_order),
            },
            false,
        )
    }
}

impl<R: SeriesCoeff> Operator<R> for IteratorOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        Ok(self.order)
    }

    fn coefficient(&self, _n: i64, _this: &dyn Stream<R>) -> Result<R> {
        Ok(self.iter.lock().next().unwrap_or_else(R::zero))
    }

    fn same_as(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        feed("iterator", state);
    }
}

/// A placeholder that forwards to a target defined after construction.
pub struct UninitializedOp<R: SeriesCoeff> {
    target: OnceLock<StreamRef<R>>,
    approximate_order: OrderState,
    visiting: AtomicBool,
}

/// A dense placeholder stream for recursive definitions.
///
/// Build the placeholder first, use it in the expression that defines it,
/// then bind that expression with [`UninitializedStream::define`].
/// Such a definition forms a reference cycle that is never freed.
pub type UninitializedStream<R> = CachedStream<R, UninitializedOp<R>>;

impl<R: SeriesCoeff> CachedStream<R, UninitializedOp<R>> {
    /// An undefined stream with the given lower bound for its order.
    #[must_use]
    pub fn new(approximate_order: i64, true_order: bool) -> Self {
        Self::from_op(
            UninitializedOp {
                target: OnceLock::new(),
                approximate_order: OrderState::new(approximate_order, true_order),
                visiting: AtomicBool::new(false),
            },
            false,
        )
    }

    /// Binds the placeholder to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::AlreadyDefined`] on a second definition.
    pub fn define(&self, target: StreamRef<R>) -> Result<()> {
        self.operator()
            .target
            .set(target)
            .map_err(|_| StreamError::AlreadyDefined)?;
        tracing::debug!("placeholder stream defined");
        Ok(())
    }

    /// The bound target, if any.
    pub fn target(&self) -> Option<&StreamRef<R>> {
        self.operator().target.get()
    }
}

impl<R: SeriesCoeff> Operator<R> for UninitializedOp<R> {
    fn initial_order(&self) -> Result<OrderState> {
        Ok(self.approximate_order)
    }

    fn coefficient(&self, n: i64, _this: &dyn Stream<R>) -> Result<R> {
        self.target.get().ok_or(StreamError::Undefined)?.get(n)
    }

    fn same_as(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }

    fn hash_into(&self, state: &mut dyn Hasher) {
        feed("uninitialized", state);
        feed(&(self as *const Self as usize), state);
    }

    fn is_uninitialized(&self) -> bool {
        let Some(target) = self.target.get() else {
            return true;
        };
        // Coupled placeholders refer to each other; a cycle that only
        // passes through defined placeholders is initialized.
        if self
            .visiting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let result = target.is_uninitialized();
        self.visiting.store(false, Ordering::Release);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{AddStream, CauchyMulStream};
    use crate::exact::ExactStream;
    use crate::stream::same_stream;
    use brook_rings::{Ring, Q};

    fn q(n: i64) -> Q {
        Q::from_integer(n)
    }

    fn prefix(s: &dyn Stream<Q>, len: i64) -> Vec<Q> {
        (0..len).map(|n| s.get(n).unwrap()).collect()
    }

    #[test]
    fn test_function_stream() {
        let squares = FunctionStream::new(|n| q(n * n), true, 0);
        assert_eq!(squares.get(3).unwrap(), q(9));
        assert_eq!(squares.cache().unwrap().cached_entries(), vec![(3, q(9))]);
        assert_eq!(prefix(&squares, 5), vec![q(0), q(1), q(4), q(9), q(16)]);

        let dense = FunctionStream::new(|n| q(n * n), false, 0);
        assert_eq!(prefix(&dense, 4), vec![q(0), q(1), q(4), q(9)]);
        assert_eq!(dense.known_order(), Some(crate::Valuation::Finite(1)));
        assert_eq!(dense.cache().unwrap().cached_entries(), vec![(1, q(1)), (2, q(4)), (3, q(9))]);
    }

    #[test]
    fn test_function_identity_equality() {
        let f: CoefficientFn<Q> = Arc::new(|n| q(n));
        let a = FunctionStream::from_shared(Arc::clone(&f), true, 0, false);
        let b = FunctionStream::from_shared(f, true, 0, false);
        let c = FunctionStream::new(|n| q(n), true, 0);
        assert!(same_stream::<Q>(&a, &b));
        assert!(!same_stream::<Q>(&a, &c));
    }

    #[test]
    fn test_iterator_stream() {
        let s = IteratorStream::new((0..3).map(q), 0, false);
        assert_eq!(prefix(&s, 6), vec![q(0), q(1), q(2), q(0), q(0), q(0)]);
        assert_eq!(s.order().unwrap(), crate::Valuation::Finite(1));

        let shifted = IteratorStream::new((0..).map(q), 2, false);
        assert_eq!(prefix(&shifted, 5), vec![q(0), q(0), q(0), q(1), q(2)]);
    }

    #[test]
    fn test_undefined_placeholder() {
        let u = UninitializedStream::<Q>::new(0, false);
        assert!(u.is_uninitialized());
        assert_eq!(u.get(0), Err(StreamError::Undefined));
        assert_eq!(u.get(-1).unwrap(), Q::zero());
    }

    #[test]
    fn test_geometric_series_by_recursion() {
        // f = 1 + z f
        let f = Arc::new(UninitializedStream::<Q>::new(0, false));
        let one: StreamRef<Q> = Arc::new(ExactStream::monomial(Q::one(), 0).unwrap());
        let z: StreamRef<Q> = Arc::new(ExactStream::monomial(Q::one(), 1).unwrap());
        let zf = CauchyMulStream::new(z, f.clone(), false).into_ref();
        let rhs = AddStream::new(one, zf, false).into_ref();
        f.define(rhs.clone()).unwrap();

        assert!(!f.is_uninitialized());
        assert!(!rhs.is_uninitialized());
        assert_eq!(prefix(f.as_ref(), 6), vec![Q::one(); 6]);
        assert_eq!(f.define(rhs), Err(StreamError::AlreadyDefined));
    }

    #[test]
    fn test_coupled_placeholders() {
        let a = Arc::new(UninitializedStream::<Q>::new(0, false));
        let b = Arc::new(UninitializedStream::<Q>::new(0, false));
        a.define(b.clone()).unwrap();
        assert!(a.is_uninitialized());
        b.define(a.clone()).unwrap();
        assert!(!a.is_uninitialized());
        assert!(!b.is_uninitialized());
    }
}
