//! Infinite sums and products over an iterator of streams.
//!
//! The terms must have weakly increasing approximate orders, with only
//! finitely many terms of any given order. The running result is extended
//! one order at a time: after an advance, every coefficient below the
//! committed order is final.

use brook_rings::Ring;
use parking_lot::{Mutex, ReentrantMutex};
use std::any::Any;
use std::cell::Cell;
use std::hash::Hasher;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::binary::{AddStream, CauchyMulStream};
use crate::error::{Result, StreamError};
use crate::exact::{ExactStream, ZeroStream};
use crate::order::{OrderState, OrderTracker, Valuation};
use crate::stream::{feed, SeriesCoeff, Stream, StreamRef};

/// How the terms of an infinite operator are combined.
pub trait Accumulation<R: SeriesCoeff>: Send + Sync + 'static {
    /// Tag used in structural hashes.
    const NAME: &'static str;

    /// The result of an empty iterator.
    ///
    /// # Errors
    ///
    /// Fails if the result cannot be represented.
    fn empty() -> Result<StreamRef<R>>;

    /// The running result after the first term.
    ///
    /// # Errors
    ///
    /// Fails if the result cannot be represented.
    fn start(first: StreamRef<R>, sparse: bool) -> Result<StreamRef<R>>;

    /// Folds `term` into the running result.
    fn apply(current: StreamRef<R>, term: StreamRef<R>, sparse: bool) -> StreamRef<R>;
}

/// `s_1 + s_2 + ...`
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum;

/// `(1 + p_1)(1 + p_2)...`
#[derive(Clone, Copy, Debug, Default)]
pub struct Product;

impl<R: SeriesCoeff> Accumulation<R> for Sum {
    const NAME: &'static str = "infinite sum";

    fn empty() -> Result<StreamRef<R>> {
        Ok(Arc::new(ZeroStream))
    }

    fn start(first: StreamRef<R>, _sparse: bool) -> Result<StreamRef<R>> {
        Ok(first)
    }

    fn apply(current: StreamRef<R>, term: StreamRef<R>, sparse: bool) -> StreamRef<R> {
        AddStream::new(current, term, sparse).into_ref()
    }
}

impl<R: SeriesCoeff> Accumulation<R> for Product {
    const NAME: &'static str = "infinite product";

    fn empty() -> Result<StreamRef<R>> {
        Ok(Arc::new(ExactStream::monomial(R::one(), 0)?))
    }

    fn start(first: StreamRef<R>, sparse: bool) -> Result<StreamRef<R>> {
        Ok(AddStream::new(first, Self::empty()?, sparse).into_ref())
    }

    fn apply(current: StreamRef<R>, term: StreamRef<R>, sparse: bool) -> StreamRef<R> {
        let product = CauchyMulStream::new(Arc::clone(&current), term, sparse).into_ref();
        AddStream::new(current, product, sparse).into_ref()
    }
}

/// The terms consumed so far.
struct Progress<R: SeriesCoeff> {
    current: Option<StreamRef<R>>,
    /// Coefficients below this index are final.
    committed: Valuation,
}

impl<R: SeriesCoeff> Progress<R> {
    fn settled_at(&self, n: i64) -> bool {
        self.current.is_some() && self.committed.exceeds(n)
    }
}

/// A stream defined by folding infinitely many terms.
///
/// The result is assumed to be nonzero, and its order is the approximate
/// order of the running result once index 0 is final.
pub struct InfiniteOperator<R: SeriesCoeff, A> {
    terms: Mutex<Box<dyn Iterator<Item = StreamRef<R>> + Send>>,
    progress: Mutex<Progress<R>>,
    advancing: ReentrantMutex<Cell<bool>>,
    order: OrderTracker,
    sparse: bool,
    _accumulation: PhantomData<fn() -> A>,
}

/// The infinite sum of a sequence of streams.
pub type InfiniteSum<R> = InfiniteOperator<R, Sum>;

/// The infinite product `∏ (1 + p_i)` of a sequence of streams.
pub type InfiniteProduct<R> = InfiniteOperator<R, Product>;

impl<R: SeriesCoeff, A: Accumulation<R>> InfiniteOperator<R, A> {
    /// Folds the streams yielded by `terms`. Intermediate streams use the
    /// given cache kind.
    pub fn new(terms: impl Iterator<Item = StreamRef<R>> + Send + 'static, sparse: bool) -> Self {
        Self {
            terms: Mutex::new(Box::new(terms)),
            progress: Mutex::new(Progress {
                current: None,
                committed: Valuation::Finite(i64::MIN),
            }),
            advancing: ReentrantMutex::new(Cell::new(false)),
            order: OrderTracker::lazy(),
            sparse,
            _accumulation: PhantomData,
        }
    }

    /// The index below which coefficients are final, or `None` before the
    /// first term has been read.
    #[must_use]
    pub fn committed_order(&self) -> Option<Valuation> {
        let progress = self.progress.lock();
        progress.current.as_ref().map(|_| progress.committed)
    }

    fn next_term(&self) -> Option<StreamRef<R>> {
        let mut terms = self.terms.lock();
        terms.find(|s| !ZeroStream::is_zero_stream(s.as_ref()))
    }

    /// Folds in terms until the committed order increases, and returns the
    /// new committed order.
    ///
    /// Coefficients below the returned order are final: terms not yet read
    /// cannot change them. Once the terms run out the committed order is
    /// infinite and further calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InfiniteOrder`] when a term has a nonzero
    /// coefficient below the committed order, and
    /// [`StreamError::Reentrant`] when a term reads this stream.
    pub fn advance(&self) -> Result<Valuation> {
        let index = self.progress.lock().committed.finite().unwrap_or(i64::MAX);
        self.exclusively(index, || self.step())?;
        Ok(self.progress.lock().committed)
    }

    /// Advances until `done` holds. `index` is reported if the advance
    /// needs this stream's own coefficients.
    fn advance_until(&self, index: i64, done: impl Fn(&Progress<R>) -> bool) -> Result<()> {
        if done(&self.progress.lock()) {
            return Ok(());
        }
        self.exclusively(index, || {
            while !done(&self.progress.lock()) {
                self.step()?;
            }
            Ok(())
        })
    }

    fn exclusively(&self, index: i64, work: impl FnOnce() -> Result<()>) -> Result<()> {
        let guard = self.advancing.lock();
        if guard.replace(true) {
            return Err(StreamError::Reentrant { index });
        }
        let result = work();
        guard.set(false);
        result
    }

    /// Reads terms until the committed order increases.
    fn step(&self) -> Result<()> {
        let (current, committed) = {
            let progress = self.progress.lock();
            (progress.current.clone(), progress.committed)
        };
        let (mut current, committed) = match current {
            Some(current) => (current, committed),
            None => match self.next_term() {
                Some(first) => {
                    let order = first.approximate_order()?;
                    (A::start(first, self.sparse)?, order)
                }
                None => {
                    self.commit(A::empty()?, Valuation::Infinity);
                    return Ok(());
                }
            },
        };

        let mut order = committed;
        while order == committed {
            let Valuation::Finite(bound) = order else {
                break;
            };
            let Some(term) = self.next_term() else {
                order = Valuation::Infinity;
                break;
            };
            let Valuation::Finite(low) = term.approximate_order()? else {
                continue;
            };
            for m in low..bound {
                if !term.get(m)?.is_zero() {
                    return Err(StreamError::InfiniteOrder { found: m, committed });
                }
            }
            current = A::apply(current, Arc::clone(&term), self.sparse);
            order = term.approximate_order()?.max(order);
            if order == committed && term.get(bound)?.is_zero() {
                order = Valuation::Finite(bound + 1);
            }
        }
        self.commit(current, order);
        Ok(())
    }

    fn commit(&self, current: StreamRef<R>, committed: Valuation) {
        tracing::debug!(kind = A::NAME, committed = %committed, "infinite operator advanced");
        let mut progress = self.progress.lock();
        progress.current = Some(current);
        progress.committed = committed;
    }

    fn current(&self) -> Option<StreamRef<R>> {
        self.progress.lock().current.clone()
    }

    /// Coefficients `[ao, committed)` of both streams, where both are final.
    fn differs_from(&self, other: &Self) -> Result<bool> {
        let low = self.approximate_order()?.min(other.approximate_order()?);
        let high = match (self.committed_order(), other.committed_order()) {
            (Some(a), Some(b)) => a.min(b),
            _ => return Ok(false),
        };
        let (Valuation::Finite(low), Some(a), Some(b)) = (low, self.current(), other.current()) else {
            return Ok(false);
        };
        let mut n = low;
        while high.exceeds(n) {
            if a.get(n)? != b.get(n)? {
                return Ok(true);
            }
            n += 1;
        }
        Ok(false)
    }
}

impl<R: SeriesCoeff, A: Accumulation<R>> Stream<R> for InfiniteOperator<R, A> {
    fn get(&self, n: i64) -> Result<R> {
        self.advance_until(n, |p| p.settled_at(n))?;
        match self.current() {
            Some(current) => current.get(n),
            None => Ok(R::zero()),
        }
    }

    fn approximate_order(&self) -> Result<Valuation> {
        let state = self.order.get_or_init(|| {
            self.advance_until(0, |p| p.settled_at(0))?;
            match self.current() {
                Some(current) => Ok(OrderState::exact(current.approximate_order()?)),
                None => Ok(OrderState::exact(Valuation::Infinity)),
            }
        })?;
        Ok(state.approx)
    }

    fn known_order(&self) -> Option<Valuation> {
        self.order.known().map(|s| s.approx)
    }

    fn order(&self) -> Result<Valuation> {
        self.approximate_order()
    }

    fn is_nonzero(&self) -> bool {
        true
    }

    fn known_ne(&self, other: &dyn Stream<R>) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|o| self.differs_from(o).unwrap_or(false))
    }

    fn structural_eq(&self, other: &dyn Stream<R>) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|o| std::ptr::eq(self, o))
    }

    fn structural_hash(&self, state: &mut dyn Hasher) {
        feed(A::NAME, state);
        feed(&(self as *const Self as usize), state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_rings::Q;

    fn q(n: i64) -> Q {
        Q::from_integer(n)
    }

    fn qs(v: &[i64]) -> Vec<Q> {
        v.iter().copied().map(q).collect()
    }

    fn values(s: &dyn Stream<Q>, range: std::ops::Range<i64>) -> Vec<Q> {
        range.map(|n| s.get(n).unwrap()).collect()
    }

    fn monomial(n: i64) -> StreamRef<Q> {
        Arc::new(ExactStream::monomial(Q::one(), n).unwrap())
    }

    /// `t^n / (1 - t)`
    fn tail(n: i64) -> StreamRef<Q> {
        Arc::new(ExactStream::new(Vec::new(), Q::one(), Some(n), n).unwrap())
    }

    #[test]
    fn test_distinct_partitions() {
        for sparse in [true, false] {
            let f = InfiniteProduct::new((1..).map(monomial), sparse);
            assert_eq!(values(&f, 0..11), qs(&[1, 1, 1, 2, 2, 3, 4, 5, 6, 8, 10]));
            assert_eq!(f.approximate_order().unwrap(), Valuation::Finite(0));
        }
    }

    #[test]
    fn test_advance_commits_term_by_term() {
        let f = InfiniteProduct::new((1..).map(monomial), true);
        assert_eq!(f.committed_order(), None);
        assert_eq!(f.advance().unwrap(), Valuation::Finite(2));
        assert_eq!(f.advance().unwrap(), Valuation::Finite(3));
        // (1 + t)(1 + t^2) below t^3
        assert_eq!(values(&f, 0..3), qs(&[1, 1, 1]));
        assert_eq!(f.committed_order(), Some(Valuation::Finite(3)));

        let g = InfiniteSum::new((1..).map(tail), false);
        assert_eq!(g.advance().unwrap(), Valuation::Finite(2));
        assert_eq!(values(&g, 0..2), qs(&[0, 1]));

        let h = InfiniteSum::new(vec![monomial(1)].into_iter(), true);
        assert_eq!(h.advance().unwrap(), Valuation::Infinity);
        assert_eq!(h.advance().unwrap(), Valuation::Infinity);
        assert_eq!(values(&h, 0..3), qs(&[0, 1, 0]));
    }

    #[test]
    fn test_sum_of_tails() {
        let f = InfiniteSum::new((1..).map(tail), true);
        assert_eq!(f.approximate_order().unwrap(), Valuation::Finite(1));
        assert_eq!(f.get(2).unwrap(), q(2));
        assert_eq!(f.get(5).unwrap(), q(5));
        assert_eq!(values(&f, 0..8), qs(&[0, 1, 2, 3, 4, 5, 6, 7]));
        assert!(f.is_nonzero());
    }

    #[test]
    fn test_negative_orders() {
        let f = InfiniteProduct::new((1..).map(|n| monomial(n - 10)), true);
        assert_eq!(f.approximate_order().unwrap(), Valuation::Finite(-45));
    }

    #[test]
    fn test_invalid_term_order() {
        let terms = vec![monomial(2), monomial(1), monomial(3)];
        let f = InfiniteSum::new(terms.into_iter(), true);
        assert_eq!(
            f.get(2),
            Err(StreamError::InfiniteOrder {
                found: 1,
                committed: Valuation::Finite(2),
            })
        );
    }

    #[test]
    fn test_zero_terms_are_skipped() {
        let zero: StreamRef<Q> = Arc::new(ZeroStream);
        let terms = vec![zero.clone(), monomial(1), zero, monomial(2)];
        let f = InfiniteSum::new(terms.into_iter(), false);
        assert_eq!(values(&f, 0..4), qs(&[0, 1, 1, 0]));
        assert_eq!(f.committed_order(), Some(Valuation::Infinity));
    }

    #[test]
    fn test_empty_iterator() {
        let sum = InfiniteSum::<Q>::new(std::iter::empty(), true);
        assert_eq!(sum.get(0).unwrap(), Q::zero());
        assert_eq!(sum.approximate_order().unwrap(), Valuation::Infinity);

        let product = InfiniteProduct::<Q>::new(std::iter::empty(), true);
        assert_eq!(values(&product, 0..3), qs(&[1, 0, 0]));
    }

    #[test]
    fn test_matches_finite_product() {
        let f = InfiniteProduct::new((1..=5).map(monomial), true);
        let mut expected: StreamRef<Q> = monomial(0);
        for n in 1..=5 {
            let mut coefficients = vec![Q::zero(); n + 1];
            coefficients[0] = Q::one();
            coefficients[n] = Q::one();
            let factor: StreamRef<Q> = Arc::new(ExactStream::polynomial(coefficients, 0).unwrap());
            expected = CauchyMulStream::new(expected, factor, true).into_ref();
        }
        assert_eq!(values(&f, 0..20), values(expected.as_ref(), 0..20));
    }

    #[test]
    fn test_known_ne() {
        let f = InfiniteSum::new((1..).map(tail), true);
        let g = InfiniteSum::new((1..).map(|n| tail(2 * n - 1)), true);
        assert!(!f.known_ne(&g));
        assert_eq!(f.get(10).unwrap(), q(10));
        assert_eq!(g.get(10).unwrap(), q(5));
        assert!(f.known_ne(&g));
        assert!(!f.known_ne(&f));
    }

    #[test]
    fn test_identity_equality() {
        let f = InfiniteSum::new((1..).map(tail), true);
        let g = InfiniteSum::new((1..).map(tail), true);
        assert!(crate::same_stream::<Q>(&f, &f));
        assert!(!crate::same_stream::<Q>(&f, &g));
    }
}
