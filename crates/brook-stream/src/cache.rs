//! Coefficient caches for streams whose values are computed on demand.
//!
//! A sparse cache maps indices to coefficients and computes any index in
//! isolation. A dense cache stores the contiguous run of coefficients
//! starting at the true order and always produces them in increasing order,
//! which is what recursive definitions such as inverses rely on.

use parking_lot::{ReentrantMutex, RwLock};
use rustc_hash::FxHashMap;
use std::cell::Cell;
use std::sync::Arc;

use crate::error::{Result, StreamError};
use crate::order::{OrderState, OrderTracker, Valuation};
use crate::stream::SeriesCoeff;

/// The memoized coefficients of a stream.
#[derive(Debug)]
pub(crate) enum Store<R> {
    /// Arbitrary computed indices.
    Sparse(FxHashMap<i64, R>),
    /// Entry `i` is the coefficient at `true order + i`.
    Dense(Vec<R>),
}

impl<R: SeriesCoeff> Store<R> {
    fn new(sparse: bool) -> Self {
        if sparse {
            Self::Sparse(FxHashMap::default())
        } else {
            Self::Dense(Vec::new())
        }
    }
}

/// Order bookkeeping plus memoized coefficients for one stream.
///
/// The next dense coefficient to produce is always at
/// `approximate order + cached length`, so there is no generator state to
/// save or restore: a stream rebuilt from its parameters resumes where the
/// cache ends.
#[derive(Debug)]
pub struct CoefficientCache<R> {
    order: OrderTracker,
    store: Arc<RwLock<Store<R>>>,
    production: ReentrantMutex<Cell<bool>>,
}

impl<R: SeriesCoeff> CoefficientCache<R> {
    /// An empty cache whose order is initialized lazily.
    #[must_use]
    pub fn new(sparse: bool) -> Self {
        Self::with_tracker(sparse, OrderTracker::lazy())
    }

    pub(crate) fn with_tracker(sparse: bool, order: OrderTracker) -> Self {
        Self {
            order,
            store: Arc::new(RwLock::new(Store::new(sparse))),
            production: ReentrantMutex::new(Cell::new(false)),
        }
    }

    /// Whether coefficients are memoized by index rather than contiguously.
    #[must_use]
    pub fn is_sparse(&self) -> bool {
        matches!(&*self.store.read(), Store::Sparse(_))
    }

    /// The order tracker of the owning stream.
    #[must_use]
    pub fn tracker(&self) -> &OrderTracker {
        &self.order
    }

    pub(crate) fn shared_store(&self) -> Arc<RwLock<Store<R>>> {
        Arc::clone(&self.store)
    }

    fn snapshot(&self, fallback: OrderState) -> OrderState {
        self.order.known().unwrap_or(fallback)
    }

    /// Returns the coefficient at `n`, producing it with `rule` on a miss.
    ///
    /// `state` must be the initialized order state of the owning stream.
    /// Coefficients below the approximate order are zero without consulting
    /// `rule`.
    ///
    /// # Errors
    ///
    /// Propagates errors from `rule`, and reports
    /// [`StreamError::Reentrant`] when a dense production needs a
    /// coefficient of the same stream that is not yet available.
    pub fn fetch(&self, n: i64, state: OrderState, rule: impl Fn(i64) -> Result<R>) -> Result<R> {
        let state = self.snapshot(state);
        if state.approx.exceeds(n) {
            return Ok(R::zero());
        }
        if self.is_sparse() {
            self.fetch_sparse(n, state, &rule)
        } else {
            self.fetch_dense(n, state, &rule)
        }
    }

    fn fetch_sparse(&self, n: i64, state: OrderState, rule: &impl Fn(i64) -> Result<R>) -> Result<R> {
        if let Store::Sparse(map) = &*self.store.read() {
            if let Some(c) = map.get(&n) {
                return Ok(c.clone());
            }
        }

        let c = rule(n)?;

        let mut store = self.store.write();
        let Store::Sparse(map) = &mut *store else {
            return Ok(c);
        };
        let state = self.snapshot(state);
        if state.true_order || Valuation::Finite(n) > state.approx {
            map.insert(n, c.clone());
            return Ok(c);
        }
        if state.approx.exceeds(n) {
            return Ok(c);
        }

        if !c.is_zero() {
            map.insert(n, c.clone());
            self.order.mark_true(Valuation::Finite(n));
            return Ok(c);
        }

        // The approximate order is never cached before the true order is
        // known; skip over any zeros computed beyond it.
        let mut ao = n + 1;
        loop {
            match map.get(&ao) {
                Some(v) if !v.is_zero() => {
                    self.order.mark_true(Valuation::Finite(ao));
                    break;
                }
                Some(_) => ao += 1,
                None => {
                    self.order.advance_to(Valuation::Finite(ao));
                    break;
                }
            }
        }
        Ok(c)
    }

    fn fetch_dense(&self, n: i64, state: OrderState, rule: &impl Fn(i64) -> Result<R>) -> Result<R> {
        if let Some(c) = self.dense_at(n, state) {
            return Ok(c);
        }

        let guard = self.production.lock();

        loop {
            let st = self.snapshot(state);
            if st.true_order || st.approx.exceeds(n) {
                break;
            }
            let Valuation::Finite(ao) = st.approx else {
                break;
            };
            let c = produce(&guard, ao, rule)?;
            if c.is_zero() {
                self.order.advance_to(Valuation::Finite(ao + 1));
            } else {
                if let Store::Dense(values) = &mut *self.store.write() {
                    if values.is_empty() {
                        values.push(c);
                    }
                }
                self.order.mark_true(Valuation::Finite(ao));
            }
        }

        let st = self.snapshot(state);
        let Valuation::Finite(ao) = st.approx else {
            return Ok(R::zero());
        };
        if !st.true_order || n < ao {
            return Ok(R::zero());
        }
        let i = usize::try_from(n - ao).unwrap_or(usize::MAX);

        loop {
            let len = match &*self.store.read() {
                Store::Dense(values) => match values.get(i) {
                    Some(c) => return Ok(c.clone()),
                    None => values.len(),
                },
                Store::Sparse(_) => return Ok(R::zero()),
            };
            let index = ao + i64::try_from(len).unwrap_or(i64::MAX);
            let c = produce(&guard, index, rule)?;
            if let Store::Dense(values) = &mut *self.store.write() {
                if values.len() == len {
                    values.push(c);
                }
            }
        }
    }

    fn dense_at(&self, n: i64, state: OrderState) -> Option<R> {
        let st = self.snapshot(state);
        let ao = st.approx.finite()?;
        if !st.true_order || n < ao {
            return None;
        }
        let i = usize::try_from(n - ao).ok()?;
        match &*self.store.read() {
            Store::Dense(values) => values.get(i).cloned(),
            Store::Sparse(_) => None,
        }
    }

    /// Scans forward from the approximate order for the first nonzero
    /// coefficient, reading through `get`.
    ///
    /// # Errors
    ///
    /// Propagates errors from `get`.
    pub fn scan_order(&self, state: OrderState, get: impl Fn(i64) -> Result<R>) -> Result<Valuation> {
        let st = self.snapshot(state);
        if st.true_order {
            return Ok(st.approx);
        }
        let Valuation::Finite(mut n) = st.approx else {
            return Ok(Valuation::Infinity);
        };
        while get(n)?.is_zero() {
            n += 1;
        }
        Ok(Valuation::Finite(n))
    }

    /// Whether any memoized coefficient is nonzero.
    #[must_use]
    pub fn any_nonzero(&self) -> bool {
        match &*self.store.read() {
            Store::Sparse(map) => map.values().any(|c| !c.is_zero()),
            Store::Dense(values) => values.iter().any(|c| !c.is_zero()),
        }
    }

    /// The memoized coefficients with their indices, in increasing order.
    #[must_use]
    pub fn cached_entries(&self) -> Vec<(i64, R)> {
        match &*self.store.read() {
            Store::Sparse(map) => {
                let mut entries: Vec<(i64, R)> = map.iter().map(|(&i, c)| (i, c.clone())).collect();
                entries.sort_unstable_by_key(|&(i, _)| i);
                entries
            }
            Store::Dense(values) => {
                let Some(start) = self.order.known().and_then(|s| s.approx.finite()) else {
                    return Vec::new();
                };
                (start..).zip(values.iter().cloned()).collect()
            }
        }
    }

    /// Drops all memoized coefficients. The order information is kept.
    pub fn clear(&self) {
        match &mut *self.store.write() {
            Store::Sparse(map) => map.clear(),
            Store::Dense(values) => values.clear(),
        }
    }

    /// Whether the memoized coefficients already prove the two streams
    /// different.
    #[must_use]
    pub fn known_ne(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.store, &other.store) {
            return false;
        }
        match (self.is_sparse(), other.is_sparse()) {
            (true, true) => {
                let mine = self.cached_entries();
                let theirs = other.store.read();
                let Store::Sparse(map) = &*theirs else {
                    return false;
                };
                mine.iter()
                    .any(|(i, c)| map.get(i).is_some_and(|d| d != c))
            }
            (false, false) => {
                let (Some(a), Some(b)) = (self.order.known(), other.order.known()) else {
                    return false;
                };
                if (a.true_order && b.approx > a.approx) || (b.true_order && a.approx > b.approx) {
                    return true;
                }
                if !a.true_order || !b.true_order {
                    return false;
                }
                let mine = self.cached_entries();
                let theirs = other.cached_entries();
                mine.iter().zip(theirs.iter()).any(|((_, c), (_, d))| c != d)
            }
            _ => false,
        }
    }
}

fn produce<R>(producing: &Cell<bool>, index: i64, rule: &impl Fn(i64) -> Result<R>) -> Result<R> {
    if producing.replace(true) {
        return Err(StreamError::Reentrant { index });
    }
    let result = rule(index);
    producing.set(false);
    result
}
