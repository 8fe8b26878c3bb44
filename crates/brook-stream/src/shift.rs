//! Reindexing wrappers that read through to another stream.

use parking_lot::RwLock;
use std::any::Any;
use std::hash::Hasher;
use std::sync::Arc;

use crate::cache::Store;
use crate::error::{Result, StreamError};
use crate::order::{OrderState, OrderTracker, Valuation};
use crate::stream::{feed, feed_node, same_stream, SeriesCoeff, Stream, StreamRef};

/// The stream `series[n - shift]`.
///
/// Reads go straight to `series`; nothing is cached here.
pub struct ShiftStream<R: SeriesCoeff> {
    series: StreamRef<R>,
    shift: i64,
}

impl<R: SeriesCoeff> ShiftStream<R> {
    /// Shifts `series` up by `shift` indices.
    #[must_use]
    pub fn new(series: StreamRef<R>, shift: i64) -> Self {
        Self { series, shift }
    }

    /// The amount of the shift.
    #[must_use]
    pub fn shift(&self) -> i64 {
        self.shift
    }
}

impl<R: SeriesCoeff> Stream<R> for ShiftStream<R> {
    fn get(&self, n: i64) -> Result<R> {
        self.series.get(n - self.shift)
    }

    fn approximate_order(&self) -> Result<Valuation> {
        Ok(self.series.approximate_order()? + self.shift)
    }

    fn known_order(&self) -> Option<Valuation> {
        self.series.known_order().map(|v| v + self.shift)
    }

    fn order(&self) -> Result<Valuation> {
        Ok(self.series.order()? + self.shift)
    }

    fn is_nonzero(&self) -> bool {
        self.series.is_nonzero()
    }

    fn is_uninitialized(&self) -> bool {
        self.series.is_uninitialized()
    }

    fn known_ne(&self, _other: &dyn Stream<R>) -> bool {
        false
    }

    fn structural_eq(&self, other: &dyn Stream<R>) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|o| self.shift == o.shift && same_stream(self.series.as_ref(), o.series.as_ref()))
    }

    fn structural_hash(&self, state: &mut dyn Hasher) {
        feed_node("shift", &[self.series.as_ref()], state);
        feed(&self.shift, state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A shift of a cached stream, clamped below at a minimal valuation.
///
/// The coefficient store is shared with the source stream, not copied.
/// The order is tracked separately and refined from whatever the shared
/// store holds after each read.
pub struct TruncatedStream<R: SeriesCoeff> {
    series: StreamRef<R>,
    store: Arc<RwLock<Store<R>>>,
    shift: i64,
    order: OrderTracker,
}

impl<R: SeriesCoeff> TruncatedStream<R> {
    /// Shifts `series` by `shift` and drops everything below
    /// `minimal_valuation`. Coefficients already in the cache of `series`
    /// are used to find the true order right away.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NotCached`] if `series` keeps no cache.
    pub fn new(series: StreamRef<R>, shift: i64, minimal_valuation: i64) -> Result<Self> {
        let store = series.cache().ok_or(StreamError::NotCached)?.shared_store();
        let truncated = Self {
            series,
            store,
            shift,
            order: OrderTracker::ready(OrderState::approximate(minimal_valuation)),
        };
        truncated.refine();
        Ok(truncated)
    }

    fn state(&self) -> OrderState {
        self.order
            .known()
            .unwrap_or_else(|| OrderState::approximate(Valuation::Infinity))
    }

    /// The index in this stream of the first dense cache entry, if the
    /// source's dense cache is anchored.
    fn dense_offset(&self) -> Option<i64> {
        self.series.known_order()?.finite().map(|v| v + self.shift)
    }

    /// Advances the order past cached zeros, stopping at the first cached
    /// nonzero entry or the first gap.
    fn refine(&self) {
        let state = self.state();
        if state.true_order {
            return;
        }
        let Valuation::Finite(mut ao) = state.approx else {
            return;
        };
        let found = match &*self.store.read() {
            Store::Sparse(map) => loop {
                match map.get(&(ao - self.shift)) {
                    Some(c) if !c.is_zero() => break true,
                    Some(_) => ao += 1,
                    None => break false,
                }
            },
            Store::Dense(values) => {
                let Some(offset) = self.dense_offset() else {
                    return;
                };
                ao = ao.max(offset);
                let start = usize::try_from(ao - offset).unwrap_or(usize::MAX);
                let mut found = false;
                for c in values.iter().skip(start) {
                    if !c.is_zero() {
                        found = true;
                        break;
                    }
                    ao += 1;
                }
                found
            }
        };
        if found {
            self.order.mark_true(Valuation::Finite(ao));
        } else {
            self.order.advance_to(Valuation::Finite(ao));
        }
    }

    fn cached_at(&self, n: i64) -> Option<R> {
        match &*self.store.read() {
            Store::Sparse(map) => map.get(&(n - self.shift)).cloned(),
            Store::Dense(_) => None,
        }
    }
}

impl<R: SeriesCoeff> Stream<R> for TruncatedStream<R> {
    fn get(&self, n: i64) -> Result<R> {
        if self.state().approx.exceeds(n) {
            return Ok(R::zero());
        }
        let c = self.series.get(n - self.shift)?;
        self.refine();
        Ok(c)
    }

    fn approximate_order(&self) -> Result<Valuation> {
        Ok(self.state().approx)
    }

    fn known_order(&self) -> Option<Valuation> {
        let state = self.state();
        state.true_order.then_some(state.approx)
    }

    fn order(&self) -> Result<Valuation> {
        let state = self.state();
        if state.true_order {
            return Ok(state.approx);
        }
        let Valuation::Finite(mut n) = state.approx else {
            return Ok(Valuation::Infinity);
        };
        loop {
            if let Some(c) = self.cached_at(n) {
                if !c.is_zero() {
                    self.order.mark_true(Valuation::Finite(n));
                    return Ok(Valuation::Finite(n));
                }
            } else if !self.get(n)?.is_zero() {
                return Ok(Valuation::Finite(n));
            }
            n += 1;
        }
    }

    fn is_nonzero(&self) -> bool {
        let Valuation::Finite(ao) = self.state().approx else {
            return false;
        };
        match &*self.store.read() {
            Store::Sparse(map) => map
                .iter()
                .any(|(&i, c)| i + self.shift >= ao && !c.is_zero()),
            Store::Dense(values) => {
                let Some(offset) = self.dense_offset() else {
                    return false;
                };
                let start = usize::try_from(ao - offset).unwrap_or(0);
                values.iter().skip(start).any(|c| !c.is_zero())
            }
        }
    }

    fn is_uninitialized(&self) -> bool {
        self.series.is_uninitialized()
    }

    fn known_ne(&self, other: &dyn Stream<R>) -> bool {
        self.is_uninitialized() != other.is_uninitialized()
    }

    fn structural_eq(&self, other: &dyn Stream<R>) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|o| self.shift == o.shift && same_stream(self.series.as_ref(), o.series.as_ref()))
    }

    fn structural_hash(&self, state: &mut dyn Hasher) {
        feed_node("truncated", &[self.series.as_ref()], state);
        feed(&self.shift, state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
