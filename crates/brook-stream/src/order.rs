//! Valuations and lazy order tracking.
//!
//! Every stream knows a lower bound for the index of its first nonzero
//! coefficient (its approximate order) and whether that bound is known to
//! be attained (its true order). The bound only ever increases.

use parking_lot::{Mutex, ReentrantMutex};
use std::fmt;
use std::ops::{Add, Mul};

use crate::error::{Result, StreamError};

/// The order of a stream: an integer, or infinity for the zero stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Valuation {
    /// A finite index.
    Finite(i64),
    /// The valuation of zero.
    Infinity,
}

impl Valuation {
    /// Returns the finite value, if any.
    #[must_use]
    pub fn finite(self) -> Option<i64> {
        match self {
            Self::Finite(v) => Some(v),
            Self::Infinity => None,
        }
    }

    /// Returns true for `Infinity`.
    #[must_use]
    pub fn is_infinite(self) -> bool {
        matches!(self, Self::Infinity)
    }

    /// Returns true if index `n` lies below this valuation.
    #[must_use]
    pub fn exceeds(self, n: i64) -> bool {
        Self::Finite(n) < self
    }
}

impl From<i64> for Valuation {
    fn from(value: i64) -> Self {
        Self::Finite(value)
    }
}

impl Add for Valuation {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.saturating_add(b)),
            _ => Self::Infinity,
        }
    }
}

impl Add<i64> for Valuation {
    type Output = Self;

    fn add(self, rhs: i64) -> Self::Output {
        self + Self::Finite(rhs)
    }
}

impl Mul for Valuation {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.saturating_mul(b)),
            _ => Self::Infinity,
        }
    }
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(v) => write!(f, "{v}"),
            Self::Infinity => write!(f, "+Infinity"),
        }
    }
}

/// A snapshot of what is known about a stream's order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderState {
    /// Lower bound for the index of the first nonzero coefficient.
    pub approx: Valuation,
    /// Whether `approx` is attained.
    pub true_order: bool,
}

impl OrderState {
    /// An approximate order that may not be attained.
    #[must_use]
    pub fn approximate(approx: impl Into<Valuation>) -> Self {
        Self {
            approx: approx.into(),
            true_order: false,
        }
    }

    /// An order known to be attained.
    #[must_use]
    pub fn exact(order: impl Into<Valuation>) -> Self {
        Self {
            approx: order.into(),
            true_order: true,
        }
    }

    /// An approximate order with an explicit true-order flag.
    #[must_use]
    pub fn new(approx: impl Into<Valuation>, true_order: bool) -> Self {
        Self {
            approx: approx.into(),
            true_order,
        }
    }
}

#[derive(Debug)]
enum OrderSlot {
    Pending,
    Initializing,
    Ready(OrderState),
    Failed(StreamError),
}

/// Lazily initialized, monotone order bookkeeping for one stream.
///
/// The initializer runs at most once. A failure is cached and returned on
/// every later access. Initialization of a given tracker is serialized
/// across threads; re-entry from the initializer itself is reported as
/// [`StreamError::CyclicOrder`].
#[derive(Debug)]
pub struct OrderTracker {
    init: ReentrantMutex<()>,
    slot: Mutex<OrderSlot>,
}

impl OrderTracker {
    /// A tracker whose order is computed on first use.
    #[must_use]
    pub fn lazy() -> Self {
        Self {
            init: ReentrantMutex::new(()),
            slot: Mutex::new(OrderSlot::Pending),
        }
    }

    /// A tracker initialized with a known state.
    #[must_use]
    pub fn ready(state: OrderState) -> Self {
        Self {
            init: ReentrantMutex::new(()),
            slot: Mutex::new(OrderSlot::Ready(state)),
        }
    }

    /// Returns the current state, running `init` if this is the first access.
    ///
    /// # Errors
    ///
    /// Returns the initializer's error, now or on any later call, or
    /// [`StreamError::CyclicOrder`] when the initializer needs its own result.
    pub fn get_or_init(&self, init: impl FnOnce() -> Result<OrderState>) -> Result<OrderState> {
        if let Some(result) = self.settled() {
            return result;
        }

        let _guard = self.init.lock();
        {
            let mut slot = self.slot.lock();
            match &*slot {
                OrderSlot::Ready(state) => return Ok(*state),
                OrderSlot::Failed(err) => return Err(err.clone()),
                OrderSlot::Initializing => return Err(StreamError::CyclicOrder),
                OrderSlot::Pending => *slot = OrderSlot::Initializing,
            }
        }

        let result = init();
        let mut slot = self.slot.lock();
        match &result {
            Ok(state) => {
                tracing::trace!(approx = %state.approx, true_order = state.true_order, "order initialized");
                *slot = OrderSlot::Ready(*state);
            }
            Err(err) => *slot = OrderSlot::Failed(err.clone()),
        }
        result
    }

    fn settled(&self) -> Option<Result<OrderState>> {
        match &*self.slot.lock() {
            OrderSlot::Ready(state) => Some(Ok(*state)),
            OrderSlot::Failed(err) => Some(Err(err.clone())),
            OrderSlot::Pending | OrderSlot::Initializing => None,
        }
    }

    /// The state if it has been initialized, without computing anything.
    #[must_use]
    pub fn known(&self) -> Option<OrderState> {
        match &*self.slot.lock() {
            OrderSlot::Ready(state) => Some(*state),
            _ => None,
        }
    }

    /// Declares `order` to be the true order.
    pub fn mark_true(&self, order: Valuation) {
        let mut slot = self.slot.lock();
        if let OrderSlot::Ready(state) = &mut *slot {
            if !state.true_order {
                tracing::debug!(order = %order, "true order established");
            }
            state.approx = state.approx.max(order);
            state.true_order = true;
        }
    }

    /// Raises the approximate order to at least `bound`.
    ///
    /// Has no effect once the true order is known.
    pub fn advance_to(&self, bound: Valuation) {
        let mut slot = self.slot.lock();
        if let OrderSlot::Ready(state) = &mut *slot {
            if !state.true_order && bound > state.approx {
                tracing::trace!(from = %state.approx, to = %bound, "approximate order refined");
                state.approx = bound;
            }
        }
    }
}
