//! The stream abstraction.
//!
//! A stream is an infinite sequence of ring elements indexed by integers,
//! with only finitely many nonzero entries at negative indices. Coefficients
//! are produced on demand and may be cached by the implementation.

use brook_rings::Ring;
use rustc_hash::FxHasher;
use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::cache::CoefficientCache;
use crate::error::Result;
use crate::order::Valuation;

/// Coefficient types a stream can carry.
pub trait SeriesCoeff: Ring + Send + Sync + 'static {}

impl<T: Ring + Send + Sync + 'static> SeriesCoeff for T {}

/// A lazily evaluated coefficient sequence.
///
/// Implementations must not read coefficients or orders of their operands
/// while being constructed, so that placeholder streams can be defined
/// after the expressions that refer to them.
pub trait Stream<R: SeriesCoeff>: Send + Sync + 'static {
    /// Returns the coefficient at index `n`.
    ///
    /// # Errors
    ///
    /// Surfaces domain errors of the operator tree, which are detected
    /// lazily.
    fn get(&self, n: i64) -> Result<R>;

    /// A lower bound for the index of the first nonzero coefficient.
    ///
    /// # Errors
    ///
    /// Fails if computing the bound hits a domain error.
    fn approximate_order(&self) -> Result<Valuation>;

    /// The true order, if it has already been established.
    fn known_order(&self) -> Option<Valuation>;

    /// The index of the first nonzero coefficient.
    ///
    /// This scans forward and does not terminate for a stream that is zero
    /// but cannot be recognized as such.
    ///
    /// # Errors
    ///
    /// Fails if a coefficient read fails.
    fn order(&self) -> Result<Valuation>;

    /// Whether the stream is known to be nonzero.
    fn is_nonzero(&self) -> bool;

    /// Whether the stream depends on an undefined placeholder.
    fn is_uninitialized(&self) -> bool {
        false
    }

    /// Whether the stream is known to differ from `other`.
    ///
    /// Only information that is already computed is consulted, so `false`
    /// means "not known to differ".
    fn known_ne(&self, other: &dyn Stream<R>) -> bool;

    /// Whether `other` is built by the same operator from equal operands.
    fn structural_eq(&self, other: &dyn Stream<R>) -> bool;

    /// Feeds a hash consistent with [`Stream::structural_eq`] into `state`.
    fn structural_hash(&self, state: &mut dyn Hasher);

    /// The coefficient cache, for streams that keep one.
    fn cache(&self) -> Option<&CoefficientCache<R>> {
        None
    }

    /// Upcast for downcasting to a concrete stream type.
    fn as_any(&self) -> &dyn Any;
}

/// A shared handle to a stream.
pub type StreamRef<R> = Arc<dyn Stream<R>>;

/// Whether two streams are the same object or structurally equal.
pub fn same_stream<R: SeriesCoeff>(a: &dyn Stream<R>, b: &dyn Stream<R>) -> bool {
    std::ptr::eq(thin(a), thin(b)) || a.structural_eq(b)
}

/// A 64-bit structural hash of a stream.
#[must_use]
pub fn stream_hash<R: SeriesCoeff>(s: &dyn Stream<R>) -> u64 {
    let mut hasher = FxHasher::default();
    s.structural_hash(&mut hasher);
    hasher.finish()
}

/// The data address of a stream, used for identity comparisons.
pub(crate) fn thin<R: SeriesCoeff>(s: &dyn Stream<R>) -> *const () {
    (s as *const dyn Stream<R>).cast::<()>()
}

/// Hashes `value` into a type-erased hasher.
pub(crate) fn feed<T: Hash + ?Sized>(value: &T, mut state: &mut dyn Hasher) {
    value.hash(&mut state);
}

/// Hashes a tag and the operand hashes of a stream node.
pub(crate) fn feed_node<R: SeriesCoeff>(tag: &str, operands: &[&dyn Stream<R>], state: &mut dyn Hasher) {
    feed(tag, state);
    for s in operands {
        feed(&stream_hash(*s), state);
    }
}

impl<R: SeriesCoeff> PartialEq for dyn Stream<R> {
    fn eq(&self, other: &Self) -> bool {
        same_stream(self, other)
    }
}

impl<R: SeriesCoeff> Eq for dyn Stream<R> {}

impl<R: SeriesCoeff> Hash for dyn Stream<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(stream_hash(self));
    }
}
