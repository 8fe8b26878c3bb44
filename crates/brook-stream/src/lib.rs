//! # brook-stream
//!
//! Lazy coefficient streams: the engine behind formal power series,
//! Laurent series and Dirichlet series.
//!
//! A stream is an integer-indexed sequence of ring elements, zero at all
//! sufficiently negative indices. Coefficients are computed on demand and
//! memoized, so that arbitrarily large truncations can be requested, and
//! streams can be defined recursively through placeholders.
//!
//! This crate provides:
//! - Exact streams (finite support plus a constant tail) and the zero stream
//! - Sources: closures, iterators, and placeholders defined after use
//! - Arithmetic: sums, Cauchy and Dirichlet products, their inverses
//! - Reindexing: shifts and truncations sharing an existing cache
//! - Composition, plethysm, derivatives, coefficient maps
//! - Infinite sums and products
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use brook_rings::{Ring, Q};
//! use brook_stream::{AddStream, CauchyMulStream, ExactStream, Stream, StreamRef, UninitializedStream};
//!
//! // f = 1 + z f
//! let f = Arc::new(UninitializedStream::<Q>::new(0, false));
//! let z: StreamRef<Q> = Arc::new(ExactStream::monomial(Q::one(), 1).unwrap());
//! let one: StreamRef<Q> = Arc::new(ExactStream::monomial(Q::one(), 0).unwrap());
//! let zf = CauchyMulStream::new(z, f.clone(), false).into_ref();
//! f.define(AddStream::new(one, zf, false).into_ref()).unwrap();
//! assert_eq!(f.get(7).unwrap(), Q::one());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod binary;
pub mod cache;
pub mod compose;
pub mod error;
pub mod exact;
pub mod function;
pub mod inexact;
pub mod infinite;
pub mod order;
pub mod plethysm;
pub mod shift;
pub mod stream;
pub mod unary;

#[cfg(test)]
mod proptests;

pub use binary::{AddStream, CauchyMulStream, DirichletConvolveStream, SubStream};
pub use cache::CoefficientCache;
pub use compose::ComposeStream;
pub use error::{Result, StreamError};
pub use exact::{ExactStream, ZeroStream};
pub use function::{CoefficientFn, FunctionStream, IteratorStream, UninitializedStream};
pub use inexact::{CachedStream, Operator};
pub use infinite::{Accumulation, InfiniteProduct, InfiniteSum, Product, Sum};
pub use order::{OrderState, OrderTracker, Valuation};
pub use plethysm::{PlethysmOptions, PlethysmStream, PowerSumBasis, SymmetricBasis};
pub use shift::{ShiftStream, TruncatedStream};
pub use stream::{same_stream, stream_hash, SeriesCoeff, Stream, StreamRef};
pub use unary::{
    CauchyInverseStream, DerivativeStream, DirichletInverseStream, MapCoefficientsStream, MapFn, NegStream,
    ScalarStream, Side,
};
