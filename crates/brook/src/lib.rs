//! # Brook
//!
//! Lazy formal series arithmetic in Rust.
//!
//! Brook evaluates power series, Laurent series and Dirichlet series one
//! coefficient at a time. Expressions build a graph of stream operators;
//! coefficients are computed when first requested and then memoized.
//!
//! ## Features
//!
//! - **Coefficient Rings**: integers, rationals, Z/NZ, polynomials and
//!   symmetric functions in the power-sum basis
//! - **Lazy Streams**: sparse or dense caches with monotone order tracking
//! - **Recursive Definitions**: placeholders bound after use
//! - **Series Operations**: Cauchy and Dirichlet products and inverses,
//!   composition, plethysm, derivatives, infinite sums and products
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use brook::prelude::*;
//!
//! // 1 / (1 - z - z^2)
//! let denominator: StreamRef<Q> =
//!     Arc::new(ExactStream::polynomial(vec![Q::one(), -Q::one(), -Q::one()], 0).unwrap());
//! let fibonacci = CauchyInverseStream::new(denominator);
//! assert_eq!(fibonacci.get(10).unwrap(), Q::from_integer(89));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use brook_rings as rings;
pub use brook_stream as stream;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use brook_rings::{CommutativeRing, Field, ModRing, Partition, Polynomial, PowerSum, Ring, Q, Z};
    pub use brook_stream::{
        same_stream, AddStream, CauchyInverseStream, CauchyMulStream, ComposeStream, DerivativeStream,
        DirichletConvolveStream, DirichletInverseStream, ExactStream, FunctionStream, InfiniteProduct, InfiniteSum,
        IteratorStream, NegStream, PlethysmOptions, PlethysmStream, PowerSumBasis, ScalarStream, ShiftStream,
        Stream, StreamError, StreamRef, SubStream, UninitializedStream, Valuation, ZeroStream,
    };
}
