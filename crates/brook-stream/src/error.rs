//! Errors raised by stream construction and coefficient production.

use thiserror::Error;

use crate::order::Valuation;

/// Errors that can occur while building or reading a stream.
///
/// Errors are `Clone` so that a failed lazy initialization can be
/// remembered and reported again on every later access.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Dirichlet convolution needs both operands to start at index 1 or later.
    #[error(
        "Dirichlet convolution is only defined for coefficient streams with \
         minimal index of non-zero coefficient at least 1"
    )]
    DirichletOrder,

    /// The Dirichlet inverse needs a nonzero coefficient at index 1.
    #[error("the Dirichlet inverse only exists if the coefficient with index 1 is non-zero")]
    DirichletInverseZero,

    /// Composition needs a right operand of positive valuation.
    #[error("can only compose with a series of positive valuation")]
    CompositionValuation,

    /// Plethysm with a valuation-0 operand needs a left operand of finite support.
    #[error(
        "can only compute plethysm with a series of valuation 0 for symmetric \
         functions of finite support"
    )]
    PlethysmValuation,

    /// The operand of a Cauchy inverse has no finite order.
    #[error("inverse does not exist")]
    NoInverse,

    /// The leading coefficient of an inverse is not a unit.
    #[error("the leading coefficient at index {index} is not invertible")]
    NotInvertible {
        /// Index of the offending coefficient.
        index: i64,
    },

    /// Exact streams must be nonzero.
    #[error("exact streams must be non-zero; use the zero stream instead")]
    ZeroExact,

    /// The initial coefficients of an exact stream run past its degree.
    #[error("initial coefficients end at {end}, past the constant degree {degree}")]
    ExactDegree {
        /// Index from which the constant tail starts.
        degree: i64,
        /// One past the index of the last initial coefficient.
        end: i64,
    },

    /// Scalar operators reject the scalar zero.
    #[error("the scalar must not be equal to 0")]
    ScalarIsZero,

    /// Scalar operators reject the scalar one.
    #[error("the scalar must not be equal to 1")]
    ScalarIsOne,

    /// A term of an infinite sum or product has a smaller valuation than
    /// the order already committed.
    #[error("invalid infinite operator term with order {found} < {committed}")]
    InfiniteOrder {
        /// Valuation of the offending term.
        found: i64,
        /// The order committed before the term was read.
        committed: Valuation,
    },

    /// A placeholder stream was read before being defined.
    #[error("undefined stream")]
    Undefined,

    /// A placeholder stream can only be defined once.
    #[error("the stream is already defined")]
    AlreadyDefined,

    /// Computing an approximate order required that same order.
    #[error("the approximate order depends on itself")]
    CyclicOrder,

    /// Producing a coefficient required a coefficient of the same stream
    /// that was not yet produced.
    #[error("coefficient {index} depends on itself")]
    Reentrant {
        /// Index whose production was re-entered.
        index: i64,
    },

    /// The operand does not keep a coefficient cache.
    #[error("the stream does not keep a coefficient cache")]
    NotCached,

    /// Derivatives must be of order at least one.
    #[error("the derivative order must be positive")]
    ZeroShift,
}

/// Result type for stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;
