//! # brook-rings
//!
//! Coefficient rings for the Brook lazy series engine.
//!
//! This crate provides:
//! - Abstract traits: `Ring`, `CommutativeRing`, `Field`, `VariableRaising`
//! - Concrete implementations: Z, Q, Z/NZ
//! - Polynomial rings R[x]
//! - Symmetric functions in the power-sum basis, indexed by partitions
//!
//! ## Trait Hierarchy
//!
//! ```text
//! Ring
//!  ├── CommutativeRing
//!  │    └── Field
//!  └── VariableRaising
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod integers;
pub mod modular;
pub mod partition;
pub mod poly_ring;
pub mod power_sum;
pub mod rationals;
pub mod traits;

#[cfg(test)]
mod proptests;

pub use integers::Z;
pub use modular::ModRing;
pub use partition::Partition;
pub use poly_ring::Polynomial;
pub use power_sum::PowerSum;
pub use rationals::Q;
pub use traits::{CommutativeRing, Field, Ring, VariableRaising};
