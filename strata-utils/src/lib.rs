//! Foundation primitives shared across the strata overlay engine.
//!
//! This crate carries no worldgen logic of its own; it provides the
//! currencies the engine trades in:
//!
//! - [`Identifier`] - namespaced resource names (labels, slice names,
//!   partition ids)
//! - [`random`] - the seeded linear-congruential mixing every
//!   deterministic spatial hash in the engine is built from
//! - [`climate`] - quantized climate parameter types used for
//!   nearest-hypercube label matching

pub mod climate;
mod identifier;
pub mod random;

pub use identifier::{DEFAULT_NAMESPACE, Identifier, IdentifierError};
