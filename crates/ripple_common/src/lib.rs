//! Shared foundational types used across the Ripple simulation kernel.
//!
//! This crate provides the two-state bit-vector [`Value`] carried by every
//! simulated net, together with the [`ValueError`] raised when a model asks for
//! an operand shape the value cannot represent.

#![warn(missing_docs)]

pub mod error;
pub mod value;

pub use error::ValueError;
pub use value::{Value, MAX_WIDTH};
