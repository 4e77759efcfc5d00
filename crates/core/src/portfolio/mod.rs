//! Portfolio module - position history and weights.

pub mod positions;

pub use positions::*;
