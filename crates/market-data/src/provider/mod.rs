//! Market data provider abstractions.
//!
//! This module contains:
//! - The `PriceHistoryProvider` and `HoldingsProvider` traits
//! - iShares holdings file parsing and sector normalization
//!
//! Network transport is the embedding application's concern; the traits
//! only describe what the analytics core needs back.

mod traits;

pub mod ishares;

pub use traits::{HoldingsProvider, PriceHistoryProvider};
