//! Quant Terminal Market Data Crate
//!
//! This crate defines the boundary between the analytics core and the
//! outside world: daily price bars, ETF holdings, and security profiles.
//!
//! # Core Types
//!
//! - [`Quote`] - Daily OHLCV bar
//! - [`EtfHolding`] - ETF constituent with sector and weight
//! - [`AssetProfile`] - Provider-sourced profile data (sector, industry, etc.)
//! - [`PriceHistoryProvider`] / [`HoldingsProvider`] - Provider traits
//!
//! Providers may fail or return partial data. The analytics core treats every
//! failure as "no data" for the affected symbol.

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::MarketDataError;
pub use models::{AssetProfile, EtfHolding, Quote};
pub use provider::ishares::{normalize_sector, parse_ishares_csv, NOT_CLASSIFIED};
pub use provider::{HoldingsProvider, PriceHistoryProvider};
