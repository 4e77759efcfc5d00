//! Quant Terminal Core - portfolio analytics.
//!
//! Reconstructs daily positions and weights from a transaction ledger,
//! computes time-varying portfolio and benchmark returns, and decomposes
//! excess return with Brinson-Fachler attribution. Market data and the
//! ledger come in through the traits in `quantterm_market_data` and
//! [`transactions::TransactionLedgerTrait`].

pub mod attribution;
pub mod benchmark;
pub mod constants;
pub mod errors;
pub mod frame;
pub mod portfolio;
pub mod pricing;
pub mod returns;
pub mod settings;
pub mod transactions;
pub mod utils;

pub use frame::{DailyFrame, DailySeries, PositionTable, ReturnsTable, WeightTable};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
