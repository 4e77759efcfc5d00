//! Error types for the market data crate.
//!
//! Providers surface these errors, but the analytics core treats every one of
//! them the same way: as "no data" for the requested symbol.

use thiserror::Error;

/// Errors that can occur during market data operations.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The ETF is not known to the holdings provider.
    #[error("Unknown ETF: {0}")]
    UnknownEtf(String),

    /// No data available for the requested date range.
    #[error("No data for date range")]
    NoDataForRange,

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider returned data we could not parse.
    #[error("Parse failed: {message}")]
    ParseFailed {
        /// Description of the parse failure
        message: String,
    },

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl MarketDataError {
    /// Returns true when the error means "the provider has nothing for this
    /// request" rather than "the provider failed".
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            MarketDataError::SymbolNotFound(_)
                | MarketDataError::UnknownEtf(_)
                | MarketDataError::NoDataForRange
        )
    }
}
