//! Provider trait definitions.
//!
//! The analytics core talks to the outside world only through these traits.
//! Implementations must be `Send + Sync` because per-ticker fetches may run
//! in parallel.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::errors::MarketDataError;
use crate::models::{AssetProfile, EtfHolding, Quote};

/// Source of daily price history.
pub trait PriceHistoryProvider: Send + Sync {
    /// Unique identifier for this provider, used in log records.
    fn id(&self) -> &'static str;

    /// Fetch daily bars for `ticker`, oldest first.
    ///
    /// `None` bounds mean "as far as the provider goes". An unknown ticker
    /// should produce `Ok(vec![])` or `Err(SymbolNotFound)`; callers treat both
    /// the same.
    fn fetch_price_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Quote>, MarketDataError>;

    /// Fetch the profile (name, sector, industry) for a ticker.
    ///
    /// Providers without profile data keep the default.
    fn get_profile(&self, _ticker: &str) -> Result<Option<AssetProfile>, MarketDataError> {
        Ok(None)
    }
}

/// Source of ETF constituent holdings.
pub trait HoldingsProvider: Send + Sync {
    /// Unique identifier for this provider, used in log records.
    fn id(&self) -> &'static str;

    /// Current holdings of `etf_symbol`, keyed by constituent ticker.
    fn fetch_holdings(
        &self,
        etf_symbol: &str,
    ) -> Result<HashMap<String, EtfHolding>, MarketDataError>;

    /// Dates for which historical snapshots exist.
    fn available_dates(&self, _etf_symbol: &str) -> Result<Vec<NaiveDate>, MarketDataError> {
        Ok(Vec::new())
    }

    /// Historical snapshot of constituent weights (ticker -> decimal weight).
    fn fetch_holdings_for_date(
        &self,
        etf_symbol: &str,
        _date: NaiveDate,
    ) -> Result<HashMap<String, f64>, MarketDataError> {
        Err(MarketDataError::UnknownEtf(etf_symbol.to_string()))
    }
}
