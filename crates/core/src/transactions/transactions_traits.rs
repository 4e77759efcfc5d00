use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use super::Transaction;
use crate::errors::Result;

/// Read-only access to portfolio transaction ledgers.
///
/// The core never writes to the ledger. Implementations may fail; callers
/// treat a failure the same as an empty ledger.
pub trait TransactionLedgerTrait: Send + Sync {
    /// All transactions recorded for `portfolio_name`, in any order.
    fn get_transactions(&self, portfolio_name: &str) -> Result<Vec<Transaction>>;

    /// When the portfolio's ledger was last modified. `None` if unknown.
    fn get_portfolio_modified_time(&self, portfolio_name: &str) -> Result<Option<DateTime<Utc>>>;

    /// Distinct tickers ever traded in the portfolio, sorted.
    fn get_tickers(&self, portfolio_name: &str) -> Result<Vec<String>> {
        let tickers: BTreeSet<String> = self
            .get_transactions(portfolio_name)?
            .into_iter()
            .map(|t| t.ticker)
            .collect();
        Ok(tickers.into_iter().collect())
    }
}
