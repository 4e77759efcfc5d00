use chrono::NaiveDate;
use log::{debug, warn};
use quantterm_market_data::PriceHistoryProvider;
use std::sync::Arc;

use super::{compute_daily_weights, reconstruct_positions};
use crate::frame::{DailySeries, PositionTable, WeightTable};
use crate::pricing::fetch_close_series_batch;
use crate::transactions::{is_cash_ticker, Transaction, TransactionLedgerTrait};

/// Reconstructs position quantities and market-value weights for a named
/// portfolio from its transaction ledger.
#[derive(Clone)]
pub struct PositionHistoryService {
    ledger: Arc<dyn TransactionLedgerTrait>,
    price_provider: Arc<dyn PriceHistoryProvider>,
}

impl PositionHistoryService {
    pub fn new(
        ledger: Arc<dyn TransactionLedgerTrait>,
        price_provider: Arc<dyn PriceHistoryProvider>,
    ) -> Self {
        Self {
            ledger,
            price_provider,
        }
    }

    /// Ledger for `portfolio_name`, empty when the ledger cannot be read.
    pub fn load_transactions(&self, portfolio_name: &str) -> Vec<Transaction> {
        match self.ledger.get_transactions(portfolio_name) {
            Ok(transactions) => transactions,
            Err(e) => {
                warn!(
                    "Could not load transactions for portfolio '{}': {}",
                    portfolio_name, e
                );
                Vec::new()
            }
        }
    }

    /// Daily held quantity per ticker.
    pub fn get_position_history(
        &self,
        portfolio_name: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        include_cash: bool,
    ) -> PositionTable {
        let transactions = self.load_transactions(portfolio_name);
        reconstruct_positions(&transactions, include_cash, start_date, end_date)
    }

    /// Daily market-value weight per ticker.
    pub fn get_daily_weights(
        &self,
        portfolio_name: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        include_cash: bool,
    ) -> WeightTable {
        let positions =
            self.get_position_history(portfolio_name, start_date, end_date, include_cash);
        self.weights_for_positions(&positions, end_date)
    }

    /// Market-value weights for an already reconstructed position table.
    pub fn weights_for_positions(
        &self,
        positions: &PositionTable,
        end_date: Option<NaiveDate>,
    ) -> WeightTable {
        if positions.is_empty() {
            return WeightTable::new();
        }

        let tickers: Vec<String> = positions
            .columns()
            .filter(|t| !is_cash_ticker(t))
            .map(str::to_string)
            .collect();
        let closes = fetch_close_series_batch(self.price_provider.as_ref(), &tickers, None, end_date);
        debug!(
            "Loaded closes for {}/{} tickers for weight calculation",
            closes.len(),
            tickers.len()
        );

        compute_daily_weights(positions, |ticker| {
            closes.get(ticker).cloned().unwrap_or_else(DailySeries::new)
        })
    }
}
