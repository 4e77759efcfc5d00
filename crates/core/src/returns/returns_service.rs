use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use quantterm_market_data::PriceHistoryProvider;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::returns_calculator::{
    compound_series, correlation_matrix, cumulative_returns, daily_returns_from_closes,
    resample_returns, rolling_volatility, time_varying_daily_returns,
};
use super::{CashDrag, CorrelationMatrix, ReturnInterval, ReturnsCache};
use crate::frame::{DailySeries, ReturnsTable};
use crate::portfolio::PositionHistoryService;
use crate::pricing::fetch_close_series_batch;
use crate::transactions::{is_cash_ticker, TransactionLedgerTrait};

/// Daily returns for portfolio tickers, cached per portfolio, and the
/// portfolio-level series derived from them.
pub struct ReturnsDataService {
    ledger: Arc<dyn TransactionLedgerTrait>,
    price_provider: Arc<dyn PriceHistoryProvider>,
    positions: PositionHistoryService,
    cache: Arc<ReturnsCache>,
}

impl ReturnsDataService {
    pub fn new(
        ledger: Arc<dyn TransactionLedgerTrait>,
        price_provider: Arc<dyn PriceHistoryProvider>,
        cache: Arc<ReturnsCache>,
    ) -> Self {
        let positions = PositionHistoryService::new(ledger.clone(), price_provider.clone());
        Self {
            ledger,
            price_provider,
            positions,
            cache,
        }
    }

    fn ledger_modified_time(&self, portfolio_name: &str) -> Option<DateTime<Utc>> {
        match self.ledger.get_portfolio_modified_time(portfolio_name) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(
                    "Could not read modification time for portfolio '{}': {}",
                    portfolio_name, e
                );
                None
            }
        }
    }

    /// Daily returns for every non-cash ticker the portfolio ever traded.
    pub fn get_daily_returns(
        &self,
        portfolio_name: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> ReturnsTable {
        let modified = self.ledger_modified_time(portfolio_name);
        let table = self
            .cache
            .get_or_compute(portfolio_name, modified, || self.compute_returns(portfolio_name));
        table.slice(start_date, end_date)
    }

    fn compute_returns(&self, portfolio_name: &str) -> ReturnsTable {
        let tickers = match self.ledger.get_tickers(portfolio_name) {
            Ok(tickers) => tickers,
            Err(e) => {
                warn!(
                    "Could not load tickers for portfolio '{}': {}",
                    portfolio_name, e
                );
                return ReturnsTable::new();
            }
        };
        let tickers: Vec<String> = tickers
            .iter()
            .filter(|t| !is_cash_ticker(t))
            .map(|t| t.trim().to_uppercase())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if tickers.is_empty() {
            return ReturnsTable::new();
        }

        let table = self.get_ticker_returns(&tickers, None, None);
        debug!(
            "Computed returns for '{}': {} tickers, {} days",
            portfolio_name,
            table.column_count(),
            table.len()
        );
        table
    }

    /// Daily returns for arbitrary tickers, bypassing the cache. Tickers with
    /// no price data are absent.
    pub fn get_ticker_returns(
        &self,
        tickers: &[String],
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> ReturnsTable {
        let closes = fetch_close_series_batch(self.price_provider.as_ref(), tickers, None, end_date);
        let series = closes
            .iter()
            .map(|(ticker, closes)| (ticker.clone(), daily_returns_from_closes(closes)))
            .filter(|(_, returns)| !returns.is_empty());
        ReturnsTable::from_series(series).slice(start_date, end_date)
    }

    /// Static-weight portfolio returns. Without `weights` every ticker gets an
    /// equal share; given weights are renormalized over the tickers that have
    /// returns. Missing cells count as zero.
    pub fn get_portfolio_returns(
        &self,
        portfolio_name: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        weights: Option<&HashMap<String, f64>>,
    ) -> DailySeries<f64> {
        let returns = self.get_daily_returns(portfolio_name, start_date, end_date);
        if returns.is_empty() {
            return DailySeries::new();
        }

        let tickers: Vec<&str> = returns.columns().collect();
        let normalized: HashMap<&str, f64> = match weights {
            None => {
                let equal = 1.0 / tickers.len() as f64;
                tickers.iter().map(|t| (*t, equal)).collect()
            }
            Some(weights) => {
                let total: f64 = tickers
                    .iter()
                    .map(|t| weights.get(*t).copied().unwrap_or(0.0))
                    .sum();
                if total == 0.0 {
                    return DailySeries::new();
                }
                tickers
                    .iter()
                    .map(|t| (*t, weights.get(*t).copied().unwrap_or(0.0) / total))
                    .collect()
            }
        };

        returns
            .dates()
            .map(|date| {
                let daily: f64 = normalized
                    .iter()
                    .filter(|(_, w)| **w > 0.0)
                    .map(|(t, w)| returns.value_or_zero(date, t) * w)
                    .sum();
                (date, daily)
            })
            .collect()
    }

    /// Running compounded return per ticker.
    pub fn get_cumulative_returns(
        &self,
        portfolio_name: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> ReturnsTable {
        cumulative_returns(&self.get_daily_returns(portfolio_name, start_date, end_date))
    }

    /// Portfolio returns weighted by the market-value weights held each day,
    /// resampled to `interval`.
    pub fn get_time_varying_portfolio_returns(
        &self,
        portfolio_name: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        include_cash: bool,
        interval: ReturnInterval,
    ) -> DailySeries<f64> {
        let weights = self
            .positions
            .get_daily_weights(portfolio_name, None, end_date, include_cash);
        if weights.is_empty() {
            return DailySeries::new();
        }
        let returns = self.get_daily_returns(portfolio_name, None, end_date);
        let daily = time_varying_daily_returns(&weights, &returns, start_date, end_date);
        resample_returns(&daily, interval)
    }

    /// Compounded return with the cash position weighted in, minus the same
    /// without it.
    pub fn calculate_cash_drag(
        &self,
        portfolio_name: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> CashDrag {
        let with_cash = self.get_time_varying_portfolio_returns(
            portfolio_name,
            start_date,
            end_date,
            true,
            ReturnInterval::Daily,
        );
        let without_cash = self.get_time_varying_portfolio_returns(
            portfolio_name,
            start_date,
            end_date,
            false,
            ReturnInterval::Daily,
        );

        let return_with_cash = compound_series(&with_cash);
        let return_without_cash = compound_series(&without_cash);
        CashDrag {
            return_with_cash,
            return_without_cash,
            drag: return_with_cash - return_without_cash,
        }
    }

    pub fn get_correlation_matrix(
        &self,
        portfolio_name: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> CorrelationMatrix {
        let returns = self.get_daily_returns(portfolio_name, start_date, end_date);
        if returns.is_empty() {
            return CorrelationMatrix::default();
        }
        correlation_matrix(&returns)
    }

    /// Annualized rolling volatility per ticker over `window` trading days.
    pub fn get_volatility(
        &self,
        portfolio_name: &str,
        window: usize,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> ReturnsTable {
        let returns = self.get_daily_returns(portfolio_name, start_date, end_date);
        if returns.is_empty() {
            return ReturnsTable::new();
        }
        rolling_volatility(&returns, window)
    }

    /// Forget cached returns for one portfolio, e.g. after its ledger changed.
    pub fn invalidate_cache(&self, portfolio_name: &str) {
        self.cache.invalidate(portfolio_name);
    }

    pub fn invalidate_all_caches(&self) {
        self.cache.invalidate_all();
    }
}
