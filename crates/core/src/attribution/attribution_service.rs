use chrono::NaiveDate;
use log::{debug, info, warn};
use quantterm_market_data::{AssetProfile, EtfHolding, HoldingsProvider, PriceHistoryProvider};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{calculate_attribution, AttributionInput, BrinsonAnalysis};
use crate::benchmark::{build_benchmark_returns, HistoricalWeightsService};
use crate::constants::{MAX_AGGREGATE_DAILY_RETURN, NOT_CLASSIFIED_SECTOR};
use crate::errors::Result;
use crate::frame::{slice_series, DailySeries, ReturnsTable, WeightTable};
use crate::portfolio::{compute_daily_weights, reconstruct_positions, PositionHistoryService};
use crate::pricing::fetch_close_series_batch;
use crate::returns::{
    clip_series, compound_series, daily_returns_from_closes, time_varying_daily_returns,
};
use crate::settings::AnalysisSettings;
use crate::transactions::{is_cash_ticker, TransactionLedgerTrait};

/// Result of one analysis run. Every variant except `Complete` names the
/// first input that was missing.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    NoPortfolioSelected,
    NoBenchmarkSelected,
    /// The ledger produced no positions.
    NoHoldings,
    /// The portfolio sector filter removed every position.
    NoHoldingsInUniverse,
    NoReturnsData,
    NoBenchmarkData,
    Complete(Box<AnalysisReport>),
}

impl AnalysisOutcome {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            AnalysisOutcome::Complete(report) => Some(report),
            _ => None,
        }
    }

    pub fn analysis(&self) -> Option<&BrinsonAnalysis> {
        self.report().map(|report| &report.analysis)
    }
}

/// A completed run: the attribution plus the aggregate daily series it
/// covers, both clipped to +/-50% per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analysis: BrinsonAnalysis,
    /// Time-varying portfolio return per trading day of the period.
    pub portfolio_returns: DailySeries<f64>,
    /// Constituent-weighted benchmark return per trading day of the period.
    pub benchmark_returns: DailySeries<f64>,
}

/// Runs attribution of a ledger portfolio against an ETF benchmark.
pub struct AttributionService {
    positions: PositionHistoryService,
    price_provider: Arc<dyn PriceHistoryProvider>,
    holdings_provider: Arc<dyn HoldingsProvider>,
    historical_weights: HistoricalWeightsService,
}

impl AttributionService {
    pub fn new(
        ledger: Arc<dyn TransactionLedgerTrait>,
        price_provider: Arc<dyn PriceHistoryProvider>,
        holdings_provider: Arc<dyn HoldingsProvider>,
    ) -> Self {
        Self {
            positions: PositionHistoryService::new(ledger, price_provider.clone()),
            price_provider,
            historical_weights: HistoricalWeightsService::new(holdings_provider.clone()),
            holdings_provider,
        }
    }

    /// Full pipeline from the ledger to a [`BrinsonAnalysis`].
    ///
    /// Only invalid settings are an error. Missing data of any kind ends the
    /// run with the matching [`AnalysisOutcome`].
    pub fn run_analysis(
        &self,
        portfolio_name: &str,
        benchmark_etf: &str,
        settings: &AnalysisSettings,
    ) -> Result<AnalysisOutcome> {
        settings.validate()?;

        let portfolio_name = portfolio_name.trim();
        if portfolio_name.is_empty() {
            return Ok(AnalysisOutcome::NoPortfolioSelected);
        }
        let benchmark_etf = benchmark_etf.trim().to_uppercase();
        if benchmark_etf.is_empty() {
            return Ok(AnalysisOutcome::NoBenchmarkSelected);
        }

        let custom_range = settings.custom_range();
        let end_date = custom_range.map(|(_, end)| end);

        let transactions = self.positions.load_transactions(portfolio_name);
        let positions = reconstruct_positions(&transactions, settings.include_cash, None, end_date);
        if positions.is_empty() {
            info!("Portfolio '{}' has no positions", portfolio_name);
            return Ok(AnalysisOutcome::NoHoldings);
        }

        let portfolio_tickers: Vec<String> = positions
            .columns()
            .filter(|t| !is_cash_ticker(t))
            .map(str::to_string)
            .collect();
        let mut closes = fetch_close_series_batch(
            self.price_provider.as_ref(),
            &portfolio_tickers,
            None,
            end_date,
        );
        let mut daily_weights = compute_daily_weights(&positions, |ticker| {
            closes.get(ticker).cloned().unwrap_or_default()
        });

        let holdings = self.fetch_holdings(&benchmark_etf);
        let profiles = self.fetch_profiles(
            portfolio_tickers
                .iter()
                .filter(|t| !holdings.contains_key(t.as_str())),
        );

        if let Some(sectors) = settings.portfolio_sector_filter() {
            let allowed: HashSet<&str> = sectors.iter().map(String::as_str).collect();
            daily_weights.retain_columns(|ticker| {
                let sector = universe_sector(ticker, settings, &profiles, &holdings);
                allowed.contains(sector.as_str())
            });
            daily_weights = renormalize_rows(&daily_weights);
            if daily_weights.column_count() == 0 {
                info!(
                    "No holdings of '{}' in sectors {:?}",
                    portfolio_name, sectors
                );
                return Ok(AnalysisOutcome::NoHoldingsInUniverse);
            }
        }

        let portfolio_returns = ReturnsTable::from_series(
            daily_weights
                .columns()
                .filter_map(|ticker| {
                    let returns = daily_returns_from_closes(closes.get(ticker)?);
                    (!returns.is_empty()).then(|| (ticker.to_string(), returns))
                })
                .collect::<Vec<_>>(),
        );
        let portfolio_daily =
            time_varying_daily_returns(&daily_weights, &portfolio_returns, None, end_date);
        let period_daily = select_period(&portfolio_daily, settings);
        let (Some(period_start), Some(period_end)) = (
            period_daily.keys().next().copied(),
            period_daily.keys().next_back().copied(),
        ) else {
            info!("No portfolio returns for '{}'", portfolio_name);
            return Ok(AnalysisOutcome::NoReturnsData);
        };
        let portfolio_period_returns = clip_series(&period_daily, MAX_AGGREGATE_DAILY_RETURN);
        info!(
            "Analysis period {} to {} ({} days), portfolio return {:.4}%",
            period_start,
            period_end,
            portfolio_period_returns.len(),
            compound_series(&portfolio_period_returns) * 100.0
        );

        let missing: Vec<String> = holdings
            .keys()
            .filter(|t| !closes.contains_key(t.as_str()))
            .cloned()
            .collect();
        closes.extend(fetch_close_series_batch(
            self.price_provider.as_ref(),
            &missing,
            None,
            Some(period_end),
        ));
        let benchmark = build_benchmark_returns(
            &holdings,
            settings.benchmark_sector_filter(),
            |ticker| closes.get(ticker).cloned().unwrap_or_default(),
        );
        let benchmark_returns = benchmark
            .constituent_returns
            .slice(Some(period_start), Some(period_end));
        if benchmark.is_empty() || benchmark_returns.is_empty() {
            info!("No benchmark data for {}", benchmark_etf);
            return Ok(AnalysisOutcome::NoBenchmarkData);
        }

        let daily_benchmark_weights = if settings.use_historical_benchmark_weights {
            self.historical_benchmark_weights(
                &benchmark_etf,
                &benchmark.holdings,
                period_start,
                period_end,
            )
        } else {
            None
        };

        let portfolio_weights = static_weights(&daily_weights, period_end);
        debug!(
            "{} portfolio holdings on {}, {} benchmark holdings",
            portfolio_weights.len(),
            period_end,
            benchmark.holdings.len()
        );

        let input = AttributionInput {
            portfolio_weights: &portfolio_weights,
            benchmark_holdings: &benchmark.holdings,
            portfolio_returns: &portfolio_returns,
            benchmark_returns: &benchmark_returns,
            period_start,
            period_end,
            daily_weights: Some(&daily_weights),
            daily_benchmark_weights: daily_benchmark_weights.as_ref(),
            security_profiles: &profiles,
            sector_overrides: &settings.sector_overrides,
        };
        Ok(AnalysisOutcome::Complete(Box::new(AnalysisReport {
            analysis: calculate_attribution(&input),
            portfolio_returns: portfolio_period_returns,
            benchmark_returns: slice_series(
                &benchmark.daily_returns,
                Some(period_start),
                Some(period_end),
            ),
        })))
    }

    fn fetch_holdings(&self, etf_symbol: &str) -> HashMap<String, EtfHolding> {
        match self.holdings_provider.fetch_holdings(etf_symbol) {
            Ok(holdings) => holdings
                .into_iter()
                .map(|(ticker, holding)| (ticker.trim().to_uppercase(), holding))
                .collect(),
            Err(e) => {
                warn!(
                    "{}: could not fetch holdings for {}: {}",
                    self.holdings_provider.id(),
                    etf_symbol,
                    e
                );
                HashMap::new()
            }
        }
    }

    fn fetch_profiles<'a, I>(&self, tickers: I) -> HashMap<String, AssetProfile>
    where
        I: Iterator<Item = &'a String>,
    {
        let tickers: Vec<&String> = tickers.collect();
        tickers
            .par_iter()
            .filter_map(|ticker| match self.price_provider.get_profile(ticker) {
                Ok(profile) => profile.map(|p| ((*ticker).clone(), p)),
                Err(e) => {
                    warn!(
                        "{}: could not fetch profile for {}: {}",
                        self.price_provider.id(),
                        ticker,
                        e
                    );
                    None
                }
            })
            .collect()
    }

    /// Interpolated benchmark weights restricted to the constituents in use.
    /// `None` when no snapshot covers the period.
    fn historical_benchmark_weights(
        &self,
        etf_symbol: &str,
        holdings: &HashMap<String, EtfHolding>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Option<WeightTable> {
        let mut weights = self
            .historical_weights
            .get_daily_benchmark_weights(etf_symbol, start, end);
        weights.retain_columns(|ticker| holdings.contains_key(ticker));
        let weights = renormalize_rows(&weights);
        if weights.is_empty() || weights.column_count() == 0 {
            info!(
                "Falling back to static benchmark weights for {}",
                etf_symbol
            );
            return None;
        }
        Some(weights)
    }
}

/// Sector used by the portfolio universe filter.
fn universe_sector(
    ticker: &str,
    settings: &AnalysisSettings,
    profiles: &HashMap<String, AssetProfile>,
    holdings: &HashMap<String, EtfHolding>,
) -> String {
    settings
        .sector_overrides
        .get(ticker)
        .cloned()
        .or_else(|| profiles.get(ticker).and_then(|p| p.sector.clone()))
        .or_else(|| holdings.get(ticker).map(|h| h.sector.clone()))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NOT_CLASSIFIED_SECTOR.to_string())
}

/// Scale each row to sum to one. Rows with no positive total become zeros.
fn renormalize_rows(weights: &WeightTable) -> WeightTable {
    let mut out = WeightTable::with_columns(weights.columns());
    for (date, row) in weights.rows() {
        out.ensure_row(date);
        let total = weights.row_sum(date);
        for (ticker, weight) in row {
            let value = if total > 0.0 && weight.is_finite() {
                weight / total
            } else {
                0.0
            };
            out.insert(date, ticker, value);
        }
    }
    out
}

/// Custom range when configured, else the last `lookback_days` observations.
fn select_period(daily: &DailySeries<f64>, settings: &AnalysisSettings) -> DailySeries<f64> {
    if let Some((start, end)) = settings.custom_range() {
        return slice_series(daily, Some(start), Some(end));
    }
    match settings.lookback_days {
        Some(n) if n < daily.len() => daily
            .iter()
            .skip(daily.len() - n)
            .map(|(d, r)| (*d, *r))
            .collect(),
        _ => daily.clone(),
    }
}

/// Positive weights from the last row on or before `date`.
fn static_weights(daily_weights: &WeightTable, date: NaiveDate) -> HashMap<String, f64> {
    daily_weights
        .slice(None, Some(date))
        .rows()
        .last()
        .map(|(_, row)| {
            row.iter()
                .filter(|(_, w)| w.is_finite() && **w > 0.0)
                .map(|(t, w)| (t.clone(), *w))
                .collect()
        })
        .unwrap_or_default()
}
