use chrono::NaiveDate;
use log::{debug, info, warn};
use quantterm_market_data::HoldingsProvider;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::constants::MIN_SNAPSHOT_SPACING_DAYS;
use crate::frame::{in_range, WeightTable};
use crate::utils::time_utils::{get_days_between, is_weekday};

/// Thin `available` down to roughly weekly snapshots within `[start, end]`:
/// the first date, then each date at least five days after the last pick.
pub fn select_weekly_dates(
    available: &[NaiveDate],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NaiveDate> {
    let candidates: BTreeSet<NaiveDate> = available
        .iter()
        .copied()
        .filter(|d| in_range(*d, Some(start), Some(end)))
        .collect();

    let mut selected: Vec<NaiveDate> = Vec::new();
    for date in candidates {
        match selected.last() {
            Some(last) if (date - *last).num_days() < MIN_SNAPSHOT_SPACING_DAYS => {}
            _ => selected.push(date),
        }
    }
    selected
}

/// Daily weekday benchmark weights from sparse snapshots.
///
/// Each weekday takes the latest snapshot on or before it; a ticker missing
/// from that snapshot gets zero. Weekdays before the first snapshot are all
/// zero.
pub fn interpolate_daily_weights(
    snapshots: &BTreeMap<NaiveDate, HashMap<String, f64>>,
    start: NaiveDate,
    end: NaiveDate,
) -> WeightTable {
    if snapshots.is_empty() || start > end {
        return WeightTable::new();
    }

    let tickers: BTreeSet<&str> = snapshots
        .values()
        .flat_map(|s| s.keys().map(String::as_str))
        .collect();
    let mut weights = WeightTable::with_columns(tickers.iter().copied());

    for date in get_days_between(start, end).into_iter().filter(|d| is_weekday(*d)) {
        let snapshot = snapshots.range(..=date).next_back().map(|(_, s)| s);
        for ticker in &tickers {
            let weight = snapshot
                .and_then(|s| s.get(*ticker))
                .copied()
                .unwrap_or(0.0);
            weights.insert(date, ticker, weight);
        }
    }
    weights
}

fn renormalize(snapshot: HashMap<String, f64>) -> HashMap<String, f64> {
    let total: f64 = snapshot.values().filter(|w| w.is_finite()).sum();
    if total <= 0.0 {
        return HashMap::new();
    }
    snapshot
        .into_iter()
        .filter(|(_, w)| w.is_finite())
        .map(|(ticker, w)| (ticker.to_uppercase(), w / total))
        .collect()
}

/// Time-varying benchmark weights from historical holdings snapshots.
pub struct HistoricalWeightsService {
    holdings_provider: Arc<dyn HoldingsProvider>,
}

impl HistoricalWeightsService {
    pub fn new(holdings_provider: Arc<dyn HoldingsProvider>) -> Self {
        Self { holdings_provider }
    }

    /// Snapshot dates the provider knows for `etf_symbol`; empty on failure.
    pub fn available_dates(&self, etf_symbol: &str) -> Vec<NaiveDate> {
        match self.holdings_provider.available_dates(etf_symbol) {
            Ok(dates) => dates,
            Err(e) => {
                warn!(
                    "{}: could not list snapshot dates for {}: {}",
                    self.holdings_provider.id(),
                    etf_symbol,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Renormalized snapshots at roughly weekly spacing within `[start, end]`.
    pub fn fetch_snapshots(
        &self,
        etf_symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BTreeMap<NaiveDate, HashMap<String, f64>> {
        let available = self.available_dates(etf_symbol);
        let selected = select_weekly_dates(&available, start, end);
        debug!(
            "Selected {}/{} snapshot dates for {}",
            selected.len(),
            available.len(),
            etf_symbol
        );

        let mut snapshots = BTreeMap::new();
        for date in selected {
            match self.holdings_provider.fetch_holdings_for_date(etf_symbol, date) {
                Ok(snapshot) => {
                    let snapshot = renormalize(snapshot);
                    if !snapshot.is_empty() {
                        snapshots.insert(date, snapshot);
                    }
                }
                Err(e) => warn!(
                    "{}: could not fetch {} holdings for {}: {}",
                    self.holdings_provider.id(),
                    etf_symbol,
                    date,
                    e
                ),
            }
        }
        snapshots
    }

    /// Daily weekday weights for `etf_symbol`, or an empty table when no
    /// snapshot is available in the range.
    pub fn get_daily_benchmark_weights(
        &self,
        etf_symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> WeightTable {
        let snapshots = self.fetch_snapshots(etf_symbol, start, end);
        if snapshots.is_empty() {
            info!(
                "No historical holdings for {} between {} and {}",
                etf_symbol, start, end
            );
            return WeightTable::new();
        }
        interpolate_daily_weights(&snapshots, start, end)
    }
}
