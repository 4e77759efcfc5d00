use log::{debug, info};
use quantterm_market_data::EtfHolding;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::constants::MAX_AGGREGATE_DAILY_RETURN;
use crate::frame::{DailySeries, ReturnsTable};
use crate::returns::{clip_series, daily_returns_from_closes};

/// A weighted benchmark built from ETF constituents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReturns {
    /// Aggregate daily return, clipped to +/-50%.
    pub daily_returns: DailySeries<f64>,
    /// Every included constituent, renormalized to sum to 1.
    pub normalized_weights: HashMap<String, f64>,
    /// Per-constituent daily returns, clipped to +/-100%.
    pub constituent_returns: ReturnsTable,
    /// Included holdings with `weight` replaced by the normalized weight.
    pub holdings: HashMap<String, EtfHolding>,
}

impl BenchmarkReturns {
    pub fn is_empty(&self) -> bool {
        self.daily_returns.is_empty()
    }
}

/// `weight / sum(weights)` per holding. Empty when the weights do not sum to
/// a positive number.
pub fn normalize_weights(holdings: &HashMap<String, EtfHolding>) -> HashMap<String, f64> {
    let total: f64 = holdings.values().map(|h| h.weight).sum();
    if total <= 0.0 {
        return HashMap::new();
    }
    holdings
        .iter()
        .map(|(ticker, h)| (ticker.clone(), h.weight / total))
        .collect()
}

/// Holdings whose sector is in `sectors`. `None` or an empty list keeps all.
pub fn filter_by_sectors(
    holdings: &HashMap<String, EtfHolding>,
    sectors: Option<&[String]>,
) -> HashMap<String, EtfHolding> {
    let allowed: HashSet<&str> = match sectors {
        Some(sectors) if !sectors.is_empty() => sectors.iter().map(String::as_str).collect(),
        _ => return holdings.clone(),
    };
    holdings
        .iter()
        .filter(|(_, h)| allowed.contains(h.sector.as_str()))
        .map(|(ticker, h)| (ticker.clone(), h.clone()))
        .collect()
}

/// Build a constituent-weighted benchmark return series.
///
/// Holdings are sector-filtered first, then renormalized. Each constituent's
/// daily returns come from `price_lookup` closes and are clipped to +/-100%.
/// The daily aggregate weights constituents by their weight renormalized over
/// the constituents that have return data; a constituent without a return on
/// a day contributes zero. The aggregate is clipped to +/-50%.
pub fn build_benchmark_returns<F>(
    holdings: &HashMap<String, EtfHolding>,
    sector_filter: Option<&[String]>,
    price_lookup: F,
) -> BenchmarkReturns
where
    F: Fn(&str) -> DailySeries<f64>,
{
    let filtered = filter_by_sectors(holdings, sector_filter);
    if filtered.is_empty() {
        debug!("No benchmark holdings left after sector filter");
        return BenchmarkReturns::default();
    }

    let normalized_weights = normalize_weights(&filtered);
    let normalized_holdings: HashMap<String, EtfHolding> = filtered
        .iter()
        .map(|(ticker, h)| {
            let mut holding = h.clone();
            holding.weight = normalized_weights.get(ticker).copied().unwrap_or(0.0);
            (ticker.clone(), holding)
        })
        .collect();

    let constituent_returns = ReturnsTable::from_series(filtered.keys().filter_map(|ticker| {
        let returns = daily_returns_from_closes(&price_lookup(ticker));
        (!returns.is_empty()).then(|| (ticker.clone(), returns))
    }));
    if constituent_returns.is_empty() {
        info!("No constituent returns for {} benchmark holdings", filtered.len());
        return BenchmarkReturns {
            normalized_weights,
            holdings: normalized_holdings,
            ..BenchmarkReturns::default()
        };
    }

    let available_total: f64 = constituent_returns
        .columns()
        .filter_map(|t| filtered.get(t).map(|h| h.weight))
        .sum();
    let weights: Vec<(&str, f64)> = constituent_returns
        .columns()
        .filter_map(|t| {
            let w = filtered.get(t)?.weight;
            (available_total > 0.0).then_some((t, w / available_total))
        })
        .collect();

    let aggregate: DailySeries<f64> = constituent_returns
        .dates()
        .map(|date| {
            let daily: f64 = weights
                .iter()
                .map(|(t, w)| constituent_returns.value_or_zero(date, t) * w)
                .sum();
            (date, daily)
        })
        .collect();
    let daily_returns = clip_series(&aggregate, MAX_AGGREGATE_DAILY_RETURN);

    debug!(
        "Built benchmark from {}/{} constituents over {} days",
        constituent_returns.column_count(),
        filtered.len(),
        daily_returns.len()
    );

    BenchmarkReturns {
        daily_returns,
        normalized_weights,
        constituent_returns,
        holdings: normalized_holdings,
    }
}
