//! Brinson-Fachler (1985) performance attribution.
//!
//! Excess return is decomposed per security into allocation, selection and
//! interaction effects, then aggregated by sector. When daily portfolio
//! weights are available the period totals come from summing per-day effects
//! computed with that day's weights; effects add up over time while returns
//! compound.

use chrono::NaiveDate;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{
    AttributionInput, AttributionResult, BrinsonAnalysis, BrinsonEffects, Classification,
    DailyAttributionEffect, Exposure,
};
use crate::constants::NOT_CLASSIFIED_SECTOR;
use crate::frame::{ReturnsTable, WeightTable};
use crate::returns::{compound, compound_series, time_varying_daily_returns};

/// Run one attribution over `[period_start, period_end]`.
///
/// Missing weights or returns for any ticker and date contribute zero; the
/// function never fails.
pub fn calculate_attribution(input: &AttributionInput<'_>) -> BrinsonAnalysis {
    let start = input.period_start;
    let end = input.period_end;

    let daily_weights = input.daily_weights.filter(|w| !w.is_empty());
    let daily_benchmark_weights = input.daily_benchmark_weights.filter(|w| !w.is_empty());

    let portfolio_period_returns =
        period_returns(input.portfolio_returns, start, end, daily_weights);
    let benchmark_period_returns = period_returns(input.benchmark_returns, start, end, None);

    let benchmark_weights: BTreeMap<&str, f64> = input
        .benchmark_holdings
        .iter()
        .map(|(ticker, h)| (ticker.as_str(), h.weight))
        .collect();

    let total_benchmark_return = match daily_benchmark_weights {
        Some(weights) => {
            let r = compound_series(&time_varying_daily_returns(
                weights,
                input.benchmark_returns,
                Some(start),
                Some(end),
            ));
            info!("Using time-varying benchmark weights, return {:.4}%", r * 100.0);
            r
        }
        None => {
            let r: f64 = benchmark_weights
                .iter()
                .map(|(t, w)| w * benchmark_period_returns.get(*t).copied().unwrap_or(0.0))
                .sum();
            info!("Using static benchmark weights, return {:.4}%", r * 100.0);
            r
        }
    };

    let sector_benchmark_returns =
        sector_benchmark_returns(input, &benchmark_period_returns);

    let all_tickers: BTreeSet<&str> = input
        .portfolio_weights
        .keys()
        .map(String::as_str)
        .chain(benchmark_weights.keys().copied())
        .collect();

    let mut by_security: BTreeMap<String, AttributionResult> = BTreeMap::new();
    for ticker in all_tickers {
        let portfolio_weight = input.portfolio_weights.get(ticker).copied().unwrap_or(0.0);
        let benchmark_weight = benchmark_weights.get(ticker).copied().unwrap_or(0.0);
        if portfolio_weight == 0.0 && benchmark_weight == 0.0 {
            continue;
        }

        let exposure = Exposure {
            portfolio_weight,
            benchmark_weight,
            portfolio_return: if portfolio_weight > 0.0 {
                portfolio_period_returns.get(ticker).copied().unwrap_or(0.0)
            } else {
                0.0
            },
            // Only the benchmark's own return series, never the portfolio's.
            benchmark_return: if benchmark_weight > 0.0 {
                benchmark_period_returns.get(ticker).copied().unwrap_or(0.0)
            } else {
                0.0
            },
        };
        let classification = classify(ticker, input);
        let sector_return = sector_benchmark_returns
            .get(classification.sector.as_str())
            .copied()
            .unwrap_or(total_benchmark_return);
        let effects = BrinsonEffects::compute(&exposure, sector_return, total_benchmark_return);

        by_security.insert(
            ticker.to_string(),
            AttributionResult::new(ticker, classification, exposure, effects),
        );
    }

    let by_sector = aggregate_by_sector(&by_security);

    let (total_portfolio_return, totals, daily_effects) = match daily_weights {
        Some(weights) => {
            let total_portfolio_return = compound_series(&time_varying_daily_returns(
                weights,
                input.portfolio_returns,
                Some(start),
                Some(end),
            ));
            let daily_effects = daily_attribution(input, weights, daily_benchmark_weights);
            let mut totals = BrinsonEffects::default();
            for day in &daily_effects {
                totals += day.effects();
            }
            (total_portfolio_return, totals, daily_effects)
        }
        None => {
            let total_portfolio_return: f64 = input
                .portfolio_weights
                .iter()
                .map(|(t, w)| w * portfolio_period_returns.get(t.as_str()).copied().unwrap_or(0.0))
                .sum();
            let mut totals = BrinsonEffects::default();
            for result in by_security.values() {
                totals += result.effects();
            }
            (total_portfolio_return, totals, Vec::new())
        }
    };

    debug!(
        "Attribution {} to {}: {} securities, {} sectors, {} daily rows",
        start,
        end,
        by_security.len(),
        by_sector.len(),
        daily_effects.len()
    );

    BrinsonAnalysis {
        period_start: start,
        period_end: end,
        total_portfolio_return,
        total_benchmark_return,
        total_excess_return: total_portfolio_return - total_benchmark_return,
        total_allocation_effect: totals.allocation,
        total_selection_effect: totals.selection,
        total_interaction_effect: totals.interaction,
        by_security,
        by_sector,
        daily_effects,
        used_time_varying_benchmark: daily_benchmark_weights.is_some(),
    }
}

/// Compounded return per ticker over the period.
///
/// With `weights`, a ticker that has a weight column only compounds the days
/// on which its weight is positive, so a position bought mid-period is not
/// credited with returns from before the purchase.
pub fn period_returns(
    returns: &ReturnsTable,
    start: NaiveDate,
    end: NaiveDate,
    weights: Option<&WeightTable>,
) -> HashMap<String, f64> {
    let period = returns.slice(Some(start), Some(end));
    if period.is_empty() {
        return HashMap::new();
    }
    let period_weights = weights
        .map(|w| w.slice(Some(start), Some(end)))
        .filter(|w| !w.is_empty());

    period
        .columns()
        .filter_map(|ticker| {
            let mut series = period.column(ticker);
            series.retain(|_, r| r.is_finite());
            if let Some(held) = period_weights.as_ref().filter(|w| w.has_column(ticker)) {
                series.retain(|date, _| held.get(*date, ticker).is_some_and(|w| w > 0.0));
            }
            (!series.is_empty()).then(|| (ticker.to_string(), compound(series.into_values())))
        })
        .collect()
}

fn sector_or_default(sector: Option<&str>) -> String {
    match sector.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => NOT_CLASSIFIED_SECTOR.to_string(),
    }
}

/// Benchmark constituents take their sector from the holding. Other tickers
/// use the sector override, then the security profile.
fn classify(ticker: &str, input: &AttributionInput<'_>) -> Classification {
    let profile = input.security_profiles.get(ticker);
    let industry = profile
        .and_then(|p| p.industry.clone())
        .unwrap_or_default();

    if let Some(holding) = input.benchmark_holdings.get(ticker) {
        return Classification {
            name: holding.name.clone(),
            sector: sector_or_default(Some(holding.sector.as_str())),
            industry,
        };
    }

    let sector = input
        .sector_overrides
        .get(ticker)
        .map(String::as_str)
        .or_else(|| profile.and_then(|p| p.sector.as_deref()));
    Classification {
        name: profile
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| ticker.to_string()),
        sector: sector_or_default(sector),
        industry,
    }
}

/// Weight-normalized average benchmark return per sector.
fn sector_benchmark_returns(
    input: &AttributionInput<'_>,
    benchmark_period_returns: &HashMap<String, f64>,
) -> HashMap<String, f64> {
    let mut sums: HashMap<String, (f64, f64)> = HashMap::new();
    for (ticker, holding) in input.benchmark_holdings {
        let r = benchmark_period_returns.get(ticker).copied().unwrap_or(0.0);
        let entry = sums
            .entry(sector_or_default(Some(holding.sector.as_str())))
            .or_insert((0.0, 0.0));
        entry.0 += holding.weight;
        entry.1 += holding.weight * r;
    }
    sums.into_iter()
        .map(|(sector, (weight, weighted))| {
            let r = if weight > 0.0 { weighted / weight } else { 0.0 };
            (sector, r)
        })
        .collect()
}

/// Sum security effects per sector. Sector returns are weight-weighted
/// averages for display only.
pub fn aggregate_by_sector(
    by_security: &BTreeMap<String, AttributionResult>,
) -> BTreeMap<String, AttributionResult> {
    #[derive(Default)]
    struct SectorTotals {
        exposure: Exposure,
        weighted_portfolio_return: f64,
        weighted_benchmark_return: f64,
        effects: BrinsonEffects,
        count: usize,
    }

    let mut sectors: BTreeMap<&str, SectorTotals> = BTreeMap::new();
    for result in by_security.values() {
        let totals = sectors.entry(result.sector.as_str()).or_default();
        totals.exposure.portfolio_weight += result.portfolio_weight;
        totals.exposure.benchmark_weight += result.benchmark_weight;
        totals.weighted_portfolio_return += result.portfolio_weight * result.portfolio_return;
        totals.weighted_benchmark_return += result.benchmark_weight * result.benchmark_return;
        totals.effects += result.effects();
        totals.count += 1;
    }

    sectors
        .into_iter()
        .map(|(sector, mut totals)| {
            let exposure = &mut totals.exposure;
            if exposure.portfolio_weight > 0.0 {
                exposure.portfolio_return =
                    totals.weighted_portfolio_return / exposure.portfolio_weight;
            }
            if exposure.benchmark_weight > 0.0 {
                exposure.benchmark_return =
                    totals.weighted_benchmark_return / exposure.benchmark_weight;
            }
            let classification = Classification {
                name: format!("{} ({} holdings)", sector, totals.count),
                sector: sector.to_string(),
                industry: String::new(),
            };
            (
                sector.to_string(),
                AttributionResult::new(sector, classification, totals.exposure, totals.effects),
            )
        })
        .collect()
}

/// Per-day effects over the dates shared by the portfolio weights, portfolio
/// returns and benchmark returns.
///
/// The day's benchmark total and sector returns use the static holding
/// weights. A ticker's benchmark weight comes from `daily_benchmark_weights`
/// when that table has a column for it, and from the holdings otherwise.
/// Tickers outside the benchmark fall in the "Not Classified" sector, so
/// their sector return is the day's benchmark total unless the benchmark
/// itself has unclassified members.
fn daily_attribution(
    input: &AttributionInput<'_>,
    daily_weights: &WeightTable,
    daily_benchmark_weights: Option<&WeightTable>,
) -> Vec<DailyAttributionEffect> {
    let start = Some(input.period_start);
    let end = Some(input.period_end);

    let portfolio_weights = daily_weights.slice(start, end);
    let portfolio_returns = input.portfolio_returns.slice(start, end);
    let benchmark_returns = input.benchmark_returns.slice(start, end);
    let benchmark_weights_by_day = daily_benchmark_weights
        .map(|w| w.slice(start, end))
        .filter(|w| !w.is_empty());

    let dates: BTreeSet<NaiveDate> = portfolio_weights
        .common_dates(&portfolio_returns)
        .intersection(&benchmark_returns.dates().collect())
        .copied()
        .collect();
    if dates.is_empty() {
        return Vec::new();
    }

    let static_weights: BTreeMap<&str, f64> = input
        .benchmark_holdings
        .iter()
        .map(|(ticker, h)| (ticker.as_str(), h.weight))
        .collect();

    let mut sector_members: BTreeMap<String, Vec<(&str, f64)>> = BTreeMap::new();
    for (ticker, holding) in input.benchmark_holdings {
        sector_members
            .entry(sector_or_default(Some(holding.sector.as_str())))
            .or_default()
            .push((ticker.as_str(), holding.weight));
    }
    let sector_totals: BTreeMap<&str, f64> = sector_members
        .iter()
        .map(|(sector, members)| (sector.as_str(), members.iter().map(|(_, w)| w).sum::<f64>()))
        .collect();

    let tickers: BTreeSet<&str> = portfolio_weights
        .columns()
        .chain(static_weights.keys().copied())
        .collect();
    // Daily sector returns only know benchmark members; everything else is
    // unclassified here regardless of overrides or profiles.
    let ticker_sectors: HashMap<&str, String> = tickers
        .iter()
        .map(|t| {
            let sector = match input.benchmark_holdings.get(*t) {
                Some(holding) => sector_or_default(Some(holding.sector.as_str())),
                None => NOT_CLASSIFIED_SECTOR.to_string(),
            };
            (*t, sector)
        })
        .collect();

    dates
        .into_iter()
        .map(|date| {
            let benchmark_total: f64 = static_weights
                .iter()
                .map(|(t, w)| w * benchmark_returns.value_or_zero(date, t))
                .sum();

            let sector_returns: HashMap<&str, f64> = sector_members
                .iter()
                .map(|(sector, members)| {
                    let weighted: f64 = members
                        .iter()
                        .map(|(t, w)| w * benchmark_returns.value_or_zero(date, t))
                        .sum();
                    let total = sector_totals.get(sector.as_str()).copied().unwrap_or(0.0);
                    let r = if total > 0.0 { weighted / total } else { 0.0 };
                    (sector.as_str(), r)
                })
                .collect();

            let mut effects = BrinsonEffects::default();
            for ticker in &tickers {
                let benchmark_weight = match &benchmark_weights_by_day {
                    Some(by_day) if by_day.has_column(ticker) => {
                        by_day.value_or_zero(date, ticker)
                    }
                    _ => static_weights.get(ticker).copied().unwrap_or(0.0),
                };
                let exposure = Exposure {
                    portfolio_weight: portfolio_weights.value_or_zero(date, ticker),
                    benchmark_weight,
                    portfolio_return: portfolio_returns.value_or_zero(date, ticker),
                    benchmark_return: benchmark_returns.value_or_zero(date, ticker),
                };
                let sector_return = ticker_sectors
                    .get(ticker)
                    .and_then(|sector| sector_returns.get(sector.as_str()))
                    .copied()
                    .unwrap_or(benchmark_total);
                effects += BrinsonEffects::compute(&exposure, sector_return, benchmark_total);
            }

            DailyAttributionEffect {
                date,
                allocation: effects.allocation,
                selection: effects.selection,
                interaction: effects.interaction,
            }
        })
        .collect()
}
