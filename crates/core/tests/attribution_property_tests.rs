//! Property-based integration tests for positions, returns and attribution.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use quantterm_core::attribution::{calculate_attribution, AttributionInput};
use quantterm_core::benchmark::normalize_weights;
use quantterm_core::frame::{DailySeries, ReturnsTable};
use quantterm_core::portfolio::{compute_daily_weights, reconstruct_positions};
use quantterm_core::returns::compound;
use quantterm_core::transactions::Transaction;
use quantterm_market_data::{AssetProfile, EtfHolding};
use rust_decimal::Decimal;
use std::collections::HashMap;

const TICKERS: [&str; 4] = ["AAPL", "MSFT", "XOM", "JPM"];
const SECTORS: [&str; 4] = ["Information Technology", "Information Technology", "Energy", "Financials"];

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

// =============================================================================
// Generators
// =============================================================================

/// Buys only, so every ledger stays long.
fn arb_buys() -> impl Strategy<Value = Vec<Transaction>> {
    proptest::collection::vec((0i64..20, 0usize..TICKERS.len(), 1u32..500), 1..20).prop_map(
        |entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (offset, t, qty))| {
                    Transaction::buy(
                        base_date() + Duration::days(offset),
                        TICKERS[t],
                        Decimal::from(qty),
                    )
                    .with_sequence(i as i64)
                })
                .collect()
        },
    )
}

/// One close per calendar day for each ticker.
fn arb_closes() -> impl Strategy<Value = Vec<Vec<f64>>> {
    proptest::collection::vec(proptest::collection::vec(1.0f64..500.0, 25), TICKERS.len())
}

fn arb_weights() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(0.0f64..1.0, TICKERS.len())
}

fn arb_returns() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-0.2f64..0.2, TICKERS.len())
}

fn close_series(closes: &[f64]) -> DailySeries<f64> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| (base_date() + Duration::days(i as i64), *c))
        .collect()
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Weights sum to one on every day with positive market value.
    #[test]
    fn prop_weights_are_conserved(
        transactions in arb_buys(),
        closes in arb_closes(),
    ) {
        let end = base_date() + Duration::days(24);
        let positions = reconstruct_positions(&transactions, false, None, Some(end));
        let series: HashMap<&str, DailySeries<f64>> = TICKERS
            .iter()
            .zip(closes.iter())
            .map(|(t, c)| (*t, close_series(c)))
            .collect();

        let weights = compute_daily_weights(&positions, |ticker| {
            series.get(ticker).cloned().unwrap_or_default()
        });

        for date in weights.dates() {
            let sum = weights.row_sum(date);
            prop_assert!(
                (sum - 1.0).abs() < 1e-9,
                "weights on {} sum to {}",
                date,
                sum
            );
        }
    }

    /// Held quantity equals the cumulative sum of buys up to the day.
    #[test]
    fn prop_positions_replay_cumulative_quantities(transactions in arb_buys()) {
        let end = base_date() + Duration::days(24);
        let positions = reconstruct_positions(&transactions, false, None, Some(end));

        for (date, row) in positions.rows() {
            for ticker in TICKERS {
                let expected: Decimal = transactions
                    .iter()
                    .filter(|tx| tx.ticker == ticker && tx.date <= date)
                    .map(|tx| tx.quantity)
                    .sum();
                let actual = row.get(ticker).copied().unwrap_or(Decimal::ZERO);
                prop_assert_eq!(actual, expected, "{} on {}", ticker, date);
            }
        }
    }

    /// Normalized benchmark weights sum to one and keep their proportions.
    #[test]
    fn prop_benchmark_weights_renormalize(raw in arb_weights()) {
        prop_assume!(raw.iter().sum::<f64>() > 1e-6);
        let holdings: HashMap<String, EtfHolding> = TICKERS
            .iter()
            .zip(SECTORS.iter())
            .zip(raw.iter())
            .map(|((t, s), w)| (t.to_string(), EtfHolding::equity(t, s, *w)))
            .collect();

        let normalized = normalize_weights(&holdings);
        let total: f64 = normalized.values().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);

        let raw_total: f64 = raw.iter().sum();
        for (t, w) in TICKERS.iter().zip(raw.iter()) {
            prop_assert!((normalized[*t] - w / raw_total).abs() < 1e-9);
        }
    }

    /// Compounding matches the product of growth factors.
    #[test]
    fn prop_compounding_is_geometric(returns in proptest::collection::vec(-0.5f64..0.5, 0..30)) {
        let expected = returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;
        prop_assert!((compound(returns.iter().copied()) - expected).abs() < 1e-12);
        prop_assert_eq!(compound(std::iter::repeat(0.0).take(returns.len())), 0.0);
    }

    /// Every security and sector row's total is exactly the sum of its effects,
    /// and static totals are the sum of security effects.
    #[test]
    fn prop_effects_are_additive(
        portfolio_raw in arb_weights(),
        benchmark_raw in arb_weights(),
        portfolio_ret in arb_returns(),
        benchmark_ret in arb_returns(),
    ) {
        let date = base_date() + Duration::days(2);
        let portfolio_weights: HashMap<String, f64> = TICKERS
            .iter()
            .zip(portfolio_raw.iter())
            .map(|(t, w)| (t.to_string(), *w))
            .collect();
        let holdings: HashMap<String, EtfHolding> = TICKERS
            .iter()
            .zip(SECTORS.iter())
            .zip(benchmark_raw.iter())
            .map(|((t, s), w)| (t.to_string(), EtfHolding::equity(t, s, *w)))
            .collect();
        let mut portfolio_returns = ReturnsTable::new();
        let mut benchmark_returns = ReturnsTable::new();
        for (i, t) in TICKERS.iter().enumerate() {
            portfolio_returns.insert(date, t, portfolio_ret[i]);
            benchmark_returns.insert(date, t, benchmark_ret[i]);
        }
        let profiles: HashMap<String, AssetProfile> = HashMap::new();
        let overrides: HashMap<String, String> = HashMap::new();

        let analysis = calculate_attribution(&AttributionInput {
            portfolio_weights: &portfolio_weights,
            benchmark_holdings: &holdings,
            portfolio_returns: &portfolio_returns,
            benchmark_returns: &benchmark_returns,
            period_start: base_date(),
            period_end: base_date() + Duration::days(5),
            daily_weights: None,
            daily_benchmark_weights: None,
            security_profiles: &profiles,
            sector_overrides: &overrides,
        });

        for result in analysis.by_security.values().chain(analysis.by_sector.values()) {
            prop_assert_eq!(
                result.total_effect,
                result.allocation_effect + result.selection_effect + result.interaction_effect
            );
        }
        let divergence = analysis.security_level_divergence();
        prop_assert!(divergence.allocation.abs() < 1e-12);
        prop_assert!(divergence.selection.abs() < 1e-12);
        prop_assert!(divergence.interaction.abs() < 1e-12);
    }
}
