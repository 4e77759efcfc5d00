use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::frame::PositionTable;
use crate::transactions::Transaction;
use crate::utils::time_utils::{get_days_between, valuation_date_today};

/// Replays a transaction ledger into a dense daily table of held quantities.
///
/// Transactions are sorted by `(date, sequence)` before replay. The table
/// covers every calendar day from the first transaction to `end_date`
/// (today when `None`); quantities carry forward across days with no
/// activity. `start_date` only trims the output: replay always starts at the
/// first transaction so cumulative quantities are correct.
///
/// Tickers are upper-cased. An empty ledger yields an empty table.
pub fn reconstruct_positions(
    transactions: &[Transaction],
    include_cash: bool,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> PositionTable {
    let mut ledger: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| include_cash || !tx.is_cash())
        .collect();
    if ledger.is_empty() {
        return PositionTable::new();
    }
    ledger.sort_by_key(|tx| tx.replay_key());

    let mut changes: BTreeMap<NaiveDate, BTreeMap<String, Decimal>> = BTreeMap::new();
    let mut tickers: BTreeSet<String> = BTreeSet::new();
    for tx in &ledger {
        let ticker = tx.ticker.trim().to_uppercase();
        *changes
            .entry(tx.date)
            .or_default()
            .entry(ticker.clone())
            .or_insert(Decimal::ZERO) += tx.signed_quantity();
        tickers.insert(ticker);
    }

    let first_date = ledger[0].date;
    let last_date = end_date.unwrap_or_else(valuation_date_today);

    let mut positions = PositionTable::with_columns(tickers.iter().cloned());
    let mut running: BTreeMap<&str, Decimal> =
        tickers.iter().map(|t| (t.as_str(), Decimal::ZERO)).collect();

    for date in get_days_between(first_date, last_date) {
        if let Some(day_changes) = changes.get(&date) {
            for (ticker, delta) in day_changes {
                if let Some(quantity) = running.get_mut(ticker.as_str()) {
                    *quantity += *delta;
                }
            }
        }
        for (ticker, quantity) in &running {
            positions.insert(date, ticker, *quantity);
        }
    }

    debug!(
        "Reconstructed {} tickers over {} days from {} transactions",
        tickers.len(),
        positions.len(),
        ledger.len()
    );

    match start_date {
        Some(start) => positions.slice(Some(start), None),
        None => positions,
    }
}
