use num_traits::ToPrimitive;
use std::collections::BTreeMap;

use crate::frame::{DailySeries, PositionTable, WeightTable};
use crate::pricing::price_on_or_before;
use crate::transactions::is_cash_ticker;

/// Converts held quantities into market-value weights per day.
///
/// `price_lookup` returns the close series for a ticker (empty when there is
/// no data). Closes are carried forward onto the position calendar, so
/// weekends keep Friday's price. Cash is valued at its quantity. A ticker
/// without prices, or a day before its first close, contributes zero market
/// value. Days whose total market value is not positive get zero weight for
/// every ticker.
pub fn compute_daily_weights<F>(positions: &PositionTable, price_lookup: F) -> WeightTable
where
    F: Fn(&str) -> DailySeries<f64>,
{
    if positions.is_empty() {
        return WeightTable::new();
    }

    let tickers: Vec<String> = positions.columns().map(str::to_string).collect();
    let prices: BTreeMap<&str, DailySeries<f64>> = tickers
        .iter()
        .filter(|t| !is_cash_ticker(t))
        .map(|t| (t.as_str(), price_lookup(t)))
        .collect();

    let mut weights = WeightTable::with_columns(tickers.iter().cloned());

    for (date, row) in positions.rows() {
        let market_values: Vec<(&str, f64)> = tickers
            .iter()
            .map(|ticker| {
                let quantity = row
                    .get(ticker)
                    .and_then(|q| q.to_f64())
                    .unwrap_or(0.0);
                let value = if is_cash_ticker(ticker) {
                    quantity
                } else {
                    prices
                        .get(ticker.as_str())
                        .and_then(|series| price_on_or_before(series, date))
                        .map(|price| quantity * price)
                        .unwrap_or(0.0)
                };
                (ticker.as_str(), if value.is_finite() { value } else { 0.0 })
            })
            .collect();

        let total: f64 = market_values.iter().map(|(_, v)| v).sum();
        for (ticker, value) in market_values {
            let weight = if total > 0.0 { value / total } else { 0.0 };
            weights.insert(date, ticker, weight);
        }
    }

    weights
}
