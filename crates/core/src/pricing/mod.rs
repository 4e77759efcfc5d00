//! Close-price access on top of the price history provider.
//!
//! Every fetch here soft-fails: a provider error is logged and turned into an
//! empty series, so "provider down" and "no data" look identical downstream.

use chrono::NaiveDate;
use log::{debug, warn};
use quantterm_market_data::{PriceHistoryProvider, Quote};
use rayon::prelude::*;
use std::collections::HashMap;

use crate::frame::DailySeries;

/// Close prices keyed by date. Later bars for the same date replace earlier ones.
pub fn close_series(bars: &[Quote]) -> DailySeries<f64> {
    bars.iter()
        .filter_map(|bar| {
            bar.close_f64()
                .filter(|close| close.is_finite())
                .map(|close| (bar.date, close))
        })
        .collect()
}

/// Close series for one ticker, empty on any provider failure.
pub fn fetch_close_series(
    provider: &dyn PriceHistoryProvider,
    ticker: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> DailySeries<f64> {
    match provider.fetch_price_history(ticker, start, end) {
        Ok(bars) => {
            let series = close_series(&bars);
            if series.is_empty() {
                debug!("{}: no price data for {}", provider.id(), ticker);
            }
            series
        }
        Err(e) => {
            warn!(
                "{}: could not fetch price history for {}: {}",
                provider.id(),
                ticker,
                e
            );
            DailySeries::new()
        }
    }
}

/// Close series for many tickers, fetched in parallel. Tickers without data
/// are absent from the result.
pub fn fetch_close_series_batch(
    provider: &dyn PriceHistoryProvider,
    tickers: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> HashMap<String, DailySeries<f64>> {
    tickers
        .par_iter()
        .map(|ticker| (ticker.clone(), fetch_close_series(provider, ticker, start, end)))
        .filter(|(_, series)| !series.is_empty())
        .collect()
}

/// Last observation on or before `date` (LOCF).
pub fn price_on_or_before(series: &DailySeries<f64>, date: NaiveDate) -> Option<f64> {
    series.range(..=date).next_back().map(|(_, price)| *price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantterm_market_data::MarketDataError;
    use rust_decimal_macros::dec;

    struct FlakyProvider;

    impl PriceHistoryProvider for FlakyProvider {
        fn id(&self) -> &'static str {
            "FLAKY"
        }

        fn fetch_price_history(
            &self,
            ticker: &str,
            _start: Option<NaiveDate>,
            _end: Option<NaiveDate>,
        ) -> Result<Vec<Quote>, MarketDataError> {
            match ticker {
                "AAPL" => Ok(vec![
                    Quote::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), dec!(100)),
                    Quote::new(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), dec!(101)),
                ]),
                "DOWN" => Err(MarketDataError::ProviderError {
                    provider: "FLAKY".to_string(),
                    message: "503".to_string(),
                }),
                _ => Ok(vec![]),
            }
        }
    }

    #[test]
    fn test_provider_errors_become_empty_series() {
        assert!(fetch_close_series(&FlakyProvider, "DOWN", None, None).is_empty());
        assert_eq!(fetch_close_series(&FlakyProvider, "AAPL", None, None).len(), 2);
    }

    #[test]
    fn test_batch_drops_tickers_without_data() {
        let tickers = vec!["AAPL".to_string(), "DOWN".to_string(), "NONE".to_string()];
        let batch = fetch_close_series_batch(&FlakyProvider, &tickers, None, None);
        assert_eq!(batch.len(), 1);
        assert!(batch.contains_key("AAPL"));
    }

    #[test]
    fn test_price_on_or_before_forward_fills() {
        let series = fetch_close_series(&FlakyProvider, "AAPL", None, None);
        let sat = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        assert_eq!(price_on_or_before(&series, sat), Some(101.0));
        let before = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(price_on_or_before(&series, before), None);
    }
}
