#[cfg(test)]
mod tests {
    use crate::constants::FREE_CASH_TICKER;
    use crate::errors::Result;
    use crate::returns::{CacheConfig, ReturnInterval, ReturnsCache, ReturnsDataService};
    use crate::transactions::{Transaction, TransactionLedgerTrait};
    use chrono::{DateTime, Duration, NaiveDate, Utc};
    use quantterm_market_data::{MarketDataError, PriceHistoryProvider, Quote};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    struct MockLedger {
        transactions: Vec<Transaction>,
        modified: Option<DateTime<Utc>>,
    }

    impl TransactionLedgerTrait for MockLedger {
        fn get_transactions(&self, _portfolio_name: &str) -> Result<Vec<Transaction>> {
            Ok(self.transactions.clone())
        }

        fn get_portfolio_modified_time(
            &self,
            _portfolio_name: &str,
        ) -> Result<Option<DateTime<Utc>>> {
            Ok(self.modified)
        }
    }

    #[derive(Default)]
    struct CountingPrices {
        closes: HashMap<String, Vec<(NaiveDate, Decimal)>>,
        fetches: AtomicUsize,
    }

    impl CountingPrices {
        fn with(mut self, ticker: &str, closes: &[(u32, Decimal)]) -> Self {
            self.closes.insert(
                ticker.to_string(),
                closes.iter().map(|(day, c)| (d(*day), *c)).collect(),
            );
            self
        }
    }

    impl PriceHistoryProvider for CountingPrices {
        fn id(&self) -> &'static str {
            "COUNTING"
        }

        fn fetch_price_history(
            &self,
            ticker: &str,
            _start: Option<NaiveDate>,
            end: Option<NaiveDate>,
        ) -> std::result::Result<Vec<Quote>, MarketDataError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let closes = self
                .closes
                .get(ticker)
                .ok_or_else(|| MarketDataError::SymbolNotFound(ticker.to_string()))?;
            Ok(closes
                .iter()
                .filter(|(date, _)| end.map_or(true, |e| *date <= e))
                .map(|(date, close)| Quote::new(*date, *close))
                .collect())
        }
    }

    // AAPL: 100 -> 110 -> 121; MSFT: 50 -> 50 -> 45
    fn prices() -> CountingPrices {
        CountingPrices::default()
            .with("AAPL", &[(2, dec!(100)), (3, dec!(110)), (4, dec!(121))])
            .with("MSFT", &[(2, dec!(50)), (3, dec!(50)), (4, dec!(45))])
    }

    fn service_with(
        transactions: Vec<Transaction>,
        prices: Arc<CountingPrices>,
    ) -> (ReturnsDataService, TempDir) {
        let dir = tempdir().unwrap();
        let ledger = MockLedger {
            transactions,
            modified: Some(Utc::now() - Duration::hours(1)),
        };
        let cache = Arc::new(ReturnsCache::new(CacheConfig::new(dir.path())));
        (
            ReturnsDataService::new(Arc::new(ledger), prices, cache),
            dir,
        )
    }

    fn two_stock_ledger() -> Vec<Transaction> {
        vec![
            Transaction::buy(d(2), "AAPL", dec!(1)),
            Transaction::buy(d(2), "MSFT", dec!(2)),
            Transaction::buy(d(2), FREE_CASH_TICKER, dec!(200)),
        ]
    }

    #[test]
    fn test_daily_returns_exclude_cash_and_are_cached() {
        let prices = Arc::new(prices());
        let (service, _dir) = service_with(two_stock_ledger(), prices.clone());

        let returns = service.get_daily_returns("Growth", None, None);
        assert_eq!(returns.columns().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);
        assert_eq!(returns.len(), 2);
        let fetches = prices.fetches.load(Ordering::SeqCst);

        let sliced = service.get_daily_returns("Growth", Some(d(4)), None);
        assert_eq!(sliced.len(), 1);
        assert_eq!(prices.fetches.load(Ordering::SeqCst), fetches);
    }

    #[test]
    fn test_equal_weight_portfolio_returns() {
        let (service, _dir) = service_with(two_stock_ledger(), Arc::new(prices()));

        let returns = service.get_portfolio_returns("Growth", None, None, None);

        assert!((returns[&d(3)] - 0.05).abs() < 1e-12);
        assert!((returns[&d(4)] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_custom_weights_are_renormalized() {
        let (service, _dir) = service_with(two_stock_ledger(), Arc::new(prices()));
        let weights: HashMap<String, f64> =
            [("AAPL".to_string(), 3.0), ("MSFT".to_string(), 1.0)].into();

        let returns = service.get_portfolio_returns("Growth", None, None, Some(&weights));

        assert!((returns[&d(3)] - 0.075).abs() < 1e-12);

        let zero: HashMap<String, f64> = HashMap::new();
        assert!(service
            .get_portfolio_returns("Growth", None, None, Some(&zero))
            .is_empty());
    }

    #[test]
    fn test_time_varying_returns_follow_held_weights() {
        let (service, _dir) = service_with(two_stock_ledger(), Arc::new(prices()));

        let daily = service.get_time_varying_portfolio_returns(
            "Growth",
            None,
            Some(d(4)),
            false,
            ReturnInterval::Daily,
        );

        // Same-day weights. Day 3: 110/210 * 10% + 100/210 * 0%
        // Day 4: 121/211 * 10% + 90/211 * -10%
        let expected_d3 = 110.0 / 210.0 * 0.10;
        assert!((daily[&d(3)] - expected_d3).abs() < 1e-12);
        let expected_d4 = 121.0 / 211.0 * 0.10 + 90.0 / 211.0 * -0.10;
        assert!((daily[&d(4)] - expected_d4).abs() < 1e-12);

        let monthly = service.get_time_varying_portfolio_returns(
            "Growth",
            None,
            Some(d(4)),
            false,
            ReturnInterval::Monthly,
        );
        assert_eq!(monthly.len(), 1);
        assert!((monthly[&d(4)] - ((1.0 + expected_d3) * (1.0 + expected_d4) - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_cash_drag_is_negative_in_rising_market() {
        let prices = CountingPrices::default().with("AAPL", &[(2, dec!(100)), (3, dec!(110))]);
        let ledger = vec![
            Transaction::buy(d(2), "AAPL", dec!(1)),
            Transaction::buy(d(2), FREE_CASH_TICKER, dec!(100)),
        ];
        let (service, _dir) = service_with(ledger, Arc::new(prices));

        let drag = service.calculate_cash_drag("Growth", None, Some(d(3)));

        // With cash, AAPL is 110 of 210 on the day it gains 10%.
        let with_cash = 110.0 / 210.0 * 0.10;
        assert!((drag.return_without_cash - 0.10).abs() < 1e-12);
        assert!((drag.return_with_cash - with_cash).abs() < 1e-12);
        assert!((drag.drag - (with_cash - 0.10)).abs() < 1e-12);
        assert!(drag.drag < 0.0);
    }

    #[test]
    fn test_invalidate_cache_refetches() {
        let prices = Arc::new(prices());
        let (service, _dir) = service_with(two_stock_ledger(), prices.clone());
        service.get_daily_returns("Growth", None, None);
        let fetches = prices.fetches.load(Ordering::SeqCst);

        service.invalidate_cache("Growth");
        service.get_daily_returns("Growth", None, None);

        assert!(prices.fetches.load(Ordering::SeqCst) > fetches);
    }

    #[test]
    fn test_correlation_and_volatility_from_cached_returns() {
        let (service, _dir) = service_with(two_stock_ledger(), Arc::new(prices()));

        let matrix = service.get_correlation_matrix("Growth", None, None);
        assert_eq!(matrix.tickers.len(), 2);

        let vol = service.get_volatility("Growth", 2, None, None);
        assert_eq!(vol.len(), 1);
        assert!(vol.get(d(4), "AAPL").is_some());
    }
}
