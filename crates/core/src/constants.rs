/// Synthetic ledger ticker for uninvested cash. Valued at face (price 1).
pub const FREE_CASH_TICKER: &str = "FREE CASH";

/// Per-security daily returns beyond this magnitude are treated as feed errors.
pub const MAX_DAILY_RETURN: f64 = 1.0;

/// Aggregate (portfolio or benchmark) daily returns beyond this magnitude are clipped.
pub const MAX_AGGREGATE_DAILY_RETURN: f64 = 0.5;

/// Trading days per year, used to annualize volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Default lookback window (trading-day observations) for attribution.
pub const DEFAULT_LOOKBACK_DAYS: usize = 252;

/// Minimum spacing between selected historical benchmark snapshots.
pub const MIN_SNAPSHOT_SPACING_DAYS: i64 = 5;

/// Sector label for securities with no classification.
pub const NOT_CLASSIFIED_SECTOR: &str = "Not Classified";

/// Tolerance used when comparing weight sums.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;
