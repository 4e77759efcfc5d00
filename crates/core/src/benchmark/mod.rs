//! Benchmark module - constituent-weighted ETF benchmark returns and
//! time-varying benchmark weights.

mod benchmark_builder;
mod historical_weights;


pub use benchmark_builder::{
    build_benchmark_returns, filter_by_sectors, normalize_weights, BenchmarkReturns,
};
pub use historical_weights::{
    interpolate_daily_weights, select_weekly_dates, HistoricalWeightsService,
};
