use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::DEFAULT_LOOKBACK_DAYS;
use crate::errors::{Error, Result};

/// User-facing settings for an attribution run.
///
/// The analysis period is the last `lookback_days` return observations, or the
/// custom range when `lookback_days` is `None` and both custom dates are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSettings {
    pub lookback_days: Option<usize>,
    pub custom_start_date: Option<NaiveDate>,
    pub custom_end_date: Option<NaiveDate>,
    /// Restrict portfolio holdings to these sectors. `None` or empty keeps all.
    pub portfolio_universe_sectors: Option<Vec<String>>,
    /// Restrict benchmark constituents to these sectors.
    pub benchmark_universe_sectors: Option<Vec<String>>,
    /// Ticker -> sector, applied to holdings outside the benchmark.
    pub sector_overrides: HashMap<String, String>,
    pub include_cash: bool,
    pub use_historical_benchmark_weights: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            lookback_days: Some(DEFAULT_LOOKBACK_DAYS),
            custom_start_date: None,
            custom_end_date: None,
            portfolio_universe_sectors: None,
            benchmark_universe_sectors: None,
            sector_overrides: HashMap::new(),
            include_cash: false,
            use_historical_benchmark_weights: false,
        }
    }
}

impl AnalysisSettings {
    /// Custom range in effect, if any.
    pub fn custom_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.lookback_days, self.custom_start_date, self.custom_end_date) {
            (None, Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn portfolio_sector_filter(&self) -> Option<&[String]> {
        self.portfolio_universe_sectors
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    pub fn benchmark_sector_filter(&self) -> Option<&[String]> {
        self.benchmark_universe_sectors
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == Some(0) {
            return Err(Error::InvalidConfigValue(
                "lookback_days must be at least 1".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.custom_start_date, self.custom_end_date) {
            if start > end {
                return Err(Error::InvalidConfigValue(format!(
                    "custom start date {} is after end date {}",
                    start, end
                )));
            }
        }
        Ok(())
    }
}
