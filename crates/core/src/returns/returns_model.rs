use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Sampling interval for a return series. Every interval other than `Daily`
/// links the daily returns of a bucket geometrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReturnInterval {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ReturnInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnInterval::Daily => "daily",
            ReturnInterval::Weekly => "weekly",
            ReturnInterval::Monthly => "monthly",
            ReturnInterval::Yearly => "yearly",
        }
    }
}

impl fmt::Display for ReturnInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnInterval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(ReturnInterval::Daily),
            "weekly" => Ok(ReturnInterval::Weekly),
            "monthly" => Ok(ReturnInterval::Monthly),
            "yearly" => Ok(ReturnInterval::Yearly),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown return interval '{}'",
                other
            ))),
        }
    }
}

/// Pearson correlation of daily returns. `values[i][j]` pairs `tickers[i]`
/// with `tickers[j]`; NaN where fewer than two common observations exist or a
/// series is constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        Some(self.values[i][j])
    }
}

/// One year of a monthly returns grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReturnsRow {
    pub year: i32,
    /// January first. `None` where the month has no data.
    pub months: [Option<f64>; 12],
    /// Compounded from the months that have data.
    pub ytd: Option<f64>,
}

/// Compounded returns over a range with and without the cash position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CashDrag {
    pub return_with_cash: f64,
    pub return_without_cash: f64,
    /// `return_with_cash - return_without_cash`; negative when cash held back
    /// a rising portfolio.
    pub drag: f64,
}
