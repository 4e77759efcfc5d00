use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar as returned by a price history provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Trading day the bar belongs to
    pub date: NaiveDate,

    /// Opening price (optional, some feeds only publish closes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Decimal>,

    /// Closing price (required)
    pub close: Decimal,

    /// Split and dividend adjusted close, when the provider has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjclose: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}

impl Quote {
    /// Create a close-only bar
    pub fn new(date: NaiveDate, close: Decimal) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            adjclose: None,
            volume: None,
        }
    }

    /// Create a full OHLCV bar
    pub fn ohlcv(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close,
            adjclose: None,
            volume: Some(volume),
        }
    }

    /// Close as a float for return arithmetic. Unrepresentable values yield `None`.
    pub fn close_f64(&self) -> Option<f64> {
        self.close.to_f64()
    }
}
