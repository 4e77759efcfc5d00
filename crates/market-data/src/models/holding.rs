use serde::{Deserialize, Serialize};

/// A single constituent of an ETF as published by the fund sponsor.
///
/// `weight` is a decimal fraction (0.0665 = 6.65%). Weights across one
/// snapshot rarely sum to exactly 1 because cash and derivatives lines are
/// dropped, so consumers renormalize before use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtfHolding {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub weight: f64,
    pub currency: String,
    pub asset_class: String,
    pub location: String,
}

impl EtfHolding {
    /// Minimal equity holding, mostly useful for callers building benchmarks by hand.
    pub fn equity(ticker: &str, sector: &str, weight: f64) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            name: ticker.to_uppercase(),
            sector: sector.to_string(),
            weight,
            currency: "USD".to_string(),
            asset_class: "Equity".to_string(),
            location: String::new(),
        }
    }
}
