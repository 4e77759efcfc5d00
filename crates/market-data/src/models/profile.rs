use serde::{Deserialize, Serialize};

/// Security profile data from market data providers.
///
/// Used to classify holdings that are not part of the benchmark, where the
/// ETF holdings file cannot tell us the sector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetProfile {
    /// Ticker the profile describes
    pub ticker: String,

    /// Company/asset name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Business sector (e.g., "Technology")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,

    /// Industry within sector (e.g., "Consumer Electronics")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    /// Asset class (e.g., "Equity", "Fixed Income")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_class: Option<String>,
}
