//! iShares holdings file support.
//!
//! iShares publishes fund holdings as a CSV with roughly nine rows of fund
//! metadata, one header row starting with `Ticker`, the constituent rows, and
//! sometimes a legal footer. Only equity rows are kept; cash, futures and FX
//! lines are dropped, which is why the remaining weights sum to slightly less
//! than one.

use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use std::collections::HashMap;

use crate::errors::MarketDataError;
use crate::models::EtfHolding;

pub const PROVIDER_ID: &str = "ISHARES";

/// Sector assigned when the sponsor leaves the field blank.
pub const NOT_CLASSIFIED: &str = "Not Classified";

const MAX_TICKER_LEN: usize = 10;

/// Known fund endpoints (ETF symbol, CSV download URL).
const ETF_URLS: &[(&str, &str)] = &[(
    "IWV",
    "https://www.ishares.com/us/products/239714/ishares-russell-3000-etf/1467271812596.ajax?fileType=csv&dataType=fund",
)];

/// iShares GICS sector labels mapped to the sector names used for display
/// and for matching security profiles.
const SECTOR_MAP: &[(&str, &str)] = &[
    ("Information Technology", "Technology"),
    ("Consumer Discretionary", "Consumer Cyclical"),
    ("Consumer Staples", "Consumer Defensive"),
    ("Health Care", "Healthcare"),
    ("Financials", "Financial Services"),
    ("Communication Services", "Communication Services"),
    ("Communication", "Communication Services"),
    ("Industrials", "Industrials"),
    ("Energy", "Energy"),
    ("Materials", "Basic Materials"),
    ("Real Estate", "Real Estate"),
    ("Utilities", "Utilities"),
];

/// ETF symbols with a known holdings endpoint.
pub fn available_etfs() -> Vec<&'static str> {
    ETF_URLS.iter().map(|(symbol, _)| *symbol).collect()
}

/// Holdings download URL for `etf_symbol`, case-insensitive.
pub fn holdings_url(etf_symbol: &str) -> Option<&'static str> {
    let symbol = etf_symbol.to_uppercase();
    ETF_URLS
        .iter()
        .find(|(known, _)| *known == symbol)
        .map(|(_, url)| *url)
}

/// Map an iShares sector label to the display sector.
pub fn normalize_sector(raw_sector: &str) -> String {
    let trimmed = raw_sector.trim();
    if trimmed.is_empty() {
        return NOT_CLASSIFIED.to_string();
    }
    SECTOR_MAP
        .iter()
        .find(|(ishares, _)| *ishares == trimmed)
        .map(|(_, sector)| sector.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Parse the raw iShares CSV into holdings keyed by upper-cased ticker.
///
/// Returns `ParseFailed` when no header row can be found. Individual
/// malformed rows are skipped.
pub fn parse_ishares_csv(csv_content: &str) -> Result<HashMap<String, EtfHolding>, MarketDataError> {
    let lines: Vec<&str> = csv_content.trim().lines().collect();
    let header_idx = lines
        .iter()
        .position(|line| line.starts_with("Ticker,") || line.starts_with("\"Ticker\","))
        .ok_or_else(|| MarketDataError::ParseFailed {
            message: "could not find holdings header row".to_string(),
        })?;

    let body = lines[header_idx..].join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let columns = HoldingColumns {
        ticker: column("Ticker"),
        name: column("Name"),
        sector: column("Sector"),
        asset_class: column("Asset Class"),
        weight: column("Weight (%)"),
        currency: column("Currency"),
        location: column("Location"),
    };

    let mut holdings = HashMap::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping unreadable holdings row: {}", e);
                continue;
            }
        };
        if let Some(holding) = parse_row(&record, &columns) {
            holdings.insert(holding.ticker.clone(), holding);
        }
    }

    if holdings.is_empty() {
        warn!("iShares holdings file contained no equity rows");
    }
    Ok(holdings)
}

struct HoldingColumns {
    ticker: Option<usize>,
    name: Option<usize>,
    sector: Option<usize>,
    asset_class: Option<usize>,
    weight: Option<usize>,
    currency: Option<usize>,
    location: Option<usize>,
}

fn field<'r>(record: &'r StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("")
}

fn parse_row(record: &StringRecord, columns: &HoldingColumns) -> Option<EtfHolding> {
    let ticker = field(record, columns.ticker);
    let asset_class = field(record, columns.asset_class);

    if asset_class != "Equity" {
        return None;
    }
    if ticker.is_empty() || ticker == "-" || ticker.len() > MAX_TICKER_LEN {
        return None;
    }

    let weight_str = field(record, columns.weight).replace(['%', ','], "");
    let weight = weight_str.parse::<f64>().map(|w| w / 100.0).unwrap_or(0.0);

    let currency = match field(record, columns.currency) {
        "" => "USD",
        other => other,
    };

    Some(EtfHolding {
        ticker: ticker.to_uppercase(),
        name: field(record, columns.name).to_string(),
        sector: normalize_sector(field(record, columns.sector)),
        weight,
        currency: currency.to_string(),
        asset_class: asset_class.to_string(),
        location: field(record, columns.location).to_string(),
    })
}
