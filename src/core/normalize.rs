//! Decoding of raw treasury payloads into normalized holding records.
//!
//! The treasury API is loosely typed: the company list may be missing, numbers
//! sometimes arrive as strings, and `total_holdings` is either a plain number or
//! an object keyed by asset id. Everything is decoded once here; nothing past this
//! module has to care about the raw shape.

use crate::core::asset::Asset;
use crate::core::holding::{CompanyHoldingRecord, NOT_AVAILABLE, UNKNOWN};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Payload-level holdings total, in either of the shapes the API uses.
#[derive(Debug, Clone, PartialEq)]
pub enum TotalHoldings {
    Flat(f64),
    ByAsset(BTreeMap<String, f64>),
}

impl TotalHoldings {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(TotalHoldings::ByAsset(
                map.iter()
                    .filter_map(|(k, v)| number_from_value(v).map(|n| (k.clone(), n)))
                    .collect(),
            )),
            other => number_from_value(other).map(TotalHoldings::Flat),
        }
    }

    /// Total for the given asset. A flat total is taken as-is; a nested total
    /// missing the asset's key is 0.
    pub fn for_asset(&self, asset: Asset) -> f64 {
        match self {
            TotalHoldings::Flat(total) => *total,
            TotalHoldings::ByAsset(map) => map.get(asset.id()).copied().unwrap_or(0.0),
        }
    }
}

/// One company entry exactly as the API reports it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCompany {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_holdings: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_entry_value_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_current_value_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub percentage_of_total_supply: Option<f64>,
}

/// Raw per-asset document returned by the treasury endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TreasuryPayload {
    #[serde(default, deserialize_with = "lenient_companies")]
    pub companies: Option<Vec<RawCompany>>,
    #[serde(default, deserialize_with = "lenient_total_holdings")]
    pub total_holdings: Option<TotalHoldings>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_value_usd: Option<f64>,
}

impl TreasuryPayload {
    /// Decodes an arbitrary JSON value. Anything that is not an object yields an
    /// empty payload.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            debug!("Treasury payload is not an object, treating as empty");
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// Normalized view of one asset's payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TreasurySnapshot {
    pub asset: Asset,
    pub companies: Vec<CompanyHoldingRecord>,
    pub reported_total_holdings: Option<f64>,
    pub reported_total_value_usd: Option<f64>,
}

impl TreasurySnapshot {
    pub fn empty(asset: Asset) -> Self {
        Self {
            asset,
            companies: Vec::new(),
            reported_total_holdings: None,
            reported_total_value_usd: None,
        }
    }
}

/// Converts the payload's company list into records sorted by holdings,
/// largest first. Ties keep their input order.
pub fn normalize_records(payload: &TreasuryPayload) -> Vec<CompanyHoldingRecord> {
    let Some(companies) = payload.companies.as_ref() else {
        debug!("Payload has no company list");
        return Vec::new();
    };

    let mut records: Vec<CompanyHoldingRecord> = companies.iter().map(normalize_company).collect();
    records.sort_by(|a, b| b.holdings_quantity.total_cmp(&a.holdings_quantity));
    records
}

/// Normalizes a payload along with its reported totals.
pub fn normalize(asset: Asset, payload: &TreasuryPayload) -> TreasurySnapshot {
    let companies = normalize_records(payload);
    debug!("Normalized {} {} treasury records", companies.len(), asset.code());
    TreasurySnapshot {
        asset,
        companies,
        reported_total_holdings: payload
            .total_holdings
            .as_ref()
            .map(|t| non_negative(t.for_asset(asset))),
        reported_total_value_usd: payload.total_value_usd.map(non_negative),
    }
}

fn normalize_company(raw: &RawCompany) -> CompanyHoldingRecord {
    CompanyHoldingRecord {
        name: raw.name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        symbol: raw.symbol.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        country: raw.country.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        holdings_quantity: raw.total_holdings.map_or(0.0, non_negative),
        entry_value_usd: raw.total_entry_value_usd.map(non_negative),
        current_value_usd: raw.total_current_value_usd.map(non_negative),
        percent_of_supply: raw.percentage_of_total_supply.map(non_negative),
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_total_holdings<'de, D>(deserializer: D) -> Result<Option<TotalHoldings>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(TotalHoldings::from_value))
}

fn lenient_companies<'de, D>(deserializer: D) -> Result<Option<Vec<RawCompany>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value::<RawCompany>(item).unwrap_or_default())
                .collect(),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_company_list_is_empty() {
        let payload = TreasuryPayload::from_value(json!({ "total_holdings": 10 }));
        assert!(normalize_records(&payload).is_empty());

        let payload = TreasuryPayload::from_value(json!({ "companies": null }));
        assert!(normalize_records(&payload).is_empty());

        let payload = TreasuryPayload::from_value(json!("not an object"));
        assert!(normalize_records(&payload).is_empty());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let payload = TreasuryPayload::from_value(json!({ "companies": [{}] }));
        let records = normalize_records(&payload);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Unknown");
        assert_eq!(records[0].symbol, "N/A");
        assert_eq!(records[0].country, "Unknown");
        assert_eq!(records[0].holdings_quantity, 0.0);
        assert_eq!(records[0].entry_value_usd, None);
        assert_eq!(records[0].current_value_usd, None);
        assert_eq!(records[0].percent_of_supply, None);
    }

    #[test]
    fn test_malformed_and_negative_numbers() {
        let payload = TreasuryPayload::from_value(json!({
            "companies": [
                {
                    "name": "Strategy",
                    "symbol": "MSTR.US",
                    "country": "US",
                    "total_holdings": "1500.5",
                    "total_entry_value_usd": "lots",
                    "total_current_value_usd": -42.0,
                    "percentage_of_total_supply": [1, 2]
                },
                "garbage"
            ]
        }));
        let records = normalize_records(&payload);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].holdings_quantity, 1500.5);
        assert_eq!(records[0].entry_value_usd, None);
        assert_eq!(records[0].current_value_usd, Some(0.0));
        assert_eq!(records[0].percent_of_supply, None);
        assert_eq!(records[1].name, "Unknown");
    }

    #[test]
    fn test_sorted_descending_and_stable() {
        let payload = TreasuryPayload::from_value(json!({
            "companies": [
                { "name": "Small", "total_holdings": 10 },
                { "name": "TieFirst", "total_holdings": 500 },
                { "name": "Big", "total_holdings": 1000 },
                { "name": "TieSecond", "total_holdings": 500 }
            ]
        }));
        let names: Vec<String> = normalize_records(&payload)
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, vec!["Big", "TieFirst", "TieSecond", "Small"]);
    }

    #[test]
    fn test_flat_and_nested_total_holdings() {
        let flat = TreasuryPayload::from_value(json!({
            "total_holdings": 640250.5,
            "total_value_usd": 70_000_000_000.0_f64,
            "companies": []
        }));
        let snapshot = normalize(Asset::Bitcoin, &flat);
        assert_eq!(snapshot.reported_total_holdings, Some(640250.5));
        assert_eq!(snapshot.reported_total_value_usd, Some(70_000_000_000.0));

        let nested = TreasuryPayload::from_value(json!({
            "total_holdings": { "ethereum": 2_100_000, "bitcoin": 5 }
        }));
        let snapshot = normalize(Asset::Ethereum, &nested);
        assert_eq!(snapshot.reported_total_holdings, Some(2_100_000.0));
        assert!(snapshot.companies.is_empty());

        let nested_missing = TreasuryPayload::from_value(json!({
            "total_holdings": { "ethereum": 12 }
        }));
        let snapshot = normalize(Asset::Bitcoin, &nested_missing);
        assert_eq!(snapshot.reported_total_holdings, Some(0.0));
    }

    #[test]
    fn test_payload_deserializes_from_json_text() {
        let text = r#"{
            "total_holdings": 1500,
            "total_value_usd": 60000000,
            "market_cap_dominance": 0.01,
            "companies": [
                {
                    "name": "Metaplanet",
                    "symbol": "3350.T",
                    "country": "JP",
                    "total_holdings": 1500,
                    "total_entry_value_usd": 50000000,
                    "total_current_value_usd": 60000000,
                    "percentage_of_total_supply": 0.007
                }
            ]
        }"#;
        let payload: TreasuryPayload = serde_json::from_str(text).unwrap();
        let records = normalize_records(&payload);

        assert_eq!(records[0].symbol, "3350.T");
        assert_eq!(records[0].entry_value_usd, Some(50_000_000.0));
        assert_eq!(records[0].percent_of_supply, Some(0.007));
    }
}
