//! Normalized per-company treasury rows

use serde::Serialize;

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";

/// Composite natural key used to join tables across assets.
///
/// Matching is exact: no case folding or whitespace trimming is applied, so a
/// company reported as "Tesla" for one asset and "Tesla " for the other ends up
/// as two separate rows in the combined view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub struct CompanyKey {
    pub name: String,
    pub symbol: String,
    pub country: String,
}

/// A single company's holding of one asset after normalization.
///
/// Quantities and USD values are never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyHoldingRecord {
    pub name: String,
    pub symbol: String,
    pub country: String,
    pub holdings_quantity: f64,
    pub entry_value_usd: Option<f64>,
    pub current_value_usd: Option<f64>,
    pub percent_of_supply: Option<f64>,
}

impl CompanyHoldingRecord {
    pub fn key(&self) -> CompanyKey {
        CompanyKey {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            country: self.country.clone(),
        }
    }
}

/// A holding record with profit/loss attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedHoldingRecord {
    #[serde(flatten)]
    pub record: CompanyHoldingRecord,
    pub pnl_usd: f64,
    pub pnl_percent: f64,
}

impl EnrichedHoldingRecord {
    pub fn entry_value_usd(&self) -> f64 {
        self.record.entry_value_usd.unwrap_or(0.0)
    }

    pub fn current_value_usd(&self) -> f64 {
        self.record.current_value_usd.unwrap_or(0.0)
    }
}

/// One asset's share of a combined row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AssetPosition {
    pub quantity: f64,
    pub entry_value_usd: f64,
    pub current_value_usd: f64,
}

/// One company across both assets.
///
/// `combined_entry_usd` and `combined_current_usd` always equal the sum of the
/// two positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedHoldingRecord {
    pub name: String,
    pub symbol: String,
    pub country: String,
    pub bitcoin: AssetPosition,
    pub ethereum: AssetPosition,
    pub combined_entry_usd: f64,
    pub combined_current_usd: f64,
    pub combined_pnl_usd: f64,
    pub combined_pnl_percent: f64,
}
