//! Profit/loss calculations
use crate::core::holding::{CompanyHoldingRecord, EnrichedHoldingRecord};

/// Percentage gain of `pnl` relative to `entry`, or 0 when there is no entry
/// value to divide by.
pub fn pnl_percent(pnl: f64, entry: f64) -> f64 {
    if entry != 0.0 && entry.is_finite() {
        (pnl / entry) * 100.0
    } else {
        0.0
    }
}

/// Attaches absolute and percentage profit/loss to a record. Absent values
/// count as 0.
pub fn enrich(record: CompanyHoldingRecord) -> EnrichedHoldingRecord {
    let entry = record.entry_value_usd.unwrap_or(0.0);
    let current = record.current_value_usd.unwrap_or(0.0);
    let pnl_usd = current - entry;

    EnrichedHoldingRecord {
        pnl_percent: pnl_percent(pnl_usd, entry),
        pnl_usd,
        record,
    }
}

pub fn enrich_all(records: Vec<CompanyHoldingRecord>) -> Vec<EnrichedHoldingRecord> {
    records.into_iter().map(enrich).collect()
}
