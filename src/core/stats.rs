//! Summary figures for a single asset or the combined view.
use crate::core::asset::Asset;
use crate::core::holding::{CombinedHoldingRecord, EnrichedHoldingRecord};
use crate::core::metrics::pnl_percent;
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of one asset's table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub asset: Asset,
    pub total_quantity: f64,
    pub total_value_usd: f64,
    pub total_entry_usd: f64,
    pub total_pnl_usd: f64,
    pub total_pnl_percent: f64,
    pub average_quantity_per_company: f64,
    pub company_count: usize,
    /// Unclamped; the sum of reported percentages can exceed 100.
    pub supply_dominance_percent: f64,
}

impl AggregateStats {
    /// Companies' share of supply limited to `[0, 100]`, for donut charts.
    pub fn supply_share(&self) -> f64 {
        clamp_percent(self.supply_dominance_percent)
    }

    /// Remainder of the donut after [`Self::supply_share`].
    pub fn others_share(&self) -> f64 {
        100.0 - self.supply_share()
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Builds the summary for one asset's enriched table.
///
/// Supply dominance prefers the API's per-company percentages whenever at least
/// one company reports a nonzero value. Otherwise it falls back to the share of
/// the asset's fixed maximum supply, which is 0 for uncapped assets.
pub fn asset_stats(asset: Asset, rows: &[EnrichedHoldingRecord]) -> AggregateStats {
    let company_count = rows.len();
    let total_quantity: f64 = rows.iter().map(|r| r.record.holdings_quantity).sum();
    let total_value_usd: f64 = rows.iter().map(|r| r.current_value_usd()).sum();
    let total_entry_usd: f64 = rows.iter().map(|r| r.entry_value_usd()).sum();
    let total_pnl_usd = total_value_usd - total_entry_usd;

    let average_quantity_per_company = if company_count > 0 {
        total_quantity / company_count as f64
    } else {
        0.0
    };

    let reports_supply = rows
        .iter()
        .any(|r| r.record.percent_of_supply.is_some_and(|p| p != 0.0));
    let supply_dominance_percent = if reports_supply {
        rows.iter()
            .map(|r| r.record.percent_of_supply.unwrap_or(0.0))
            .sum()
    } else {
        match asset.max_supply() {
            Some(max_supply) if max_supply > 0.0 => total_quantity / max_supply * 100.0,
            _ => 0.0,
        }
    };

    AggregateStats {
        asset,
        total_quantity,
        total_value_usd,
        total_entry_usd,
        total_pnl_usd,
        total_pnl_percent: pnl_percent(total_pnl_usd, total_entry_usd),
        average_quantity_per_company,
        company_count,
        supply_dominance_percent,
    }
}

/// Per-asset totals inside the combined view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AssetTotals {
    pub quantity: f64,
    pub entry_value_usd: f64,
    pub current_value_usd: f64,
    /// Companies holding a nonzero quantity of the asset.
    pub holder_count: usize,
}

/// Summary of the combined table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedStats {
    pub totals_by_asset: BTreeMap<Asset, AssetTotals>,
    pub total_entry_usd: f64,
    pub total_current_usd: f64,
    pub total_pnl_usd: f64,
    pub total_pnl_percent: f64,
    pub company_count: usize,
}

impl CombinedStats {
    pub fn total_quantity(&self, asset: Asset) -> f64 {
        self.totals_by_asset.get(&asset).map_or(0.0, |t| t.quantity)
    }

    /// Current value split by asset, as percentages of the combined value.
    pub fn asset_distribution(&self) -> BTreeMap<Asset, f64> {
        self.totals_by_asset
            .iter()
            .map(|(asset, totals)| {
                let share = if self.total_current_usd > 0.0 {
                    totals.current_value_usd / self.total_current_usd * 100.0
                } else {
                    0.0
                };
                (*asset, share)
            })
            .collect()
    }
}

pub fn combined_stats(rows: &[CombinedHoldingRecord]) -> CombinedStats {
    let mut totals_by_asset: BTreeMap<Asset, AssetTotals> =
        Asset::ALL.iter().map(|a| (*a, AssetTotals::default())).collect();

    for row in rows {
        for (asset, position) in [(Asset::Bitcoin, &row.bitcoin), (Asset::Ethereum, &row.ethereum)] {
            let totals = totals_by_asset.entry(asset).or_default();
            totals.quantity += position.quantity;
            totals.entry_value_usd += position.entry_value_usd;
            totals.current_value_usd += position.current_value_usd;
            if position.quantity > 0.0 {
                totals.holder_count += 1;
            }
        }
    }

    let total_entry_usd: f64 = rows.iter().map(|r| r.combined_entry_usd).sum();
    let total_current_usd: f64 = rows.iter().map(|r| r.combined_current_usd).sum();
    let total_pnl_usd = total_current_usd - total_entry_usd;

    CombinedStats {
        totals_by_asset,
        total_entry_usd,
        total_current_usd,
        total_pnl_usd,
        total_pnl_percent: pnl_percent(total_pnl_usd, total_entry_usd),
        company_count: rows.len(),
    }
}

/// Largest holdings by current USD value, for the top-companies bar chart.
pub fn top_by_current_value(rows: &[EnrichedHoldingRecord], n: usize) -> Vec<&EnrichedHoldingRecord> {
    let mut sorted: Vec<&EnrichedHoldingRecord> = rows.iter().collect();
    sorted.sort_by(|a, b| b.current_value_usd().total_cmp(&a.current_value_usd()));
    sorted.truncate(n);
    sorted
}

/// Same as [`top_by_current_value`] for the combined table.
pub fn top_combined_by_current_value(
    rows: &[CombinedHoldingRecord],
    n: usize,
) -> Vec<&CombinedHoldingRecord> {
    let mut sorted: Vec<&CombinedHoldingRecord> = rows.iter().collect();
    sorted.sort_by(|a, b| b.combined_current_usd.total_cmp(&a.combined_current_usd));
    sorted.truncate(n);
    sorted
}
