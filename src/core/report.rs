//! End-to-end pipeline from raw payloads to display-ready reports.
//!
//! A missing payload (fetch failure) is treated the same as an empty one so that
//! one asset being unavailable never prevents the other from being shown.
use crate::core::asset::Asset;
use crate::core::holding::{CombinedHoldingRecord, EnrichedHoldingRecord};
use crate::core::merge::{AssetTable, merge};
use crate::core::metrics::enrich_all;
use crate::core::normalize::{TreasuryPayload, TreasurySnapshot, normalize};
use crate::core::stats::{AggregateStats, CombinedStats, asset_stats, combined_stats};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetReport {
    pub asset: Asset,
    pub rows: Vec<EnrichedHoldingRecord>,
    pub stats: AggregateStats,
    pub reported_total_holdings: Option<f64>,
    pub reported_total_value_usd: Option<f64>,
}

impl AssetReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn table(&self) -> AssetTable<'_> {
        AssetTable::new(self.asset, &self.rows)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedReport {
    pub rows: Vec<CombinedHoldingRecord>,
    pub stats: CombinedStats,
}

pub fn build_asset_report(asset: Asset, payload: Option<&TreasuryPayload>) -> AssetReport {
    let snapshot = payload.map_or_else(|| TreasurySnapshot::empty(asset), |p| normalize(asset, p));
    let rows = enrich_all(snapshot.companies);
    let stats = asset_stats(asset, &rows);

    AssetReport {
        asset,
        rows,
        stats,
        reported_total_holdings: snapshot.reported_total_holdings,
        reported_total_value_usd: snapshot.reported_total_value_usd,
    }
}

pub fn build_combined_report(first: &AssetReport, second: &AssetReport) -> CombinedReport {
    let rows = merge(first.table(), second.table());
    let stats = combined_stats(&rows);
    CombinedReport { rows, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::FxRateTable;
    use crate::core::format::{format_currency, format_percent};
    use crate::core::holding::AssetPosition;
    use serde_json::json;

    fn btc_payload() -> TreasuryPayload {
        TreasuryPayload::from_value(json!({
            "total_holdings": 1500,
            "companies": [
                {
                    "name": "B",
                    "symbol": "B.US",
                    "country": "US",
                    "total_holdings": 500,
                    "total_entry_value_usd": 20_000_000,
                    "total_current_value_usd": 10_000_000
                },
                {
                    "name": "A",
                    "symbol": "A.US",
                    "country": "US",
                    "total_holdings": 1000,
                    "total_entry_value_usd": 30_000_000,
                    "total_current_value_usd": 50_000_000
                }
            ]
        }))
    }

    #[test]
    fn test_btc_report_end_to_end() {
        let report = build_asset_report(Asset::Bitcoin, Some(&btc_payload()));
        let rates = FxRateTable::from_usd_rates(vec![("USD", 1.0)]);

        assert_eq!(report.rows.len(), 2);
        let a = &report.rows[0];
        let b = &report.rows[1];

        assert_eq!(a.record.name, "A");
        assert_eq!(a.pnl_usd, 20_000_000.0);
        assert_eq!(format_percent(a.pnl_percent, 2), "66.67%");
        assert_eq!(format_currency(a.current_value_usd(), "USD", &rates), "$50.00M");

        assert_eq!(b.record.name, "B");
        assert_eq!(b.pnl_usd, -10_000_000.0);
        assert_eq!(format_percent(b.pnl_percent, 2), "-50.00%");

        assert_eq!(report.stats.total_quantity, 1500.0);
        assert_eq!(report.reported_total_holdings, Some(1500.0));
    }

    #[test]
    fn test_merge_with_empty_eth_report() {
        let btc = build_asset_report(Asset::Bitcoin, Some(&btc_payload()));
        let eth = build_asset_report(Asset::Ethereum, None);
        assert!(eth.is_empty());

        let combined = build_combined_report(&btc, &eth);
        assert_eq!(combined.rows.len(), 2);

        for row in &combined.rows {
            assert_eq!(row.ethereum, AssetPosition::default());
            let source = btc
                .rows
                .iter()
                .find(|r| r.record.name == row.name)
                .unwrap();
            assert_eq!(row.combined_current_usd, source.current_value_usd());
        }
        assert_eq!(combined.stats.company_count, 2);
    }

    #[test]
    fn test_missing_payload_gives_empty_aggregates() {
        let report = build_asset_report(Asset::Ethereum, None);
        assert!(report.rows.is_empty());
        assert_eq!(report.stats.company_count, 0);
        assert_eq!(report.stats.average_quantity_per_company, 0.0);
        assert_eq!(report.reported_total_holdings, None);
    }
}
