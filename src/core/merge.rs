//! Outer join of per-asset tables into the combined view
use crate::core::asset::Asset;
use crate::core::holding::{
    AssetPosition, CombinedHoldingRecord, CompanyKey, EnrichedHoldingRecord,
};
use crate::core::metrics::pnl_percent;
use std::collections::BTreeMap;
use tracing::debug;

/// Enriched rows for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetTable<'a> {
    pub asset: Asset,
    pub rows: &'a [EnrichedHoldingRecord],
}

impl<'a> AssetTable<'a> {
    pub fn new(asset: Asset, rows: &'a [EnrichedHoldingRecord]) -> Self {
        Self { asset, rows }
    }
}

#[derive(Default)]
struct Slots {
    bitcoin: AssetPosition,
    ethereum: AssetPosition,
}

impl Slots {
    fn position_mut(&mut self, asset: Asset) -> &mut AssetPosition {
        match asset {
            Asset::Bitcoin => &mut self.bitcoin,
            Asset::Ethereum => &mut self.ethereum,
        }
    }
}

/// Joins two asset tables on `(name, symbol, country)`.
///
/// Every key present in either table yields exactly one row; the side a company
/// is missing from is zero-filled. Rows come out ordered by key, so swapping
/// the arguments does not change the result.
pub fn merge(first: AssetTable<'_>, second: AssetTable<'_>) -> Vec<CombinedHoldingRecord> {
    let mut joined: BTreeMap<CompanyKey, Slots> = BTreeMap::new();

    for table in [&first, &second] {
        for row in table.rows {
            let position = joined
                .entry(row.record.key())
                .or_default()
                .position_mut(table.asset);
            position.quantity += row.record.holdings_quantity;
            position.entry_value_usd += row.entry_value_usd();
            position.current_value_usd += row.current_value_usd();
        }
    }

    debug!(
        "Merged {} {} rows and {} {} rows into {} companies",
        first.rows.len(),
        first.asset.code(),
        second.rows.len(),
        second.asset.code(),
        joined.len()
    );

    joined
        .into_iter()
        .map(|(key, slots)| combine(key, slots.bitcoin, slots.ethereum))
        .collect()
}

fn combine(key: CompanyKey, bitcoin: AssetPosition, ethereum: AssetPosition) -> CombinedHoldingRecord {
    let combined_entry_usd = bitcoin.entry_value_usd + ethereum.entry_value_usd;
    let combined_current_usd = bitcoin.current_value_usd + ethereum.current_value_usd;
    let combined_pnl_usd = combined_current_usd - combined_entry_usd;

    CombinedHoldingRecord {
        name: key.name,
        symbol: key.symbol,
        country: key.country,
        bitcoin,
        ethereum,
        combined_entry_usd,
        combined_current_usd,
        combined_pnl_usd,
        combined_pnl_percent: pnl_percent(combined_pnl_usd, combined_entry_usd),
    }
}
