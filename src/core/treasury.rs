//! Treasury data source abstraction

use crate::core::asset::Asset;
use crate::core::normalize::TreasuryPayload;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TreasuryProvider: Send + Sync {
    async fn fetch_treasury(&self, asset: Asset) -> Result<TreasuryPayload>;
}
