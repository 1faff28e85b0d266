use crate::core::{FxRateProvider, FxRateTable};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: String,
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
}

/// USD-based fiat rates from the open exchange-rate API (no key required).
pub struct ErApiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl ErApiProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("treasury/1.0")
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl FxRateProvider for ErApiProvider {
    async fn fetch_rates(&self) -> Result<FxRateTable> {
        let url = format!("{}/v6/latest/USD", self.base_url);
        debug!("Requesting FX rates from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send FX rate request")?
            .error_for_status()
            .context("FX rate request failed")?;

        let latest: LatestRatesResponse = response
            .json()
            .await
            .context("Failed to parse FX rate response")?;

        if latest.result != "success" {
            return Err(anyhow!("FX rate API returned result '{}'", latest.result));
        }
        let rates = latest
            .rates
            .ok_or_else(|| anyhow!("FX rate response has no rates"))?;

        let table = FxRateTable::from_usd_rates(rates);
        debug!("Resolved FX rates: {:?}", table);
        Ok(table)
    }
}
