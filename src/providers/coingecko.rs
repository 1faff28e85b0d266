use crate::core::{Asset, TreasuryPayload, TreasuryProvider};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, error, instrument};

const API_KEY_HEADER: &str = "x-cg-api-key";

/// Fetches public-company treasury documents from the CoinGecko API.
pub struct CoinGeckoProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("treasury/1.0")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }
}

#[async_trait]
impl TreasuryProvider for CoinGeckoProvider {
    #[instrument(skip(self))]
    async fn fetch_treasury(&self, asset: Asset) -> Result<TreasuryPayload> {
        let url = format!("{}/companies/public_treasury/{}", self.base_url, asset.id());
        debug!("Requesting treasury data from {}", url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send treasury request for {asset}"))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for {asset}"))?;

        if !status.is_success() {
            error!(%status, response = %response_text, "Treasury API returned an error");
            return Err(anyhow!("API Error: {} - {}", status.as_u16(), response_text));
        }

        let payload: TreasuryPayload = serde_json::from_str(&response_text)
            .with_context(|| format!("Failed to parse treasury response for {asset}"))?;
        debug!(
            "Fetched {} companies for {}",
            payload.companies.as_ref().map_or(0, Vec::len),
            asset
        );
        Ok(payload)
    }
}
