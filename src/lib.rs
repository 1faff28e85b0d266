pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::holdings::{AssetView, HoldingsData, HoldingsOptions};
use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::{Currency, FxRateTable, TreasuryPayload};
use crate::providers::caching::{CachingFxRateProvider, CachingTreasuryProvider};
use crate::providers::coingecko::CoinGeckoProvider;
use crate::providers::er_api::ErApiProvider;
use crate::store::MemoryCache;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Holdings {
        view: AssetView,
        currency: Option<String>,
        json: bool,
    },
    Rates,
}

/// Configured providers sharing one set of caches. Fetches made through the same
/// `App` within the cache TTL are served from memory.
pub struct App {
    config: AppConfig,
    treasury_provider: CachingTreasuryProvider<CoinGeckoProvider>,
    fx_provider: CachingFxRateProvider<ErApiProvider>,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let ttl = config.cache_ttl();

        let treasury_cache: Arc<dyn Cache<String, TreasuryPayload>> =
            Arc::new(MemoryCache::<String, TreasuryPayload>::new());
        let treasury_provider = CachingTreasuryProvider::new(
            CoinGeckoProvider::new(config.coingecko_base_url(), config.coingecko_api_key())?,
            treasury_cache,
            ttl,
        );

        let fx_cache: Arc<dyn Cache<String, FxRateTable>> =
            Arc::new(MemoryCache::<String, FxRateTable>::new());
        let fx_provider =
            CachingFxRateProvider::new(ErApiProvider::new(config.fx_base_url())?, fx_cache, ttl);

        Ok(Self {
            config,
            treasury_provider,
            fx_provider,
        })
    }

    /// Loads the config at `config_path`, or the default location.
    pub fn from_config_path(config_path: Option<&str>) -> Result<Self> {
        let config = match config_path {
            Some(path) => AppConfig::load_from_path(path)?,
            None => AppConfig::load()?,
        };
        debug!("Loaded config: {config:#?}");
        Self::new(config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn fetch_holdings(&self, view: AssetView) -> HoldingsData {
        cli::holdings::fetch_holdings(&self.treasury_provider, &self.fx_provider, view).await
    }

    pub async fn run(&self, command: AppCommand) -> Result<()> {
        match command {
            AppCommand::Holdings {
                view,
                currency,
                json,
            } => {
                let code = currency.unwrap_or_else(|| self.config.currency.clone());
                let currency: Currency = code
                    .parse()
                    .with_context(|| format!("Invalid display currency '{code}'"))?;

                let options = HoldingsOptions {
                    view,
                    currency: currency.code(),
                    top_n: self.config.top_n,
                    json,
                };
                cli::holdings::run(&self.treasury_provider, &self.fx_provider, &options).await
            }
            AppCommand::Rates => cli::rates::run(&self.fx_provider).await,
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Treasury tracker starting...");
    App::from_config_path(config_path)?.run(command).await
}
