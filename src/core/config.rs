use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_FX_URL: &str = "https://open.er-api.com";
pub const API_KEY_ENV: &str = "COINGECKO_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FxProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coingecko: Option<CoinGeckoProviderConfig>,
    pub fx: Option<FxProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko: Some(CoinGeckoProviderConfig {
                base_url: DEFAULT_COINGECKO_URL.to_string(),
                api_key: None,
            }),
            fx: Some(FxProviderConfig {
                base_url: DEFAULT_FX_URL.to_string(),
            }),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_top_n() -> usize {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            currency: default_currency(),
            cache_ttl_secs: default_cache_ttl_secs(),
            top_n: default_top_n(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or defaults if no file exists.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "treasury", "treasury")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn coingecko_base_url(&self) -> &str {
        self.providers
            .coingecko
            .as_ref()
            .map_or(DEFAULT_COINGECKO_URL, |p| &p.base_url)
    }

    pub fn fx_base_url(&self) -> &str {
        self.providers
            .fx
            .as_ref()
            .map_or(DEFAULT_FX_URL, |p| &p.base_url)
    }

    /// API key from the config file, else from `COINGECKO_API_KEY`.
    pub fn coingecko_api_key(&self) -> Option<String> {
        self.providers
            .coingecko
            .as_ref()
            .and_then(|p| p.api_key.clone())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "EUR"
cache_ttl_secs: 60
top_n: 5
providers:
  coingecko:
    base_url: "http://example.com/coingecko"
    api_key: "secret"
  fx:
    base_url: "http://example.com/fx"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.top_n, 5);
        assert_eq!(config.coingecko_base_url(), "http://example.com/coingecko");
        assert_eq!(config.fx_base_url(), "http://example.com/fx");
        assert_eq!(config.coingecko_api_key(), Some("secret".to_string()));
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.currency, "USD");
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.coingecko_base_url(), DEFAULT_COINGECKO_URL);
        assert_eq!(config.fx_base_url(), DEFAULT_FX_URL);

        let partial: AppConfig = serde_yaml::from_str(
            r#"
providers:
  fx:
    base_url: "http://localhost:9999"
"#,
        )
        .unwrap();
        assert!(partial.providers.coingecko.is_none());
        assert_eq!(partial.coingecko_base_url(), DEFAULT_COINGECKO_URL);
        assert_eq!(partial.fx_base_url(), "http://localhost:9999");
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        fs::write(file.path(), "currency: \"GBP\"\n")?;

        let config = AppConfig::load_from_path(file.path())?;
        assert_eq!(config.currency, "GBP");

        let missing = AppConfig::load_from_path(file.path().with_extension("missing"));
        assert!(missing.is_err());
        Ok(())
    }
}
