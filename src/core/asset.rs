//! Tracked crypto assets

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Bitcoin has a hard cap of 21 million coins.
pub const BITCOIN_MAX_SUPPLY: f64 = 21_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Bitcoin,
    Ethereum,
}

impl Asset {
    pub const ALL: [Asset; 2] = [Asset::Bitcoin, Asset::Ethereum];

    /// Identifier used by the treasury API and as key in nested `total_holdings`.
    pub fn id(&self) -> &'static str {
        match self {
            Asset::Bitcoin => "bitcoin",
            Asset::Ethereum => "ethereum",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Asset::Bitcoin => "BTC",
            Asset::Ethereum => "ETH",
        }
    }

    /// Fixed maximum supply, if the asset has one. Ethereum is uncapped.
    pub fn max_supply(&self) -> Option<f64> {
        match self {
            Asset::Bitcoin => Some(BITCOIN_MAX_SUPPLY),
            Asset::Ethereum => None,
        }
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Asset::Bitcoin => "Bitcoin",
                Asset::Ethereum => "Ethereum",
            }
        )
    }
}

impl FromStr for Asset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "btc" | "bitcoin" => Ok(Asset::Bitcoin),
            "eth" | "ethereum" => Ok(Asset::Ethereum),
            _ => Err(anyhow::anyhow!("Invalid asset: {}", s)),
        }
    }
}
