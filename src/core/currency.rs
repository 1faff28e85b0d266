//! Fiat currencies, USD-based rate tables and the rate provider abstraction

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Display currencies supported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Cad,
        Currency::Aud,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
            Currency::Cad => "C$",
            Currency::Aud => "A$",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            "CAD" => Ok(Currency::Cad),
            "AUD" => Ok(Currency::Aud),
            _ => Err(anyhow::anyhow!("Unsupported currency: {}", s)),
        }
    }
}

/// Rates per one USD for every supported currency.
///
/// USD is always 1.0. A currency that could not be resolved is kept with a rate
/// of 0.0 rather than dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FxRateTable {
    rates: BTreeMap<Currency, f64>,
}

impl FxRateTable {
    /// Table used when no rates could be fetched.
    pub fn unavailable() -> Self {
        Self::from_usd_rates(std::iter::empty::<(&str, f64)>())
    }

    /// Builds a table from `(code, rate)` pairs quoted against USD. Unknown codes
    /// are ignored; missing, zero, negative or non-finite rates become 0.0.
    pub fn from_usd_rates<I, S>(quotes: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut rates: BTreeMap<Currency, f64> =
            Currency::ALL.iter().map(|c| (*c, 0.0)).collect();

        for (code, rate) in quotes {
            if let Ok(currency) = code.as_ref().parse::<Currency>() {
                let rate = if rate.is_finite() && rate > 0.0 {
                    rate
                } else {
                    0.0
                };
                rates.insert(currency, rate);
            }
        }
        rates.insert(Currency::Usd, 1.0);

        Self { rates }
    }

    /// Rate for a currency code. Codes outside the supported set convert 1:1.
    pub fn rate(&self, code: &str) -> f64 {
        code.parse::<Currency>()
            .ok()
            .and_then(|c| self.rates.get(&c).copied())
            .unwrap_or(1.0)
    }

    pub fn is_available(&self, currency: Currency) -> bool {
        self.rates.get(&currency).is_some_and(|r| *r > 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        self.rates.iter().map(|(c, r)| (*c, *r))
    }
}

impl Default for FxRateTable {
    fn default() -> Self {
        Self::unavailable()
    }
}

#[async_trait]
pub trait FxRateProvider: Send + Sync {
    async fn fetch_rates(&self) -> Result<FxRateTable>;
}
