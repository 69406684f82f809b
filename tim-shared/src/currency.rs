use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display currency. Catalog prices are always EUR; other currencies are a
/// fixed-rate conversion for display only and are never charged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Currency {
    #[default]
    Eur,
    Gbp,
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Usd => "$",
        }
    }

    fn rate(&self) -> f64 {
        match self {
            Currency::Eur => 1.0,
            Currency::Gbp => 0.85,
            Currency::Usd => 1.10,
        }
    }

    /// Convert a whole-euro amount, rounded to whole units.
    pub fn convert(&self, amount_eur: u32) -> u32 {
        (amount_eur as f64 * self.rate()).round() as u32
    }

    pub fn format(&self, amount_eur: u32) -> String {
        format!("{}{}", self.symbol(), self.convert(amount_eur))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown currency: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "USD" => Ok(Currency::Usd),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }
}
