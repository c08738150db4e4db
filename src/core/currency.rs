//! Currencies accepted by the comparison.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[serde(alias = "xof")]
    Xof,
    #[serde(alias = "eur")]
    Eur,
    #[serde(alias = "usd")]
    Usd,
}

impl Currency {
    /// Currency every charge is expressed in.
    pub const SETTLEMENT: Currency = Currency::Xof;

    pub const ALL: [Currency; 3] = [Currency::Xof, Currency::Eur, Currency::Usd];

    pub fn is_settlement(&self) -> bool {
        *self == Self::SETTLEMENT
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Xof => "XOF",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
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
        match s.trim().to_uppercase().as_str() {
            "XOF" => Ok(Currency::Xof),
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            _ => Err(anyhow!("Invalid currency: {}", s)),
        }
    }
}
