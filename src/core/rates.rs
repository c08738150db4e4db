//! Rate and fee tables, and the snapshots that carry them.

use crate::core::currency::Currency;
use crate::core::provider::{ProviderId, list_providers};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

const NOT_DEFINED: &str = "not_defined";

/// Conversion factors for one provider and currency.
///
/// `calculation` drives the cost; `display` is what the provider advertises.
/// The two are kept apart on purpose, they do not always agree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub calculation: f64,
    pub display: f64,
}

impl RateEntry {
    pub const fn new(calculation: f64, display: f64) -> Self {
        Self {
            calculation,
            display,
        }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// A provider's flat transfer fee, in settlement currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FeeRepr", into = "FeeRepr")]
pub enum Fee {
    Flat(f64),
    /// The provider does not publish its fee.
    Undisclosed,
}

impl Fee {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Fee::Flat(amount) => Some(*amount),
            Fee::Undisclosed => None,
        }
    }
}

impl Display for Fee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fee::Flat(amount) => write!(f, "{amount}"),
            Fee::Undisclosed => write!(f, "{NOT_DEFINED}"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FeeRepr {
    Amount(f64),
    Tag(String),
}

impl TryFrom<FeeRepr> for Fee {
    type Error = anyhow::Error;

    fn try_from(repr: FeeRepr) -> Result<Self, Self::Error> {
        match repr {
            FeeRepr::Amount(amount) if amount >= 0.0 => Ok(Fee::Flat(amount)),
            FeeRepr::Amount(amount) => Err(anyhow!("Negative fee: {}", amount)),
            FeeRepr::Tag(tag) if tag == NOT_DEFINED => Ok(Fee::Undisclosed),
            FeeRepr::Tag(tag) => Err(anyhow!("Invalid fee: {}", tag)),
        }
    }
}

impl From<Fee> for FeeRepr {
    fn from(fee: Fee) -> Self {
        match fee {
            Fee::Flat(amount) => FeeRepr::Amount(amount),
            Fee::Undisclosed => FeeRepr::Tag(NOT_DEFINED.to_string()),
        }
    }
}

pub type RateTable = BTreeMap<ProviderId, BTreeMap<Currency, RateEntry>>;
pub type FeeTable = BTreeMap<ProviderId, Fee>;

/// An immutable bundle of rates and fees.
///
/// Snapshots coming from a remote source may be partial; the store fills the
/// gaps from the compiled-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatesSnapshot {
    #[serde(default)]
    pub rates: RateTable,
    #[serde(default)]
    pub fees: FeeTable,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl RatesSnapshot {
    /// The complete compiled-in snapshot.
    pub fn defaults() -> Self {
        let rates = list_providers()
            .iter()
            .map(|p| {
                let per_currency = Currency::ALL
                    .iter()
                    .map(|c| (*c, default_rate(p.id, *c)))
                    .collect();
                (p.id, per_currency)
            })
            .collect();
        let fees = list_providers()
            .iter()
            .map(|p| (p.id, default_fee(p.id)))
            .collect();

        Self {
            rates,
            fees,
            last_updated: None,
        }
    }

    pub fn rate(&self, provider: ProviderId, currency: Currency) -> Option<RateEntry> {
        self.rates
            .get(&provider)
            .and_then(|per_currency| per_currency.get(&currency))
            .copied()
    }

    pub fn fee(&self, provider: ProviderId) -> Option<Fee> {
        self.fees.get(&provider).copied()
    }
}

/// Compiled-in fee for a provider.
pub fn default_fee(provider: ProviderId) -> Fee {
    match provider {
        ProviderId::Djamo => Fee::Flat(200.0),
        ProviderId::DjamoSn => Fee::Flat(200.0),
        ProviderId::Wave => Fee::Flat(0.0),
        ProviderId::PushCi => Fee::Flat(290.0),
        ProviderId::Orange => Fee::Undisclosed,
        ProviderId::Nafolo => Fee::Flat(0.0),
    }
}

/// Compiled-in rate for a provider and currency.
pub fn default_rate(provider: ProviderId, currency: Currency) -> RateEntry {
    match (provider, currency) {
        (_, Currency::Xof) => RateEntry::identity(),
        (ProviderId::Djamo, Currency::Eur) => RateEntry::new(682.0, 682.0),
        (ProviderId::Djamo, Currency::Usd) => RateEntry::new(603.0, 603.0),
        (ProviderId::DjamoSn, Currency::Eur) => RateEntry::new(676.0, 676.0),
        (ProviderId::DjamoSn, Currency::Usd) => RateEntry::new(601.0, 601.0),
        (ProviderId::Wave, Currency::Eur) => RateEntry::new(675.68, 676.0),
        (ProviderId::Wave, Currency::Usd) => RateEntry::new(594.3, 594.0),
        (ProviderId::PushCi, Currency::Eur) => RateEntry::new(685.0, 685.0),
        (ProviderId::PushCi, Currency::Usd) => RateEntry::new(611.0, 611.0),
        (ProviderId::Orange, Currency::Eur) => RateEntry::new(669.754, 669.754),
        (ProviderId::Orange, Currency::Usd) => RateEntry::new(585.773, 585.773),
        (ProviderId::Nafolo, Currency::Eur) => RateEntry::new(693.0, 693.0),
        (ProviderId::Nafolo, Currency::Usd) => RateEntry::new(605.0, 605.0),
    }
}
