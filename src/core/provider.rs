//! Static registry of transfer providers.
//!
//! The registry is fixed at compile time. Its order is significant: it is the
//! tie-break order when two providers end up with the same total charge.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Djamo,
    DjamoSn,
    Wave,
    PushCi,
    Orange,
    Nafolo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Djamo => "djamo",
            ProviderId::DjamoSn => "djamosn",
            ProviderId::Wave => "wave",
            ProviderId::PushCi => "pushci",
            ProviderId::Orange => "orange",
            ProviderId::Nafolo => "nafolo",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "djamo" => Ok(ProviderId::Djamo),
            "djamosn" => Ok(ProviderId::DjamoSn),
            "wave" => Ok(ProviderId::Wave),
            "pushci" => Ok(ProviderId::PushCi),
            "orange" => Ok(ProviderId::Orange),
            "nafolo" => Ok(ProviderId::Nafolo),
            _ => Err(anyhow!("Unknown provider: {}", s)),
        }
    }
}

/// Region a provider operates in. `All` marks providers serving every region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Sn,
    Ci,
    All,
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Sn => "SN",
                Region::Ci => "CI",
                Region::All => "ALL",
            }
        )
    }
}

/// Restricts a comparison to the providers serving one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CountryFilter {
    #[default]
    All,
    Only(Region),
}

impl CountryFilter {
    /// Region-bound providers must match; providers serving all regions always do.
    pub fn matches(&self, provider: &Provider) -> bool {
        match self {
            CountryFilter::All => true,
            CountryFilter::Only(region) => {
                provider.country == *region || provider.country == Region::All
            }
        }
    }
}

impl FromStr for CountryFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(CountryFilter::All),
            "SN" => Ok(CountryFilter::Only(Region::Sn)),
            "CI" => Ok(CountryFilter::Only(Region::Ci)),
            _ => Err(anyhow!("Invalid country filter: {}", s)),
        }
    }
}

impl TryFrom<String> for CountryFilter {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CountryFilter> for String {
    fn from(filter: CountryFilter) -> Self {
        filter.to_string()
    }
}

impl Display for CountryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountryFilter::All => write!(f, "all"),
            CountryFilter::Only(region) => write!(f, "{}", region.to_string().to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: &'static str,
    pub country: Region,
}

static PROVIDERS: [Provider; 6] = [
    Provider {
        id: ProviderId::Djamo,
        name: "Djamo CI",
        country: Region::Ci,
    },
    Provider {
        id: ProviderId::DjamoSn,
        name: "Djamo SN",
        country: Region::Sn,
    },
    Provider {
        id: ProviderId::Wave,
        name: "Wave",
        country: Region::All,
    },
    Provider {
        id: ProviderId::PushCi,
        name: "PushCI",
        country: Region::Ci,
    },
    Provider {
        id: ProviderId::Orange,
        name: "Orange Money Senegal",
        country: Region::Sn,
    },
    Provider {
        id: ProviderId::Nafolo,
        name: "Nafolo CI",
        country: Region::Ci,
    },
];

/// All providers, in registry order.
pub fn list_providers() -> &'static [Provider] {
    &PROVIDERS
}

pub fn provider(id: ProviderId) -> &'static Provider {
    // ProviderId variants are declared in registry order.
    &PROVIDERS[id as usize]
}
