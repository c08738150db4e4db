//! Holds the active rate overrides and merges them over the defaults.

use crate::core::rates::{FeeTable, RateTable, RatesSnapshot};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Thread-safe store of the most recent override snapshot.
///
/// Overrides are swapped as a whole reference, so a reader sees either the
/// previous or the new snapshot and never a mix of both. The lock is only held
/// for the pointer swap or clone; merging happens outside of it.
pub struct RateStore {
    overrides: RwLock<Option<Arc<RatesSnapshot>>>,
}

impl RateStore {
    /// A store serving the compiled-in defaults only.
    pub fn new() -> Self {
        Self {
            overrides: RwLock::new(None),
        }
    }

    pub fn with_overrides(snapshot: RatesSnapshot) -> Self {
        Self {
            overrides: RwLock::new(Some(Arc::new(snapshot))),
        }
    }

    /// Replaces the overrides wholesale. `None` falls back to defaults only.
    pub fn replace(&self, snapshot: Option<RatesSnapshot>) {
        let next = snapshot.map(Arc::new);
        debug!(
            has_overrides = next.is_some(),
            last_updated = ?next.as_ref().and_then(|s| s.last_updated),
            "Replacing rate overrides"
        );
        *self
            .overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub fn overrides(&self) -> Option<Arc<RatesSnapshot>> {
        self.overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merged fees: defaults with every overridden provider replaced.
    pub fn fees(&self) -> FeeTable {
        self.snapshot().fees
    }

    /// Merged rates, per provider and per currency.
    pub fn rates(&self) -> RateTable {
        self.snapshot().rates
    }

    /// A complete view of rates and fees taken from a single read of the
    /// overrides.
    pub fn snapshot(&self) -> RatesSnapshot {
        merge(self.overrides().as_deref())
    }
}

impl Default for RateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(overrides: Option<&RatesSnapshot>) -> RatesSnapshot {
    let mut merged = RatesSnapshot::defaults();
    let Some(overrides) = overrides else {
        return merged;
    };

    for (provider, per_currency) in &overrides.rates {
        let Some(target) = merged.rates.get_mut(provider) else {
            continue;
        };
        for (currency, entry) in per_currency {
            if let Some(slot) = target.get_mut(currency) {
                *slot = *entry;
            }
        }
    }
    for (provider, fee) in &overrides.fees {
        if let Some(slot) = merged.fees.get_mut(provider) {
            *slot = *fee;
        }
    }
    merged.last_updated = overrides.last_updated;
    merged
}
