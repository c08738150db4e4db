//! Ranks providers by what the recipient side is charged.
use crate::core::currency::Currency;
use crate::core::fees::{FeeBreakdown, resolve_breakdown};
use crate::core::provider::{CountryFilter, Provider, list_providers};
use crate::core::rates::{Fee, RatesSnapshot, default_fee};
use crate::core::store::RateStore;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use tracing::debug;

/// Conversion cost plus flat fee. An undisclosed fee ranks after every amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TotalCharge {
    Amount(f64),
    Undisclosed,
}

impl Serialize for TotalCharge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TotalCharge::Amount(amount) => serializer.serialize_f64(*amount),
            TotalCharge::Undisclosed => serializer.serialize_none(),
        }
    }
}

impl TotalCharge {
    pub fn amount(&self) -> Option<f64> {
        match self {
            TotalCharge::Amount(amount) => Some(*amount),
            TotalCharge::Undisclosed => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, TotalCharge::Amount(_))
    }

    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (TotalCharge::Amount(a), TotalCharge::Amount(b)) => a.total_cmp(b),
            (TotalCharge::Amount(_), TotalCharge::Undisclosed) => Ordering::Less,
            (TotalCharge::Undisclosed, TotalCharge::Amount(_)) => Ordering::Greater,
            (TotalCharge::Undisclosed, TotalCharge::Undisclosed) => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub provider: &'static Provider,
    pub breakdown: FeeBreakdown,
    pub fee: Fee,
    pub total_charge: TotalCharge,
    /// 1-based position in the ranking.
    pub rank: usize,
    pub is_cheapest: bool,
    /// Extra cost compared to the cheapest entry. `None` for the cheapest
    /// itself and whenever either side has an undisclosed fee.
    pub savings: Option<f64>,
}

/// Ranks every provider matching `filter` using the store's current rates.
///
/// Rates and fees come from one read of the store, so a concurrent replace is
/// either fully visible or not at all.
pub fn compare(
    store: &RateStore,
    amount: f64,
    currency: Currency,
    filter: CountryFilter,
) -> Vec<ComparisonResult> {
    let snapshot = store.snapshot();
    rank(&snapshot, amount, currency, filter)
}

/// Ranks every provider matching `filter` against a fixed snapshot.
pub fn rank(
    snapshot: &RatesSnapshot,
    amount: f64,
    currency: Currency,
    filter: CountryFilter,
) -> Vec<ComparisonResult> {
    let mut results: Vec<ComparisonResult> = list_providers()
        .iter()
        .filter(|p| filter.matches(p))
        .map(|p| {
            let breakdown = resolve_breakdown(amount, currency, p.id, snapshot);
            let fee = snapshot.fee(p.id).unwrap_or_else(|| default_fee(p.id));
            let total_charge = match fee {
                Fee::Flat(fee) => TotalCharge::Amount(breakdown.total_cost as f64 + fee),
                Fee::Undisclosed => TotalCharge::Undisclosed,
            };
            ComparisonResult {
                provider: p,
                breakdown,
                fee,
                total_charge,
                rank: 0,
                is_cheapest: false,
                savings: None,
            }
        })
        .collect();

    // Vec::sort_by is stable: ties keep registry order.
    results.sort_by(|a, b| a.total_charge.total_cmp(&b.total_charge));

    let cheapest = results.iter().position(|r| r.total_charge.is_finite());
    let cheapest_charge = cheapest.and_then(|i| results[i].total_charge.amount());

    for (index, result) in results.iter_mut().enumerate() {
        result.rank = index + 1;
        result.is_cheapest = Some(index) == cheapest;
        if !result.is_cheapest {
            result.savings = match (result.total_charge.amount(), cheapest_charge) {
                (Some(charge), Some(best)) => Some(charge - best),
                _ => None,
            };
        }
    }

    debug!(
        %currency,
        %filter,
        amount,
        count = results.len(),
        cheapest = ?cheapest.map(|i| results[i].provider.id),
        "Ranked providers"
    );
    results
}

/// A provider's advertised rate for one currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    pub provider: &'static Provider,
    pub display_rate: f64,
    pub is_best: bool,
}

/// Lists every provider's display rate for `currency`, lowest first.
pub fn rank_rates(snapshot: &RatesSnapshot, currency: Currency) -> Vec<RateQuote> {
    let mut quotes: Vec<RateQuote> = list_providers()
        .iter()
        .map(|p| RateQuote {
            provider: p,
            display_rate: resolve_breakdown(1.0, currency, p.id, snapshot).display_rate,
            is_best: false,
        })
        .collect();
    quotes.sort_by(|a, b| a.display_rate.total_cmp(&b.display_rate));

    let best = quotes
        .iter()
        .map(|q| q.display_rate)
        .filter(|r| *r > 0.0)
        .min_by(|a, b| a.total_cmp(b));
    if let Some(best) = best {
        for quote in quotes.iter_mut() {
            quote.is_best = quote.display_rate == best;
        }
    }
    quotes
}
