//! Per-provider cost of a conversion.

use crate::core::currency::Currency;
use crate::core::provider::ProviderId;
use crate::core::rates::{RateEntry, RatesSnapshot, default_rate};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeBreakdown {
    pub calculation_rate: f64,
    pub display_rate: f64,
    /// Converted amount in settlement currency, rounded to whole units.
    pub total_cost: i64,
}

/// Computes the conversion cost of `amount` for a provider.
///
/// Rates missing from `snapshot` fall back to the compiled-in table, so this
/// never fails for a provider and currency from the closed sets.
pub fn resolve_breakdown(
    amount: f64,
    currency: Currency,
    provider: ProviderId,
    snapshot: &RatesSnapshot,
) -> FeeBreakdown {
    let rate = if currency.is_settlement() {
        RateEntry::identity()
    } else {
        snapshot
            .rate(provider, currency)
            .unwrap_or_else(|| default_rate(provider, currency))
    };

    FeeBreakdown {
        calculation_rate: rate.calculation,
        display_rate: rate.display,
        total_cost: round_units(amount, rate.calculation),
    }
}

/// `amount * rate` rounded half away from zero.
fn round_units(amount: f64, rate: f64) -> i64 {
    let exact = match (Decimal::from_f64(amount), Decimal::from_f64(rate)) {
        (Some(a), Some(r)) => a
            .checked_mul(r)
            .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|v| v.to_i64()),
        _ => None,
    };
    // Out of decimal range: f64::round is also half away from zero.
    exact.unwrap_or_else(|| (amount * rate).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::list_providers;
    use std::collections::BTreeMap;

    #[test]
    fn test_default_rates_round_trip() {
        let defaults = RatesSnapshot::defaults();
        for p in list_providers() {
            for c in [Currency::Eur, Currency::Usd] {
                let breakdown = resolve_breakdown(1.0, c, p.id, &defaults);
                let expected = default_rate(p.id, c);
                assert_eq!(breakdown.calculation_rate, expected.calculation);
                assert_eq!(breakdown.display_rate, expected.display);
            }
        }
    }

    #[test]
    fn test_eur_examples() {
        let defaults = RatesSnapshot::defaults();
        let wave = resolve_breakdown(50.0, Currency::Eur, ProviderId::Wave, &defaults);
        let djamo = resolve_breakdown(50.0, Currency::Eur, ProviderId::Djamo, &defaults);
        assert_eq!(wave.total_cost, 33784);
        assert_eq!(djamo.total_cost, 34100);
        assert_eq!(wave.display_rate, 676.0);
    }

    #[test]
    fn test_settlement_currency_is_identity() {
        let breakdown = resolve_breakdown(
            1500.0,
            Currency::Xof,
            ProviderId::Orange,
            &RatesSnapshot::defaults(),
        );
        assert_eq!(breakdown.total_cost, 1500);
        assert_eq!(breakdown.calculation_rate, 1.0);
        assert_eq!(breakdown.display_rate, 1.0);
    }

    #[test]
    fn test_missing_pair_falls_back_to_default() {
        let empty = RatesSnapshot::default();
        let breakdown = resolve_breakdown(10.0, Currency::Usd, ProviderId::PushCi, &empty);
        assert_eq!(breakdown.total_cost, 6110);
    }

    #[test]
    fn test_override_rate_is_used() {
        let snapshot = RatesSnapshot {
            rates: BTreeMap::from([(
                ProviderId::Wave,
                BTreeMap::from([(Currency::Usd, RateEntry::new(600.0, 599.0))]),
            )]),
            ..Default::default()
        };
        let breakdown = resolve_breakdown(2.0, Currency::Usd, ProviderId::Wave, &snapshot);
        assert_eq!(breakdown.total_cost, 1200);
        assert_eq!(breakdown.display_rate, 599.0);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(round_units(0.5, 1.0), 1);
        assert_eq!(round_units(2.5, 1.0), 3);
        assert_eq!(round_units(1.0, 669.754), 670);
        // 0.1 * 5 is exactly 0.5 in decimal arithmetic.
        assert_eq!(round_units(0.1, 5.0), 1);
        assert_eq!(round_units(10.0, 585.773), 5858);
    }
}
