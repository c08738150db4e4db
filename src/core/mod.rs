//! Rate resolution and provider ranking

pub mod comparison;
pub mod config;
pub mod currency;
pub mod fees;
pub mod log;
pub mod provider;
pub mod rates;
pub mod source;
pub mod store;
pub mod sync;

// Re-export main types for cleaner imports
pub use comparison::{ComparisonResult, RateQuote, TotalCharge, compare, rank, rank_rates};
pub use currency::Currency;
pub use fees::{FeeBreakdown, resolve_breakdown};
pub use provider::{CountryFilter, Provider, ProviderId, Region, list_providers};
pub use rates::{Fee, RateEntry, RatesSnapshot};
pub use source::{OnChange, RatesSource, Subscription};
pub use store::RateStore;
pub use sync::{RateSync, SyncStatus};
