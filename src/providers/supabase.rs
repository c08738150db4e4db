use crate::core::config::RemoteConfig;
use crate::core::currency::Currency;
use crate::core::provider::ProviderId;
use crate::core::rates::{Fee, RateEntry, RatesSnapshot};
use crate::core::source::{OnChange, RatesSource, Subscription};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

const SEND_RETRIES: usize = 2;
const RETRY_DELAY: Duration = Duration::from_millis(500);
use tracing::{debug, instrument, warn};

/// Row of the `exchange_rates` table.
#[derive(Debug, Deserialize)]
struct ExchangeRateRow {
    provider: String,
    currency: String,
    calculation_rate: f64,
    display_rate: f64,
    fee: Option<f64>,
    updated_at: String,
}

/// Reads active exchange rates from a Supabase (PostgREST) table.
///
/// Changes are detected by polling: the table is re-read every
/// `poll_interval` and subscribers hear about it only when the result differs
/// from the previous read.
#[derive(Clone)]
pub struct SupabaseSource {
    base_url: String,
    anon_key: String,
    table: String,
    poll_interval: Duration,
    client: reqwest::Client,
}

impl SupabaseSource {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("xofcompare/1.0")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            table: config.table.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.anon_key.is_empty()
    }

    /// Sends the authenticated GET, retrying transport failures only. HTTP
    /// error statuses are returned as-is.
    async fn send(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .get(url)
                .header("apikey", &self.anon_key)
                .bearer_auth(&self.anon_key)
                .send()
                .await;
            match result {
                Err(e) if attempt < SEND_RETRIES => {
                    attempt += 1;
                    debug!("Attempt {}/{} failed: {}. Retrying...", attempt, SEND_RETRIES, e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                result => return result,
            }
        }
    }

    #[instrument(name = "SupabaseRatesFetch", skip(self), fields(table = %self.table))]
    async fn fetch_rows(&self) -> Result<Vec<ExchangeRateRow>> {
        let url = format!(
            "{}/rest/v1/{}?select=*&is_active=eq.true",
            self.base_url, self.table
        );
        debug!("Requesting exchange rates from {}", url);

        let response = self
            .send(&url)
            .await
            .with_context(|| format!("Failed to send request to {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for table: {}",
                response.status(),
                self.table
            ));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse exchange rates for {}", self.table))
    }
}

#[async_trait]
impl RatesSource for SupabaseSource {
    async fn fetch_snapshot(&self) -> Option<RatesSnapshot> {
        if !self.is_configured() {
            debug!("Remote rates not configured");
            return None;
        }

        match self.fetch_rows().await {
            Ok(rows) if rows.is_empty() => {
                warn!(table = %self.table, "No active exchange rates found");
                None
            }
            Ok(rows) => Some(snapshot_from_rows(rows)),
            Err(e) => {
                warn!(error = %e, "Failed to fetch remote exchange rates");
                None
            }
        }
    }

    fn subscribe(&self, on_change: OnChange) -> Subscription {
        if !self.is_configured() {
            return Subscription::noop();
        }

        let source = self.clone();
        Subscription::spawn(async move {
            // Nothing reported yet, so the first poll is always delivered.
            let mut last: Option<Option<RatesSnapshot>> = None;
            loop {
                tokio::time::sleep(source.poll_interval).await;
                let current = source.fetch_snapshot().await;
                if last.as_ref() != Some(&current) {
                    debug!("Exchange rates changed");
                    on_change(current.clone());
                    last = Some(current);
                }
            }
        })
    }
}

/// Folds table rows into a snapshot.
///
/// The first fee seen for a provider wins, a `null` fee means the provider
/// does not disclose it, and the latest `updated_at` becomes the snapshot
/// timestamp. Rows for unknown providers or currencies are skipped, as are
/// rows with a non-positive rate or a negative fee.
fn snapshot_from_rows(rows: Vec<ExchangeRateRow>) -> RatesSnapshot {
    let mut snapshot = RatesSnapshot::default();

    for row in rows {
        let (provider, currency) = match (
            row.provider.parse::<ProviderId>(),
            row.currency.parse::<Currency>(),
        ) {
            (Ok(p), Ok(c)) => (p, c),
            _ => {
                debug!(
                    provider = %row.provider,
                    currency = %row.currency,
                    "Skipping unknown exchange rate row"
                );
                continue;
            }
        };

        if !is_valid_row(&row) {
            debug!(
                provider = %row.provider,
                currency = %row.currency,
                calculation_rate = row.calculation_rate,
                display_rate = row.display_rate,
                fee = ?row.fee,
                "Skipping invalid exchange rate row"
            );
            continue;
        }

        snapshot
            .rates
            .entry(provider)
            .or_default()
            .insert(currency, RateEntry::new(row.calculation_rate, row.display_rate));

        snapshot.fees.entry(provider).or_insert(match row.fee {
            Some(fee) => Fee::Flat(fee),
            None => Fee::Undisclosed,
        });

        match DateTime::parse_from_rfc3339(&row.updated_at) {
            Ok(ts) => {
                let ts = ts.with_timezone(&Utc);
                if snapshot.last_updated.is_none_or(|current| ts > current) {
                    snapshot.last_updated = Some(ts);
                }
            }
            Err(e) => debug!(updated_at = %row.updated_at, error = %e, "Invalid timestamp"),
        }
    }

    snapshot
}

fn is_valid_row(row: &ExchangeRateRow) -> bool {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    positive(row.calculation_rate)
        && positive(row.display_rate)
        && row.fee.is_none_or(|fee| fee.is_finite() && fee >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::RateStore;
    use crate::core::sync::{RateSync, SyncStatus};
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ANON_KEY: &str = "test-anon-key";

    const MOCK_ROWS: &str = r#"[
        {
            "id": "1",
            "provider": "wave",
            "currency": "EUR",
            "calculation_rate": 655.5,
            "display_rate": 656,
            "fee": 0,
            "updated_at": "2025-03-01T10:00:00+00:00",
            "is_active": true
        },
        {
            "id": "2",
            "provider": "wave",
            "currency": "USD",
            "calculation_rate": 590,
            "display_rate": 590,
            "fee": 25,
            "updated_at": "2025-03-02T08:30:00.123456+00:00",
            "is_active": true
        },
        {
            "id": "3",
            "provider": "orange",
            "currency": "EUR",
            "calculation_rate": 660,
            "display_rate": 660,
            "fee": null,
            "updated_at": "2025-02-27T00:00:00+00:00",
            "is_active": true
        },
        {
            "id": "4",
            "provider": "western",
            "currency": "EUR",
            "calculation_rate": 640,
            "display_rate": 640,
            "fee": 1000,
            "updated_at": "2025-04-01T00:00:00+00:00",
            "is_active": true
        }
    ]"#;

    fn config(url: &str) -> RemoteConfig {
        RemoteConfig {
            url: url.to_string(),
            anon_key: ANON_KEY.to_string(),
            poll_interval_secs: 1,
            ..Default::default()
        }
    }

    async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/exchange_rates"))
            .and(query_param("is_active", "eq.true"))
            .and(header("apikey", ANON_KEY))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_fetch_snapshot() {
        let mock_server = create_mock_server(200, MOCK_ROWS).await;
        let source = SupabaseSource::new(&config(&mock_server.uri())).unwrap();

        let snapshot = source.fetch_snapshot().await.unwrap();

        assert_eq!(
            snapshot.rate(ProviderId::Wave, Currency::Eur),
            Some(RateEntry::new(655.5, 656.0))
        );
        assert_eq!(
            snapshot.rate(ProviderId::Wave, Currency::Usd),
            Some(RateEntry::new(590.0, 590.0))
        );
        // First row per provider decides the fee.
        assert_eq!(snapshot.fee(ProviderId::Wave), Some(Fee::Flat(0.0)));
        assert_eq!(snapshot.fee(ProviderId::Orange), Some(Fee::Undisclosed));
        assert_eq!(snapshot.fees.len(), 2);
        assert_eq!(
            snapshot.last_updated.unwrap().to_rfc3339(),
            "2025-03-02T08:30:00.123456+00:00"
        );
    }

    #[tokio::test]
    async fn test_empty_table_is_absent() {
        let mock_server = create_mock_server(200, "[]").await;
        let source = SupabaseSource::new(&config(&mock_server.uri())).unwrap();
        assert!(source.fetch_snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_absent() {
        let mock_server = create_mock_server(401, r#"{"message":"Invalid API key"}"#).await;
        let source = SupabaseSource::new(&config(&mock_server.uri())).unwrap();
        assert!(source.fetch_snapshot().await.is_none());

        let err = source.fetch_rows().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "HTTP error: 401 Unauthorized for table: exchange_rates"
        );
    }

    #[tokio::test]
    async fn test_malformed_response_is_absent() {
        let mock_server = create_mock_server(200, r#"{"rows": []}"#).await;
        let source = SupabaseSource::new(&config(&mock_server.uri())).unwrap();
        assert!(source.fetch_snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_source() {
        let source = SupabaseSource::new(&RemoteConfig::default()).unwrap();
        assert!(!source.is_configured());
        assert!(source.fetch_snapshot().await.is_none());

        let subscription = source.subscribe(Arc::new(|_: Option<RatesSnapshot>| {}));
        assert!(!subscription.is_active());
    }

    #[tokio::test]
    async fn test_subscription_reports_changes() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/exchange_rates"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_ROWS))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/exchange_rates"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&mock_server)
            .await;

        let source = SupabaseSource::new(&config(&mock_server.uri())).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = source.subscribe(Arc::new(move |snapshot: Option<RatesSnapshot>| {
            sink.lock().unwrap().push(snapshot);
        }));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        subscription.unsubscribe();

        // First poll is always reported, the empty table after it is a change.
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_some());
        assert!(seen[1].is_none());
    }

    #[tokio::test]
    async fn test_store_picks_up_recovered_remote() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/exchange_rates"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/exchange_rates"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_ROWS))
            .mount(&mock_server)
            .await;

        let source = SupabaseSource::new(&config(&mock_server.uri())).unwrap();
        let store = Arc::new(RateStore::new());
        let sync = RateSync::start(&source, Arc::clone(&store)).await;
        assert_eq!(sync.status(), SyncStatus::DefaultsOnly);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.fees()[&ProviderId::Wave], Fee::Flat(0.0));
        assert!(store.overrides().is_some());
        assert!(matches!(sync.status(), SyncStatus::Live { .. }));
        sync.stop();
    }

    #[tokio::test]
    async fn test_transport_failure_is_absent() {
        // Nothing listens on port 9 of the loopback interface.
        let source = SupabaseSource::new(&config("http://127.0.0.1:9")).unwrap();
        assert!(source.fetch_snapshot().await.is_none());

        let err = source.fetch_rows().await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to send request to"));
    }

    #[test]
    fn test_snapshot_from_rows_skips_invalid_values() {
        let rows: Vec<ExchangeRateRow> = serde_json::from_str(
            r#"[
                {"provider": "djamo", "currency": "EUR", "calculation_rate": 680,
                 "display_rate": 680, "fee": -500, "updated_at": "2025-03-01T10:00:00+00:00"},
                {"provider": "djamo", "currency": "USD", "calculation_rate": 600,
                 "display_rate": 600, "fee": 150, "updated_at": "2025-03-01T10:00:00+00:00"},
                {"provider": "wave", "currency": "EUR", "calculation_rate": 0,
                 "display_rate": 656, "fee": 0, "updated_at": "2025-03-01T10:00:00+00:00"},
                {"provider": "nafolo", "currency": "USD", "calculation_rate": 605,
                 "display_rate": -1, "fee": null, "updated_at": "2025-03-01T10:00:00+00:00"}
            ]"#,
        )
        .unwrap();
        let snapshot = snapshot_from_rows(rows);

        assert_eq!(
            snapshot.rates[&ProviderId::Djamo].keys().collect::<Vec<_>>(),
            vec![&Currency::Usd]
        );
        assert_eq!(snapshot.fee(ProviderId::Djamo), Some(Fee::Flat(150.0)));
        assert!(!snapshot.rates.contains_key(&ProviderId::Wave));
        assert!(!snapshot.fees.contains_key(&ProviderId::Wave));
        assert!(!snapshot.rates.contains_key(&ProviderId::Nafolo));
    }

    #[test]
    fn test_snapshot_from_rows_skips_unknown() {
        let rows: Vec<ExchangeRateRow> = serde_json::from_str(MOCK_ROWS).unwrap();
        let snapshot = snapshot_from_rows(rows);
        assert_eq!(snapshot.rates.len(), 2);
        assert!(!snapshot.rates.contains_key(&ProviderId::Djamo));
    }
}
