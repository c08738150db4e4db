//! Keeps a [`RateStore`] in step with a [`RatesSource`].

use crate::core::rates::RatesSnapshot;
use crate::core::source::{RatesSource, Subscription};
use crate::core::store::RateStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Informational state of the remote rates, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No remote snapshot is applied; the compiled-in rates are in use.
    DefaultsOnly,
    Live { last_updated: Option<DateTime<Utc>> },
}

pub struct RateSync {
    store: Arc<RateStore>,
    status: Arc<watch::Sender<SyncStatus>>,
    subscription: Subscription,
}

impl RateSync {
    /// Fetches an initial snapshot into `store`, then subscribes for updates.
    ///
    /// A failed fetch leaves the store on its defaults.
    pub async fn start(source: &dyn RatesSource, store: Arc<RateStore>) -> Self {
        let mut sync = Self::fetch(source, store).await;

        let on_change = {
            let store = Arc::clone(&sync.store);
            let status = Arc::clone(&sync.status);
            Arc::new(move |snapshot: Option<RatesSnapshot>| apply(&store, &status, snapshot))
        };
        sync.subscription = source.subscribe(on_change);
        sync
    }

    /// Fetches an initial snapshot into `store` without subscribing.
    pub async fn fetch(source: &dyn RatesSource, store: Arc<RateStore>) -> Self {
        let status = Arc::new(watch::Sender::new(SyncStatus::DefaultsOnly));

        match source.fetch_snapshot().await {
            Some(snapshot) => apply(&store, &status, Some(snapshot)),
            None => warn!("Remote rates unavailable, using built-in rates"),
        }

        Self {
            store,
            status,
            subscription: Subscription::noop(),
        }
    }

    pub fn store(&self) -> &Arc<RateStore> {
        &self.store
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    /// Receiver notified after every applied update, including ones that
    /// leave the status unchanged. Pushes equal to the applied rates are
    /// dropped.
    pub fn updates(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn stop(&self) {
        self.subscription.unsubscribe();
    }
}

fn apply(store: &RateStore, status: &watch::Sender<SyncStatus>, snapshot: Option<RatesSnapshot>) {
    if store.overrides().as_deref() == snapshot.as_ref() {
        debug!("Rates unchanged");
        return;
    }
    let next = match &snapshot {
        Some(s) => SyncStatus::Live {
            last_updated: s.last_updated,
        },
        None => SyncStatus::DefaultsOnly,
    };
    store.replace(snapshot);
    info!(status = ?next, "Rates updated");
    status.send_replace(next);
}
