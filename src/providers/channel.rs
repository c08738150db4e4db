use crate::core::rates::RatesSnapshot;
use crate::core::source::{OnChange, RatesSource, Subscription};
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

/// In-process rate source. Whatever is published is pushed to subscribers.
pub struct ChannelSource {
    tx: watch::Sender<Option<RatesSnapshot>>,
}

impl ChannelSource {
    pub fn new(initial: Option<RatesSnapshot>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn publish(&self, snapshot: Option<RatesSnapshot>) {
        debug!(present = snapshot.is_some(), "Publishing rates snapshot");
        self.tx.send_replace(snapshot);
    }
}

impl Default for ChannelSource {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl RatesSource for ChannelSource {
    async fn fetch_snapshot(&self) -> Option<RatesSnapshot> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self, on_change: OnChange) -> Subscription {
        let mut rx = self.tx.subscribe();
        Subscription::spawn(async move {
            // Ends once the source is dropped.
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                on_change(snapshot);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::ProviderId;
    use crate::core::rates::Fee;
    use crate::core::store::RateStore;
    use crate::core::sync::{RateSync, SyncStatus};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn fee_snapshot(fee: f64) -> RatesSnapshot {
        RatesSnapshot {
            fees: BTreeMap::from([(ProviderId::Wave, Fee::Flat(fee))]),
            ..Default::default()
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_fetch_returns_latest() {
        let source = ChannelSource::new(Some(fee_snapshot(10.0)));
        assert_eq!(source.fetch_snapshot().await, Some(fee_snapshot(10.0)));
        source.publish(None);
        assert_eq!(source.fetch_snapshot().await, None);
    }

    #[tokio::test]
    async fn test_pushes_reach_store_until_stopped() {
        let source = ChannelSource::new(Some(fee_snapshot(10.0)));
        let store = Arc::new(RateStore::new());
        let sync = RateSync::start(&source, Arc::clone(&store)).await;
        assert_eq!(store.fees()[&ProviderId::Wave], Fee::Flat(10.0));

        source.publish(Some(fee_snapshot(20.0)));
        settle().await;
        assert_eq!(store.fees()[&ProviderId::Wave], Fee::Flat(20.0));

        source.publish(None);
        settle().await;
        assert!(store.overrides().is_none());
        assert_eq!(sync.status(), SyncStatus::DefaultsOnly);

        sync.stop();
        sync.stop();
        source.publish(Some(fee_snapshot(30.0)));
        settle().await;
        assert!(store.overrides().is_none());
    }

    #[tokio::test]
    async fn test_teardown_without_messages() {
        let source = ChannelSource::default();
        let subscription = source.subscribe(Arc::new(|_: Option<RatesSnapshot>| {}));
        assert!(subscription.is_active());
        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(!subscription.is_active());
    }
}
