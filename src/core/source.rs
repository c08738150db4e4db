//! Remote rate source abstractions

use crate::core::rates::RatesSnapshot;
use async_trait::async_trait;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::debug;

/// Callback invoked with every new snapshot. `None` means "no overrides".
pub type OnChange = Arc<dyn Fn(Option<RatesSnapshot>) + Send + Sync>;

#[async_trait]
pub trait RatesSource: Send + Sync {
    /// Fetches the current snapshot once. Failures yield `None`.
    async fn fetch_snapshot(&self) -> Option<RatesSnapshot>;

    /// Starts delivering snapshots to `on_change` whenever the backing data
    /// changes, until the returned subscription is torn down.
    fn subscribe(&self, on_change: OnChange) -> Subscription;
}

/// Teardown handle for a [`RatesSource::subscribe`] registration.
///
/// Dropping the handle tears the subscription down as well.
pub struct Subscription {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Subscription {
    /// Runs `listener` on the tokio runtime until unsubscribed.
    pub fn spawn<F>(listener: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: Mutex::new(Some(tokio::spawn(listener))),
        }
    }

    /// A subscription that never delivers anything.
    pub fn noop() -> Self {
        Self {
            task: Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stops further callbacks. Calling this more than once is harmless.
    pub fn unsubscribe(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            debug!("Tearing down rate subscription");
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
