use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::info;

use crate::ResourceKind;

/// One-way latch released once the owning informer has bulk loaded its cache
/// and dispatched the initial listing.
///
/// Clones share the same latch. Once released it never closes again.
#[derive(Clone)]
pub struct SyncBarrier {
    kind: ResourceKind,
    synced: Arc<watch::Sender<bool>>,
}

impl SyncBarrier {
    pub fn new(kind: ResourceKind) -> Self {
        let (synced, _) = watch::channel(false);
        Self {
            kind,
            synced: Arc::new(synced),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn has_synced(&self) -> bool {
        *self.synced.borrow()
    }

    /// Releases every current and future waiter. Idempotent.
    pub(crate) fn mark_synced(&self) {
        if !self.synced.send_replace(true) {
            info!(kind = %self.kind, "cache synced");
        }
    }

    /// Waits until synced or until `limit` elapses; returns whether the cache
    /// is synced.
    pub async fn wait_for_sync(
        &self,
        limit: Duration,
    ) -> bool {
        let mut rx = self.synced.subscribe();
        let waited = timeout(limit, rx.wait_for(|synced| *synced))
            .await
            .map(|changed| changed.is_ok());
        match waited {
            Ok(true) => true,
            // Sender lives in self, so the channel cannot close while we wait.
            Ok(false) => self.has_synced(),
            Err(_) => false,
        }
    }
}
