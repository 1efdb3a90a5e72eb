use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::interval_at;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::metrics::WATCH_ERRORS;
use crate::ChangeEvent;
use crate::ClusterApi;
use crate::Error;
use crate::EventDispatcher;
use crate::ResourceCache;
use crate::ResourceKind;
use crate::Result;
use crate::SyncBarrier;
use crate::WatchNotification;

pub struct Informer {
    kind: ResourceKind,
    namespace: Option<String>,
    api: Arc<dyn ClusterApi>,
    cache: Arc<ResourceCache>,
    barrier: SyncBarrier,
    dispatcher: EventDispatcher,
    resync_interval: Duration,
}

impl Informer {
    pub fn new(
        namespace: Option<String>,
        api: Arc<dyn ClusterApi>,
        dispatcher: EventDispatcher,
        resync_interval: Duration,
    ) -> Self {
        let kind = dispatcher.kind();
        Self {
            kind,
            namespace,
            api,
            cache: Arc::new(ResourceCache::new(kind)),
            barrier: SyncBarrier::new(kind),
            dispatcher,
            resync_interval,
        }
    }

    pub fn cache(&self) -> Arc<ResourceCache> {
        self.cache.clone()
    }

    pub fn barrier(&self) -> SyncBarrier {
        self.barrier.clone()
    }

    /// Drives the watch until `shutdown` is cancelled or the stream ends.
    ///
    /// Transport errors are logged and skipped; the transport reconnects on
    /// its own and follows up with a fresh listing. Only a kind mismatch,
    /// which means the informer was wired to the wrong stream, ends the task
    /// with an error.
    pub async fn run(
        self,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let mut stream = self.api.watch_resources(self.kind, self.namespace.clone());
        let mut resync = interval_at(Instant::now() + self.resync_interval, self.resync_interval);
        resync.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(kind = %self.kind, namespace = ?self.namespace, "informer started");
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!(kind = %self.kind, "informer shutting down");
                    return Ok(());
                }

                _ = resync.tick(), if self.barrier.has_synced() => {
                    self.resync().await;
                }

                next = stream.next() => match next {
                    Some(Ok(notification)) => self.handle_notification(notification).await?,
                    Some(Err(e)) => {
                        WATCH_ERRORS.with_label_values(&[self.kind.as_str()]).inc();
                        warn!(kind = %self.kind, "watch error, waiting for transport to recover: {}", e);
                    }
                    None => {
                        warn!(kind = %self.kind, "watch stream ended");
                        return Ok(());
                    }
                },
            }
        }
    }

    pub(crate) async fn handle_notification(
        &self,
        notification: WatchNotification,
    ) -> Result<()> {
        match notification {
            WatchNotification::Relisted(items) => {
                let events = self.cache.bulk_load(items)?;
                debug!(kind = %self.kind, events = events.len(), entries = self.cache.len(), "relist applied");
                self.dispatcher.dispatch_all(&events).await;
                self.barrier.mark_synced();
            }
            WatchNotification::Applied(resource) => {
                self.ensure_kind(resource.kind)?;
                let event = match self.cache.get(&resource.namespace, &resource.name) {
                    Some(old) => ChangeEvent::Updated { old, new: resource },
                    None => ChangeEvent::Added(resource),
                };
                self.cache.apply(&event)?;
                self.dispatcher.dispatch(&event).await;
            }
            WatchNotification::Deleted(resource) => {
                self.ensure_kind(resource.kind)?;
                let resource = self
                    .cache
                    .get(&resource.namespace, &resource.name)
                    .unwrap_or(resource);
                let event = ChangeEvent::Deleted(resource);
                self.cache.apply(&event)?;
                self.dispatcher.dispatch(&event).await;
            }
        }
        Ok(())
    }

    /// Redelivers every cached entry as an update with identical old and new
    /// state.
    pub(crate) async fn resync(&self) {
        let snapshot = self.cache.list_all();
        debug!(kind = %self.kind, entries = snapshot.len(), "resync");
        for resource in snapshot {
            let event = ChangeEvent::Updated {
                old: resource.clone(),
                new: resource,
            };
            self.dispatcher.dispatch(&event).await;
        }
    }

    fn ensure_kind(
        &self,
        actual: ResourceKind,
    ) -> Result<()> {
        if actual != self.kind {
            return Err(Error::KindMismatch {
                expected: self.kind,
                actual,
            });
        }
        Ok(())
    }
}
