use std::sync::Arc;

use tracing::error;
use tracing::trace;

use super::EventHandler;
use crate::metrics::EVENTS_DISPATCHED;
use crate::metrics::HANDLER_FAILURES;
use crate::ChangeEvent;
use crate::ResourceKind;

pub struct EventDispatcher {
    kind: ResourceKind,
    handler: Arc<dyn EventHandler>,
}

impl EventDispatcher {
    pub fn new(
        kind: ResourceKind,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self { kind, handler }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Delivers one event. Handler failures are logged and counted, never
    /// propagated, so the stream keeps moving.
    pub async fn dispatch(
        &self,
        event: &ChangeEvent,
    ) {
        let resource = event.resource();
        trace!(
            kind = %self.kind,
            event = event.label(),
            namespace = %resource.namespace,
            name = %resource.name,
            "dispatching"
        );
        EVENTS_DISPATCHED
            .with_label_values(&[self.kind.as_str(), event.label()])
            .inc();

        if let Err(e) = self.handler.handle(event).await {
            HANDLER_FAILURES.with_label_values(&[self.kind.as_str()]).inc();
            error!(
                kind = %self.kind,
                event = event.label(),
                namespace = %resource.namespace,
                name = %resource.name,
                "handler failed: {}",
                e
            );
        }
    }

    pub async fn dispatch_all(
        &self,
        events: &[ChangeEvent],
    ) {
        for event in events {
            self.dispatch(event).await;
        }
    }
}
