mod fake_cluster;
pub use fake_cluster::*;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::ChangeEvent;
use crate::EventHandler;
use crate::OwnerReference;
use crate::Resource;
use crate::ResourceKind;
use crate::Result;

pub fn deployment(
    namespace: &str,
    name: &str,
    replicas: Option<i32>,
    generation: i64,
) -> Resource {
    Resource {
        kind: ResourceKind::Deployment,
        namespace: namespace.to_string(),
        name: name.to_string(),
        generation,
        owner_references: vec![],
        replicas,
    }
}

/// Pod owned by a ReplicaSet
pub fn pod(
    namespace: &str,
    name: &str,
) -> Resource {
    Resource {
        owner_references: vec![OwnerReference {
            kind: "ReplicaSet".to_string(),
            name: format!("{name}-rs"),
        }],
        ..unowned_pod(namespace, name)
    }
}

pub fn unowned_pod(
    namespace: &str,
    name: &str,
) -> Resource {
    Resource {
        kind: ResourceKind::Pod,
        namespace: namespace.to_string(),
        name: name.to_string(),
        generation: 0,
        owner_references: vec![],
        replicas: None,
    }
}

/// Handler that remembers every event it was given
#[derive(Default, Clone)]
pub struct RecordingHandler {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }
}

#[async_trait::async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(
        &self,
        event: &ChangeEvent,
    ) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Polls `condition` every 10ms until it holds or one second passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    condition()
}
