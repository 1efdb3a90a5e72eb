use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::ClusterApi;
use crate::ClusterError;
use crate::Resource;
use crate::ResourceKind;
use crate::ResourceRef;
use crate::Result;
use crate::WatchNotification;
use crate::WatchStream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterAction {
    Delete(ResourceRef),
    PatchReplicas { target: ResourceRef, replicas: i32 },
}

type NotificationTx = mpsc::UnboundedSender<Result<WatchNotification>>;
type NotificationRx = mpsc::UnboundedReceiver<Result<WatchNotification>>;

/// In-memory cluster: serves lists from its state, feeds watches from test
/// pushes, and records every mutation it is asked to perform.
pub struct FakeCluster {
    state: Mutex<BTreeMap<ResourceRef, Resource>>,
    actions: Mutex<Vec<ClusterAction>>,
    senders: HashMap<ResourceKind, NotificationTx>,
    receivers: Mutex<HashMap<ResourceKind, NotificationRx>>,
    fail_lists: AtomicBool,
}

impl FakeCluster {
    pub fn new() -> Self {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for kind in [ResourceKind::Deployment, ResourceKind::Pod] {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(kind, tx);
            receivers.insert(kind, rx);
        }
        Self {
            state: Mutex::new(BTreeMap::new()),
            actions: Mutex::new(Vec::new()),
            senders,
            receivers: Mutex::new(receivers),
            fail_lists: AtomicBool::new(false),
        }
    }

    pub fn with_resources(resources: Vec<Resource>) -> Self {
        let cluster = Self::new();
        for resource in resources {
            cluster.insert(resource);
        }
        cluster
    }

    pub fn insert(
        &self,
        resource: Resource,
    ) {
        self.state.lock().insert(resource.to_ref(), resource);
    }

    pub fn contains(
        &self,
        target: &ResourceRef,
    ) -> bool {
        self.state.lock().contains_key(target)
    }

    pub fn get(
        &self,
        target: &ResourceRef,
    ) -> Option<Resource> {
        self.state.lock().get(target).cloned()
    }

    /// Every resource of `kind` currently in the fake state
    pub fn snapshot(
        &self,
        kind: ResourceKind,
    ) -> Vec<Resource> {
        self.state.lock().values().filter(|r| r.kind == kind).cloned().collect()
    }

    pub fn push(
        &self,
        kind: ResourceKind,
        notification: WatchNotification,
    ) {
        let _ = self.senders[&kind].send(Ok(notification));
    }

    pub fn push_error(
        &self,
        kind: ResourceKind,
    ) {
        let _ = self.senders[&kind].send(Err(ClusterError::Watch {
            kind,
            message: "connection reset".to_string(),
        }
        .into()));
    }

    /// Sends the current state of `kind` as a full listing
    pub fn push_relist(
        &self,
        kind: ResourceKind,
    ) {
        self.push(kind, WatchNotification::Relisted(self.snapshot(kind)));
    }

    pub fn fail_lists(&self) {
        self.fail_lists.store(true, Ordering::SeqCst);
    }

    pub fn actions(&self) -> Vec<ClusterAction> {
        self.actions.lock().clone()
    }

    pub fn deletes(&self) -> Vec<ResourceRef> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                ClusterAction::Delete(target) => Some(target),
                ClusterAction::PatchReplicas { .. } => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ClusterApi for FakeCluster {
    async fn list_resources(
        &self,
        kind: ResourceKind,
        namespace: Option<String>,
    ) -> Result<Vec<Resource>> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(ClusterError::Request("list unavailable".to_string()).into());
        }
        Ok(self
            .snapshot(kind)
            .into_iter()
            .filter(|r| namespace.as_deref().map_or(true, |ns| r.namespace == ns))
            .collect())
    }

    fn watch_resources(
        &self,
        kind: ResourceKind,
        _namespace: Option<String>,
    ) -> WatchStream {
        match self.receivers.lock().remove(&kind) {
            Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
            None => futures::stream::pending::<Result<WatchNotification>>().boxed(),
        }
    }

    async fn delete_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<()> {
        let target = ResourceRef::new(kind, namespace, name);
        self.actions.lock().push(ClusterAction::Delete(target.clone()));
        match self.state.lock().remove(&target) {
            Some(_) => Ok(()),
            None => Err(ClusterError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            }
            .into()),
        }
    }

    async fn patch_replicas(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<()> {
        let target = ResourceRef::deployment(namespace, name);
        self.actions.lock().push(ClusterAction::PatchReplicas {
            target: target.clone(),
            replicas,
        });
        match self.state.lock().get_mut(&target) {
            Some(deployment) => {
                deployment.replicas = Some(replicas);
                Ok(())
            }
            None => Err(ClusterError::NotFound {
                kind: ResourceKind::Deployment,
                namespace: namespace.to_string(),
                name: name.to_string(),
            }
            .into()),
        }
    }
}
