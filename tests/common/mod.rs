#![allow(dead_code)]

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use podkiller::ClusterApi;
use podkiller::ClusterError;
use podkiller::OwnerReference;
use podkiller::Resource;
use podkiller::ResourceKind;
use podkiller::ResourceRef;
use podkiller::Result;
use podkiller::WatchNotification;
use podkiller::WatchStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub fn deployment(
    namespace: &str,
    name: &str,
    replicas: i32,
) -> Resource {
    Resource {
        kind: ResourceKind::Deployment,
        namespace: namespace.to_string(),
        name: name.to_string(),
        generation: 1,
        owner_references: vec![],
        replicas: Some(replicas),
    }
}

pub fn replica_set_pod(
    namespace: &str,
    name: &str,
) -> Resource {
    Resource {
        kind: ResourceKind::Pod,
        namespace: namespace.to_string(),
        name: name.to_string(),
        generation: 0,
        owner_references: vec![OwnerReference {
            kind: "ReplicaSet".to_string(),
            name: format!("{name}-rs"),
        }],
        replicas: None,
    }
}

pub fn bare_pod(
    namespace: &str,
    name: &str,
) -> Resource {
    Resource {
        owner_references: vec![],
        ..replica_set_pod(namespace, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Delete(ResourceRef),
    ScaleTo { target: ResourceRef, replicas: i32 },
}

type Tx = mpsc::UnboundedSender<Result<WatchNotification>>;
type Rx = mpsc::UnboundedReceiver<Result<WatchNotification>>;

/// In-memory API server. Writes go through the same watch streams an informer
/// reads, the way a real cluster echoes them back.
pub struct ClusterSim {
    objects: Mutex<BTreeMap<ResourceRef, Resource>>,
    mutations: Mutex<Vec<Mutation>>,
    watchers: HashMap<ResourceKind, Tx>,
    pending: Mutex<HashMap<ResourceKind, Rx>>,
}

impl ClusterSim {
    pub fn new(objects: Vec<Resource>) -> Self {
        let mut watchers = HashMap::new();
        let mut pending = HashMap::new();
        for kind in [ResourceKind::Deployment, ResourceKind::Pod] {
            let (tx, rx) = mpsc::unbounded_channel();
            watchers.insert(kind, tx);
            pending.insert(kind, rx);
        }
        let sim = Self {
            objects: Mutex::new(objects.into_iter().map(|r| (r.to_ref(), r)).collect()),
            mutations: Mutex::new(Vec::new()),
            watchers,
            pending: Mutex::new(pending),
        };
        // every watch opens with a full listing
        sim.relist(ResourceKind::Deployment);
        sim.relist(ResourceKind::Pod);
        sim
    }

    pub fn relist(
        &self,
        kind: ResourceKind,
    ) {
        let items = self.list(kind);
        self.emit(kind, WatchNotification::Relisted(items));
    }

    /// Creates or replaces an object and notifies watchers.
    pub fn apply(
        &self,
        resource: Resource,
    ) {
        self.objects.lock().insert(resource.to_ref(), resource.clone());
        self.emit(resource.kind, WatchNotification::Applied(resource));
    }

    pub fn list(
        &self,
        kind: ResourceKind,
    ) -> Vec<Resource> {
        self.objects.lock().values().filter(|r| r.kind == kind).cloned().collect()
    }

    pub fn get(
        &self,
        target: &ResourceRef,
    ) -> Option<Resource> {
        self.objects.lock().get(target).cloned()
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.mutations.lock().clone()
    }

    fn emit(
        &self,
        kind: ResourceKind,
        notification: WatchNotification,
    ) {
        let _ = self.watchers[&kind].send(Ok(notification));
    }

    fn not_found(
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> podkiller::Error {
        ClusterError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
        .into()
    }
}

#[async_trait::async_trait]
impl ClusterApi for ClusterSim {
    async fn list_resources(
        &self,
        kind: ResourceKind,
        namespace: Option<String>,
    ) -> Result<Vec<Resource>> {
        Ok(self
            .list(kind)
            .into_iter()
            .filter(|r| namespace.as_deref().map_or(true, |ns| r.namespace == ns))
            .collect())
    }

    fn watch_resources(
        &self,
        kind: ResourceKind,
        _namespace: Option<String>,
    ) -> WatchStream {
        match self.pending.lock().remove(&kind) {
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
        self.mutations.lock().push(Mutation::Delete(target.clone()));
        let removed = self.objects.lock().remove(&target);
        match removed {
            Some(resource) => {
                self.emit(kind, WatchNotification::Deleted(resource));
                Ok(())
            }
            None => Err(Self::not_found(kind, namespace, name)),
        }
    }

    async fn patch_replicas(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<()> {
        let target = ResourceRef::deployment(namespace, name);
        self.mutations.lock().push(Mutation::ScaleTo {
            target: target.clone(),
            replicas,
        });
        let updated = {
            let mut objects = self.objects.lock();
            objects.get_mut(&target).map(|deployment| {
                // a spec write bumps the generation
                deployment.replicas = Some(replicas);
                deployment.generation += 1;
                deployment.clone()
            })
        };
        match updated {
            Some(deployment) => {
                self.emit(ResourceKind::Deployment, WatchNotification::Applied(deployment));
                Ok(())
            }
            None => Err(Self::not_found(ResourceKind::Deployment, namespace, name)),
        }
    }
}

/// Polls `condition` every 10ms until it holds or two seconds pass.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
