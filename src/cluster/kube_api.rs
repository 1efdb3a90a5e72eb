//! [`ClusterApi`] on top of `kube`.
//!
//! The watch side uses `kube::runtime::watcher` with the default backoff, and
//! folds its `Init`/`InitApply`/`InitDone` sequence into a single
//! [`WatchNotification::Relisted`] so the informer always sees a complete
//! listing at once.

use futures::future;
use futures::Stream;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::Api;
use kube::api::DeleteParams;
use kube::api::ListParams;
use kube::api::Patch;
use kube::api::PatchParams;
use kube::runtime::watcher;
use kube::runtime::WatchStreamExt;
use kube::Client;
use serde_json::json;
use tracing::debug;

use super::ClusterApi;
use super::WatchStream;
use crate::ClusterError;
use crate::Error;
use crate::Resource;
use crate::ResourceKind;
use crate::Result;
use crate::WatchNotification;

pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the in-cluster environment or the local kubeconfig.
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await.map_err(ClusterError::Kube)?;
        Ok(Self::new(client))
    }

    fn deployments(
        &self,
        namespace: Option<&str>,
    ) -> Api<Deployment> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    fn pods(
        &self,
        namespace: Option<&str>,
    ) -> Api<Pod> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}

#[async_trait::async_trait]
impl ClusterApi for KubeClusterApi {
    async fn list_resources(
        &self,
        kind: ResourceKind,
        namespace: Option<String>,
    ) -> Result<Vec<Resource>> {
        let params = ListParams::default();
        let resources = match kind {
            ResourceKind::Deployment => self
                .deployments(namespace.as_deref())
                .list(&params)
                .await
                .map_err(ClusterError::Kube)?
                .items
                .iter()
                .map(Resource::from_deployment)
                .collect(),
            ResourceKind::Pod => self
                .pods(namespace.as_deref())
                .list(&params)
                .await
                .map_err(ClusterError::Kube)?
                .items
                .iter()
                .map(Resource::from_pod)
                .collect(),
        };
        debug!(%kind, ?namespace, "listed resources");
        Ok(resources)
    }

    fn watch_resources(
        &self,
        kind: ResourceKind,
        namespace: Option<String>,
    ) -> WatchStream {
        let config = watcher::Config::default();
        match kind {
            ResourceKind::Deployment => relisting(
                kind,
                watcher(self.deployments(namespace.as_deref()), config).default_backoff(),
                Resource::from_deployment,
            ),
            ResourceKind::Pod => relisting(
                kind,
                watcher(self.pods(namespace.as_deref()), config).default_backoff(),
                Resource::from_pod,
            ),
        }
    }

    async fn delete_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<()> {
        let params = DeleteParams::default();
        let result = match kind {
            ResourceKind::Deployment => self
                .deployments(Some(namespace))
                .delete(name, &params)
                .await
                .map(|_| ()),
            ResourceKind::Pod => self.pods(Some(namespace)).delete(name, &params).await.map(|_| ()),
        };
        result.map_err(|e| api_error(e, kind, namespace, name))
    }

    async fn patch_replicas(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<()> {
        let patch = json!({ "spec": { "replicas": replicas } });
        self.deployments(Some(namespace))
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map(|_| ())
            .map_err(|e| api_error(e, ResourceKind::Deployment, namespace, name))
    }
}

/// Maps 404 and 409 responses to their typed variants.
pub(super) fn api_error(
    err: kube::Error,
    kind: ResourceKind,
    namespace: &str,
    name: &str,
) -> Error {
    let cluster_error = match &err {
        kube::Error::Api(response) if response.code == 404 => ClusterError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        kube::Error::Api(response) if response.code == 409 => ClusterError::Conflict {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        _ => ClusterError::Kube(err),
    };
    cluster_error.into()
}

pub(super) fn relisting<K, S>(
    kind: ResourceKind,
    events: S,
    convert: fn(&K) -> Resource,
) -> WatchStream
where
    K: Send + 'static,
    S: Stream<Item = std::result::Result<watcher::Event<K>, watcher::Error>> + Send + 'static,
{
    events
        .scan(Vec::new(), move |listing: &mut Vec<Resource>, event| {
            let notification = match event {
                Ok(watcher::Event::Init) => {
                    listing.clear();
                    None
                }
                Ok(watcher::Event::InitApply(obj)) => {
                    listing.push(convert(&obj));
                    None
                }
                Ok(watcher::Event::InitDone) => Some(Ok(WatchNotification::Relisted(std::mem::take(listing)))),
                Ok(watcher::Event::Apply(obj)) => Some(Ok(WatchNotification::Applied(convert(&obj)))),
                Ok(watcher::Event::Delete(obj)) => Some(Ok(WatchNotification::Deleted(convert(&obj)))),
                Err(e) => Some(Err(ClusterError::Watch {
                    kind,
                    message: e.to_string(),
                }
                .into())),
            };
            future::ready(Some(notification))
        })
        .filter_map(future::ready)
        .boxed()
}
