//! Cluster API seam
//!
//! Everything the controller needs from the API server goes through
//! [`ClusterApi`]: bulk list, the watch stream, pod/deployment deletion and
//! the replica patch. Reconnects, backoff and authentication belong to the
//! implementation, not to the controller.

mod kube_api;
pub use kube_api::*;


use futures::stream::BoxStream;
#[cfg(test)]
use mockall::automock;

use crate::ResourceKind;
use crate::Resource;
use crate::Result;
use crate::WatchNotification;

/// Never-ending stream of transport notifications for one kind
pub type WatchStream = BoxStream<'static, Result<WatchNotification>>;

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ClusterApi: Send + Sync + 'static {
    /// Lists every resource of `kind`, across all namespaces when `namespace` is `None`.
    async fn list_resources(
        &self,
        kind: ResourceKind,
        namespace: Option<String>,
    ) -> Result<Vec<Resource>>;

    /// Opens the watch. The first item is expected to be a
    /// [`WatchNotification::Relisted`] with the complete listing.
    fn watch_resources(
        &self,
        kind: ResourceKind,
        namespace: Option<String>,
    ) -> WatchStream;

    /// Returns `ClusterError::NotFound` when the resource is already gone.
    async fn delete_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<()>;

    /// Sets `spec.replicas` on a Deployment.
    async fn patch_replicas(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<()>;
}
