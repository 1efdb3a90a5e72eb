//! Resource model shared by caches, policies and the cluster adapter.
//!
//! Only the fields the remediation policies read are kept: identity,
//! generation, owner references and, for Deployments, the desired replica count.

mod convert;


use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::CONTROLLER_NAME;
use crate::PROTECTED_NAMESPACE;
use crate::REPLICA_SET_KIND;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Deployment,
    Pod,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Pod => "Pod",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Back-reference to the managing resource. Lookup only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,
}

/// Cache key, unique within one kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Target of a remediation action
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(
        kind: ResourceKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn pod(
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(ResourceKind::Pod, namespace, name)
    }

    pub fn deployment(
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(ResourceKind::Deployment, namespace, name)
    }

    pub fn is_protected(&self) -> bool {
        self.namespace == PROTECTED_NAMESPACE
    }

    /// The controller's own pod, matched by its literal well-known name
    pub fn is_controller_itself(&self) -> bool {
        self.kind == ResourceKind::Pod && self.name == CONTROLLER_NAME
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
    /// Bumped on spec changes only. Absent upstream reads as 0.
    pub generation: i64,
    pub owner_references: Vec<OwnerReference>,
    /// Desired replica count; Deployments only.
    pub replicas: Option<i32>,
}

impl Resource {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.namespace.clone(), self.name.clone())
    }

    pub fn to_ref(&self) -> ResourceRef {
        ResourceRef::new(self.kind, self.namespace.clone(), self.name.clone())
    }

    pub fn is_protected(&self) -> bool {
        self.namespace == PROTECTED_NAMESPACE
    }

    /// Missing replica count is treated as zero.
    pub fn desired_replicas(&self) -> i32 {
        self.replicas.unwrap_or(0)
    }

    pub fn is_owned_by_kind(
        &self,
        owner_kind: &str,
    ) -> bool {
        self.owner_references.iter().any(|owner| owner.kind == owner_kind)
    }

    /// A pod managed through a ReplicaSet, outside the protected namespace.
    ///
    /// Only the immediate owner kind is checked; the ReplicaSet is not
    /// followed to its Deployment.
    pub fn is_deployment_pod(&self) -> bool {
        self.kind == ResourceKind::Pod && !self.is_protected() && self.is_owned_by_kind(REPLICA_SET_KIND)
    }
}

/// Typed change notification produced by the informer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Added(Resource),
    Updated { old: Resource, new: Resource },
    Deleted(Resource),
}

impl ChangeEvent {
    /// The resource the event is about (the new state for updates)
    pub fn resource(&self) -> &Resource {
        match self {
            ChangeEvent::Added(resource) => resource,
            ChangeEvent::Updated { new, .. } => new,
            ChangeEvent::Deleted(resource) => resource,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource().kind
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            ChangeEvent::Added(_) => "added",
            ChangeEvent::Updated { .. } => "updated",
            ChangeEvent::Deleted(_) => "deleted",
        }
    }
}

/// Raw notification from the watch transport, before cache comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchNotification {
    /// Create or modify, the transport does not say which
    Applied(Resource),
    Deleted(Resource),
    /// Complete listing, delivered on connect and after every reconnect
    Relisted(Vec<Resource>),
}
