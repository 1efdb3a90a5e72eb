use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use tracing::info;
use tracing::trace;

use super::Plan;
use super::Policy;
use super::Remediation;
use crate::ChangeEvent;
use crate::Resource;
use crate::ResourceCache;
use crate::ResourceKey;
use crate::ResourceKind;
use crate::ResourceRef;

/// Deployment-driven policy.
///
/// Remembers, per Deployment, the deployment pods that existed in its
/// namespace the last time it was looked at. An update that reveals a pod
/// outside that set deletes every owned pod in the namespace; any update with
/// a positive replica count zeroes the Deployment.
pub struct DeploymentPolicy {
    pods: Arc<ResourceCache>,
    observed: DashMap<ResourceKey, BTreeSet<String>>,
}

impl DeploymentPolicy {
    pub fn new(pods: Arc<ResourceCache>) -> Self {
        Self {
            pods,
            observed: DashMap::new(),
        }
    }

    /// Deployment pods currently cached in the Deployment's namespace.
    ///
    /// Ownership is a single hop: any ReplicaSet-owned pod in the namespace
    /// counts, whichever ReplicaSet it is.
    pub fn owned_pods(
        &self,
        deployment: &Resource,
    ) -> BTreeSet<String> {
        if deployment.is_protected() {
            return BTreeSet::new();
        }
        self.pods
            .list_namespace(&deployment.namespace)
            .into_iter()
            .filter(Resource::is_deployment_pod)
            .map(|pod| pod.name)
            .collect()
    }

    pub fn observed_pods(
        &self,
        deployment: &ResourceKey,
    ) -> Option<BTreeSet<String>> {
        self.observed.get(deployment).map(|entry| entry.value().clone())
    }

    fn on_updated(
        &self,
        old: &Resource,
        new: &Resource,
    ) -> Plan {
        let mut plan = Plan::default();
        if new.generation != old.generation {
            trace!(
                namespace = %new.namespace,
                name = %new.name,
                old_generation = old.generation,
                new_generation = new.generation,
                "generation changed, skipping"
            );
            return plan;
        }

        let current = self.owned_pods(new);
        let previous = self
            .observed
            .insert(new.key(), current.clone())
            .unwrap_or_else(|| current.clone());

        let unexpected: Vec<&String> = current.iter().filter(|pod| !previous.contains(*pod)).collect();
        if !unexpected.is_empty() {
            info!(
                namespace = %new.namespace,
                deployment = %new.name,
                "unexpected new pods: {:?}",
                unexpected
            );
            for pod in &current {
                plan.push(Remediation::DeleteResource(ResourceRef::pod(
                    new.namespace.clone(),
                    pod.clone(),
                )));
            }
        }

        if new.desired_replicas() > 0 && !new.is_protected() {
            plan.push(Remediation::ZeroReplicas(new.to_ref()));
        }
        plan
    }
}

impl Policy for DeploymentPolicy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Deployment
    }

    fn evaluate(
        &self,
        event: &ChangeEvent,
    ) -> Plan {
        match event {
            ChangeEvent::Added(deployment) => {
                let owned = self.owned_pods(deployment);
                debug!(
                    namespace = %deployment.namespace,
                    deployment = %deployment.name,
                    pods = owned.len(),
                    "discovered deployment"
                );
                self.observed.insert(deployment.key(), owned);
                Plan::default()
            }
            ChangeEvent::Updated { old, new } => self.on_updated(old, new),
            ChangeEvent::Deleted(deployment) => {
                self.observed.remove(&deployment.key());
                Plan::default()
            }
        }
    }

    fn sweep(
        &self,
        deployment: &Resource,
    ) -> Plan {
        let mut plan = Plan::default();
        for pod in self.owned_pods(deployment) {
            plan.push(Remediation::DeleteResource(ResourceRef::pod(
                deployment.namespace.clone(),
                pod,
            )));
        }
        plan
    }
}
