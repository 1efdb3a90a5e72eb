use std::collections::HashSet;

use tracing::debug;

use super::Plan;
use super::Policy;
use super::Remediation;
use crate::ChangeEvent;
use crate::Resource;
use crate::ResourceKind;

/// Pod-driven policy: deployment pods are deleted as soon as they show up.
#[derive(Default)]
pub struct PodPolicy;

impl PodPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Policy for PodPolicy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Pod
    }

    fn evaluate(
        &self,
        event: &ChangeEvent,
    ) -> Plan {
        let mut plan = Plan::default();
        match event {
            ChangeEvent::Added(pod) => {
                if pod.is_deployment_pod() {
                    plan.push(Remediation::DeleteResource(pod.to_ref()));
                }
            }
            ChangeEvent::Updated { old, new } => {
                if new.generation != old.generation {
                    return plan;
                }
                // at most one delete per pod name per evaluation
                let mut seen: HashSet<&str> = HashSet::new();
                if old.is_deployment_pod() {
                    seen.insert(old.name.as_str());
                }
                if new.is_deployment_pod() && !seen.contains(new.name.as_str()) {
                    debug!(namespace = %new.namespace, name = %new.name, "pod became a deployment pod");
                    plan.push(Remediation::DeleteResource(new.to_ref()));
                }
            }
            ChangeEvent::Deleted(_) => {}
        }
        plan
    }

    fn sweep(
        &self,
        pod: &Resource,
    ) -> Plan {
        let mut plan = Plan::default();
        if pod.is_deployment_pod() {
            plan.push(Remediation::DeleteResource(pod.to_ref()));
        }
        plan
    }
}
