//! Remediation policies
//!
//! A [`Policy`] turns one [`ChangeEvent`] into a [`Plan`] of remediations.
//! Policies only read caches; side effects belong to the
//! [`ActionExecutor`](crate::ActionExecutor), reached through
//! [`PolicyHandler`].
//!
//! Two rails are enforced when a decision enters a plan, so no policy can
//! bypass them:
//! - nothing in [`PROTECTED_NAMESPACE`](crate::PROTECTED_NAMESPACE) is touched
//! - the pod named [`CONTROLLER_NAME`](crate::CONTROLLER_NAME) is never deleted

mod deployment_policy;
mod handler;
mod pod_policy;

pub use deployment_policy::*;
pub use handler::*;
pub use pod_policy::*;

#[cfg(test)]
mod handler_test;

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::ChangeEvent;
use crate::Resource;
use crate::ResourceKind;
use crate::ResourceRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Remediation {
    DeleteResource(ResourceRef),
    ZeroReplicas(ResourceRef),
}

impl Remediation {
    pub fn target(&self) -> &ResourceRef {
        match self {
            Remediation::DeleteResource(target) | Remediation::ZeroReplicas(target) => target,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Remediation::DeleteResource(_) => "delete",
            Remediation::ZeroReplicas(_) => "zero_replicas",
        }
    }
}

impl fmt::Display for Remediation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} {}", self.action(), self.target())
    }
}

/// De-duplicated, ordered set of remediations for one evaluation.
#[derive(Debug, Default)]
pub struct Plan {
    decisions: BTreeSet<Remediation>,
}

impl Plan {
    /// Adds a decision unless a safety rail forbids it. Duplicates collapse.
    pub fn push(
        &mut self,
        remediation: Remediation,
    ) {
        let target = remediation.target();
        if target.is_protected() {
            debug!("skipping {}: protected namespace", remediation);
            return;
        }
        if matches!(remediation, Remediation::DeleteResource(_)) && target.is_controller_itself() {
            debug!("skipping {}: controller's own pod", remediation);
            return;
        }
        self.decisions.insert(remediation);
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn into_vec(self) -> Vec<Remediation> {
        self.decisions.into_iter().collect()
    }
}

pub trait Policy: Send + Sync + 'static {
    /// Kind of the events this policy evaluates
    fn kind(&self) -> ResourceKind;

    /// Decides what, if anything, to do about one event.
    fn evaluate(
        &self,
        event: &ChangeEvent,
    ) -> Plan;

    /// Decision for a resource found during the one-shot startup sweep.
    fn sweep(
        &self,
        resource: &Resource,
    ) -> Plan;
}
