//! Action Executor
//!
//! Issues remediation mutations against the cluster API. Every action is
//! idempotent: a target that is already gone counts as success.
//!
//! Two execution modes, chosen by `executor.workers`:
//! - `0`: inline. The caller awaits the remote call, so actions for one
//!   resource complete in the order they were decided.
//! - `N > 0`: pooled. Each action runs on its own task behind a semaphore of
//!   `N` permits; the caller only waits for a permit. Ordering between actions
//!   is no longer guaranteed and failures are reported through logs and
//!   metrics only.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::metrics::REMEDIATIONS;
use crate::ClusterApi;
use crate::Error;
use crate::ExecutorConfig;
use crate::Remediation;
use crate::ResourceKind;
use crate::ResourceRef;
use crate::Result;

pub struct ActionExecutor {
    api: Arc<dyn ClusterApi>,
    pool: Option<Arc<Semaphore>>,
}

impl ActionExecutor {
    pub fn new(
        api: Arc<dyn ClusterApi>,
        config: &ExecutorConfig,
    ) -> Self {
        let pool = (config.workers > 0).then(|| Arc::new(Semaphore::new(config.workers)));
        Self { api, pool }
    }

    pub fn inline(api: Arc<dyn ClusterApi>) -> Self {
        Self { api, pool: None }
    }

    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    pub async fn execute(
        &self,
        remediation: &Remediation,
    ) -> Result<()> {
        let Some(pool) = &self.pool else {
            return apply(self.api.as_ref(), remediation).await;
        };

        let permit = pool
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::Fatal(format!("executor pool closed: {e}")))?;
        let api = self.api.clone();
        let remediation = remediation.clone();
        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = apply(api.as_ref(), &remediation).await {
                error!("pooled {} failed: {}", remediation, e);
            }
        });
        Ok(())
    }

    pub async fn delete_resource(
        &self,
        target: &ResourceRef,
    ) -> Result<()> {
        delete_resource(self.api.as_ref(), target).await
    }

    pub async fn zero_replicas(
        &self,
        target: &ResourceRef,
    ) -> Result<()> {
        zero_replicas(self.api.as_ref(), target).await
    }
}

async fn apply(
    api: &dyn ClusterApi,
    remediation: &Remediation,
) -> Result<()> {
    match remediation {
        Remediation::DeleteResource(target) => delete_resource(api, target).await,
        Remediation::ZeroReplicas(target) => zero_replicas(api, target).await,
    }
}

async fn delete_resource(
    api: &dyn ClusterApi,
    target: &ResourceRef,
) -> Result<()> {
    let result = api.delete_resource(target.kind, &target.namespace, &target.name).await;
    settle("delete", target, result)
}

async fn zero_replicas(
    api: &dyn ClusterApi,
    target: &ResourceRef,
) -> Result<()> {
    if target.kind != ResourceKind::Deployment {
        return Err(Error::UnsupportedAction {
            action: "zero_replicas",
            kind: target.kind,
            namespace: target.namespace.clone(),
            name: target.name.clone(),
        });
    }
    let result = api.patch_replicas(&target.namespace, &target.name, 0).await;
    settle("zero_replicas", target, result)
}

/// Collapses "already gone" into success and records the outcome.
fn settle(
    action: &'static str,
    target: &ResourceRef,
    result: Result<()>,
) -> Result<()> {
    match result {
        Ok(()) => {
            REMEDIATIONS.with_label_values(&[action, "applied"]).inc();
            info!("{} {}: done", action, target);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            REMEDIATIONS.with_label_values(&[action, "already_converged"]).inc();
            debug!("{} {}: already gone", action, target);
            Ok(())
        }
        Err(e) => {
            REMEDIATIONS.with_label_values(&[action, "failed"]).inc();
            Err(e)
        }
    }
}
