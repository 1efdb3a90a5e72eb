use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::spawn_task;
use crate::ActionExecutor;
use crate::CacheOnly;
use crate::ClusterApi;
use crate::DeploymentPolicy;
use crate::EventDispatcher;
use crate::Informer;
use crate::PodPolicy;
use crate::Policy;
use crate::PolicyHandler;
use crate::ResourceCache;
use crate::ResourceKind;
use crate::Result;
use crate::Settings;
use crate::SyncBarrier;
use crate::WatchMode;

enum Wiring {
    Deployments {
        pods: Informer,
        deployments: Informer,
        policy: Arc<DeploymentPolicy>,
    },
    Pods {
        pods: Informer,
        policy: Arc<PodPolicy>,
    },
}

pub struct Controller {
    api: Arc<dyn ClusterApi>,
    namespace: Option<String>,
    sync_timeout: Duration,
    executor: Arc<ActionExecutor>,
    wiring: Wiring,
    shutdown: CancellationToken,
}

impl Controller {
    /// Builds every component for the configured mode. Nothing talks to the
    /// cluster until [`Controller::run`].
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` when the controller or executor section
    /// fails validation.
    pub fn new(
        settings: &Settings,
        api: Arc<dyn ClusterApi>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        settings.controller.validate()?;
        settings.executor.validate()?;

        let namespace = settings.controller.namespace.clone();
        let resync = settings.controller.resync_interval();
        let executor = Arc::new(ActionExecutor::new(api.clone(), &settings.executor));

        let wiring = match settings.controller.mode {
            WatchMode::Deployments => {
                let pods = Informer::new(
                    namespace.clone(),
                    api.clone(),
                    EventDispatcher::new(ResourceKind::Pod, Arc::new(CacheOnly)),
                    resync,
                );
                let policy = Arc::new(DeploymentPolicy::new(pods.cache()));
                let handler = PolicyHandler::new(policy.clone(), executor.clone());
                let deployments = Informer::new(
                    namespace.clone(),
                    api.clone(),
                    EventDispatcher::new(ResourceKind::Deployment, Arc::new(handler)),
                    resync,
                );
                Wiring::Deployments {
                    pods,
                    deployments,
                    policy,
                }
            }
            WatchMode::Pods => {
                let policy = Arc::new(PodPolicy::new());
                let handler = PolicyHandler::new(policy.clone(), executor.clone());
                let pods = Informer::new(
                    namespace.clone(),
                    api.clone(),
                    EventDispatcher::new(ResourceKind::Pod, Arc::new(handler)),
                    resync,
                );
                Wiring::Pods { pods, policy }
            }
        };

        Ok(Self {
            api,
            namespace,
            sync_timeout: settings.controller.sync_timeout(),
            executor,
            wiring,
            shutdown,
        })
    }

    pub fn mode(&self) -> WatchMode {
        match self.wiring {
            Wiring::Deployments { .. } => WatchMode::Deployments,
            Wiring::Pods { .. } => WatchMode::Pods,
        }
    }

    /// Cache maintained for `kind`, if this mode watches it.
    pub fn cache(
        &self,
        kind: ResourceKind,
    ) -> Option<Arc<ResourceCache>> {
        self.informer(kind).map(Informer::cache)
    }

    pub fn barrier(
        &self,
        kind: ResourceKind,
    ) -> Option<SyncBarrier> {
        self.informer(kind).map(Informer::barrier)
    }

    fn informer(
        &self,
        kind: ResourceKind,
    ) -> Option<&Informer> {
        match (&self.wiring, kind) {
            (Wiring::Deployments { pods, .. }, ResourceKind::Pod) => Some(pods),
            (Wiring::Deployments { deployments, .. }, ResourceKind::Deployment) => Some(deployments),
            (Wiring::Pods { pods, .. }, ResourceKind::Pod) => Some(pods),
            (Wiring::Pods { .. }, ResourceKind::Deployment) => None,
        }
    }

    /// Starts the informers, waits for their caches, sweeps once and then
    /// blocks until the shutdown token is cancelled.
    pub async fn run(self) -> Result<()> {
        let Self {
            api,
            namespace,
            sync_timeout,
            executor,
            wiring,
            shutdown,
        } = self;
        let startup = Startup {
            api,
            namespace,
            sync_timeout,
            executor,
            shutdown: shutdown.clone(),
        };
        let mut handles = Vec::new();

        match wiring {
            Wiring::Deployments {
                pods,
                deployments,
                policy,
            } => {
                info!("controller started in deployments mode");
                if startup.start(pods, &mut handles).await && startup.start(deployments, &mut handles).await {
                    startup.sweep(policy.as_ref()).await;
                }
            }
            Wiring::Pods { pods, policy } => {
                info!("controller started in pods mode");
                if startup.start(pods, &mut handles).await {
                    startup.sweep(policy.as_ref()).await;
                }
            }
        }

        shutdown.cancelled().await;
        info!("controller shutting down");
        join_all(handles).await;
        Ok(())
    }
}

struct Startup {
    api: Arc<dyn ClusterApi>,
    namespace: Option<String>,
    sync_timeout: Duration,
    executor: Arc<ActionExecutor>,
    shutdown: CancellationToken,
}

impl Startup {
    /// Spawns `informer` and waits for its cache. Returns `false` if shutdown
    /// came first.
    async fn start(
        &self,
        informer: Informer,
        handles: &mut Vec<JoinHandle<()>>,
    ) -> bool {
        let barrier = informer.barrier();
        let kind = barrier.kind();
        let shutdown = self.shutdown.clone();
        spawn_task(
            &format!("{}_informer", kind.as_str().to_lowercase()),
            move || informer.run(shutdown),
            Some(handles),
        );
        self.wait_until_synced(&barrier).await
    }

    async fn wait_until_synced(
        &self,
        barrier: &SyncBarrier,
    ) -> bool {
        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => return false,

                synced = barrier.wait_for_sync(self.sync_timeout) => {
                    if synced {
                        return true;
                    }
                    warn!(kind = %barrier.kind(), timeout = ?self.sync_timeout, "cache not synced yet, still waiting");
                }
            }
        }
    }

    /// One pass over a fresh listing of the policy's kind.
    async fn sweep<P: Policy>(
        &self,
        policy: &P,
    ) {
        let kind = policy.kind();
        let resources = match self.api.list_resources(kind, self.namespace.clone()).await {
            Ok(resources) => resources,
            Err(e) => {
                warn!(kind = %kind, "startup sweep listing failed, skipping sweep: {}", e);
                Vec::new()
            }
        };

        let mut attempted = 0;
        for resource in &resources {
            for remediation in policy.sweep(resource).into_vec() {
                attempted += 1;
                if let Err(e) = self.executor.execute(&remediation).await {
                    warn!("startup sweep: {} failed: {}", remediation, e);
                }
            }
        }
        debug!(kind = %kind, listed = resources.len(), attempted, "startup sweep finished");
        info!(kind = %kind, "startup sweep done");
    }
}
