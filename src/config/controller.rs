use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Which resource kind drives remediation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WatchMode {
    /// Watch Deployments; Pods are cached for lookups only
    #[default]
    Deployments,
    /// Watch Pods and delete deployment pods directly
    Pods,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ControllerConfig {
    #[serde(default)]
    pub mode: WatchMode,

    /// Restricts watches to one namespace; all namespaces when unset
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default = "default_resync_interval_secs")]
    pub resync_interval_secs: u64,

    /// How long to wait for a cache sync before warning and waiting again
    #[serde(default = "default_sync_timeout_ms")]
    pub sync_timeout_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mode: WatchMode::default(),
            namespace: None,
            resync_interval_secs: default_resync_interval_secs(),
            sync_timeout_ms: default_sync_timeout_ms(),
        }
    }
}

impl ControllerConfig {
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.resync_interval_secs == 0 {
            return Err(Error::InvalidConfig("resync_interval_secs must be greater than 0".into()));
        }
        if self.sync_timeout_ms == 0 {
            return Err(Error::InvalidConfig("sync_timeout_ms must be greater than 0".into()));
        }
        if let Some(namespace) = &self.namespace {
            if namespace.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "namespace cannot be blank; leave it unset to watch all namespaces".into(),
                ));
            }
        }
        Ok(())
    }
}

fn default_resync_interval_secs() -> u64 {
    60
}

fn default_sync_timeout_ms() -> u64 {
    30_000
}
