//! Controller Error Hierarchy
//!
//! Errors are split by how the controller reacts to them:
//! remote failures are logged and abandoned, stale-state results collapse to
//! success inside the executor, and invariant violations end the task that
//! hit them.

use config::ConfigError;

use crate::ResourceKind;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Remote cluster API failures (list, watch, delete, patch)
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// Configuration source or parse failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration loaded but failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A resource of one kind reached a component built for another
    #[error("{actual} resource delivered to the {expected} cache")]
    KindMismatch {
        expected: ResourceKind,
        actual: ResourceKind,
    },

    /// Remediation issued against a kind that does not support it
    #[error("{action} is not supported for {kind} {namespace}/{name}")]
    UnsupportedAction {
        action: &'static str,
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// Target resource is already gone
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    /// Write rejected because the resource changed underneath us
    #[error("conflict while updating {kind} {namespace}/{name}")]
    Conflict {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    /// Watch transport reported an error (it retries on its own)
    #[error("watch stream error for {kind}: {message}")]
    Watch { kind: ResourceKind, message: String },

    /// Any other client or API server failure
    #[error(transparent)]
    Kube(#[from] kube::Error),

    /// Canned request failure raised by the in-memory test clusters
    #[cfg(test)]
    #[error("cluster request failed: {0}")]
    Request(String),
}

impl Error {
    /// `true` when the error only says the target no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Cluster(ClusterError::NotFound { .. }))
    }
}
