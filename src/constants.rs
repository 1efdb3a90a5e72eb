// -
// Safety rails

/// System namespace exempt from every remediation. Not configurable.
pub const PROTECTED_NAMESPACE: &str = "kube-system";

/// Well-known name of the controller's own pod; never a delete target.
pub const CONTROLLER_NAME: &str = "podkiller";

// -
// Ownership

/// Owner kind that marks a pod as deployment-managed (single hop only).
pub(crate) const REPLICA_SET_KIND: &str = "ReplicaSet";

// -
// Configuration

/// Environment variable prefix, e.g. `PODKILLER__CONTROLLER__MODE=pods`
pub(crate) const ENV_PREFIX: &str = "PODKILLER";

/// Optional configuration file path
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
