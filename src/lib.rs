//! podkiller
//!
//! A Kubernetes controller that treats replicated workloads as unwanted: it
//! watches Deployments (or Pods), keeps an in-memory cache per kind, and
//! deletes ReplicaSet-owned pods and scales their Deployments to zero.
//! `kube-system` and the controller's own pod are never touched.
//!
//! ```ignore
//! let settings = Settings::new()?.validate()?;
//! let api = Arc::new(KubeClusterApi::try_default().await?);
//! Controller::new(&settings, api, shutdown)?.run().await?;
//! ```

mod cache;
mod cluster;
mod config;
mod constants;
mod controller;
mod dispatcher;
mod errors;
mod executor;
mod informer;
pub mod metrics;
mod policy;
mod resource;
mod utils;

pub use cache::*;
pub use cluster::*;
pub use config::*;
pub use constants::*;
pub use controller::*;
pub use dispatcher::*;
pub use errors::*;
pub use executor::*;
pub use informer::*;
pub use policy::*;
pub use resource::*;
pub use utils::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
