//! Controller
//!
//! Wires informers, policies and the executor for the configured
//! [`WatchMode`](crate::WatchMode):
//!
//! ```text
//! deployments:  Pod informer (cache only) ──sync──▶ Deployment informer ──sync──▶ sweep
//!                       │                                  │
//!                       └──── Arc<ResourceCache> ─────▶ DeploymentPolicy
//!
//! pods:         Pod informer (PodPolicy) ──sync──▶ sweep
//! ```
//!
//! After the sweep the controller idles until the shutdown token is
//! cancelled, then waits for its informers to stop.

mod controller;
pub use controller::*;
