//! Desired-state synthesis and reconciliation engine for Jitsi deployments
//!
//! Given one `Jitsi` custom resource, this crate computes the desired
//! Kubernetes object graph and converges the cluster toward it:
//!
//! - **env**: composes each container's environment from the component's
//!   recognized-variable table plus operator-computed extras
//! - **affinity**: merges default anti-affinity with user scheduling rules
//! - **builders**: pure desired-spec builders, one module per component
//! - **sync**: the generic fetch -> build -> diff -> persist pipeline
//! - **controller**: `reconcile`/`error_policy` entry points for the
//!   kube runtime
//!
//! Builders never talk to the cluster; the synchronizer is the only
//! component with I/O.

pub mod affinity;
pub mod builders;
pub mod controller;
pub mod env;
pub mod sync;
pub mod variables;

pub use jitsi_common::{crd, Error};
