//! Common types for the Jitsi operator: CRD, errors, and utilities

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod kube_utils;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Label key carrying the owning Jitsi instance name
pub const LABEL_INSTANCE: &str = "jitsi.dev/instance";

/// Label key carrying the component name within an instance
pub const LABEL_COMPONENT: &str = "jitsi.dev/component";

/// Label key marking resources managed by this operator
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of [`LABEL_MANAGED_BY`] on every managed resource
pub const MANAGED_BY_VALUE: &str = "jitsi-operator";

/// Field manager name used for server-side apply and status patches
pub const FIELD_MANAGER: &str = "jitsi-operator";

/// Topology key used by default anti-affinity terms
pub const HOSTNAME_TOPOLOGY_KEY: &str = "kubernetes.io/hostname";
