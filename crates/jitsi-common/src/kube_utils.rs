//! Shared Kubernetes client utilities
//!
//! Client construction with explicit timeouts and the status merge-patch
//! helper used by the controller. Network calls are bounded by the
//! client's connect/read timeouts so a stalled API server cannot wedge a
//! reconcile indefinitely.

use std::time::Duration;

use kube::api::{Api, Patch, PatchParams};
use kube::{Client, Config};
use tracing::debug;

use crate::{Error, FIELD_MANAGER};

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a kube client from the standard inference chain with default timeouts
pub async fn create_client() -> Result<Client, Error> {
    create_client_with_timeout(DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT).await
}

/// Create a kube client with custom connect/read timeouts
pub async fn create_client_with_timeout(
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, Error> {
    let mut config = Config::infer()
        .await
        .map_err(|e| Error::internal_with_context("client", format!("failed to infer kube config: {e}")))?;
    config.connect_timeout = Some(connect_timeout);
    config.read_timeout = Some(read_timeout);
    Ok(Client::try_from(config)?)
}

/// Patch the status sub-resource of a namespaced Kubernetes resource
///
/// Serializes `status` into `{ "status": <status> }` and applies it via
/// merge-patch, leaving every other field untouched.
pub async fn patch_resource_status<T>(
    client: &Client,
    name: &str,
    namespace: &str,
    status: &impl serde::Serialize,
) -> Result<(), Error>
where
    T: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>
        + Clone
        + serde::de::DeserializeOwned
        + std::fmt::Debug,
    <T as kube::Resource>::DynamicType: Default,
{
    let api: Api<T> = Api::namespaced(client.clone(), namespace);
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;
    debug!(name = %name, namespace = %namespace, "patched status");
    Ok(())
}
