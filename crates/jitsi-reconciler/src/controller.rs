//! Jitsi controller implementation
//!
//! Reconciles one `Jitsi` instance by running the generic sync pipeline
//! over every managed resource - five Deployments, the signaling and
//! front-end Services, and the two PodMonitors - concurrently (they are
//! independent of each other), then folding the outcomes into status
//! conditions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::join;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::api::Api;
use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use tracing::{error, info, instrument, warn};

#[cfg(test)]
use mockall::automock;

use jitsi_common::crd::{
    Component, Condition, ConditionStatus, Jitsi, JitsiPhase, JitsiStatus,
};
use jitsi_common::{kube_utils, Error};

use crate::builders;
use crate::builders::PodMonitor;
use crate::sync::{sync, ObjectApi, SyncOutcome};

/// How often a healthy instance is re-examined
const RESYNC_INTERVAL: Duration = Duration::from_secs(300);
/// Backoff before retrying a transient failure
const RETRY_INTERVAL: Duration = Duration::from_secs(30);
/// Conflicts re-run the pipeline almost immediately: the fetch will see
/// the new resourceVersion
const CONFLICT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

// =============================================================================
// Traits for dependency injection and testability
// =============================================================================

/// Writer for the Jitsi status subresource
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatusWriter: Send + Sync {
    /// Merge-patch the status of the named instance
    async fn patch_status(
        &self,
        name: &str,
        namespace: &str,
        status: &JitsiStatus,
    ) -> Result<(), Error>;
}

/// Real status writer backed by the API server
pub struct KubeStatusWriter {
    client: Client,
}

impl KubeStatusWriter {
    /// Create a status writer over the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusWriter for KubeStatusWriter {
    async fn patch_status(
        &self,
        name: &str,
        namespace: &str,
        status: &JitsiStatus,
    ) -> Result<(), Error> {
        kube_utils::patch_resource_status::<Jitsi>(&self.client, name, namespace, status).await
    }
}

/// Factory handing out namespace-scoped resource APIs
///
/// Managed resources live in the instance's namespace, so APIs are built
/// per reconcile call; tests substitute in-memory stores.
pub trait ApiFactory: Send + Sync {
    /// Deployments API for a namespace
    fn deployments(&self, namespace: &str) -> Arc<dyn ObjectApi<Deployment>>;
    /// Services API for a namespace
    fn services(&self, namespace: &str) -> Arc<dyn ObjectApi<Service>>;
    /// PodMonitors API for a namespace
    fn pod_monitors(&self, namespace: &str) -> Arc<dyn ObjectApi<PodMonitor>>;
}

/// Real API factory backed by the API server
pub struct KubeApiFactory {
    client: Client,
}

impl KubeApiFactory {
    /// Create a factory over the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ApiFactory for KubeApiFactory {
    fn deployments(&self, namespace: &str) -> Arc<dyn ObjectApi<Deployment>> {
        Arc::new(Api::<Deployment>::namespaced(self.client.clone(), namespace))
    }

    fn services(&self, namespace: &str) -> Arc<dyn ObjectApi<Service>> {
        Arc::new(Api::<Service>::namespaced(self.client.clone(), namespace))
    }

    fn pod_monitors(&self, namespace: &str) -> Arc<dyn ObjectApi<PodMonitor>> {
        Arc::new(Api::<PodMonitor>::namespaced(self.client.clone(), namespace))
    }
}

// =============================================================================
// Controller context
// =============================================================================

/// Controller context shared across all reconciliation calls
pub struct Context {
    /// Resource API factory
    pub apis: Arc<dyn ApiFactory>,
    /// Status writer
    pub status: Arc<dyn StatusWriter>,
}

impl Context {
    /// Create a context from explicit dependencies
    pub fn new(apis: Arc<dyn ApiFactory>, status: Arc<dyn StatusWriter>) -> Self {
        Self { apis, status }
    }

    /// Create a context over a Kubernetes client
    pub fn from_client(client: Client) -> Self {
        Self {
            apis: Arc::new(KubeApiFactory::new(client.clone())),
            status: Arc::new(KubeStatusWriter::new(client)),
        }
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Reconcile one Jitsi instance
///
/// Called whenever the instance or one of its owned resources changes.
/// Permanent errors (invalid spec) park the instance until the spec is
/// edited; transient errors propagate to [`error_policy`] for requeue.
#[instrument(skip(jitsi, ctx), fields(instance = %jitsi.name_any()))]
pub async fn reconcile(jitsi: Arc<Jitsi>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = jitsi.name_any();
    let namespace = match jitsi.metadata.namespace.as_deref() {
        Some(ns) => ns,
        None => {
            warn!("instance has no namespace; ignoring");
            return Ok(Action::await_change());
        }
    };
    info!("reconciling instance");

    if let Err(e) = jitsi.spec.validate() {
        warn!(error = %e, "spec validation failed");
        let status = JitsiStatus {
            observed_generation: jitsi.metadata.generation,
            phase: JitsiPhase::Failed,
            message: Some(e.to_string()),
            conditions: Vec::new(),
        };
        ctx.status.patch_status(&name, namespace, &status).await?;
        return Ok(Action::await_change());
    }

    let results = run_syncs(&jitsi, namespace, &ctx).await;

    let now = Utc::now();
    let mut conditions = Vec::with_capacity(results.len());
    let mut first_error: Option<Error> = None;
    for (resource, result) in results {
        match result {
            Ok(outcome) => conditions.push(Condition {
                type_: resource.to_string(),
                status: ConditionStatus::True,
                reason: outcome.as_str().to_string(),
                message: String::new(),
                last_transition_time: now,
            }),
            Err(e) => {
                warn!(resource = resource, error = %e, "resource sync failed");
                conditions.push(Condition {
                    type_: resource.to_string(),
                    status: ConditionStatus::False,
                    reason: error_reason(&e).to_string(),
                    message: e.to_string(),
                    last_transition_time: now,
                });
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    let phase = match &first_error {
        None => JitsiPhase::Ready,
        Some(e) if e.is_retryable() => JitsiPhase::Reconciling,
        Some(_) => JitsiPhase::Failed,
    };
    let status = JitsiStatus {
        observed_generation: jitsi.metadata.generation,
        phase,
        message: first_error.as_ref().map(|e| e.to_string()),
        conditions,
    };
    ctx.status.patch_status(&name, namespace, &status).await?;

    match first_error {
        None => {
            info!("instance in sync");
            Ok(Action::requeue(RESYNC_INTERVAL))
        }
        Some(e) if e.is_retryable() => Err(e),
        Some(e) => {
            warn!(error = %e, "permanent error; awaiting spec change");
            Ok(Action::await_change())
        }
    }
}

/// Run the sync pipeline for every managed resource of one instance
///
/// The syncs are independent - none reads another's output - so they run
/// concurrently; each is internally a strict fetch->build->diff->persist
/// sequence.
async fn run_syncs(
    jitsi: &Jitsi,
    namespace: &str,
    ctx: &Context,
) -> Vec<(&'static str, Result<SyncOutcome, Error>)> {
    let deployments = ctx.apis.deployments(namespace);
    let services = ctx.apis.services(namespace);
    let monitors = ctx.apis.pod_monitors(namespace);

    let prosody_dep_name = jitsi.component_name(Component::Prosody);
    let jicofo_dep_name = jitsi.component_name(Component::Jicofo);
    let jvb_dep_name = jitsi.component_name(Component::Jvb);
    let jibri_dep_name = jitsi.component_name(Component::Jibri);
    let web_dep_name = jitsi.component_name(Component::Web);
    let prosody_svc_name = jitsi.component_name(Component::Prosody);
    let web_svc_name = jitsi.component_name(Component::Web);
    let jvb_mon_name = jitsi.component_name(Component::Jvb);
    let jicofo_mon_name = jitsi.component_name(Component::Jicofo);

    let (prosody_dep, jicofo_dep, jvb_dep, jibri_dep, web_dep, prosody_svc, web_svc, jvb_mon, jicofo_mon) = join!(
        sync(
            deployments.as_ref(),
            jitsi,
            &prosody_dep_name,
            |dep| builders::prosody::deployment(jitsi, dep),
        ),
        sync(
            deployments.as_ref(),
            jitsi,
            &jicofo_dep_name,
            |dep| builders::jicofo::deployment(jitsi, dep),
        ),
        sync(
            deployments.as_ref(),
            jitsi,
            &jvb_dep_name,
            |dep| builders::jvb::deployment(jitsi, dep),
        ),
        sync(
            deployments.as_ref(),
            jitsi,
            &jibri_dep_name,
            |dep| builders::jibri::deployment(jitsi, dep),
        ),
        sync(
            deployments.as_ref(),
            jitsi,
            &web_dep_name,
            |dep| builders::web::deployment(jitsi, dep),
        ),
        sync(
            services.as_ref(),
            jitsi,
            &prosody_svc_name,
            |svc| builders::prosody::service(jitsi, svc),
        ),
        sync(
            services.as_ref(),
            jitsi,
            &web_svc_name,
            |svc| builders::web::service(jitsi, svc),
        ),
        sync(
            monitors.as_ref(),
            jitsi,
            &jvb_mon_name,
            |mon| builders::monitoring::pod_monitor(jitsi, Component::Jvb, mon),
        ),
        sync(
            monitors.as_ref(),
            jitsi,
            &jicofo_mon_name,
            |mon| builders::monitoring::pod_monitor(jitsi, Component::Jicofo, mon),
        ),
    );

    vec![
        ("ProsodyDeployment", prosody_dep),
        ("JicofoDeployment", jicofo_dep),
        ("JvbDeployment", jvb_dep),
        ("JibriDeployment", jibri_dep),
        ("WebDeployment", web_dep),
        ("ProsodyService", prosody_svc),
        ("WebService", web_svc),
        ("JvbPodMonitor", jvb_mon),
        ("JicofoPodMonitor", jicofo_mon),
    ]
}

/// Machine-readable condition reason for an error
fn error_reason(error: &Error) -> &'static str {
    match error {
        Error::Conflict { .. } => "Conflict",
        Error::Configuration { .. } => "InvalidConfiguration",
        Error::Kube { .. } => "ClusterError",
        Error::Invariant { .. } => "InvariantViolation",
        Error::Serialization { .. } => "SerializationError",
        Error::Internal { .. } => "InternalError",
    }
}

/// Error policy for the Jitsi controller
///
/// Conflicts re-run the pipeline almost immediately; other transient
/// errors back off; permanent errors wait for a spec edit.
pub fn error_policy(jitsi: Arc<Jitsi>, error: &Error, _ctx: Arc<Context>) -> Action {
    error!(
        ?error,
        instance = %jitsi.name_any(),
        retryable = error.is_retryable(),
        "reconciliation failed"
    );

    if error.is_conflict() {
        Action::requeue(CONFLICT_RETRY_INTERVAL)
    } else if error.is_retryable() {
        Action::requeue(RETRY_INTERVAL)
    } else {
        Action::await_change()
    }
}
