//! Desired-state synchronization
//!
//! One generic pipeline applies every managed resource kind:
//! Fetch (absent is not an error) -> Build (pure mutation of the fetched
//! or empty object) -> Diff -> Persist (create / replace / nothing).
//!
//! The fetched object's `resourceVersion` rides along into the replace
//! call, so a concurrent writer - another controller or a human with
//! kubectl - makes the API server reject the write with a conflict. The
//! caller re-runs the whole pipeline; this function never loops
//! internally. Fields the builder doesn't touch (status, third-party
//! metadata) are carried over from the fetched object untouched.

use async_trait::async_trait;
use kube::api::{Api, PostParams};
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use jitsi_common::crd::Jitsi;
use jitsi_common::Error;

/// Outcome of synchronizing one managed resource
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The resource did not exist and was created
    Created,
    /// The resource existed and differed from the desired state
    Updated,
    /// The resource already matched the desired state
    Unchanged,
}

impl SyncOutcome {
    /// Stable name, used as a condition reason
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Created => "Created",
            SyncOutcome::Updated => "Updated",
            SyncOutcome::Unchanged => "Unchanged",
        }
    }
}

/// Narrow cluster API used by the synchronizer
///
/// `kube::Api` implements this in production; tests substitute an
/// in-memory store with conflict injection.
#[async_trait]
pub trait ObjectApi<K>: Send + Sync {
    /// Fetch by name; `None` when the object does not exist
    async fn fetch(&self, name: &str) -> Result<Option<K>, kube::Error>;
    /// Create the object
    async fn create(&self, obj: &K) -> Result<K, kube::Error>;
    /// Replace the object named `name` with `obj`
    ///
    /// `obj` carries the `resourceVersion` observed at fetch time; the
    /// API server rejects the write with 409 if it moved on.
    async fn replace(&self, name: &str, obj: &K) -> Result<K, kube::Error>;
}

#[async_trait]
impl<K> ObjectApi<K> for Api<K>
where
    K: Resource + Clone + DeserializeOwned + Serialize + std::fmt::Debug + Send + Sync,
{
    async fn fetch(&self, name: &str) -> Result<Option<K>, kube::Error> {
        self.get_opt(name).await
    }

    async fn create(&self, obj: &K) -> Result<K, kube::Error> {
        Api::create(self, &PostParams::default(), obj).await
    }

    async fn replace(&self, name: &str, obj: &K) -> Result<K, kube::Error> {
        Api::replace(self, name, &PostParams::default(), obj).await
    }
}

/// Synchronize one managed resource toward its desired state
///
/// `build` mutates the fetched-or-empty object into the desired state; it
/// owns exactly the fields it writes. A build error skips persistence
/// entirely, leaving the cluster object at its previous state.
///
/// Cancellation: dropping the returned future between the fetch and
/// persist calls writes nothing; each network call is atomic per object
/// and bounded by the client's timeouts.
pub async fn sync<K, F>(
    api: &dyn ObjectApi<K>,
    owner: &Jitsi,
    name: &str,
    build: F,
) -> Result<SyncOutcome, Error>
where
    K: Resource<DynamicType = ()> + Default + Clone + PartialEq + std::fmt::Debug,
    F: FnOnce(&mut K) -> Result<(), Error>,
{
    let kind = K::kind(&());

    // Fetch: absent yields an empty template with the deterministic name
    let observed = api.fetch(name).await?;
    let mut desired = match &observed {
        Some(existing) => existing.clone(),
        None => {
            let mut template = K::default();
            template.meta_mut().name = Some(name.to_string());
            template.meta_mut().namespace = owner.namespace();
            template
        }
    };

    // Build: pure mutation; on error the resource keeps its previous state
    build(&mut desired)?;
    ensure_controller_reference(owner, &mut desired)?;

    // Diff + Persist
    let outcome = match observed {
        None => {
            api.create(&desired)
                .await
                .map_err(|e| conflict_or(e, &kind, name))?;
            SyncOutcome::Created
        }
        Some(existing) if existing == desired => SyncOutcome::Unchanged,
        Some(_) => {
            api.replace(name, &desired)
                .await
                .map_err(|e| conflict_or(e, &kind, name))?;
            SyncOutcome::Updated
        }
    };

    match outcome {
        SyncOutcome::Unchanged => debug!(kind = %kind, name = %name, "resource already in sync"),
        _ => info!(kind = %kind, name = %name, outcome = outcome.as_str(), "synchronized resource"),
    }
    Ok(outcome)
}

/// Make the owning Jitsi the controller of a managed resource
///
/// Set on create so cascade deletion works; re-added on update if it went
/// missing (idempotent - an existing reference is left alone).
fn ensure_controller_reference<K>(owner: &Jitsi, obj: &mut K) -> Result<(), Error>
where
    K: Resource,
{
    let owner_ref = owner.controller_owner_ref(&()).ok_or_else(|| {
        Error::internal_with_context("sync", "owner has no name or uid; cannot set owner reference")
    })?;

    let refs = obj.meta_mut().owner_references.get_or_insert_with(Vec::new);
    if !refs.iter().any(|r| r.uid == owner_ref.uid) {
        refs.push(owner_ref);
    }
    Ok(())
}

/// Map an optimistic-concurrency rejection to the conflict variant
///
/// Covers both 409 on replace (stale resourceVersion) and 409 on create
/// (lost a create race); everything else passes through as a kube error.
fn conflict_or(e: kube::Error, kind: &str, name: &str) -> Error {
    match e {
        kube::Error::Api(ref ae) if ae.code == 409 => Error::conflict(kind, name),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentStatus};
    use jitsi_common::crd::JitsiSpec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory object store with resourceVersion bookkeeping
    ///
    /// Mimics the API server closely enough for pipeline tests: create
    /// assigns version 1, replace requires the stored version and bumps
    /// it, and a conflict can be forced for race tests.
    #[derive(Default)]
    struct FakeApi {
        store: Mutex<HashMap<String, Deployment>>,
        force_conflict: AtomicBool,
    }

    impl FakeApi {
        fn stored(&self, name: &str) -> Option<Deployment> {
            self.store.lock().unwrap().get(name).cloned()
        }

        fn insert(&self, obj: Deployment) {
            let name = obj.name_any();
            self.store.lock().unwrap().insert(name, obj);
        }

        fn conflict() -> kube::Error {
            kube::Error::Api(kube::error::ErrorResponse {
                status: "Failure".to_string(),
                message: "the object has been modified".to_string(),
                reason: "Conflict".to_string(),
                code: 409,
            })
        }
    }

    #[async_trait]
    impl ObjectApi<Deployment> for FakeApi {
        async fn fetch(&self, name: &str) -> Result<Option<Deployment>, kube::Error> {
            Ok(self.store.lock().unwrap().get(name).cloned())
        }

        async fn create(&self, obj: &Deployment) -> Result<Deployment, kube::Error> {
            let mut store = self.store.lock().unwrap();
            let name = obj.name_any();
            if store.contains_key(&name) {
                return Err(Self::conflict());
            }
            let mut created = obj.clone();
            created.metadata.resource_version = Some("1".to_string());
            store.insert(name, created.clone());
            Ok(created)
        }

        async fn replace(&self, name: &str, obj: &Deployment) -> Result<Deployment, kube::Error> {
            if self.force_conflict.load(Ordering::SeqCst) {
                return Err(Self::conflict());
            }
            let mut store = self.store.lock().unwrap();
            let existing = store.get(name).ok_or_else(Self::conflict)?;
            if existing.metadata.resource_version != obj.metadata.resource_version {
                return Err(Self::conflict());
            }
            let next_version = existing
                .metadata
                .resource_version
                .as_deref()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
                + 1;
            let mut replaced = obj.clone();
            replaced.metadata.resource_version = Some(next_version.to_string());
            store.insert(name.to_string(), replaced.clone());
            Ok(replaced)
        }
    }

    fn owner() -> Jitsi {
        let mut jitsi = Jitsi::new("meet", JitsiSpec::default());
        jitsi.metadata.namespace = Some("conferencing".to_string());
        jitsi.metadata.uid = Some("uid-meet".to_string());
        jitsi
    }

    fn set_replicas(replicas: i32) -> impl FnOnce(&mut Deployment) -> Result<(), Error> {
        move |dep: &mut Deployment| {
            dep.spec.get_or_insert_with(Default::default).replicas = Some(replicas);
            Ok(())
        }
    }

    /// Story: first reconciliation creates the resource and wires cascade
    /// deletion via a controller owner reference.
    #[tokio::test]
    async fn story_sync_creates_absent_resource_with_owner_reference() {
        let api = FakeApi::default();
        let owner = owner();

        let outcome = sync(&api, &owner, "meet-prosody", set_replicas(1))
            .await
            .expect("sync succeeds");
        assert_eq!(outcome, SyncOutcome::Created);

        let stored = api.stored("meet-prosody").expect("object created");
        assert_eq!(stored.metadata.namespace.as_deref(), Some("conferencing"));
        let refs = stored
            .metadata
            .owner_references
            .expect("owner reference set on create");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].uid, "uid-meet");
        assert_eq!(refs[0].kind, "Jitsi");
        assert_eq!(refs[0].controller, Some(true));
    }

    /// Story: reconciliation is idempotent - a second pass with an
    /// unchanged spec writes nothing and leaves the object identical.
    #[tokio::test]
    async fn story_second_sync_is_unchanged() {
        let api = FakeApi::default();
        let owner = owner();

        sync(&api, &owner, "meet-web", set_replicas(2))
            .await
            .expect("first sync");
        let after_first = api.stored("meet-web").expect("created");

        let outcome = sync(&api, &owner, "meet-web", set_replicas(2))
            .await
            .expect("second sync");
        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert_eq!(api.stored("meet-web").expect("still present"), after_first);
    }

    /// Story: spec drift is converged while fields outside the builder's
    /// ownership - a status written by another controller - survive.
    #[tokio::test]
    async fn story_sync_updates_drifted_resource_preserving_foreign_fields() {
        let api = FakeApi::default();
        let owner = owner();

        sync(&api, &owner, "meet-jvb", set_replicas(2))
            .await
            .expect("create");

        // Another controller records status on the live object
        let mut live = api.stored("meet-jvb").expect("created");
        live.status = Some(DeploymentStatus {
            available_replicas: Some(2),
            ..Default::default()
        });
        api.insert(live);

        // The CR now asks for more bridge capacity
        let outcome = sync(&api, &owner, "meet-jvb", set_replicas(4))
            .await
            .expect("update");
        assert_eq!(outcome, SyncOutcome::Updated);

        let stored = api.stored("meet-jvb").expect("present");
        assert_eq!(stored.spec.and_then(|s| s.replicas), Some(4));
        assert_eq!(
            stored.status.and_then(|s| s.available_replicas),
            Some(2),
            "status set by another controller must survive the update"
        );
    }

    /// Story: a builder error leaves the cluster untouched - no partial
    /// object is ever persisted.
    #[tokio::test]
    async fn story_builder_error_skips_persist() {
        let api = FakeApi::default();
        let owner = owner();

        let err = sync(&api, &owner, "meet-jibri", |_dep: &mut Deployment| {
            Err(Error::configuration_for(
                "jibri",
                "bucket requires a credentials secret name",
            ))
        })
        .await
        .expect_err("builder error propagates");

        assert!(!err.is_retryable());
        assert!(api.stored("meet-jibri").is_none(), "nothing persisted");
    }

    /// Story: a concurrent writer between fetch and persist surfaces as a
    /// conflict for the reconcile loop to retry.
    #[tokio::test]
    async fn story_concurrent_modification_surfaces_conflict() {
        let api = FakeApi::default();
        let owner = owner();

        sync(&api, &owner, "meet-jicofo", set_replicas(1))
            .await
            .expect("create");

        api.force_conflict.store(true, Ordering::SeqCst);
        let err = sync(&api, &owner, "meet-jicofo", set_replicas(3))
            .await
            .expect_err("replace rejected");

        assert!(err.is_conflict());
        assert!(err.is_retryable());
    }

    /// Story: retrying after a conflict re-runs the pipeline from fetch
    /// and succeeds against the new resourceVersion.
    #[tokio::test]
    async fn story_retry_after_conflict_converges() {
        let api = FakeApi::default();
        let owner = owner();

        sync(&api, &owner, "meet-jvb", set_replicas(1))
            .await
            .expect("create");

        // A concurrent writer bumps the object (e.g., kubectl edit)
        let mut live = api.stored("meet-jvb").expect("created");
        live.metadata.resource_version = Some("7".to_string());
        api.insert(live);

        // Re-running the pipeline fetches the new version and wins
        let outcome = sync(&api, &owner, "meet-jvb", set_replicas(5))
            .await
            .expect("retry converges");
        assert_eq!(outcome, SyncOutcome::Updated);
        assert_eq!(
            api.stored("meet-jvb")
                .and_then(|d| d.spec)
                .and_then(|s| s.replicas),
            Some(5)
        );
    }

    #[tokio::test]
    async fn test_existing_owner_reference_is_not_duplicated() {
        let api = FakeApi::default();
        let owner = owner();

        sync(&api, &owner, "meet-web", set_replicas(1))
            .await
            .expect("create");
        sync(&api, &owner, "meet-web", set_replicas(2))
            .await
            .expect("update");

        let refs = api
            .stored("meet-web")
            .and_then(|d| d.metadata.owner_references)
            .expect("owner references present");
        assert_eq!(refs.len(), 1);
    }

    #[tokio::test]
    async fn test_owner_without_uid_is_an_internal_error() {
        let api = FakeApi::default();
        let mut owner = owner();
        owner.metadata.uid = None;

        let err = sync(&api, &owner, "meet-web", set_replicas(1))
            .await
            .expect_err("owner reference cannot be built");
        assert!(matches!(err, Error::Internal { .. }));
    }
}
