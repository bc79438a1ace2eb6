//! Recording worker (Jibri) deployment builder
//!
//! Jibri drives a virtual X display and a headless browser inside its
//! container, which requires privileged mode plus the SYS_ADMIN and
//! NET_BIND_SERVICE capabilities - a hard requirement of the workload,
//! not a default to relax. Recordings land on an ephemeral volume and are
//! optionally shipped to an object-storage sink.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Capabilities, EmptyDirVolumeSource, SecurityContext};

use jitsi_common::crd::{Component, Jitsi};
use jitsi_common::Error;

use super::{deployment_scaffold, upsert_component_container, upsert_mount, upsert_volume};
use crate::env::{compose, storage_env, EnvAccumulator};
use crate::variables::JIBRI_VARIABLES;

/// Volume receiving finished recordings
const RECORDINGS_VOLUME: &str = "recordings";
/// Memory-backed volume for the browser's shared memory
const SHM_VOLUME: &str = "dev-shm";
/// Where recordings land when the instance doesn't override it
const DEFAULT_RECORDING_DIR: &str = "/config/recordings";

/// Build the desired recorder Deployment
pub fn deployment(jitsi: &Jitsi, dep: &mut Deployment) -> Result<(), Error> {
    if let Some(bucket) = &jitsi.spec.jibri.bucket {
        if bucket.secret.name.is_empty() {
            return Err(Error::configuration_for(
                Component::Jibri.as_str(),
                "bucket requires a credentials secret name",
            ));
        }
    }

    let pod = deployment_scaffold(jitsi, Component::Jibri, false, dep);

    upsert_volume(pod, RECORDINGS_VOLUME).empty_dir = Some(EmptyDirVolumeSource::default());
    upsert_volume(pod, SHM_VOLUME).empty_dir = Some(EmptyDirVolumeSource {
        medium: Some("Memory".to_string()),
        ..Default::default()
    });

    let secret = jitsi.component_secret_name();
    let mut extras = EnvAccumulator::default();
    extras.secret_key("JIBRI_XMPP_PASSWORD", &secret, "JIBRI_XMPP_PASSWORD");
    extras.secret_key("JIBRI_RECORDER_PASSWORD", &secret, "JIBRI_RECORDER_PASSWORD");
    extras.field_ref("LOCAL_ADDRESS", "status.podIP");
    extras.field_ref("JIBRI_INSTANCE_ID", "metadata.name");
    if let Some(bucket) = &jitsi.spec.jibri.bucket {
        storage_env(bucket, &mut extras);
    }
    let env = compose(JIBRI_VARIABLES, |n| jitsi.variable(n), extras.into_vars());

    let recording_dir = jitsi
        .variable("JIBRI_RECORDING_DIR")
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_RECORDING_DIR)
        .to_string();

    let container = upsert_component_container(jitsi, Component::Jibri, pod, env);
    upsert_mount(container, RECORDINGS_VOLUME).mount_path = recording_dir;
    upsert_mount(container, SHM_VOLUME).mount_path = "/dev/shm".to_string();
    container.security_context = Some(SecurityContext {
        privileged: Some(true),
        capabilities: Some(Capabilities {
            add: Some(vec![
                "NET_BIND_SERVICE".to_string(),
                "SYS_ADMIN".to_string(),
            ]),
            drop: None,
        }),
        ..Default::default()
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_fixtures::{assert_labels_consistent, jitsi};
    use jitsi_common::crd::{BucketSpec, SecretRef};

    fn with_bucket(mut instance: Jitsi) -> Jitsi {
        instance.spec.jibri.bucket = Some(BucketSpec {
            host: "https://s3.example.com".to_string(),
            name: "recordings".to_string(),
            secret: SecretRef {
                name: "bucket-creds".to_string(),
            },
        });
        instance
    }

    fn env_names(dep: &Deployment) -> Vec<String> {
        dep.spec
            .as_ref()
            .and_then(|s| s.template.spec.as_ref())
            .map(|p| p.containers[0].clone())
            .and_then(|c| c.env)
            .map(|env| env.into_iter().map(|v| v.name).collect())
            .unwrap_or_default()
    }

    #[test]
    fn builds_labels_strategy_and_replicas() {
        let mut instance = jitsi("meet");
        instance.spec.jibri.replicas = Some(2);
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        assert_labels_consistent(&instance, Component::Jibri, &dep);
        let spec = dep.spec.as_ref().expect("spec");
        assert_eq!(spec.replicas, Some(2));
        assert_eq!(
            spec.strategy.as_ref().and_then(|s| s.type_.as_deref()),
            Some("RollingUpdate")
        );
    }

    #[test]
    fn recorder_runs_privileged_with_display_capabilities() {
        let instance = jitsi("meet");
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        let container = &dep.spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0];
        let sc = container.security_context.as_ref().expect("security context");
        assert_eq!(sc.privileged, Some(true));
        let caps = sc
            .capabilities
            .as_ref()
            .and_then(|c| c.add.as_ref())
            .expect("added capabilities");
        assert!(caps.contains(&"NET_BIND_SERVICE".to_string()));
        assert!(caps.contains(&"SYS_ADMIN".to_string()));
    }

    #[test]
    fn scratch_volumes_are_mounted() {
        let mut instance = jitsi("meet");
        instance
            .spec
            .variables
            .insert("JIBRI_RECORDING_DIR".to_string(), "/recordings".to_string());
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        let pod = dep.spec.as_ref().unwrap().template.spec.as_ref().unwrap();
        let volumes = pod.volumes.as_ref().expect("volumes");
        assert_eq!(volumes.len(), 2);
        assert!(volumes.iter().any(|v| v.name == RECORDINGS_VOLUME));
        let shm = volumes.iter().find(|v| v.name == SHM_VOLUME).unwrap();
        assert_eq!(
            shm.empty_dir.as_ref().and_then(|e| e.medium.as_deref()),
            Some("Memory")
        );

        let mounts = pod.containers[0].volume_mounts.as_ref().expect("mounts");
        let recordings = mounts.iter().find(|m| m.name == RECORDINGS_VOLUME).unwrap();
        assert_eq!(recordings.mount_path, "/recordings");
        let shm = mounts.iter().find(|m| m.name == SHM_VOLUME).unwrap();
        assert_eq!(shm.mount_path, "/dev/shm");
    }

    #[test]
    fn recording_dir_falls_back_to_image_default() {
        let instance = jitsi("meet");
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        let pod = dep.spec.as_ref().unwrap().template.spec.as_ref().unwrap();
        let mounts = pod.containers[0].volume_mounts.as_ref().expect("mounts");
        let recordings = mounts.iter().find(|m| m.name == RECORDINGS_VOLUME).unwrap();
        assert_eq!(recordings.mount_path, DEFAULT_RECORDING_DIR);
    }

    #[test]
    fn storage_sink_adds_exactly_four_variables() {
        let instance = with_bucket(jitsi("meet"));
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        let names = env_names(&dep);
        let storage: Vec<_> = names.iter().filter(|n| n.starts_with("S3_")).collect();
        assert_eq!(storage.len(), 4);
        for expected in ["S3_URL", "S3_BUCKET", "S3_ACCESS_KEY", "S3_SECRET_KEY"] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn no_storage_sink_means_no_storage_variables() {
        let instance = jitsi("meet");
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        assert!(!env_names(&dep).iter().any(|n| n.starts_with("S3_")));
    }

    #[test]
    fn bucket_without_secret_name_is_a_configuration_error() {
        let mut instance = with_bucket(jitsi("meet"));
        instance.spec.jibri.bucket.as_mut().unwrap().secret.name.clear();
        let mut dep = Deployment::default();

        let err = deployment(&instance, &mut dep).expect_err("must fail");
        assert_eq!(err.component(), Some("jibri"));
        // The builder bailed before mutating anything
        assert_eq!(dep, Deployment::default());
    }

    #[test]
    fn runtime_identity_comes_from_pod_fields() {
        let instance = jitsi("meet");
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        let env = dep.spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0]
            .env
            .clone()
            .expect("env");
        let local = env.iter().find(|v| v.name == "LOCAL_ADDRESS").expect("pod IP");
        assert_eq!(
            local
                .value_from
                .as_ref()
                .and_then(|s| s.field_ref.as_ref())
                .map(|f| f.field_path.as_str()),
            Some("status.podIP")
        );
        let id = env
            .iter()
            .find(|v| v.name == "JIBRI_INSTANCE_ID")
            .expect("instance id");
        assert_eq!(
            id.value_from
                .as_ref()
                .and_then(|s| s.field_ref.as_ref())
                .map(|f| f.field_path.as_str()),
            Some("metadata.name")
        );
    }

    #[test]
    fn rebuilding_an_existing_deployment_is_stable() {
        let instance = with_bucket(jitsi("meet"));
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("first build");
        let first = dep.clone();
        deployment(&instance, &mut dep).expect("second build");
        assert_eq!(dep, first, "rebuilding must not accumulate or reorder");
    }
}
