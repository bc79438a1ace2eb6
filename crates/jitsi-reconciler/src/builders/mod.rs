//! Desired-spec builders for managed resources
//!
//! One module per component, each exposing pure mutation builders the
//! synchronizer runs against the fetched-or-empty object. Builders only
//! write the fields they own and mutate nested structures in place, so
//! server-defaulted fields (probe thresholds, rolling-update parameters,
//! volume modes) ride along unchanged and never cause spurious updates.
//!
//! Ownership model:
//! - always written: labels, selector, pod-template labels, strategy type,
//!   environment, volumes/mounts/ports we declare, affinity, security
//!   context, probes' handlers;
//! - written when declared: replicas, image pull policy, resources,
//!   service account name (absent declarations leave the live value to
//!   the server's defaulting, matching the fields' shared ownership).

pub mod jibri;
pub mod jicofo;
pub mod jvb;
pub mod monitoring;
pub mod prosody;
pub mod web;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, ContainerPort, PodSpec, Volume, VolumeMount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

use jitsi_common::crd::{Component, Jitsi};

pub use monitoring::{PodMonitor, PodMonitorSpec};

/// Deployment update strategy types
const STRATEGY_ROLLING_UPDATE: &str = "RollingUpdate";
const STRATEGY_RECREATE: &str = "Recreate";

/// Apply the common deployment scaffold for one component
///
/// Labels, selector and pod-template labels are always identical: the
/// selector is immutable after creation, so they are derived from the
/// same source every time. Returns the pod spec for the component
/// builder to fill in.
fn deployment_scaffold<'a>(
    jitsi: &Jitsi,
    component: Component,
    recreate: bool,
    dep: &'a mut Deployment,
) -> &'a mut PodSpec {
    let labels = jitsi.component_labels(component);

    dep.metadata.labels = Some(labels.clone());

    let spec = dep.spec.get_or_insert_with(Default::default);
    spec.selector = LabelSelector {
        match_labels: Some(labels.clone()),
        ..Default::default()
    };

    // Only the strategy type is owned here; rolling-update parameters are
    // server-defaulted and must not be clobbered. Recreate cannot carry
    // rolling-update parameters at all.
    let strategy = spec.strategy.get_or_insert_with(Default::default);
    if recreate {
        strategy.type_ = Some(STRATEGY_RECREATE.to_string());
        strategy.rolling_update = None;
    } else {
        strategy.type_ = Some(STRATEGY_ROLLING_UPDATE.to_string());
    }

    if let Some(replicas) = jitsi.spec.replicas(component) {
        spec.replicas = Some(replicas);
    }

    let template = &mut spec.template;
    template.metadata.get_or_insert_with(Default::default).labels = Some(labels);

    let pod = template.spec.get_or_insert_with(Default::default);
    pod.affinity = crate::affinity::component_affinity(jitsi, component);

    let runtime = jitsi.spec.runtime(component);
    if let Some(sa) = &runtime.service_account_name {
        if !sa.is_empty() {
            pod.service_account_name = Some(sa.clone());
        }
    }

    pod
}

/// Fetch or insert the component's container, then apply the common
/// container settings (image, pull policy, resources, environment)
fn upsert_component_container<'a>(
    jitsi: &Jitsi,
    component: Component,
    pod: &'a mut PodSpec,
    env: Vec<k8s_openapi::api::core::v1::EnvVar>,
) -> &'a mut Container {
    let runtime = jitsi.spec.runtime(component);
    let container = upsert_container(pod, component.as_str());
    container.image = Some(runtime.image.clone());
    if let Some(policy) = &runtime.image_pull_policy {
        container.image_pull_policy = Some(policy.clone());
    }
    if let Some(resources) = &runtime.resources {
        container.resources = Some(resources.to_requirements());
    }
    container.env = Some(env);
    container
}

/// Fetch or insert a container by name, preserving its other fields
fn upsert_container<'a>(pod: &'a mut PodSpec, name: &str) -> &'a mut Container {
    let containers = &mut pod.containers;
    let idx = match containers.iter().position(|c| c.name == name) {
        Some(idx) => idx,
        None => {
            containers.push(Container {
                name: name.to_string(),
                ..Default::default()
            });
            containers.len() - 1
        }
    };
    &mut containers[idx]
}

/// Fetch or insert a pod volume by name
fn upsert_volume<'a>(pod: &'a mut PodSpec, name: &str) -> &'a mut Volume {
    let volumes = pod.volumes.get_or_insert_with(Vec::new);
    let idx = match volumes.iter().position(|v| v.name == name) {
        Some(idx) => idx,
        None => {
            volumes.push(Volume {
                name: name.to_string(),
                ..Default::default()
            });
            volumes.len() - 1
        }
    };
    &mut volumes[idx]
}

/// Drop a pod volume by name (feature no longer declared)
fn remove_volume(pod: &mut PodSpec, name: &str) {
    if let Some(volumes) = &mut pod.volumes {
        volumes.retain(|v| v.name != name);
        if volumes.is_empty() {
            pod.volumes = None;
        }
    }
}

/// Fetch or insert a volume mount by name
fn upsert_mount<'a>(container: &'a mut Container, name: &str) -> &'a mut VolumeMount {
    let mounts = container.volume_mounts.get_or_insert_with(Vec::new);
    let idx = match mounts.iter().position(|m| m.name == name) {
        Some(idx) => idx,
        None => {
            mounts.push(VolumeMount {
                name: name.to_string(),
                ..Default::default()
            });
            mounts.len() - 1
        }
    };
    &mut mounts[idx]
}

/// Drop a volume mount by name
fn remove_mount(container: &mut Container, name: &str) {
    if let Some(mounts) = &mut container.volume_mounts {
        mounts.retain(|m| m.name != name);
        if mounts.is_empty() {
            container.volume_mounts = None;
        }
    }
}

/// Declare a named TCP container port
fn upsert_tcp_port(container: &mut Container, name: &str, port: i32) {
    let ports = container.ports.get_or_insert_with(Vec::new);
    if let Some(existing) = ports
        .iter_mut()
        .find(|p| p.name.as_deref() == Some(name))
    {
        existing.container_port = port;
        existing.protocol = Some("TCP".to_string());
    } else {
        ports.push(ContainerPort {
            name: Some(name.to_string()),
            container_port: port,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        });
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use jitsi_common::crd::{Component, Jitsi, JitsiSpec};

    /// A complete Jitsi instance the builder tests run against
    pub fn jitsi(name: &str) -> Jitsi {
        let mut spec = JitsiSpec::default();
        spec.prosody.runtime.image = "jitsi/prosody:stable-10078".to_string();
        spec.jicofo.runtime.image = "jitsi/jicofo:stable-10078".to_string();
        spec.jvb.runtime.image = "jitsi/jvb:stable-10078".to_string();
        spec.jibri.runtime.image = "jitsi/jibri:stable-10078".to_string();
        spec.web.runtime.image = "jitsi/web:stable-10078".to_string();
        spec.variables
            .insert("XMPP_DOMAIN".to_string(), "meet.example.com".to_string());
        spec.variables
            .insert("TZ".to_string(), "UTC".to_string());

        let mut jitsi = Jitsi::new(name, spec);
        jitsi.metadata.namespace = Some("conferencing".to_string());
        jitsi.metadata.uid = Some(format!("uid-{name}"));
        jitsi
    }

    /// Assert the selector, object labels and template labels agree
    pub fn assert_labels_consistent(
        jitsi: &Jitsi,
        component: Component,
        dep: &k8s_openapi::api::apps::v1::Deployment,
    ) {
        let labels = jitsi.component_labels(component);
        assert_eq!(dep.metadata.labels.as_ref(), Some(&labels));
        let spec = dep.spec.as_ref().expect("deployment spec");
        assert_eq!(spec.selector.match_labels.as_ref(), Some(&labels));
        assert_eq!(
            spec.template
                .metadata
                .as_ref()
                .and_then(|m| m.labels.as_ref()),
            Some(&labels)
        );
    }
}
