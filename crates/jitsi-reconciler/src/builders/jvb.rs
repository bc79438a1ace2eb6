//! Media bridge (JVB) deployment builder
//!
//! The bridge is the horizontally scaled component; its default
//! anti-affinity spreads replicas across nodes so one node failure
//! doesn't drop all media capacity.

use k8s_openapi::api::apps::v1::Deployment;

use jitsi_common::crd::{Component, Jitsi};
use jitsi_common::Error;

use super::{deployment_scaffold, upsert_component_container, upsert_tcp_port};
use crate::env::{compose, EnvAccumulator};
use crate::variables::JVB_VARIABLES;

/// Colibri REST port scraped by the bridge PodMonitor
const METRICS_PORT: i32 = 8080;

/// Build the desired bridge Deployment
pub fn deployment(jitsi: &Jitsi, dep: &mut Deployment) -> Result<(), Error> {
    let pod = deployment_scaffold(jitsi, Component::Jvb, false, dep);

    let secret = jitsi.component_secret_name();
    let mut extras = EnvAccumulator::default();
    extras.secret_key("JVB_AUTH_PASSWORD", &secret, "JVB_AUTH_PASSWORD");
    extras.field_ref("LOCAL_ADDRESS", "status.podIP");
    let env = compose(JVB_VARIABLES, |n| jitsi.variable(n), extras.into_vars());

    let container = upsert_component_container(jitsi, Component::Jvb, pod, env);
    upsert_tcp_port(container, "metrics", METRICS_PORT);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_fixtures::{assert_labels_consistent, jitsi};
    use jitsi_common::LABEL_COMPONENT;

    #[test]
    fn builds_rolling_deployment_with_bridge_identity() {
        let mut instance = jitsi("meet");
        instance.spec.jvb.replicas = Some(3);
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        assert_labels_consistent(&instance, Component::Jvb, &dep);
        let spec = dep.spec.as_ref().expect("spec");
        assert_eq!(spec.replicas, Some(3));

        let env = spec.template.spec.as_ref().unwrap().containers[0]
            .env
            .clone()
            .expect("env");
        let auth = env
            .iter()
            .find(|v| v.name == "JVB_AUTH_PASSWORD")
            .expect("bridge auth secret");
        assert!(auth.value_from.is_some());
        let local = env
            .iter()
            .find(|v| v.name == "LOCAL_ADDRESS")
            .expect("pod IP");
        assert_eq!(
            local
                .value_from
                .as_ref()
                .and_then(|s| s.field_ref.as_ref())
                .map(|f| f.field_path.as_str()),
            Some("status.podIP")
        );
    }

    #[test]
    fn default_affinity_spreads_bridge_replicas() {
        let instance = jitsi("meet");
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        let affinity = dep
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap()
            .affinity
            .as_ref()
            .expect("default anti-affinity present");
        let selector = affinity
            .pod_anti_affinity
            .as_ref()
            .and_then(|a| {
                a.preferred_during_scheduling_ignored_during_execution
                    .as_ref()
            })
            .and_then(|p| p.first())
            .and_then(|t| t.pod_affinity_term.label_selector.as_ref())
            .and_then(|s| s.match_labels.as_ref())
            .expect("selector targets the bridge itself");
        assert_eq!(selector.get(LABEL_COMPONENT).map(String::as_str), Some("jvb"));
    }

    #[test]
    fn disabling_default_affinity_leaves_scheduling_to_the_user() {
        let mut instance = jitsi("meet");
        instance.spec.jvb.runtime.disable_default_affinity = true;
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        assert!(dep
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap()
            .affinity
            .is_none());
    }

    #[test]
    fn metrics_port_matches_the_pod_monitor_endpoint() {
        let instance = jitsi("meet");
        let mut dep = Deployment::default();
        deployment(&instance, &mut dep).expect("builds");

        let ports = dep.spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0]
            .ports
            .as_ref()
            .expect("ports");
        assert!(ports
            .iter()
            .any(|p| p.name.as_deref() == Some("metrics") && p.container_port == METRICS_PORT));
    }
}
