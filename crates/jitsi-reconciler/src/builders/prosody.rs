//! Signaling server (Prosody) builders
//!
//! Prosody holds exclusive conference state (MUC occupancy, sessions), so
//! its Deployment uses the Recreate strategy: two concurrent versions
//! would split the XMPP domain. The companion Service exposes the three
//! well-known signaling ports inside the cluster.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, ExecAction, KeyToPath, Service, ServicePort,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use jitsi_common::crd::{Component, Jitsi};
use jitsi_common::Error;

use super::{
    deployment_scaffold, remove_mount, remove_volume, upsert_component_container, upsert_mount,
    upsert_volume,
};
use crate::env::{compose, turn_env, EnvAccumulator};
use crate::variables::PROSODY_VARIABLES;

/// Volume carrying the user-supplied configuration overlay
const OVERLAY_VOLUME: &str = "jitsi-meet";
/// File the overlay ConfigMap must provide
const OVERLAY_KEY: &str = "jitsi-meet.cfg.lua";

/// Component passwords referenced from the instance secret
///
/// Prosody provisions the XMPP accounts every other component logs in
/// with, so it references all of them.
const COMPONENT_SECRET_KEYS: &[&str] = &[
    "JICOFO_COMPONENT_SECRET",
    "JICOFO_AUTH_PASSWORD",
    "JVB_AUTH_PASSWORD",
    "JIBRI_XMPP_PASSWORD",
    "JIBRI_RECORDER_PASSWORD",
];

/// Build the desired signaling Deployment
pub fn deployment(jitsi: &Jitsi, dep: &mut Deployment) -> Result<(), Error> {
    if let Some(turn) = &jitsi.spec.turn {
        if turn.host.is_empty() {
            return Err(Error::configuration_for(
                Component::Prosody.as_str(),
                "turn.host must be set",
            ));
        }
        if turn.port == 0 {
            return Err(Error::configuration_for(
                Component::Prosody.as_str(),
                "turn.port must be non-zero",
            ));
        }
    }

    let pod = deployment_scaffold(jitsi, Component::Prosody, true, dep);

    if jitsi.spec.prosody.custom_config.is_none() {
        remove_volume(pod, OVERLAY_VOLUME);
    }
    if let Some(overlay) = &jitsi.spec.prosody.custom_config {
        let volume = upsert_volume(pod, OVERLAY_VOLUME);
        volume.config_map = Some(ConfigMapVolumeSource {
            name: overlay.name.clone(),
            items: Some(vec![KeyToPath {
                key: OVERLAY_KEY.to_string(),
                path: OVERLAY_KEY.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        });
    }

    let secret = jitsi.component_secret_name();
    let mut extras = EnvAccumulator::default();
    for key in COMPONENT_SECRET_KEYS {
        extras.secret_key(key, &secret, key);
    }
    if let Some(turn) = &jitsi.spec.turn {
        turn_env(turn, &mut extras);
    }
    let env = compose(PROSODY_VARIABLES, |n| jitsi.variable(n), extras.into_vars());

    let container = upsert_component_container(jitsi, Component::Prosody, pod, env);

    // Only the probe handler is owned; thresholds and timing stay with
    // the server's defaults.
    let probe = container.readiness_probe.get_or_insert_with(Default::default);
    probe.exec = Some(ExecAction {
        command: Some(
            ["prosodyctl", "--config", "/config/prosody.cfg.lua", "status"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ),
    });

    if jitsi.spec.prosody.custom_config.is_some() {
        let mount = upsert_mount(container, OVERLAY_VOLUME);
        mount.mount_path = format!("/config/conf.d/{OVERLAY_KEY}");
        mount.sub_path = Some(OVERLAY_KEY.to_string());
    } else {
        remove_mount(container, OVERLAY_VOLUME);
    }

    Ok(())
}

/// Build the desired signaling Service
///
/// Client connections, BOSH/websocket HTTP, and server-to-server
/// federation, all ClusterIP: external exposure is deliberately left to
/// the cluster's ingress layer.
pub fn service(jitsi: &Jitsi, svc: &mut Service) -> Result<(), Error> {
    let labels = jitsi.component_labels(Component::Prosody);
    svc.metadata.labels = Some(labels.clone());

    let spec = svc.spec.get_or_insert_with(Default::default);
    spec.type_ = Some("ClusterIP".to_string());
    spec.selector = Some(labels);
    spec.ports = Some(vec![
        tcp_port("xmpp", 5222),
        tcp_port("http", 5280),
        tcp_port("external", 5347),
    ]);

    Ok(())
}

fn tcp_port(name: &str, port: i32) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        port,
        target_port: Some(IntOrString::Int(port)),
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }
}
