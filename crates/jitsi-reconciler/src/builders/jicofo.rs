//! Conference focus (Jicofo) deployment builder

use k8s_openapi::api::apps::v1::Deployment;

use jitsi_common::crd::{Component, Jitsi};
use jitsi_common::Error;

use super::{deployment_scaffold, upsert_component_container, upsert_tcp_port};
use crate::env::{compose, EnvAccumulator};
use crate::variables::JICOFO_VARIABLES;

/// Prometheus port scraped by the focus PodMonitor
const METRICS_PORT: i32 = 8888;

/// Build the desired focus Deployment
pub fn deployment(jitsi: &Jitsi, dep: &mut Deployment) -> Result<(), Error> {
    let pod = deployment_scaffold(jitsi, Component::Jicofo, false, dep);

    let secret = jitsi.component_secret_name();
    let mut extras = EnvAccumulator::default();
    extras.secret_key("JICOFO_COMPONENT_SECRET", &secret, "JICOFO_COMPONENT_SECRET");
    extras.secret_key("JICOFO_AUTH_PASSWORD", &secret, "JICOFO_AUTH_PASSWORD");
    let env = compose(JICOFO_VARIABLES, |n| jitsi.variable(n), extras.into_vars());

    let container = upsert_component_container(jitsi, Component::Jicofo, pod, env);
    upsert_tcp_port(container, "metrics", METRICS_PORT);

    Ok(())
}
