//! Web front-end builders
//!
//! The front-end is fully table-driven - every setting it understands
//! comes from the instance variables map - and gets a ClusterIP Service
//! so in-cluster ingress can route to it.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Service, ServicePort};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use jitsi_common::crd::{Component, Jitsi};
use jitsi_common::Error;

use super::{deployment_scaffold, upsert_component_container};
use crate::env::compose;
use crate::variables::WEB_VARIABLES;

/// Build the desired front-end Deployment
pub fn deployment(jitsi: &Jitsi, dep: &mut Deployment) -> Result<(), Error> {
    let pod = deployment_scaffold(jitsi, Component::Web, false, dep);
    let env = compose(WEB_VARIABLES, |n| jitsi.variable(n), Vec::new());
    upsert_component_container(jitsi, Component::Web, pod, env);
    Ok(())
}

/// Build the desired front-end Service
pub fn service(jitsi: &Jitsi, svc: &mut Service) -> Result<(), Error> {
    let labels = jitsi.component_labels(Component::Web);
    svc.metadata.labels = Some(labels.clone());

    let spec = svc.spec.get_or_insert_with(Default::default);
    spec.type_ = Some("ClusterIP".to_string());
    spec.selector = Some(labels);
    spec.ports = Some(vec![ServicePort {
        name: Some("http".to_string()),
        port: 80,
        target_port: Some(IntOrString::Int(80)),
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }]);

    Ok(())
}
