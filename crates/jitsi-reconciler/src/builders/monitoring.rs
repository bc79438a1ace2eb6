//! PodMonitor builders for the metrics-exposing components
//!
//! The focus and the bridge export Prometheus metrics; one PodMonitor per
//! component points the prometheus-operator at the pods' named `metrics`
//! port. PodMonitor is a foreign CRD (`monitoring.coreos.com/v1`), typed
//! explicitly with just the fields this operator owns.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use jitsi_common::crd::{Component, Jitsi, LabelSelectorSpec};
use jitsi_common::Error;

/// Name of the scraped container port
const METRICS_PORT_NAME: &str = "metrics";

/// One scrape endpoint of a PodMonitor
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodMetricsEndpoint {
    /// Named container port to scrape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

/// Spec of the prometheus-operator PodMonitor resource
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "monitoring.coreos.com",
    version = "v1",
    kind = "PodMonitor",
    plural = "podmonitors",
    namespaced,
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct PodMonitorSpec {
    /// Pods to scrape
    pub selector: LabelSelectorSpec,
    /// Endpoints to scrape on each selected pod
    pub pod_metrics_endpoints: Vec<PodMetricsEndpoint>,
}

/// Build the desired PodMonitor for one component
pub fn pod_monitor(jitsi: &Jitsi, component: Component, mon: &mut PodMonitor) -> Result<(), Error> {
    let labels = jitsi.component_labels(component);
    mon.metadata.labels = Some(labels.clone());
    mon.spec.selector = LabelSelectorSpec {
        match_labels: labels,
    };
    mon.spec.pod_metrics_endpoints = vec![PodMetricsEndpoint {
        port: Some(METRICS_PORT_NAME.to_string()),
    }];
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_fixtures::jitsi;

    #[test]
    fn monitor_selects_component_pods_on_the_metrics_port() {
        let instance = jitsi("meet");
        let mut mon = PodMonitor::default();
        pod_monitor(&instance, Component::Jvb, &mut mon).expect("builds");

        let labels = instance.component_labels(Component::Jvb);
        assert_eq!(mon.metadata.labels.as_ref(), Some(&labels));
        assert_eq!(mon.spec.selector.match_labels, labels);
        assert_eq!(mon.spec.pod_metrics_endpoints.len(), 1);
        assert_eq!(
            mon.spec.pod_metrics_endpoints[0].port.as_deref(),
            Some(METRICS_PORT_NAME)
        );
    }

    #[test]
    fn focus_and_bridge_monitors_select_different_pods() {
        let instance = jitsi("meet");
        let mut jvb = PodMonitor::default();
        pod_monitor(&instance, Component::Jvb, &mut jvb).expect("builds");
        let mut jicofo = PodMonitor::default();
        pod_monitor(&instance, Component::Jicofo, &mut jicofo).expect("builds");

        assert_ne!(jvb.spec.selector, jicofo.spec.selector);
    }

    #[test]
    fn monitor_serializes_with_prometheus_operator_field_names() {
        let instance = jitsi("meet");
        let mut mon = PodMonitor::default();
        mon.metadata.name = Some("meet-jvb".to_string());
        pod_monitor(&instance, Component::Jvb, &mut mon).expect("builds");

        let json = serde_json::to_value(&mon).expect("serializes");
        assert_eq!(json["apiVersion"], "monitoring.coreos.com/v1");
        assert_eq!(json["kind"], "PodMonitor");
        assert_eq!(json["spec"]["podMetricsEndpoints"][0]["port"], "metrics");
        assert!(json["spec"]["selector"]["matchLabels"].is_object());
    }
}
