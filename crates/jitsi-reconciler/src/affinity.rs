//! Scheduling affinity for component pods
//!
//! Two components carry a default soft anti-affinity: the recording
//! worker spreads away from media-bridge pods (recordings compete with
//! media forwarding for CPU), and the bridge spreads its own replicas
//! across nodes. Users can add their own rules - which are always kept,
//! never reordered - or disable the default entirely for single-node or
//! heavily customized clusters.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Affinity, PodAffinityTerm, PodAntiAffinity, WeightedPodAffinityTerm,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

use jitsi_common::crd::{AffinitySpec, Component, Jitsi};
use jitsi_common::HOSTNAME_TOPOLOGY_KEY;

/// Weight of the default anti-affinity preference
const DEFAULT_ANTI_AFFINITY_WEIGHT: i32 = 100;

/// How a component's pod affinity is derived
#[derive(Debug)]
pub enum AffinityChoice<'a> {
    /// The user fully controls scheduling; emit their affinity verbatim
    UserOverride(Option<&'a AffinitySpec>),
    /// Merge the default anti-affinity term against a peer component's
    /// pods with whatever the user declared
    DefaultMerged {
        /// Labels of the pods to schedule away from
        peer_labels: BTreeMap<String, String>,
        /// User-declared rules, preserved unchanged
        user: Option<&'a AffinitySpec>,
    },
}

/// Resolve an affinity choice into the pod-spec affinity
pub fn merge(choice: AffinityChoice<'_>) -> Option<Affinity> {
    match choice {
        AffinityChoice::UserOverride(user) => user.and_then(AffinitySpec::to_affinity),
        AffinityChoice::DefaultMerged { peer_labels, user } => {
            let default_term = WeightedPodAffinityTerm {
                weight: DEFAULT_ANTI_AFFINITY_WEIGHT,
                pod_affinity_term: PodAffinityTerm {
                    label_selector: Some(LabelSelector {
                        match_labels: Some(peer_labels),
                        ..Default::default()
                    }),
                    topology_key: HOSTNAME_TOPOLOGY_KEY.to_string(),
                    ..Default::default()
                },
            };

            let mut affinity = user
                .and_then(AffinitySpec::to_affinity)
                .unwrap_or_default();
            let anti = affinity.pod_anti_affinity.get_or_insert(PodAntiAffinity {
                preferred_during_scheduling_ignored_during_execution: None,
                required_during_scheduling_ignored_during_execution: None,
            });
            let preferred = anti
                .preferred_during_scheduling_ignored_during_execution
                .get_or_insert_with(Vec::new);
            preferred.insert(0, default_term);

            Some(affinity)
        }
    }
}

/// Peer component the default anti-affinity schedules away from
///
/// The bridge's peer is itself: spreading replicas across nodes keeps a
/// node failure from taking out all media capacity.
fn default_peer(component: Component) -> Option<Component> {
    match component {
        Component::Jibri => Some(Component::Jvb),
        Component::Jvb => Some(Component::Jvb),
        Component::Jicofo | Component::Prosody | Component::Web => None,
    }
}

/// Compute the pod affinity for one component of an instance
pub fn component_affinity(jitsi: &Jitsi, component: Component) -> Option<Affinity> {
    let runtime = jitsi.spec.runtime(component);
    let user = runtime.affinity.as_ref();

    let choice = match default_peer(component) {
        Some(peer) if !runtime.disable_default_affinity => AffinityChoice::DefaultMerged {
            peer_labels: jitsi.component_labels(peer),
            user,
        },
        _ => AffinityChoice::UserOverride(user),
    };
    merge(choice)
}
