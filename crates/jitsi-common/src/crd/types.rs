//! Shared CRD types for the Jitsi operator
//!
//! CR-facing types are hand-rolled with `JsonSchema` so the CRD schema is
//! explicit and stable, then converted to `k8s_openapi` natives at the
//! point where builders assemble pod specs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Components
// =============================================================================

/// A managed component of a Jitsi deployment
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Recording worker
    Jibri,
    /// Focus / conference controller
    Jicofo,
    /// Media bridge
    Jvb,
    /// XMPP signaling server
    Prosody,
    /// Web front-end
    Web,
}

impl Component {
    /// Stable lowercase name, used in labels and resource name suffixes
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Jibri => "jibri",
            Component::Jicofo => "jicofo",
            Component::Jvb => "jvb",
            Component::Prosody => "prosody",
            Component::Web => "web",
        }
    }

    /// All managed components, in reconciliation order
    pub const ALL: [Component; 5] = [
        Component::Prosody,
        Component::Jicofo,
        Component::Jvb,
        Component::Jibri,
        Component::Web,
    ];
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// References
// =============================================================================

/// Reference to a key within a named Secret in the instance namespace
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeyRef {
    /// Secret name
    pub name: String,
    /// Key within the secret
    pub key: String,
}

impl SecretKeyRef {
    /// Convert to the k8s native selector for use in an EnvVarSource
    pub fn to_selector(&self) -> corev1::SecretKeySelector {
        corev1::SecretKeySelector {
            name: self.name.clone(),
            key: self.key.clone(),
            optional: None,
        }
    }
}

/// Reference to a Secret by name in the instance namespace
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    /// Secret name
    pub name: String,
}

/// Reference to a ConfigMap in the instance namespace
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapRef {
    /// ConfigMap name
    pub name: String,
}

// =============================================================================
// Feature descriptors
// =============================================================================

/// Object-storage sink for finished recordings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BucketSpec {
    /// Endpoint URL of the object store
    pub host: String,
    /// Bucket name
    pub name: String,
    /// Secret holding `ACCESS_KEY` and `SECRET_KEY` entries
    pub secret: SecretRef,
}

/// External TURN/STUN relay used by the signaling component
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TurnSpec {
    /// TURN server hostname
    pub host: String,
    /// TURN server port
    pub port: u16,
    /// Whether clients connect over TLS (switches the advertised variable
    /// names from `TURN_*` to `TURNS_*`)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tls: bool,
    /// Optional static credentials for the relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretKeyRef>,
}

// =============================================================================
// Resources
// =============================================================================

/// Compute resource requests and limits, expressed as quantity strings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesSpec {
    /// Minimum resources (e.g., cpu: "500m", memory: "1Gi")
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,
    /// Maximum resources
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, String>,
}

impl ResourcesSpec {
    /// Convert to k8s native resource requirements
    pub fn to_requirements(&self) -> corev1::ResourceRequirements {
        let quantify = |m: &BTreeMap<String, String>| {
            if m.is_empty() {
                None
            } else {
                Some(
                    m.iter()
                        .map(|(k, v)| (k.clone(), Quantity(v.clone())))
                        .collect(),
                )
            }
        };
        corev1::ResourceRequirements {
            requests: quantify(&self.requests),
            limits: quantify(&self.limits),
            ..Default::default()
        }
    }
}

// =============================================================================
// Affinity
// =============================================================================

/// Label selector for affinity terms
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelectorSpec {
    /// Labels that must match
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

/// A single pod (anti-)affinity term
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodAffinityTermSpec {
    /// Selector for the peer pods this term refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelectorSpec>,
    /// Topology domain the rule applies within (e.g., kubernetes.io/hostname)
    pub topology_key: String,
}

/// A weighted pod (anti-)affinity term for preferred scheduling
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeightedPodAffinityTermSpec {
    /// Weight in the range 1-100
    pub weight: i32,
    /// The term being weighted
    pub pod_affinity_term: PodAffinityTermSpec,
}

/// Scheduling rules for one set of terms (required and preferred)
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodAffinityRules {
    /// Hard requirements - pods must satisfy these to schedule
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_during_scheduling_ignored_during_execution: Vec<PodAffinityTermSpec>,
    /// Soft preferences - the scheduler tries to satisfy these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_during_scheduling_ignored_during_execution: Vec<WeightedPodAffinityTermSpec>,
}

/// User-declared scheduling affinity for one component
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AffinitySpec {
    /// Co-location rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_affinity: Option<PodAffinityRules>,
    /// Anti-co-location rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_anti_affinity: Option<PodAffinityRules>,
}

impl LabelSelectorSpec {
    fn to_selector(&self) -> metav1::LabelSelector {
        metav1::LabelSelector {
            match_labels: if self.match_labels.is_empty() {
                None
            } else {
                Some(self.match_labels.clone())
            },
            ..Default::default()
        }
    }
}

impl PodAffinityTermSpec {
    /// Convert to the k8s native affinity term
    pub fn to_term(&self) -> corev1::PodAffinityTerm {
        corev1::PodAffinityTerm {
            label_selector: self.label_selector.as_ref().map(|s| s.to_selector()),
            topology_key: self.topology_key.clone(),
            ..Default::default()
        }
    }
}

impl WeightedPodAffinityTermSpec {
    /// Convert to the k8s native weighted affinity term
    pub fn to_term(&self) -> corev1::WeightedPodAffinityTerm {
        corev1::WeightedPodAffinityTerm {
            weight: self.weight,
            pod_affinity_term: self.pod_affinity_term.to_term(),
        }
    }
}

impl PodAffinityRules {
    fn required_terms(&self) -> Option<Vec<corev1::PodAffinityTerm>> {
        if self
            .required_during_scheduling_ignored_during_execution
            .is_empty()
        {
            None
        } else {
            Some(
                self.required_during_scheduling_ignored_during_execution
                    .iter()
                    .map(|t| t.to_term())
                    .collect(),
            )
        }
    }

    fn preferred_terms(&self) -> Option<Vec<corev1::WeightedPodAffinityTerm>> {
        if self
            .preferred_during_scheduling_ignored_during_execution
            .is_empty()
        {
            None
        } else {
            Some(
                self.preferred_during_scheduling_ignored_during_execution
                    .iter()
                    .map(|t| t.to_term())
                    .collect(),
            )
        }
    }
}

impl AffinitySpec {
    /// Convert to the k8s native affinity struct
    ///
    /// Returns `None` when no rules are declared at all, so empty user
    /// affinity doesn't force an empty `affinity: {}` stanza into pods.
    pub fn to_affinity(&self) -> Option<corev1::Affinity> {
        let pod_affinity = self.pod_affinity.as_ref().map(|r| corev1::PodAffinity {
            required_during_scheduling_ignored_during_execution: r.required_terms(),
            preferred_during_scheduling_ignored_during_execution: r.preferred_terms(),
        });
        let pod_anti_affinity = self
            .pod_anti_affinity
            .as_ref()
            .map(|r| corev1::PodAntiAffinity {
                required_during_scheduling_ignored_during_execution: r.required_terms(),
                preferred_during_scheduling_ignored_during_execution: r.preferred_terms(),
            });
        if pod_affinity.is_none() && pod_anti_affinity.is_none() {
            return None;
        }
        Some(corev1::Affinity {
            pod_affinity,
            pod_anti_affinity,
            ..Default::default()
        })
    }
}

// =============================================================================
// Status
// =============================================================================

/// Status of a condition (True, False, Unknown)
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Kubernetes-style condition for status reporting
///
/// One condition is kept per managed resource, reflecting the outcome of
/// its last sync.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Condition {
    /// Type of condition (e.g., ProsodyDeployment)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    pub reason: String,

    /// Human-readable message
    pub message: String,

    /// Last time the condition transitioned
    #[serde(rename = "lastTransitionTime")]
    pub last_transition_time: DateTime<Utc>,
}

/// Lifecycle phase of a Jitsi instance
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum JitsiPhase {
    /// Instance has not been reconciled yet
    #[default]
    Pending,
    /// Managed resources are being converged
    Reconciling,
    /// All managed resources match the desired state
    Ready,
    /// Reconciliation hit a permanent error (spec edit required)
    Failed,
}

impl fmt::Display for JitsiPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Reconciling => write!(f, "Reconciling"),
            Self::Ready => write!(f, "Ready"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}
