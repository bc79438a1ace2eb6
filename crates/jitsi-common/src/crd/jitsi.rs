//! Jitsi Custom Resource Definition
//!
//! A `Jitsi` resource describes one complete video-conferencing deployment:
//! signaling (Prosody), conference focus (Jicofo), media bridge (JVB),
//! recording worker (Jibri) and the web front-end. The operator derives
//! every managed cluster object from this single resource.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{
    AffinitySpec, BucketSpec, Component, Condition, ConfigMapRef, JitsiPhase, ResourcesSpec,
    TurnSpec,
};
use crate::{Error, LABEL_COMPONENT, LABEL_INSTANCE, LABEL_MANAGED_BY, MANAGED_BY_VALUE};

/// Container settings shared by every component
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Container image
    #[serde(default)]
    pub image: String,

    /// Image pull policy (Always, IfNotPresent, Never)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// Compute resource requests and limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesSpec>,

    /// User-declared scheduling affinity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<AffinitySpec>,

    /// Replace the operator's default anti-affinity entirely with the
    /// user-declared affinity (escape hatch for single-node clusters)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_default_affinity: bool,

    /// Service account the component pods run as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

/// Recording worker settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JibriSpec {
    /// Common container settings
    #[serde(flatten)]
    pub runtime: ComponentSpec,

    /// Number of recorder replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Object-storage sink for finished recordings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<BucketSpec>,
}

/// Conference focus settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JicofoSpec {
    /// Common container settings
    #[serde(flatten)]
    pub runtime: ComponentSpec,

    /// Number of focus replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
}

/// Media bridge settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JvbSpec {
    /// Common container settings
    #[serde(flatten)]
    pub runtime: ComponentSpec,

    /// Number of bridge replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
}

/// Signaling server settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProsodySpec {
    /// Common container settings
    #[serde(flatten)]
    pub runtime: ComponentSpec,

    /// ConfigMap overlaying the stock signaling configuration
    /// (mounted as `jitsi-meet.cfg.lua`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_config: Option<ConfigMapRef>,
}

/// Web front-end settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSpec {
    /// Common container settings
    #[serde(flatten)]
    pub runtime: ComponentSpec,

    /// Number of front-end replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
}

/// Specification for a Jitsi deployment instance
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "jitsi.dev",
    version = "v1alpha1",
    kind = "Jitsi",
    plural = "jitsis",
    status = "JitsiStatus",
    namespaced,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JitsiSpec {
    /// Instance-wide settings map
    ///
    /// Each component's environment is built from its recognized-variable
    /// table: a name present here is emitted as a literal (even when the
    /// value is the empty string); a name absent here emits nothing and
    /// the container image's own default applies.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,

    /// External TURN relay advertised by the signaling component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<TurnSpec>,

    /// Signaling server
    #[serde(default)]
    pub prosody: ProsodySpec,

    /// Conference focus
    #[serde(default)]
    pub jicofo: JicofoSpec,

    /// Media bridge
    #[serde(default)]
    pub jvb: JvbSpec,

    /// Recording worker
    #[serde(default)]
    pub jibri: JibriSpec,

    /// Web front-end
    #[serde(default)]
    pub web: WebSpec,
}

impl JitsiSpec {
    /// Common container settings for a component
    pub fn runtime(&self, component: Component) -> &ComponentSpec {
        match component {
            Component::Jibri => &self.jibri.runtime,
            Component::Jicofo => &self.jicofo.runtime,
            Component::Jvb => &self.jvb.runtime,
            Component::Prosody => &self.prosody.runtime,
            Component::Web => &self.web.runtime,
        }
    }

    /// Declared replica count for a component
    ///
    /// The signaling component always runs a single replica (it holds
    /// exclusive conference state) and exposes no replica knob.
    pub fn replicas(&self, component: Component) -> Option<i32> {
        match component {
            Component::Jibri => self.jibri.replicas,
            Component::Jicofo => self.jicofo.replicas,
            Component::Jvb => self.jvb.replicas,
            Component::Prosody => None,
            Component::Web => self.web.replicas,
        }
    }

    /// Validate the spec before any resource is built
    ///
    /// Cross-field rules the schema cannot express; each failure is a
    /// configuration error that requires a spec edit.
    pub fn validate(&self) -> Result<(), Error> {
        for component in Component::ALL {
            if self.runtime(component).image.is_empty() {
                return Err(Error::configuration_for(
                    component.as_str(),
                    "image must be set",
                ));
            }
        }

        if let Some(bucket) = &self.jibri.bucket {
            if bucket.secret.name.is_empty() {
                return Err(Error::configuration_for(
                    Component::Jibri.as_str(),
                    "bucket requires a credentials secret name",
                ));
            }
        }

        if let Some(turn) = &self.turn {
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

        Ok(())
    }
}

/// Status for a Jitsi deployment instance
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JitsiStatus {
    /// The generation of the spec that was last processed by the controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Current lifecycle phase
    #[serde(default)]
    pub phase: JitsiPhase,

    /// Human-readable message about current state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// One condition per managed resource, reflecting its last sync
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl Jitsi {
    /// Instance name (metadata.name)
    ///
    /// Unlike `ResourceExt::name_any` this never falls back to a
    /// generateName prefix; a Jitsi without a name cannot be reconciled.
    pub fn instance_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Deterministic name of one component's managed resources
    /// (`<instance>-<component>`)
    pub fn component_name(&self, component: Component) -> String {
        format!("{}-{}", self.instance_name(), component)
    }

    /// Labels identifying one component of this instance
    ///
    /// Used for the managed resource's own labels, the pod template
    /// labels, and the selector - all three must stay identical because
    /// selectors are immutable once created.
    pub fn component_labels(&self, component: Component) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert(LABEL_INSTANCE.to_string(), self.instance_name().to_string());
        labels.insert(LABEL_COMPONENT.to_string(), component.as_str().to_string());
        labels.insert(LABEL_MANAGED_BY.to_string(), MANAGED_BY_VALUE.to_string());
        labels
    }

    /// Resolve a setting from the instance-wide variables map
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.spec.variables.get(name).map(String::as_str)
    }

    /// Name of the secret carrying this instance's component passwords
    ///
    /// XMPP account passwords and the focus component secret live in a
    /// secret named after the instance; the operator only emits references
    /// to it, never reads the values.
    pub fn component_secret_name(&self) -> String {
        self.instance_name().to_string()
    }
}
