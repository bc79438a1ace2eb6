//! Custom Resource Definitions for the Jitsi operator

mod jitsi;
mod types;

pub use jitsi::{
    ComponentSpec, Jitsi, JibriSpec, JicofoSpec, JitsiSpec, JitsiStatus, JvbSpec, ProsodySpec,
    WebSpec,
};
pub use types::{
    AffinitySpec, BucketSpec, Component, Condition, ConditionStatus, ConfigMapRef, JitsiPhase,
    LabelSelectorSpec, PodAffinityRules, PodAffinityTermSpec, ResourcesSpec, SecretKeyRef,
    SecretRef, TurnSpec, WeightedPodAffinityTermSpec,
};
