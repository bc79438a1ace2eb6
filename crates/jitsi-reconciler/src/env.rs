//! Environment composition for component containers
//!
//! Each container's environment is assembled from two layers, in a fixed
//! order so generated specs stay byte-stable across reconciliations:
//!
//! 1. The component's recognized-variable table, filtered through the
//!    instance's settings map (a set name becomes a literal, an unset name
//!    emits nothing).
//! 2. `extras`: operator-computed variables - secret references, pod field
//!    references, and feature-conditional sets (storage sink, TURN relay) -
//!    appended in contributor order.
//!
//! A table name that an extra also computes is skipped in the table pass;
//! computed values are authoritative. By construction no two entries in
//! one container's list share a name.

use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector, SecretKeySelector};

use jitsi_common::crd::{BucketSpec, TurnSpec};

/// Build a literal environment variable
pub fn literal(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        value_from: None,
    }
}

/// Build a variable resolved from a field of the running pod
pub fn field_ref(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: None,
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
    }
}

/// Build a variable resolved from a key in a named secret
pub fn secret_key(name: &str, secret_name: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: None,
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret_name.to_string(),
                key: key.to_string(),
                optional: None,
            }),
            ..Default::default()
        }),
    }
}

/// Ordered accumulator for operator-computed extras
///
/// Contributor functions push into this in a fixed sequence; the final
/// list is handed to [`compose`].
#[derive(Debug, Default)]
pub struct EnvAccumulator {
    vars: Vec<EnvVar>,
}

impl EnvAccumulator {
    /// Append a literal variable
    pub fn literal(&mut self, name: &str, value: impl Into<String>) {
        self.vars.push(literal(name, value));
    }

    /// Append a pod field reference
    pub fn field_ref(&mut self, name: &str, field_path: &str) {
        self.vars.push(field_ref(name, field_path));
    }

    /// Append a secret key reference
    pub fn secret_key(&mut self, name: &str, secret_name: &str, key: &str) {
        self.vars.push(secret_key(name, secret_name, key));
    }

    /// Append an already-built variable
    pub fn push(&mut self, var: EnvVar) {
        self.vars.push(var);
    }

    /// Finish accumulation
    pub fn into_vars(self) -> Vec<EnvVar> {
        self.vars
    }
}

/// Compose one container's complete environment
///
/// Walks `table` in order, emitting a literal for every name `resolve`
/// yields (skipping names shadowed by `extras`), then appends `extras`
/// unchanged. Infallible: absent settings simply emit nothing.
pub fn compose<'a, R>(table: &[&str], resolve: R, extras: Vec<EnvVar>) -> Vec<EnvVar>
where
    R: Fn(&str) -> Option<&'a str>,
{
    let shadowed: BTreeSet<&str> = extras.iter().map(|e| e.name.as_str()).collect();

    let mut vars: Vec<EnvVar> = Vec::with_capacity(table.len() + extras.len());
    for name in table {
        if shadowed.contains(name) {
            continue;
        }
        if let Some(value) = resolve(name) {
            vars.push(literal(name, value));
        }
    }
    vars.extend(extras);

    debug_assert!(
        {
            let mut seen = BTreeSet::new();
            vars.iter().all(|v| seen.insert(v.name.as_str()))
        },
        "duplicate environment variable name in composed list"
    );

    vars
}

// =============================================================================
// Feature contributors
// =============================================================================

/// Storage-sink variables for the recording worker
///
/// Exactly four variables: the endpoint and bucket as literals, the
/// credentials as references into the bucket's secret.
pub fn storage_env(bucket: &BucketSpec, env: &mut EnvAccumulator) {
    env.literal("S3_URL", &bucket.host);
    env.literal("S3_BUCKET", &bucket.name);
    env.secret_key("S3_ACCESS_KEY", &bucket.secret.name, "ACCESS_KEY");
    env.secret_key("S3_SECRET_KEY", &bucket.secret.name, "SECRET_KEY");
}

/// TURN relay variables for the signaling server
///
/// The advertised variable names switch between `TURN_*` and `TURNS_*`
/// depending on whether clients connect over TLS. The credentials
/// reference is emitted only when the relay descriptor carries one.
pub fn turn_env(turn: &TurnSpec, env: &mut EnvAccumulator) {
    let prefix = if turn.tls { "TURNS" } else { "TURN" };
    env.literal(&format!("{prefix}_HOST"), &turn.host);
    env.literal(&format!("{prefix}_PORT"), turn.port.to_string());
    if let Some(secret) = &turn.secret {
        env.push(EnvVar {
            name: "TURN_CREDENTIALS".to_string(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(secret.to_selector()),
                ..Default::default()
            }),
        });
    }
}
