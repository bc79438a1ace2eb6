//! Error types for the Jitsi operator
//!
//! Errors are structured with fields to aid debugging in production and
//! carry a retry policy: the controller's error_policy asks each error
//! whether re-running the reconcile can help before requeueing.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for Jitsi operator operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Optimistic-concurrency rejection while persisting a managed resource
    ///
    /// The object changed between fetch and persist. The whole sync
    /// pipeline for the resource must be re-run from fetch.
    #[error("conflict persisting {kind} {name}: object changed concurrently")]
    Conflict {
        /// Resource kind being written
        kind: String,
        /// Resource name being written
        name: String,
    },

    /// A required cross-field combination is missing from the spec
    ///
    /// Requires a spec edit to fix; never retried automatically.
    #[error("configuration error for {component}: {message}")]
    Configuration {
        /// Component whose spec is invalid
        component: String,
        /// Description of what's invalid
        message: String,
    },

    /// A builder invariant was violated
    ///
    /// Indicates a programming defect (e.g., a duplicate environment
    /// variable name). Fails loudly rather than silently dropping data.
    #[error("builder invariant violated [{context}]: {message}")]
    Invariant {
        /// Description of the violated invariant
        message: String,
        /// Where the violation was detected (e.g., "env", "sync")
        context: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Where the error occurred (e.g., "startup", "controller")
        context: String,
    },
}

impl Error {
    /// Create a conflict error for a managed resource
    pub fn conflict(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Conflict {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a configuration error without component context
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            component: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
        }
    }

    /// Create a configuration error for a specific component
    pub fn configuration_for(component: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: msg.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an invariant violation error with context
    pub fn invariant_in(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Invariant {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Conflicts always retry (re-running the sync pipeline resolves them).
    /// Configuration and invariant errors require a spec or code fix.
    /// Kubernetes errors retry unless the API rejected the request (4xx).
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => {
                !matches!(
                    source,
                    kube::Error::Api(ae) if (400..500).contains(&ae.code)
                )
            }
            Error::Conflict { .. } => true,
            Error::Configuration { .. } => false,
            Error::Invariant { .. } => false,
            Error::Serialization { .. } => false,
            Error::Internal { .. } => true,
        }
    }

    /// Check if this error is an optimistic-concurrency conflict
    ///
    /// Conflicts are requeued immediately rather than with backoff.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Get the component name if this error is associated with one
    pub fn component(&self) -> Option<&str> {
        match self {
            Error::Configuration { component, .. } => Some(component),
            _ => None,
        }
    }
}
