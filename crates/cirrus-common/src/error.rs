//! Error types for the Cirrus cluster lifecycle service

use std::fmt;

use thiserror::Error;

/// The provisioning step that failed.
///
/// Provisioning is an ordered, non-transactional sequence of orchestrator
/// calls; tagging errors with the step lets callers log root cause and,
/// in the future, resume from the failed step instead of restarting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    /// Creation of the credential secrets
    Secrets,
    /// Ensuring the fleet-wide cluster version descriptor exists
    ClusterVersion,
    /// Submission of the cluster deployment resource
    Deployment,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionStep::Secrets => write!(f, "secrets"),
            ProvisionStep::ClusterVersion => write!(f, "cluster version"),
            ProvisionStep::Deployment => write!(f, "deployment"),
        }
    }
}

/// Main error type for Cirrus operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Malformed cluster spec, rejected before persistence
    #[error("validation error: {0}")]
    Validation(String),

    /// Record store read or write failure
    #[error("persistence error: {0}")]
    Persistence(String),

    /// No record, or no external resource, for the given identifier
    #[error("not found: {0}")]
    NotFound(String),

    /// A provisioning step against the external orchestrator failed
    #[error("provisioning failed during {step} step: {source}")]
    Provisioning {
        /// The step that failed; later steps were not attempted
        step: ProvisionStep,
        /// The underlying cause
        source: Box<Error>,
    },

    /// The cluster record was persisted but provisioning failed.
    ///
    /// This is a valid terminal outcome, not a bug: the record remains in
    /// the store in `Installing` state and callers can retry provisioning
    /// out of band using the identifier carried here.
    #[error("cluster {id} was persisted but provisioning failed: {source}")]
    ProvisionIncomplete {
        /// Identifier of the persisted record
        id: String,
        /// The provisioning error
        source: Box<Error>,
    },

    /// More than one external resource matched a supposedly-unique
    /// identifier. Signals a correctness bug upstream; not retryable.
    #[error("inconsistency: {0}")]
    Inconsistency(String),

    /// An external call did not answer within its deadline
    #[error("timed out: {0}")]
    Timeout(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a persistence error with the given message
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a not-found error with the given message
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Wrap an error as a provisioning failure at the given step
    pub fn provisioning(step: ProvisionStep, source: Error) -> Self {
        Self::Provisioning {
            step,
            source: Box::new(source),
        }
    }

    /// Wrap a provisioning error with the identifier of the record that
    /// was already persisted when provisioning failed
    pub fn provision_incomplete(id: impl Into<String>, source: Error) -> Self {
        Self::ProvisionIncomplete {
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// Create an inconsistency error with the given message
    pub fn inconsistency(msg: impl Into<String>) -> Self {
        Self::Inconsistency(msg.into())
    }

    /// Create a timeout error with the given message
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioning_error_names_the_failed_step() {
        let err = Error::provisioning(
            ProvisionStep::Secrets,
            Error::persistence("connection refused"),
        );
        let msg = err.to_string();
        assert!(msg.contains("secrets"), "message was: {msg}");
        assert!(msg.contains("connection refused"), "message was: {msg}");
    }

    #[test]
    fn provision_incomplete_carries_the_record_id() {
        let err = Error::provision_incomplete(
            "abc-123",
            Error::provisioning(ProvisionStep::Deployment, Error::validation("boom")),
        );
        assert!(err.to_string().contains("abc-123"));
    }
}
