//! Deterministic naming of orchestrator resources.
//!
//! The deployment name is the only identity link between a cluster record
//! and the external system, so it is computed by one pure function used by
//! both the provisioning client and the reconciler. It is a weak reference:
//! a lookup key, never an ownership relation.

use cirrus_common::CLUSTER_ID_LABEL;

/// Name and namespace of the deployment resource inside the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDeploymentRef {
    /// Deployment resource name: the lower-cased cluster name
    pub name: String,
    /// Orchestrator namespace holding all Cirrus-managed resources
    pub namespace: String,
}

impl ExternalDeploymentRef {
    /// Name of the TLS certificate secret for this deployment
    pub fn certs_secret(&self) -> String {
        format!("{}-certs", self.name)
    }

    /// Name of the cloud-account credentials secret for this deployment
    pub fn aws_creds_secret(&self) -> String {
        format!("{}-aws-creds", self.name)
    }

    /// Name of the SSH key pair secret for this deployment
    pub fn ssh_key_secret(&self) -> String {
        format!("{}-ssh-key", self.name)
    }
}

/// Compute the external deployment reference for a cluster name.
///
/// Pure and deterministic: the same (name, namespace) pair always yields
/// the same reference.
pub fn deployment_ref(cluster_name: &str, namespace: &str) -> ExternalDeploymentRef {
    ExternalDeploymentRef {
        name: cluster_name.to_lowercase(),
        namespace: namespace.to_string(),
    }
}

/// Label selector matching the deployment resource labeled with the given
/// cluster record identifier
pub fn id_label_selector(id: &str) -> String {
    format!("{CLUSTER_ID_LABEL}={id}")
}
