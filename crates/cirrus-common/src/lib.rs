//! Common types for Cirrus: the cluster API model, errors, and utilities

#![deny(missing_docs)]

pub mod api;
pub mod error;
pub mod kube_utils;
pub mod telemetry;

pub use error::{Error, ProvisionStep};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Label key carrying a cluster record's local identifier on the external
/// deployment resource. This is the correlation key: the provisioner sets it
/// and the reconciler queries by it.
pub const CLUSTER_ID_LABEL: &str = "cirrus.io/cluster-id";

/// Namespace in the orchestrator cluster where all Cirrus-managed resources
/// (secrets, version descriptor, deployments) live
pub const DEFAULT_CLUSTERS_NAMESPACE: &str = "cirrus-clusters";
