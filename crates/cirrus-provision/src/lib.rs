//! Provisioning delegation and state reconciliation against the external
//! cluster orchestrator.
//!
//! The orchestrator is the system of record for actually creating compute
//! infrastructure; this crate is a client of it. [`ClusterProvisioner`]
//! submits the resources that describe a cluster, [`StateReconciler`] maps
//! the orchestrator's live status back into the three-state lifecycle enum.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use cirrus_common::api::{Cluster, ClusterState};
use cirrus_common::Result;

mod deadline;
pub mod deployment_ref;
mod manifests;
mod provisioner;
mod reconciler;

pub use deployment_ref::{deployment_ref, id_label_selector, ExternalDeploymentRef};
pub use provisioner::OrchestratorProvisioner;
pub use reconciler::OrchestratorReconciler;

/// Submits a persisted cluster record to the external orchestrator.
///
/// Provisioning is fire-and-forget: a successful return means the request
/// was accepted, not that infrastructure exists. No retries are performed;
/// callers own retry policy.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterProvisioner: Send + Sync {
    /// Create the orchestrator resources describing this cluster.
    ///
    /// Must be called with the *persisted* record so the correlation label
    /// carries the real identifier.
    async fn provision(&self, cluster: &Cluster) -> Result<()>;
}

/// Derives the current lifecycle state of a cluster by querying the
/// external orchestrator. No caching; every call is a live query.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StateReconciler: Send + Sync {
    /// Look up the deployment resource labeled with this identifier and map
    /// its reported status to a lifecycle state.
    ///
    /// Zero matching resources is a not-found error; more than one is an
    /// inconsistency (identifiers are unique, so this must never happen).
    async fn observe(&self, id: &str) -> Result<ClusterState>;
}
