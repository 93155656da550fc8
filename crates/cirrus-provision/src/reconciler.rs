//! Orchestrator-backed implementation of [`StateReconciler`].
//!
//! Reconciliation is read-only: look up the deployment by the correlation
//! label, resolve the compute cluster it references, and collapse the
//! reported status into the three-state lifecycle enum. The mapping is
//! deliberately coarse; finer-grained status is a non-goal.

use std::time::Duration;

use async_trait::async_trait;
use kube::api::{Api, DynamicObject, ListParams};
use kube::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use cirrus_common::api::ClusterState;
use cirrus_common::kube_utils::build_api_resource;
use cirrus_common::{Error, Result};

use crate::deadline::with_deadline;
use crate::deployment_ref::id_label_selector;
use crate::manifests::{CLUSTER_API_VERSION, CLUSTER_OPERATOR_API_VERSION};
use crate::StateReconciler;

/// State reconciler querying the orchestrator's live resources
pub struct OrchestratorReconciler {
    client: Client,
    namespace: String,
    timeout: Duration,
}

impl OrchestratorReconciler {
    /// Create a reconciler for the given orchestrator namespace
    pub fn new(client: Client, namespace: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            timeout,
        }
    }
}

/// Map a compute cluster's `status` field to a lifecycle state.
///
/// An absent provider status means the orchestrator has not reported yet,
/// which reads as still installing; a present but malformed one is an
/// error, never a silent `Ready`.
fn state_from_status(status: Option<&Value>) -> Result<ClusterState> {
    let provider_status = match status.and_then(|s| s.get("providerStatus")) {
        None | Some(Value::Null) => return Ok(ClusterState::Installing),
        Some(ps) => ps,
    };
    if !provider_status.is_object() {
        return Err(Error::serialization(
            "providerStatus is not an object".to_string(),
        ));
    }
    match provider_status.get("ready") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(ClusterState::Installing),
        Some(Value::Bool(true)) => Ok(ClusterState::Ready),
        Some(other) => Err(Error::serialization(format!(
            "providerStatus.ready is not a boolean: {other}"
        ))),
    }
}

#[async_trait]
impl StateReconciler for OrchestratorReconciler {
    #[instrument(skip(self))]
    async fn observe(&self, id: &str) -> Result<ClusterState> {
        let ar = build_api_resource(CLUSTER_OPERATOR_API_VERSION, "ClusterDeployment");
        let deployments: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &self.namespace, &ar);

        let selector = id_label_selector(id);
        let matches = with_deadline(
            "deployment lookup",
            self.timeout,
            deployments.list(&ListParams::default().labels(&selector)),
        )
        .await?;

        let deployment = match matches.items.len() {
            0 => {
                // Never created, or deleted out-of-band. Distinct from
                // "installing": the weak reference points at nothing.
                warn!(id = %id, "no deployment matches the cluster identifier");
                return Err(Error::not_found(format!(
                    "no deployment labeled with cluster id '{id}'"
                )));
            }
            1 => &matches.items[0],
            n => {
                // Identifiers are unique, so this is a correctness bug
                // upstream. Fatal to the request, not retryable.
                return Err(Error::inconsistency(format!(
                    "{n} deployments labeled with cluster id '{id}'"
                )));
            }
        };

        let cluster_name = deployment
            .data
            .pointer("/spec/clusterName")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::serialization(format!(
                    "deployment for cluster id '{id}' has no spec.clusterName"
                ))
            })?;

        let cluster_ar = build_api_resource(CLUSTER_API_VERSION, "Cluster");
        let clusters: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &self.namespace, &cluster_ar);
        let cluster = with_deadline(
            "cluster status read",
            self.timeout,
            clusters.get(cluster_name),
        )
        .await?;

        let state = state_from_status(cluster.data.get("status"))?;
        debug!(id = %id, cluster = %cluster_name, state = %state, "observed cluster state");
        Ok(state)
    }
}
