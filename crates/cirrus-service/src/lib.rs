//! Cluster lifecycle service: the façade every external caller talks to.
//!
//! [`LifecycleService`] composes the record store, the provisioning client,
//! and the state reconciler, and owns the policy of when to provision. The
//! backends are trait objects selected at process start, so a different
//! store or orchestrator client slots in without touching this crate.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use cirrus_common::api::{Cluster, ClusterList, ClusterSpec, ClusterStatus, ListArguments};
use cirrus_common::{Error, Result};
use cirrus_provision::{ClusterProvisioner, StateReconciler};
use cirrus_store::ClusterStore;

/// Operations on clusters, as consumed by the HTTP layer
#[async_trait]
pub trait ClustersService: Send + Sync {
    /// Accept a spec: persist it and, when requested, delegate
    /// infrastructure creation to the external orchestrator
    async fn create(&self, spec: ClusterSpec, provision: bool) -> Result<Cluster>;

    /// Fetch a single cluster record by identifier
    async fn get(&self, id: &str) -> Result<Cluster>;

    /// List cluster records, paginated
    async fn list(&self, args: ListArguments) -> Result<ClusterList>;

    /// Derive the live lifecycle state of a cluster from the orchestrator
    async fn get_status(&self, id: &str) -> Result<ClusterStatus>;
}

/// The default [`ClustersService`] implementation
pub struct LifecycleService {
    store: Arc<dyn ClusterStore>,
    provisioner: Arc<dyn ClusterProvisioner>,
    reconciler: Arc<dyn StateReconciler>,
}

impl LifecycleService {
    /// Compose a lifecycle service from its three collaborators
    pub fn new(
        store: Arc<dyn ClusterStore>,
        provisioner: Arc<dyn ClusterProvisioner>,
        reconciler: Arc<dyn StateReconciler>,
    ) -> Self {
        Self {
            store,
            provisioner,
            reconciler,
        }
    }
}

/// Reject malformed specs before anything is persisted.
///
/// A non-empty name is always required. At least one master node is
/// required only for a spec that will actually be provisioned; a
/// record-only create may hold counts that are not yet provisionable.
fn validate_spec(spec: &ClusterSpec, provision: bool) -> Result<()> {
    if spec.name.trim().is_empty() {
        return Err(Error::validation("cluster name must not be empty"));
    }
    if provision && spec.nodes.master == 0 {
        return Err(Error::validation(
            "at least one master node is required to provision a cluster",
        ));
    }
    Ok(())
}

#[async_trait]
impl ClustersService for LifecycleService {
    #[instrument(skip(self, spec), fields(name = %spec.name))]
    async fn create(&self, spec: ClusterSpec, provision: bool) -> Result<Cluster> {
        validate_spec(&spec, provision)?;

        // Persist first: the record exists from this point on regardless of
        // what provisioning does.
        let cluster = self.store.create(&spec).await?;
        info!(id = %cluster.id, "persisted cluster record");

        if provision {
            // Provision with the persisted record so the correlation label
            // carries the real identifier.
            if let Err(err) = self.provisioner.provision(&cluster).await {
                // Deliberately no rollback: the record stays in Installing
                // and the caller gets the identifier to retry out of band.
                error!(id = %cluster.id, error = %err, "provisioning failed; record remains");
                return Err(Error::provision_incomplete(cluster.id.clone(), err));
            }
        }

        Ok(cluster)
    }

    async fn get(&self, id: &str) -> Result<Cluster> {
        self.store.get(id).await
    }

    async fn list(&self, args: ListArguments) -> Result<ClusterList> {
        self.store.list(args).await
    }

    #[instrument(skip(self))]
    async fn get_status(&self, id: &str) -> Result<ClusterStatus> {
        // Confirm the record exists before contacting the orchestrator; an
        // unknown id surfaces as NotFound without any external call.
        self.store.get(id).await?;

        match self.reconciler.observe(id).await {
            Ok(state) => Ok(ClusterStatus {
                id: id.to_string(),
                state,
            }),
            Err(err) => {
                // Status queries are read-only against the store; the
                // last-known state is never touched here.
                error!(id = %id, error = %err, "state reconciliation failed");
                Err(err)
            }
        }
    }
}
