//! Orchestrator-backed implementation of [`ClusterProvisioner`].
//!
//! Provisioning is an ordered, non-transactional sequence: credential
//! secrets, then the shared version descriptor, then the deployment
//! request. Each step's failure aborts the remaining steps and is tagged
//! with the step that failed. A second attempt for the same name fails on
//! duplicate-secret creation; the sequence is not idempotent.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, DynamicObject, PostParams};
use kube::Client;
use tracing::{debug, info, instrument};

use cirrus_common::api::Cluster;
use cirrus_common::kube_utils::build_api_resource;
use cirrus_common::{Error, ProvisionStep, Result};

use crate::deadline::with_deadline;
use crate::deployment_ref::{deployment_ref, ExternalDeploymentRef};
use crate::manifests::{
    build_cluster_deployment, build_cluster_version, build_secrets, CLUSTER_OPERATOR_API_VERSION,
    CLUSTER_VERSION_NAME,
};
use crate::ClusterProvisioner;

/// Provisioning client submitting cluster resources to the orchestrator
pub struct OrchestratorProvisioner {
    client: Client,
    namespace: String,
    timeout: Duration,
}

impl OrchestratorProvisioner {
    /// Create a provisioner targeting the given orchestrator namespace.
    ///
    /// `timeout` bounds each individual orchestrator call.
    pub fn new(client: Client, namespace: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            timeout,
        }
    }

    async fn create_secrets(&self, dref: &ExternalDeploymentRef) -> Result<()> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &dref.namespace);
        for secret in build_secrets(dref) {
            let name = secret.metadata.name.clone().unwrap_or_default();
            with_deadline(
                "secret creation",
                self.timeout,
                api.create(&PostParams::default(), &secret),
            )
            .await?;
            debug!(secret = %name, "created credential secret");
        }
        Ok(())
    }

    /// Ensure the fleet-wide version descriptor exists.
    ///
    /// Implemented as an unconditional create where "already exists" is
    /// success: the backend's conditional-create semantics arbitrate
    /// concurrent first writers, and exactly one wins. The existing object
    /// is never validated or updated.
    async fn ensure_cluster_version(&self, region: &str) -> Result<()> {
        let ar = build_api_resource(CLUSTER_OPERATOR_API_VERSION, "ClusterVersion");
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &self.namespace, &ar);
        let version: DynamicObject =
            serde_json::from_value(build_cluster_version(&self.namespace, region))
                .map_err(|e| Error::serialization(format!("cluster version manifest: {e}")))?;

        match with_deadline(
            "cluster version creation",
            self.timeout,
            api.create(&PostParams::default(), &version),
        )
        .await
        {
            Ok(_) => {
                info!(name = CLUSTER_VERSION_NAME, "created cluster version descriptor");
                Ok(())
            }
            Err(Error::Kube(err)) if is_already_exists(&err) => {
                debug!(
                    name = CLUSTER_VERSION_NAME,
                    "cluster version descriptor already exists"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn create_deployment(
        &self,
        cluster: &Cluster,
        dref: &ExternalDeploymentRef,
    ) -> Result<()> {
        let ar = build_api_resource(CLUSTER_OPERATOR_API_VERSION, "ClusterDeployment");
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &dref.namespace, &ar);
        let deployment: DynamicObject =
            serde_json::from_value(build_cluster_deployment(cluster, dref))
                .map_err(|e| Error::serialization(format!("cluster deployment manifest: {e}")))?;

        // Every error, including "already exists", is surfaced here.
        with_deadline(
            "deployment creation",
            self.timeout,
            api.create(&PostParams::default(), &deployment),
        )
        .await?;
        info!(id = %cluster.id, deployment = %dref.name, "submitted cluster deployment");
        Ok(())
    }
}

fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 409)
}

#[async_trait]
impl ClusterProvisioner for OrchestratorProvisioner {
    #[instrument(skip(self, cluster), fields(id = %cluster.id, name = %cluster.name))]
    async fn provision(&self, cluster: &Cluster) -> Result<()> {
        let dref = deployment_ref(&cluster.name, &self.namespace);

        self.create_secrets(&dref)
            .await
            .map_err(|e| Error::provisioning(ProvisionStep::Secrets, e))?;
        self.ensure_cluster_version(&cluster.region)
            .await
            .map_err(|e| Error::provisioning(ProvisionStep::ClusterVersion, e))?;
        self.create_deployment(cluster, &dref)
            .await
            .map_err(|e| Error::provisioning(ProvisionStep::Deployment, e))?;

        Ok(())
    }
}
