//! Builders for the orchestrator resources submitted during provisioning.
//!
//! Field shapes follow the cluster-operator API
//! (`clusteroperator.openshift.io/v1alpha1`). Everything here is pure
//! construction; submission lives in the provisioner.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::{json, Value};

use cirrus_common::api::Cluster;
use cirrus_common::CLUSTER_ID_LABEL;

use crate::deployment_ref::ExternalDeploymentRef;

/// apiVersion of the cluster-operator resource kinds
pub const CLUSTER_OPERATOR_API_VERSION: &str = "clusteroperator.openshift.io/v1alpha1";

/// apiVersion of the compute-cluster resource created by the orchestrator
pub const CLUSTER_API_VERSION: &str = "cluster.x-k8s.io/v1alpha1";

/// Name of the fleet-wide version descriptor. First writer wins; the
/// existing object is never validated or updated.
pub const CLUSTER_VERSION_NAME: &str = "origin-v3-10";

const ANSIBLE_IMAGE: &str =
    "registry.svc.ci.openshift.org/openshift-cluster-operator/cluster-operator-ansible:latest";
const CLUSTER_API_IMAGE: &str =
    "registry.svc.ci.openshift.org/openshift-cluster-operator/kubernetes-cluster-api:latest";
const MACHINE_CONTROLLER_IMAGE: &str =
    "registry.svc.ci.openshift.org/openshift-cluster-operator/cluster-operator:latest";

const SERVICE_CIDR: &str = "172.30.0.0/16";
const POD_CIDR: &str = "10.128.0.0/14";
const DEFAULT_INSTANCE_TYPE: &str = "t2.xlarge";
const SSH_USER: &str = "centos";
const KEY_PAIR_NAME: &str = "libra";

fn opaque_secret(name: String, namespace: &str, data: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        string_data: Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<String, String>>(),
        ),
        ..Default::default()
    }
}

/// Build the three credential secrets a deployment references.
///
/// The values are placeholders; a real installation must source TLS
/// material, cloud credentials, and SSH keys from a secret backend.
pub fn build_secrets(dref: &ExternalDeploymentRef) -> Vec<Secret> {
    vec![
        opaque_secret(
            dref.certs_secret(),
            &dref.namespace,
            &[
                ("server.crt", "placeholder_tls_cert"),
                ("server.key", "placeholder_tls_key"),
            ],
        ),
        opaque_secret(
            dref.aws_creds_secret(),
            &dref.namespace,
            &[
                ("awsAccessKeyId", "placeholder_aws_access_key_id"),
                ("awsSecretAccessKey", "placeholder_aws_secret_access_key"),
            ],
        ),
        opaque_secret(
            dref.ssh_key_secret(),
            &dref.namespace,
            &[
                ("ssh-privatekey", "placeholder_ssh_private_key"),
                ("ssh-publickey", "placeholder_ssh_public_key"),
            ],
        ),
    ]
}

/// Build the fleet-wide ClusterVersion descriptor: the container images,
/// pull policy, and target platform version used for every cluster.
pub fn build_cluster_version(namespace: &str, region: &str) -> Value {
    json!({
        "apiVersion": CLUSTER_OPERATOR_API_VERSION,
        "kind": "ClusterVersion",
        "metadata": {
            "name": CLUSTER_VERSION_NAME,
            "namespace": namespace,
        },
        "spec": {
            "deploymentType": "origin",
            "version": "v3.10.0",
            "vmImages": {
                "awsImages": {
                    "regionAMIs": [
                        {"region": region, "ami": "ami-0dd8ad483cef75c18"},
                    ],
                },
            },
            "images": {
                "imageFormat": "openshift/origin-${component}:v3.10.0",
                "openshiftAnsibleImage": ANSIBLE_IMAGE,
                "openshiftAnsibleImagePullPolicy": "IfNotPresent",
                "clusterAPIImage": CLUSTER_API_IMAGE,
                "clusterAPIImagePullPolicy": "IfNotPresent",
                "machineControllerImage": MACHINE_CONTROLLER_IMAGE,
                "machineControllerImagePullPolicy": "IfNotPresent",
            },
        },
    })
}

/// Build the per-cluster ClusterDeployment resource.
///
/// Carries the correlation label with the record's local identifier, the
/// reference to the shared version descriptor, the fixed network CIDRs,
/// and the three machine pools with the spec's node counts.
pub fn build_cluster_deployment(cluster: &Cluster, dref: &ExternalDeploymentRef) -> Value {
    json!({
        "apiVersion": CLUSTER_OPERATOR_API_VERSION,
        "kind": "ClusterDeployment",
        "metadata": {
            "name": dref.name,
            "namespace": dref.namespace,
            "labels": {
                CLUSTER_ID_LABEL: cluster.id,
            },
        },
        "spec": {
            "clusterName": dref.name,
            "clusterVersionRef": {
                "name": CLUSTER_VERSION_NAME,
                "namespace": dref.namespace,
            },
            "networkConfig": {
                "services": {"cidrBlocks": [SERVICE_CIDR]},
                "pods": {"cidrBlocks": [POD_CIDR]},
            },
            "hardware": {
                "aws": {
                    "accountSecret": {"name": dref.aws_creds_secret()},
                    "sshSecret": {"name": dref.ssh_key_secret()},
                    "sshUser": SSH_USER,
                    "sslSecret": {"name": dref.certs_secret()},
                    "region": cluster.region,
                    "keyPairName": KEY_PAIR_NAME,
                },
            },
            "defaultHardwareSpec": {
                "aws": {"instanceType": DEFAULT_INSTANCE_TYPE},
            },
            "machineSets": [
                {
                    "machineSetConfig": {
                        "infra": false,
                        "size": cluster.nodes.master,
                        "nodeType": "Master",
                    },
                },
                {
                    "shortName": "compute",
                    "machineSetConfig": {
                        "infra": false,
                        "size": cluster.nodes.compute,
                        "nodeType": "Compute",
                    },
                },
                {
                    "shortName": "infra",
                    "machineSetConfig": {
                        "infra": true,
                        "size": cluster.nodes.infra,
                        "nodeType": "Compute",
                    },
                },
            ],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment_ref::deployment_ref;
    use cirrus_common::api::{ClusterSpec, ClusterState, NodeCounts};

    fn demo_cluster() -> Cluster {
        let spec = ClusterSpec {
            name: "Demo".to_string(),
            region: "us-east-1".to_string(),
            nodes: NodeCounts {
                master: 1,
                infra: 2,
                compute: 3,
            },
            memory: 64,
            cpu_cores: 16,
            storage: 500,
        };
        Cluster::from_spec("id-123", &spec, ClusterState::Installing)
    }

    #[test]
    fn secrets_use_deterministic_names_and_expected_keys() {
        let dref = deployment_ref("Demo", "cirrus-clusters");
        let secrets = build_secrets(&dref);
        assert_eq!(secrets.len(), 3);

        let names: Vec<_> = secrets
            .iter()
            .map(|s| s.metadata.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["demo-certs", "demo-aws-creds", "demo-ssh-key"]);

        for secret in &secrets {
            assert_eq!(secret.type_.as_deref(), Some("Opaque"));
            assert_eq!(
                secret.metadata.namespace.as_deref(),
                Some("cirrus-clusters")
            );
        }
        let creds = secrets[1].string_data.as_ref().unwrap();
        assert!(creds.contains_key("awsAccessKeyId"));
        assert!(creds.contains_key("awsSecretAccessKey"));
    }

    #[test]
    fn deployment_carries_the_correlation_label() {
        let cluster = demo_cluster();
        let dref = deployment_ref(&cluster.name, "cirrus-clusters");
        let deployment = build_cluster_deployment(&cluster, &dref);
        assert_eq!(
            deployment["metadata"]["labels"]["cirrus.io/cluster-id"],
            "id-123"
        );
    }

    #[test]
    fn deployment_name_and_cluster_name_are_lower_cased() {
        let cluster = demo_cluster();
        let dref = deployment_ref(&cluster.name, "cirrus-clusters");
        let deployment = build_cluster_deployment(&cluster, &dref);
        assert_eq!(deployment["metadata"]["name"], "demo");
        assert_eq!(deployment["spec"]["clusterName"], "demo");
    }

    #[test]
    fn deployment_references_the_shared_version_descriptor() {
        let cluster = demo_cluster();
        let dref = deployment_ref(&cluster.name, "cirrus-clusters");
        let deployment = build_cluster_deployment(&cluster, &dref);
        assert_eq!(
            deployment["spec"]["clusterVersionRef"]["name"],
            CLUSTER_VERSION_NAME
        );
        assert_eq!(
            deployment["spec"]["clusterVersionRef"]["namespace"],
            "cirrus-clusters"
        );
    }

    #[test]
    fn machine_pools_carry_the_requested_node_counts() {
        let cluster = demo_cluster();
        let dref = deployment_ref(&cluster.name, "cirrus-clusters");
        let deployment = build_cluster_deployment(&cluster, &dref);
        let pools = deployment["spec"]["machineSets"].as_array().unwrap();
        assert_eq!(pools.len(), 3);

        assert_eq!(pools[0]["machineSetConfig"]["size"], 1);
        assert_eq!(pools[0]["machineSetConfig"]["nodeType"], "Master");
        assert_eq!(pools[1]["shortName"], "compute");
        assert_eq!(pools[1]["machineSetConfig"]["size"], 3);
        assert_eq!(pools[2]["shortName"], "infra");
        assert_eq!(pools[2]["machineSetConfig"]["size"], 2);
        assert_eq!(pools[2]["machineSetConfig"]["infra"], true);
    }

    #[test]
    fn deployment_wires_hardware_to_the_credential_secrets() {
        let cluster = demo_cluster();
        let dref = deployment_ref(&cluster.name, "cirrus-clusters");
        let deployment = build_cluster_deployment(&cluster, &dref);
        let aws = &deployment["spec"]["hardware"]["aws"];
        assert_eq!(aws["accountSecret"]["name"], "demo-aws-creds");
        assert_eq!(aws["sshSecret"]["name"], "demo-ssh-key");
        assert_eq!(aws["sslSecret"]["name"], "demo-certs");
        assert_eq!(aws["region"], "us-east-1");
    }

    #[test]
    fn cluster_version_pins_images_and_target_version() {
        let version = build_cluster_version("cirrus-clusters", "us-east-1");
        assert_eq!(version["metadata"]["name"], CLUSTER_VERSION_NAME);
        assert_eq!(version["spec"]["version"], "v3.10.0");
        assert_eq!(
            version["spec"]["vmImages"]["awsImages"]["regionAMIs"][0]["region"],
            "us-east-1"
        );
        assert_eq!(
            version["spec"]["images"]["clusterAPIImagePullPolicy"],
            "IfNotPresent"
        );
    }
}
