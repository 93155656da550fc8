//! API types for the cluster lifecycle service.
//!
//! `ClusterSpec` is the immutable input accepted from callers; `Cluster` is
//! the persisted record. The derived node total is recomputed on every read
//! and never stored as a source of truth.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Lifecycle state of a cluster as observed from the external orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterState {
    /// The cluster record exists; infrastructure is still coming up
    Installing,
    /// The orchestrator reports the cluster as fully ready
    Ready,
    /// The orchestrator could not bring the cluster up
    Error,
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterState::Installing => write!(f, "Installing"),
            ClusterState::Ready => write!(f, "Ready"),
            ClusterState::Error => write!(f, "Error"),
        }
    }
}

impl FromStr for ClusterState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Installing" => Ok(ClusterState::Installing),
            "Ready" => Ok(ClusterState::Ready),
            "Error" => Ok(ClusterState::Error),
            other => Err(Error::serialization(format!(
                "unknown cluster state '{other}'"
            ))),
        }
    }
}

/// Requested node counts for the three machine roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    /// Control plane nodes
    #[serde(default)]
    pub master: u32,
    /// Infrastructure nodes (routers, registry)
    #[serde(default)]
    pub infra: u32,
    /// Compute nodes running tenant workloads
    #[serde(default)]
    pub compute: u32,
}

impl NodeCounts {
    /// Total node count across all roles. Derived, never persisted.
    /// Widened so that the sum is defined for any role counts.
    pub fn total(&self) -> u64 {
        u64::from(self.master) + u64::from(self.infra) + u64::from(self.compute)
    }
}

/// A cluster specification as submitted by a caller.
///
/// Immutable once accepted. Resource fields are totals; usage counters are
/// populated externally after the cluster is running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Human-readable cluster name. Not unique; the record id is the key.
    pub name: String,
    /// Cloud region to provision into
    pub region: String,
    /// Node counts per role
    #[serde(default)]
    pub nodes: NodeCounts,
    /// Total memory, in GiB
    #[serde(default)]
    pub memory: u64,
    /// Total CPU cores
    #[serde(default)]
    pub cpu_cores: u64,
    /// Total storage, in GiB
    #[serde(default)]
    pub storage: u64,
}

/// Node counts of a cluster record, including the derived total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNodes {
    /// Total node count, recomputed from the role counts on every read
    pub total: u64,
    /// Control plane nodes
    pub master: u32,
    /// Infrastructure nodes
    pub infra: u32,
    /// Compute nodes
    pub compute: u32,
}

impl From<NodeCounts> for ClusterNodes {
    fn from(counts: NodeCounts) -> Self {
        Self {
            total: counts.total(),
            master: counts.master,
            infra: counts.infra,
            compute: counts.compute,
        }
    }
}

/// Used-versus-total counters for a cluster resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResource {
    /// Currently used amount. Initialized to zero; population is an
    /// external concern, this core never mutates it.
    pub used: u64,
    /// Provisioned total
    pub total: u64,
}

impl ClusterResource {
    /// A resource with the given total and zero usage
    pub fn with_total(total: u64) -> Self {
        Self { used: 0, total }
    }
}

/// A persisted cluster record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Globally unique identifier, generated at creation and never reused
    pub id: String,
    /// Cluster name from the accepted spec
    pub name: String,
    /// Cloud region from the accepted spec
    pub region: String,
    /// Node counts, including the derived total
    pub nodes: ClusterNodes,
    /// Memory counters, in GiB
    pub memory: ClusterResource,
    /// CPU core counters
    pub cpu: ClusterResource,
    /// Storage counters, in GiB
    pub storage: ClusterResource,
    /// Last-known lifecycle state
    pub state: ClusterState,
}

impl Cluster {
    /// Build a record from an accepted spec, a freshly allocated identifier,
    /// and a lifecycle state
    pub fn from_spec(id: impl Into<String>, spec: &ClusterSpec, state: ClusterState) -> Self {
        Self {
            id: id.into(),
            name: spec.name.clone(),
            region: spec.region.clone(),
            nodes: spec.nodes.into(),
            memory: ClusterResource::with_total(spec.memory),
            cpu: ClusterResource::with_total(spec.cpu_cores),
            storage: ClusterResource::with_total(spec.storage),
            state,
        }
    }
}

/// Live status of a cluster as derived from the external orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    /// Identifier of the cluster record
    pub id: String,
    /// Lifecycle state derived from the orchestrator's reported status
    pub state: ClusterState,
}

/// Arguments for listing clusters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListArguments {
    /// Zero-based page index
    pub page: u32,
    /// Maximum number of items per page; zero yields an empty page with
    /// the true total
    pub size: u32,
}

/// One page of cluster records plus the total row count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterList {
    /// The requested page index
    pub page: u32,
    /// Number of items actually returned in this page
    pub size: u32,
    /// Total number of records in the store, from a separate count query
    pub total: u64,
    /// The records in this page, ordered by identifier ascending
    pub items: Vec<Cluster>,
}
