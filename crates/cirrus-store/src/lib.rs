//! Record store for cluster specifications and last-known lifecycle state.
//!
//! The store is a single `clusters` table keyed by a generated unique
//! identifier. The lifecycle state is the only column mutated after
//! creation; everything else is immutable once a spec is accepted.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use cirrus_common::api::{Cluster, ClusterList, ClusterSpec, ClusterState, ListArguments};
use cirrus_common::Result;

mod sqlite;

pub use sqlite::SqliteClusterStore;

/// Durable CRUD for cluster records, safe for concurrent use.
///
/// Implementations must guarantee that `create` writes exactly one row and
/// that identifiers are unique across the store's lifetime.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Allocate a fresh identifier and persist the spec as a new record in
    /// `Installing` state.
    ///
    /// Fails with a persistence error unless exactly one row is written.
    async fn create(&self, spec: &ClusterSpec) -> Result<Cluster>;

    /// Fetch a record by identifier. The derived node total is recomputed
    /// from the stored role counts.
    async fn get(&self, id: &str) -> Result<Cluster>;

    /// Return up to `size` records starting at offset `page * size`,
    /// ordered by identifier ascending, plus the total row count from a
    /// separate count query.
    async fn list(&self, args: ListArguments) -> Result<ClusterList>;

    /// Overwrite a record's lifecycle state. Idempotent; last writer wins.
    async fn set_state(&self, id: &str, state: ClusterState) -> Result<()>;
}
