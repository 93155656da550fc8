//! SQLite-backed implementation of [`ClusterStore`].
//!
//! A single mutex-guarded connection is shared by all callers; every
//! operation is one statement (or one statement plus one count query), so
//! there is no partial visibility of multi-statement writes.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

use cirrus_common::api::{
    Cluster, ClusterList, ClusterNodes, ClusterResource, ClusterSpec, ClusterState, ListArguments,
    NodeCounts,
};
use cirrus_common::{Error, Result};

use crate::ClusterStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS clusters (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    region        TEXT NOT NULL,
    master_nodes  INTEGER NOT NULL,
    infra_nodes   INTEGER NOT NULL,
    compute_nodes INTEGER NOT NULL,
    memory        INTEGER NOT NULL,
    cpu_cores     INTEGER NOT NULL,
    storage       INTEGER NOT NULL,
    state         TEXT NOT NULL
);
";

const SELECT_COLUMNS: &str = "id, name, region, master_nodes, infra_nodes, compute_nodes, \
                              memory, cpu_cores, storage, state";

/// Cluster record store backed by a SQLite database file
pub struct SqliteClusterStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteClusterStore {
    /// Open (or create) the database at the given path and apply the schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::persistence(format!("failed to open database: {e}")))?;
        info!(path = %path.as_ref().display(), "opened cluster store");
        Self::from_connection(conn)
    }

    /// Open an in-memory store. Used by tests and demo mode.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::persistence(format!("failed to open in-memory database: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Queue behind concurrent writers instead of failing with SQLITE_BUSY.
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| Error::persistence(format!("failed to set busy timeout: {e}")))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::persistence(format!("failed to apply schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::persistence("cluster store mutex poisoned"))
    }
}

/// Map a row holding the full column list into a record, recomputing the
/// derived node total.
fn cluster_from_row(row: &Row<'_>) -> rusqlite::Result<Cluster> {
    let state_text: String = row.get(9)?;
    let state = ClusterState::from_str(&state_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let nodes = NodeCounts {
        master: row.get(3)?,
        infra: row.get(4)?,
        compute: row.get(5)?,
    };
    Ok(Cluster {
        id: row.get(0)?,
        name: row.get(1)?,
        region: row.get(2)?,
        nodes: ClusterNodes::from(nodes),
        memory: ClusterResource::with_total(row.get(6)?),
        cpu: ClusterResource::with_total(row.get(7)?),
        storage: ClusterResource::with_total(row.get(8)?),
        state,
    })
}

#[async_trait]
impl ClusterStore for SqliteClusterStore {
    async fn create(&self, spec: &ClusterSpec) -> Result<Cluster> {
        let id = Uuid::new_v4().to_string();
        let state = ClusterState::Installing;

        let written = {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO clusters (id, name, region, master_nodes, infra_nodes, \
                 compute_nodes, memory, cpu_cores, storage, state) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id,
                    spec.name,
                    spec.region,
                    spec.nodes.master,
                    spec.nodes.infra,
                    spec.nodes.compute,
                    spec.memory,
                    spec.cpu_cores,
                    spec.storage,
                    state.to_string(),
                ],
            )
            .map_err(|e| Error::persistence(format!("failed to insert cluster record: {e}")))?
        };
        // Guard against partial writes: no row and many rows are both failures.
        if written != 1 {
            return Err(Error::persistence(format!(
                "expected 1 row inserted, got {written}"
            )));
        }

        debug!(id = %id, name = %spec.name, "created cluster record");
        Ok(Cluster::from_spec(id, spec, state))
    }

    async fn get(&self, id: &str) -> Result<Cluster> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM clusters WHERE id = ?1"),
            params![id],
            cluster_from_row,
        )
        .optional()
        .map_err(|e| Error::persistence(format!("failed to read cluster record: {e}")))?
        .ok_or_else(|| Error::not_found(format!("no cluster with id '{id}'")))
    }

    async fn list(&self, args: ListArguments) -> Result<ClusterList> {
        let conn = self.lock()?;

        // The total comes from its own count query, not from the page.
        let total: u64 = conn
            .query_row("SELECT COUNT(*) FROM clusters", [], |row| row.get(0))
            .map_err(|e| Error::persistence(format!("failed to count cluster records: {e}")))?;

        // The product of two u32s always fits in u64; an offset beyond the
        // i64 range is past any real table, so saturate instead of failing.
        let offset = u64::from(args.page) * u64::from(args.size);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM clusters ORDER BY id LIMIT ?1 OFFSET ?2"
            ))
            .map_err(|e| Error::persistence(format!("failed to prepare list query: {e}")))?;
        let items = stmt
            .query_map(params![args.size, offset], cluster_from_row)
            .map_err(|e| Error::persistence(format!("failed to list cluster records: {e}")))?
            .collect::<rusqlite::Result<Vec<Cluster>>>()
            .map_err(|e| Error::persistence(format!("failed to read cluster row: {e}")))?;

        Ok(ClusterList {
            page: args.page,
            size: items.len() as u32,
            total,
            items,
        })
    }

    async fn set_state(&self, id: &str, state: ClusterState) -> Result<()> {
        let updated = {
            let conn = self.lock()?;
            conn.execute(
                "UPDATE clusters SET state = ?1 WHERE id = ?2",
                params![state.to_string(), id],
            )
            .map_err(|e| Error::persistence(format!("failed to update cluster state: {e}")))?
        };
        if updated == 0 {
            return Err(Error::not_found(format!("no cluster with id '{id}'")));
        }
        debug!(id = %id, state = %state, "updated cluster state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_spec(name: &str) -> ClusterSpec {
        ClusterSpec {
            name: name.to_string(),
            region: "us-east-1".to_string(),
            nodes: NodeCounts {
                master: 1,
                infra: 1,
                compute: 3,
            },
            memory: 64,
            cpu_cores: 16,
            storage: 500,
        }
    }

    #[tokio::test]
    async fn created_records_have_unique_ids() {
        let store = SqliteClusterStore::in_memory().unwrap();
        let mut ids = std::collections::HashSet::new();
        for i in 0..20 {
            let cluster = store.create(&demo_spec(&format!("c{i}"))).await.unwrap();
            assert!(ids.insert(cluster.id), "duplicate id allocated");
        }
    }

    #[tokio::test]
    async fn get_returns_the_created_spec_with_derived_total() {
        let store = SqliteClusterStore::in_memory().unwrap();
        let spec = demo_spec("demo");
        let created = store.create(&spec).await.unwrap();
        assert_eq!(created.state, ClusterState::Installing);

        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, spec.name);
        assert_eq!(fetched.region, spec.region);
        assert_eq!(fetched.nodes.total, 5);
        assert_eq!(fetched.memory.total, 64);
        assert_eq!(fetched.memory.used, 0);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let store = SqliteClusterStore::in_memory().unwrap();
        let err = store.get("no-such-id").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn walking_all_pages_yields_every_record_exactly_once() {
        let store = SqliteClusterStore::in_memory().unwrap();
        for i in 0..7 {
            store.create(&demo_spec(&format!("c{i}"))).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut page = 0;
        loop {
            let list = store.list(ListArguments { page, size: 3 }).await.unwrap();
            assert!(list.items.len() <= 3);
            assert_eq!(list.total, 7);
            if list.items.is_empty() {
                break;
            }
            seen.extend(list.items.into_iter().map(|c| c.id));
            page += 1;
        }
        assert_eq!(seen.len(), 7);
        let mut sorted = seen.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 7, "pages overlapped");
        assert_eq!(seen, {
            let mut s = seen.clone();
            s.sort();
            s
        });
    }

    #[tokio::test]
    async fn zero_size_page_is_empty_but_reports_true_total() {
        let store = SqliteClusterStore::in_memory().unwrap();
        for i in 0..4 {
            store.create(&demo_spec(&format!("c{i}"))).await.unwrap();
        }
        let list = store.list(ListArguments { page: 0, size: 0 }).await.unwrap();
        assert!(list.items.is_empty());
        assert_eq!(list.size, 0);
        assert_eq!(list.total, 4);
    }

    #[tokio::test]
    async fn maximal_paging_parameters_yield_an_empty_page() {
        let store = SqliteClusterStore::in_memory().unwrap();
        for i in 0..3 {
            store.create(&demo_spec(&format!("c{i}"))).await.unwrap();
        }
        let list = store
            .list(ListArguments {
                page: u32::MAX,
                size: u32::MAX,
            })
            .await
            .unwrap();
        assert!(list.items.is_empty());
        assert_eq!(list.total, 3);
    }

    #[tokio::test]
    async fn set_state_is_last_writer_wins() {
        let store = SqliteClusterStore::in_memory().unwrap();
        let created = store.create(&demo_spec("demo")).await.unwrap();

        store
            .set_state(&created.id, ClusterState::Ready)
            .await
            .unwrap();
        store
            .set_state(&created.id, ClusterState::Error)
            .await
            .unwrap();
        // Overwriting with the same value is fine.
        store
            .set_state(&created.id, ClusterState::Error)
            .await
            .unwrap();

        assert_eq!(
            store.get(&created.id).await.unwrap().state,
            ClusterState::Error
        );
    }

    #[tokio::test]
    async fn set_state_on_unknown_id_is_not_found() {
        let store = SqliteClusterStore::in_memory().unwrap();
        let err = store
            .set_state("no-such-id", ClusterState::Ready)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn duplicate_names_are_permitted() {
        // The id is the documented primary key; names are display values.
        let store = SqliteClusterStore::in_memory().unwrap();
        let a = store.create(&demo_spec("same")).await.unwrap();
        let b = store.create(&demo_spec("same")).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
