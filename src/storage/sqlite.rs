//! SQLite storage backend

use super::traits::{GraphStore, OpenStore, StorageError, StorageResult};
use crate::graph::{Edge, EdgeId, Node, NodeId};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const EDGE_COLUMNS: &str =
    "id, source_id, target_id, relationship, properties_json, created_at";

/// Raw edge columns, in `EDGE_COLUMNS` order
type EdgeRow = (String, String, String, String, String, String);

/// SQLite-backed graph store
///
/// Uses a single SQLite database file with a table for nodes and one for
/// edges. Edges are indexed by `(source_id, relationship)` and
/// `(source_id, relationship, target_id)`, the two lookups the history
/// queries issue. Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                created_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_label ON nodes(label);

            -- seq keeps insertion order stable across upserts
            CREATE TABLE IF NOT EXISTS edges (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                relationship TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_edges_source_rel
                ON edges(source_id, relationship);
            CREATE INDEX IF NOT EXISTS idx_edges_source_rel_target
                ON edges(source_id, relationship, target_id);

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn write_node(conn: &Connection, node: &Node) -> StorageResult<()> {
        let properties = serde_json::to_string(&node.properties)?;
        let created_at = node.created_at.map(|t| t.to_rfc3339());

        conn.execute(
            r#"
            INSERT INTO nodes (id, label, properties_json, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                properties_json = excluded.properties_json,
                created_at = excluded.created_at
            "#,
            params![node.id.as_str(), node.label, properties, created_at],
        )?;

        Ok(())
    }

    fn write_edge(conn: &Connection, edge: &Edge) -> StorageResult<()> {
        let properties = serde_json::to_string(&edge.properties)?;

        conn.execute(
            r#"
            INSERT INTO edges (id, source_id, target_id, relationship, properties_json, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                source_id = excluded.source_id,
                target_id = excluded.target_id,
                relationship = excluded.relationship,
                properties_json = excluded.properties_json
            "#,
            params![
                edge.id.as_str(),
                edge.source.as_str(),
                edge.target.as_str(),
                edge.relationship,
                properties,
                edge.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn row_to_node(
        id: String,
        label: String,
        properties_json: String,
        created_at: Option<String>,
    ) -> StorageResult<Node> {
        Ok(Node {
            id: NodeId::from_string(id),
            label,
            properties: serde_json::from_str(&properties_json)?,
            created_at: created_at.map(|s| parse_timestamp(&s)).transpose()?,
        })
    }

    fn row_to_edge(row: EdgeRow) -> StorageResult<Edge> {
        let (id, source_id, target_id, relationship, properties_json, created_at) = row;
        Ok(Edge {
            id: EdgeId::from_string(id),
            source: NodeId::from_string(source_id),
            target: NodeId::from_string(target_id),
            relationship,
            properties: serde_json::from_str(&properties_json)?,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    fn query_edges(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> StorageResult<Vec<Edge>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(Self::row_to_edge(row?)?);
        }
        Ok(edges)
    }
}

fn parse_timestamp(s: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path.as_ref())?;
        Self::init_schema(&conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened sqlite store");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl GraphStore for SqliteStore {
    // === Node Operations ===

    fn save_node(&self, node: &Node) -> StorageResult<()> {
        let conn = self.lock()?;
        Self::write_node(&conn, node)
    }

    fn load_node(&self, id: &NodeId) -> StorageResult<Option<Node>> {
        let conn = self.lock()?;

        let row: Option<(String, String, String, Option<String>)> = conn
            .query_row(
                "SELECT id, label, properties_json, created_at FROM nodes WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        match row {
            Some((id, label, properties, created_at)) => {
                Ok(Some(Self::row_to_node(id, label, properties, created_at)?))
            }
            None => Ok(None),
        }
    }

    fn node_count(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // === Edge Operations ===

    fn save_edge(&self, edge: &Edge) -> StorageResult<()> {
        let conn = self.lock()?;
        Self::write_edge(&conn, edge)
    }

    fn edges_from(&self, source: &NodeId, relationship: &str) -> StorageResult<Vec<Edge>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {EDGE_COLUMNS} FROM edges
             WHERE source_id = ?1 AND relationship = ?2
             ORDER BY seq"
        );
        Self::query_edges(&conn, &sql, params![source.as_str(), relationship])
    }

    fn edges_between(
        &self,
        source: &NodeId,
        relationship: &str,
        target: &NodeId,
    ) -> StorageResult<Vec<Edge>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {EDGE_COLUMNS} FROM edges
             WHERE source_id = ?1 AND relationship = ?2 AND target_id = ?3
             ORDER BY seq"
        );
        Self::query_edges(
            &conn,
            &sql,
            params![source.as_str(), relationship, target.as_str()],
        )
    }

    fn edge_count(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // === Bulk Operations ===

    fn save_batch(&self, nodes: &[Node], edges: &[Edge]) -> StorageResult<()> {
        let mut conn = self.lock()?;
        // Dropping the transaction on an early return rolls it back
        let tx = conn.transaction()?;
        for node in nodes {
            Self::write_node(&tx, node)?;
        }
        for edge in edges {
            Self::write_edge(&tx, edge)?;
        }
        tx.commit()?;
        Ok(())
    }
}
