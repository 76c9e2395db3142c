//! Storage trait definitions

use crate::graph::{Edge, Node, NodeId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A set of nodes and edges moved in or out of a store as one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subgraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Subgraph {
    /// Write every node, then every edge, into the store as one batch
    ///
    /// Atomic on backends that override [`GraphStore::save_batch`] with a
    /// transaction (`SqliteStore`); elsewhere a failure leaves earlier
    /// elements written.
    pub fn load_into(&self, store: &dyn GraphStore) -> StorageResult<()> {
        store.save_batch(&self.nodes, &self.edges)?;
        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "subgraph loaded"
        );
        Ok(())
    }
}

/// Trait for graph storage backends
///
/// This is the whole surface the history queries consume. Each call is a
/// single blocking request; a backend that offers snapshot isolation gives
/// consistent results per call, and the query layer adds no locking of
/// its own.
///
/// Implementations must be thread-safe (Send + Sync) so that read queries
/// can run concurrently with each other and with an external writer.
/// Edge lists are returned in insertion order.
pub trait GraphStore: Send + Sync {
    // === Node Operations ===

    /// Save a node (insert or update)
    fn save_node(&self, node: &Node) -> StorageResult<()>;

    /// Resolve a node by ID
    fn load_node(&self, id: &NodeId) -> StorageResult<Option<Node>>;

    /// Number of stored nodes
    fn node_count(&self) -> StorageResult<usize>;

    // === Edge Operations ===

    /// Save an edge (insert or update)
    fn save_edge(&self, edge: &Edge) -> StorageResult<()>;

    /// Outgoing edges of one relationship type from a node
    fn edges_from(&self, source: &NodeId, relationship: &str) -> StorageResult<Vec<Edge>>;

    /// Outgoing edges of one relationship type from `source` whose target is `target`
    fn edges_between(
        &self,
        source: &NodeId,
        relationship: &str,
        target: &NodeId,
    ) -> StorageResult<Vec<Edge>> {
        Ok(self
            .edges_from(source, relationship)?
            .into_iter()
            .filter(|e| &e.target == target)
            .collect())
    }

    /// Number of stored edges
    fn edge_count(&self) -> StorageResult<usize>;

    // === Bulk Operations ===

    /// Save nodes then edges. The default writes them one at a time;
    /// transactional backends override it so a failure writes nothing.
    fn save_batch(&self, nodes: &[Node], edges: &[Edge]) -> StorageResult<()> {
        for node in nodes {
            self.save_node(node)?;
        }
        for edge in edges {
            self.save_edge(edge)?;
        }
        Ok(())
    }
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
