//! Graph Versioner: version history over entity/state property graphs
//!
//! Models a mutable real-world entity as an append-only chain of immutable
//! state snapshots stored in a graph, and reconstructs that history on read.
//!
//! # Core Concepts
//!
//! - **Entity**: a node with a stable identity
//! - **State**: an immutable snapshot of the entity over one interval
//! - **CURRENT / HAS_STATE / PREVIOUS**: the edges tying them together
//! - **Procedures**: `get.current.state`, `get.current.path`, `get.all`
//!   (plus `get.by.date`) served by [`VersionerApi`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::Utc;
//! use graph_versioner::{Edge, GraphStore, MemoryStore, Node, NodeId, VersionerApi};
//!
//! let store = MemoryStore::new();
//! let entity = Node::entity().with_id("order:17");
//! let state = Node::state().with_property("status", "placed");
//! let now = Utc::now();
//! store.save_node(&entity).unwrap();
//! store.save_node(&state).unwrap();
//! store.save_edge(&Edge::current(entity.id.clone(), state.id.clone(), now)).unwrap();
//! store.save_edge(&Edge::has_state(entity.id.clone(), state.id.clone(), now, None)).unwrap();
//!
//! let api = VersionerApi::new(Arc::new(store));
//! let current = api.get_current_state(&NodeId::from("order:17")).unwrap();
//! assert_eq!(current.map(|s| s.id), Some(state.id));
//! ```

pub mod api;
pub mod config;
mod graph;
pub mod query;
pub mod storage;

pub use api::{ApiError, NotFoundPolicy, Procedure, Row, VersionerApi};
pub use config::{ConfigError, VersionerConfig};
pub use graph::{
    label, property, relationship, Edge, EdgeId, Node, NodeId, Properties, PropertyValue,
};
pub use query::{
    CurrentPathQuery, CurrentStateQuery, HistoryError, HistoryQuery, HistoryResult,
    IntegrityCheck, IntegrityReport, Path, StateAtQuery, Violation,
};
pub use storage::{
    GraphStore, MemoryStore, OpenStore, SqliteStore, StorageError, StorageResult, Subgraph,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
