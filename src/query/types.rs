//! Query types and result structures

use crate::graph::{Edge, EdgeId, Node, NodeId};
use crate::storage::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A broken version-graph invariant.
///
/// The history queries rely on the write path to keep these from ever
/// happening; seeing one means the stored data is corrupt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("entity {entity} has {count} CURRENT edges")]
    MultipleCurrent { entity: NodeId, count: usize },

    #[error("entity {entity} has no HAS_STATE edge to state {state}")]
    MissingHasState { entity: NodeId, state: NodeId },

    #[error("entity {entity} has {count} HAS_STATE edges to state {state}")]
    MultipleHasState {
        entity: NodeId,
        state: NodeId,
        count: usize,
    },

    #[error("state {state} has {count} outgoing PREVIOUS edges")]
    BranchingPrevious { state: NodeId, count: usize },

    #[error("PREVIOUS chain revisits {state}")]
    PreviousCycle { state: NodeId },

    #[error("edge {edge} targets missing node {node}")]
    DanglingEdge { edge: EdgeId, node: NodeId },

    #[error("edge {edge} has no usable {property}")]
    MissingDate { edge: EdgeId, property: String },

    #[error("HAS_STATE edge to current state {state} carries an endDate")]
    OpenHasStateEnded { state: NodeId },

    #[error("PREVIOUS dates do not descend between {newer} and {older}")]
    NonDescendingPrevious { newer: NodeId, older: NodeId },

    #[error("state {state} ends at {end:?} but its successor starts at {successor_start:?}")]
    TemporalGap {
        state: NodeId,
        end: Option<DateTime<Utc>>,
        successor_start: Option<DateTime<Utc>>,
    },
}

/// Errors returned by the history queries
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The entity does not resolve, or has no version history yet
    #[error("Not found: {entity} ({reason})")]
    NotFound { entity: NodeId, reason: &'static str },

    #[error("Invariant violation: {0}")]
    InvariantViolation(#[from] Violation),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl HistoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HistoryError::NotFound { .. })
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            HistoryError::InvariantViolation(v) => Some(v),
            _ => None,
        }
    }
}

/// Result type for history queries
pub type HistoryResult<T> = Result<T, HistoryError>;

/// An ordered run of nodes and the edges connecting them.
///
/// Built hop by hop: `append` extends the path from its tail to a new
/// node, `attach` adds a further edge between nodes already on the path
/// (the current-path result carries both CURRENT and HAS_STATE between
/// the entity and its state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Path {
    /// A path holding a single node
    pub fn start(node: Node) -> Self {
        Self {
            nodes: vec![node],
            edges: Vec::new(),
        }
    }

    /// Extend the path from its tail across `edge` to `node`
    pub fn append(&mut self, edge: Edge, node: Node) {
        debug_assert!(self.tail().is_some_and(|t| edge.touches(&t.id, &node.id)));
        self.edges.push(edge);
        self.nodes.push(node);
    }

    /// Add an edge between two nodes already on the path
    pub fn attach(&mut self, edge: Edge) {
        debug_assert!(self.contains_node(&edge.source) && self.contains_node(&edge.target));
        self.edges.push(edge);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The first node (the entity, for history paths)
    pub fn head(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// The last node appended
    pub fn tail(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Nodes after the head, newest state first
    pub fn states(&self) -> &[Node] {
        self.nodes.get(1..).unwrap_or(&[])
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    /// Relationship types in edge order
    pub fn relationships(&self) -> Vec<&str> {
        self.edges.iter().map(|e| e.relationship.as_str()).collect()
    }

    /// Edges of one relationship type, in path order
    pub fn edges_of<'a>(&'a self, relationship: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.is(relationship))
    }

    /// Number of edges on the path
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Result of an integrity audit
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    /// Audited entity
    pub entity: NodeId,
    /// States reached from the current state, current included
    pub states_visited: usize,
    /// Every violation found, in chain order
    pub violations: Vec<Violation>,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}
