//! Walking the PREVIOUS chain
//!
//! Each state has at most one outgoing PREVIOUS edge, so the chain from the
//! current state back to the origin is a single line. The walker enforces
//! that: a state with several PREVIOUS edges, or a PREVIOUS edge leading
//! back onto the walked chain, is reported as a violation rather than
//! broken by date order or truncated.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::graph::{relationship, Edge, Node, NodeId};
use crate::storage::GraphStore;

use super::current::{has_state_edge, load_target, resolve_head, violated, Cardinality};
use super::types::{HistoryResult, Path, Violation};

/// Single-step walker over an entity's PREVIOUS chain
pub(super) struct ChainWalker {
    entity: NodeId,
    tail: NodeId,
    visited: HashSet<NodeId>,
}

impl ChainWalker {
    /// Start at `current`; the entity itself also counts as visited
    pub(super) fn new(entity: NodeId, current: NodeId) -> Self {
        let visited = HashSet::from([entity.clone(), current.clone()]);
        Self {
            entity,
            tail: current,
            visited,
        }
    }

    /// The most recently reached state
    pub(super) fn tail(&self) -> &NodeId {
        &self.tail
    }

    /// Follow the tail's PREVIOUS edge, or return `None` at the origin state
    pub(super) fn step<S: GraphStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> HistoryResult<Option<(Edge, Node)>> {
        let edge = match Cardinality::of(store.edges_from(&self.tail, relationship::PREVIOUS)?) {
            Cardinality::Zero => return Ok(None),
            Cardinality::One(edge) => edge,
            Cardinality::Many(count) => {
                return Err(violated(
                    &self.entity,
                    Violation::BranchingPrevious {
                        state: self.tail.clone(),
                        count,
                    },
                ))
            }
        };

        if !self.visited.insert(edge.target.clone()) {
            return Err(violated(
                &self.entity,
                Violation::PreviousCycle {
                    state: edge.target.clone(),
                },
            ));
        }

        let older = load_target(store, &self.entity, &edge)?;
        tracing::trace!(from = %self.tail, to = %older.id, "followed PREVIOUS");
        self.tail = older.id.clone();
        Ok(Some((edge, older)))
    }
}

/// Query for an entity's entire history
///
/// The result is the current path (entity, CURRENT, current state,
/// HAS_STATE) followed by every earlier state, newest to oldest, each
/// joined to its successor by the PREVIOUS edge between them.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    /// Entity reference
    pub entity: NodeId,
}

impl HistoryQuery {
    pub fn of(entity: impl Into<NodeId>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    pub fn execute<S: GraphStore + ?Sized>(&self, store: &S) -> HistoryResult<Path> {
        let head = resolve_head(store, &self.entity)?;
        let has_state = has_state_edge(store, &self.entity, &head.state.id)?;
        let mut walker = ChainWalker::new(self.entity.clone(), head.state.id.clone());

        let mut path = Path::start(head.entity);
        path.append(head.current, head.state);
        path.attach(has_state);

        while let Some((edge, older)) = walker.step(store)? {
            path.append(edge, older);
        }

        tracing::debug!(
            entity = %self.entity,
            states = path.states().len(),
            origin = %walker.tail(),
            "reconstructed history"
        );
        Ok(path)
    }
}

/// Query for the state that was active at a given instant
///
/// Walks back from the current state and returns the first state whose
/// HAS_STATE interval `[startDate, endDate)` contains the instant. Returns
/// `None` when the instant predates the origin state.
#[derive(Debug, Clone)]
pub struct StateAtQuery {
    /// Entity reference
    pub entity: NodeId,
    /// Instant to look up
    pub at: DateTime<Utc>,
}

impl StateAtQuery {
    pub fn of(entity: impl Into<NodeId>, at: DateTime<Utc>) -> Self {
        Self {
            entity: entity.into(),
            at,
        }
    }

    pub fn execute<S: GraphStore + ?Sized>(&self, store: &S) -> HistoryResult<Option<Node>> {
        let head = resolve_head(store, &self.entity)?;
        let mut walker = ChainWalker::new(self.entity.clone(), head.state.id.clone());
        let mut candidate = head.state;

        loop {
            let interval = has_state_edge(store, &self.entity, &candidate.id)?;
            let start = interval.start_date().ok_or_else(|| {
                violated(
                    &self.entity,
                    Violation::MissingDate {
                        edge: interval.id.clone(),
                        property: crate::graph::property::START_DATE.to_string(),
                    },
                )
            })?;

            if start <= self.at {
                // Newest-first, so the first start at or before the instant wins
                // unless the interval closed before it (a gap in the record).
                let open_at_instant = interval.end_date().map_or(true, |end| self.at < end);
                return Ok(open_at_instant.then_some(candidate));
            }

            match walker.step(store)? {
                Some((_, older)) => candidate = older,
                None => return Ok(None),
            }
        }
    }
}
