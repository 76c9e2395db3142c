//! Current-state resolution
//!
//! Both queries here start the same way: resolve the entity, then demand
//! exactly one outgoing CURRENT edge. Zero CURRENT edges means the entity
//! has no version history yet (`NotFound`); more than one is corruption and
//! is reported, never resolved by picking one.

use crate::graph::{relationship, Edge, Node, NodeId};
use crate::storage::GraphStore;

use super::types::{HistoryError, HistoryResult, Path, Violation};

/// How many edges a single-edge lookup returned
pub(super) enum Cardinality {
    Zero,
    One(Edge),
    Many(usize),
}

impl Cardinality {
    pub(super) fn of(mut edges: Vec<Edge>) -> Self {
        let count = edges.len();
        match edges.pop() {
            None => Cardinality::Zero,
            Some(edge) if count == 1 => Cardinality::One(edge),
            Some(_) => Cardinality::Many(count),
        }
    }
}

/// Log a violation against its entity and turn it into an error
pub(super) fn violated(entity: &NodeId, violation: Violation) -> HistoryError {
    tracing::warn!(entity = %entity, violation = %violation, "version graph invariant violated");
    violation.into()
}

/// The entity, its CURRENT edge, and the state that edge targets
#[derive(Debug, Clone)]
pub(super) struct Head {
    pub entity: Node,
    pub current: Edge,
    pub state: Node,
}

pub(super) fn resolve_entity<S: GraphStore + ?Sized>(
    store: &S,
    entity: &NodeId,
) -> HistoryResult<Node> {
    store.load_node(entity)?.ok_or_else(|| HistoryError::NotFound {
        entity: entity.clone(),
        reason: "entity does not resolve to a node",
    })
}

/// Load the node an edge points at; a missing target is a dangling edge
pub(super) fn load_target<S: GraphStore + ?Sized>(
    store: &S,
    entity: &NodeId,
    edge: &Edge,
) -> HistoryResult<Node> {
    match store.load_node(&edge.target)? {
        Some(node) => Ok(node),
        None => Err(violated(
            entity,
            Violation::DanglingEdge {
                edge: edge.id.clone(),
                node: edge.target.clone(),
            },
        )),
    }
}

pub(super) fn resolve_head<S: GraphStore + ?Sized>(
    store: &S,
    entity_id: &NodeId,
) -> HistoryResult<Head> {
    let entity = resolve_entity(store, entity_id)?;

    let current = match Cardinality::of(store.edges_from(entity_id, relationship::CURRENT)?) {
        Cardinality::One(edge) => edge,
        Cardinality::Zero => {
            return Err(HistoryError::NotFound {
                entity: entity_id.clone(),
                reason: "entity has no CURRENT state",
            })
        }
        Cardinality::Many(count) => {
            return Err(violated(
                entity_id,
                Violation::MultipleCurrent {
                    entity: entity_id.clone(),
                    count,
                },
            ))
        }
    };

    let state = load_target(store, entity_id, &current)?;
    tracing::trace!(entity = %entity_id, state = %state.id, "resolved current state");

    Ok(Head {
        entity,
        current,
        state,
    })
}

/// The HAS_STATE edge from `entity` to `state`, matched by target identity.
///
/// Dates on the edge are not consulted: the CURRENT edge has
/// already fixed which state is meant.
pub(super) fn has_state_edge<S: GraphStore + ?Sized>(
    store: &S,
    entity: &NodeId,
    state: &NodeId,
) -> HistoryResult<Edge> {
    match Cardinality::of(store.edges_between(entity, relationship::HAS_STATE, state)?) {
        Cardinality::One(edge) => Ok(edge),
        Cardinality::Zero => Err(violated(
            entity,
            Violation::MissingHasState {
                entity: entity.clone(),
                state: state.clone(),
            },
        )),
        Cardinality::Many(count) => Err(violated(
            entity,
            Violation::MultipleHasState {
                entity: entity.clone(),
                state: state.clone(),
                count,
            },
        )),
    }
}

/// Query for the entity's active state
#[derive(Debug, Clone)]
pub struct CurrentStateQuery {
    /// Entity reference
    pub entity: NodeId,
}

impl CurrentStateQuery {
    pub fn of(entity: impl Into<NodeId>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    /// Execute the query, returning the state targeted by the single CURRENT edge
    pub fn execute<S: GraphStore + ?Sized>(&self, store: &S) -> HistoryResult<Node> {
        resolve_head(store, &self.entity).map(|head| head.state)
    }
}

/// Query for the structural path between an entity and its active state
///
/// The result holds, in order: the entity, the CURRENT edge, the current
/// state, and the HAS_STATE edge joining the same two nodes.
#[derive(Debug, Clone)]
pub struct CurrentPathQuery {
    /// Entity reference
    pub entity: NodeId,
}

impl CurrentPathQuery {
    pub fn of(entity: impl Into<NodeId>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    pub fn execute<S: GraphStore + ?Sized>(&self, store: &S) -> HistoryResult<Path> {
        let head = resolve_head(store, &self.entity)?;
        let has_state = has_state_edge(store, &self.entity, &head.state.id)?;

        let mut path = Path::start(head.entity);
        path.append(head.current, head.state);
        path.attach(has_state);
        Ok(path)
    }
}
