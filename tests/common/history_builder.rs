//! Version history fixtures
//!
//! Builds entity histories through the plain `GraphStore` write surface,
//! keeping all four model invariants: one CURRENT edge, one HAS_STATE edge
//! per state (only the current one left open), a single PREVIOUS chain with
//! descending dates, and contiguous validity intervals.

use chrono::{DateTime, Utc};
use graph_versioner::{
    property, relationship, Edge, GraphStore, Node, NodeId, PropertyValue,
};

/// Instant from epoch milliseconds
pub fn at(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap()
}

/// Writes one entity's history into a store
pub struct HistoryBuilder<'a> {
    store: &'a dyn GraphStore,
    entity: NodeId,
    states: Vec<NodeId>,
}

impl<'a> HistoryBuilder<'a> {
    /// Create the entity node with its first state
    pub fn create(
        store: &'a dyn GraphStore,
        entity: &str,
        properties: &[(&str, PropertyValue)],
        start: DateTime<Utc>,
    ) -> Self {
        let entity = NodeId::from(entity);
        store.save_node(&Node::entity().with_id(entity.clone())).unwrap();

        let mut builder = Self {
            store,
            entity,
            states: Vec::new(),
        };
        let state = builder.save_state(properties);
        store
            .save_edge(&Edge::current(builder.entity.clone(), state.clone(), start))
            .unwrap();
        store
            .save_edge(&Edge::has_state(builder.entity.clone(), state.clone(), start, None))
            .unwrap();
        builder.states.push(state);
        builder
    }

    /// Append a new version that becomes current at `start`
    ///
    /// Redirects the CURRENT edge, closes the previous HAS_STATE interval at
    /// `start`, opens a new one, and links the new state to its predecessor.
    pub fn append_version(
        &mut self,
        properties: &[(&str, PropertyValue)],
        start: DateTime<Utc>,
    ) -> NodeId {
        let previous = self.current().clone();
        let state = self.save_state(properties);

        let current = self
            .store
            .edges_from(&self.entity, relationship::CURRENT)
            .unwrap()
            .remove(0);
        let redirected = Edge::current(self.entity.clone(), state.clone(), start)
            .with_id(current.id.as_str());
        self.store.save_edge(&redirected).unwrap();

        let open = self
            .store
            .edges_between(&self.entity, relationship::HAS_STATE, &previous)
            .unwrap()
            .remove(0);
        self.store
            .save_edge(&open.with_property(property::END_DATE, start))
            .unwrap();
        self.store
            .save_edge(&Edge::has_state(self.entity.clone(), state.clone(), start, None))
            .unwrap();
        self.store
            .save_edge(&Edge::previous(state.clone(), previous, start))
            .unwrap();

        self.states.push(state.clone());
        state
    }

    pub fn entity(&self) -> &NodeId {
        &self.entity
    }

    pub fn current(&self) -> &NodeId {
        self.states.last().unwrap()
    }

    /// State IDs, newest first
    pub fn newest_first(&self) -> Vec<NodeId> {
        self.states.iter().rev().cloned().collect()
    }

    // --- Corruption helpers ---

    /// Add a second CURRENT edge pointing at a fresh state
    pub fn add_stray_current(&mut self, date: DateTime<Utc>) -> NodeId {
        let stray = self.save_state(&[("stray", PropertyValue::Bool(true))]);
        self.store
            .save_edge(&Edge::current(self.entity.clone(), stray.clone(), date))
            .unwrap();
        stray
    }

    /// Add a PREVIOUS edge between two existing states
    pub fn link_previous(&self, newer: &NodeId, older: &NodeId, date: DateTime<Utc>) {
        self.store
            .save_edge(&Edge::previous(newer.clone(), older.clone(), date))
            .unwrap();
    }

    fn save_state(&self, properties: &[(&str, PropertyValue)]) -> NodeId {
        let mut node = Node::state();
        for (key, value) in properties {
            node = node.with_property(*key, value.clone());
        }
        self.store.save_node(&node).unwrap();
        node.id
    }
}
