//! In-memory storage backend
//!
//! Nodes are keyed by ID; edges live in an adjacency table keyed by
//! `(source, relationship)`, so every lookup the history queries make is a
//! single map probe.

use super::traits::{GraphStore, StorageResult};
use crate::graph::{Edge, EdgeId, Node, NodeId};
use dashmap::DashMap;

type AdjacencyKey = (NodeId, String);

/// Concurrent in-memory graph store
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: DashMap<NodeId, Node>,
    adjacency: DashMap<AdjacencyKey, Vec<Edge>>,
    /// Which adjacency bucket currently holds each edge
    edge_keys: DashMap<EdgeId, AdjacencyKey>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphStore for MemoryStore {
    fn save_node(&self, node: &Node) -> StorageResult<()> {
        self.nodes.insert(node.id.clone(), node.clone());
        Ok(())
    }

    fn load_node(&self, id: &NodeId) -> StorageResult<Option<Node>> {
        Ok(self.nodes.get(id).map(|r| r.clone()))
    }

    fn node_count(&self) -> StorageResult<usize> {
        Ok(self.nodes.len())
    }

    fn save_edge(&self, edge: &Edge) -> StorageResult<()> {
        let key = (edge.source.clone(), edge.relationship.clone());

        // An edge re-saved under a new source or relationship leaves its old bucket
        if let Some(old_key) = self.edge_keys.insert(edge.id.clone(), key.clone()) {
            if old_key != key {
                if let Some(mut old_bucket) = self.adjacency.get_mut(&old_key) {
                    old_bucket.retain(|e| e.id != edge.id);
                }
            }
        }

        let mut bucket = self.adjacency.entry(key).or_default();
        // Upsert keeps the original position so insertion order is stable
        match bucket.iter_mut().find(|e| e.id == edge.id) {
            Some(existing) => *existing = edge.clone(),
            None => bucket.push(edge.clone()),
        }
        Ok(())
    }

    fn edges_from(&self, source: &NodeId, relationship: &str) -> StorageResult<Vec<Edge>> {
        let key = (source.clone(), relationship.to_string());
        Ok(self
            .adjacency
            .get(&key)
            .map(|bucket| bucket.clone())
            .unwrap_or_default())
    }

    fn edge_count(&self) -> StorageResult<usize> {
        Ok(self.adjacency.iter().map(|bucket| bucket.len()).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::relationship;
    use chrono::Utc;

    #[test]
    fn test_save_and_load_node() {
        let store = MemoryStore::new();
        let node = Node::entity().with_id("entity:a");
        store.save_node(&node).unwrap();

        let loaded = store.load_node(&NodeId::from("entity:a")).unwrap();
        assert_eq!(loaded, Some(node));
        assert!(store.load_node(&NodeId::from("missing")).unwrap().is_none());
    }

    #[test]
    fn test_edges_indexed_by_source_and_type() {
        let store = MemoryStore::new();
        let e = NodeId::from("e");
        let s = NodeId::from("s");
        store.save_edge(&Edge::current(e.clone(), s.clone(), Utc::now())).unwrap();
        store.save_edge(&Edge::has_state(e.clone(), s.clone(), Utc::now(), None)).unwrap();

        let current = store.edges_from(&e, relationship::CURRENT).unwrap();
        assert_eq!(current.len(), 1);
        assert!(store.edges_from(&s, relationship::CURRENT).unwrap().is_empty());
        assert!(store.edges_from(&e, relationship::PREVIOUS).unwrap().is_empty());
        assert_eq!(store.edge_count().unwrap(), 2);
    }

    #[test]
    fn test_edges_between_filters_by_target() {
        let store = MemoryStore::new();
        let e = NodeId::from("e");
        let s1 = NodeId::from("s1");
        let s2 = NodeId::from("s2");
        store.save_edge(&Edge::has_state(e.clone(), s1.clone(), Utc::now(), None)).unwrap();
        store.save_edge(&Edge::has_state(e.clone(), s2.clone(), Utc::now(), None)).unwrap();

        let matched = store.edges_between(&e, relationship::HAS_STATE, &s2).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].target, s2);
    }

    #[test]
    fn test_edge_upsert_keeps_insertion_order() {
        let store = MemoryStore::new();
        let e = NodeId::from("e");
        let first =
            Edge::has_state(e.clone(), NodeId::from("s1"), Utc::now(), None).with_id("hs1");
        let second =
            Edge::has_state(e.clone(), NodeId::from("s2"), Utc::now(), None).with_id("hs2");
        store.save_edge(&first).unwrap();
        store.save_edge(&second).unwrap();

        let closed = first.clone().with_property("endDate", Utc::now());
        store.save_edge(&closed).unwrap();

        let edges = store.edges_from(&e, relationship::HAS_STATE).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].id.as_str(), "hs1");
        assert!(edges[0].end_date().is_some());
        assert_eq!(edges[1].id.as_str(), "hs2");
    }

    #[test]
    fn test_resaved_edge_moves_to_new_relationship() {
        let store = MemoryStore::new();
        let e = NodeId::from("e");
        let s = NodeId::from("s");
        let edge = Edge::current(e.clone(), s.clone(), Utc::now()).with_id("x");
        store.save_edge(&edge).unwrap();

        let retyped = Edge::has_state(e.clone(), s.clone(), Utc::now(), None).with_id("x");
        store.save_edge(&retyped).unwrap();

        assert!(store.edges_from(&e, relationship::CURRENT).unwrap().is_empty());
        let has_state = store.edges_from(&e, relationship::HAS_STATE).unwrap();
        assert_eq!(has_state.len(), 1);
        assert_eq!(has_state[0].id.as_str(), "x");
        assert_eq!(store.edge_count().unwrap(), 1);
    }

    #[test]
    fn test_resaved_edge_moves_to_new_source() {
        let store = MemoryStore::new();
        let (a, b, s) = (NodeId::from("a"), NodeId::from("b"), NodeId::from("s"));
        store
            .save_edge(&Edge::current(a.clone(), s.clone(), Utc::now()).with_id("x"))
            .unwrap();
        store
            .save_edge(&Edge::current(b.clone(), s.clone(), Utc::now()).with_id("x"))
            .unwrap();

        assert!(store.edges_from(&a, relationship::CURRENT).unwrap().is_empty());
        assert_eq!(store.edges_from(&b, relationship::CURRENT).unwrap().len(), 1);
        assert_eq!(store.edge_count().unwrap(), 1);
    }
}
