//! Serialization tests against graph documents shaped like the source data

use serde_json::{json, Value};

/// Entity with one state, as produced by the write path
fn entity_fixture() -> Value {
    json!({
        "id": "entity:immutable",
        "label": "Entity",
        "properties": { "key": "immutableValue" }
    })
}

fn current_edge_fixture() -> Value {
    json!({
        "id": "rel:current",
        "source": "entity:immutable",
        "target": "state:initial",
        "relationship": "CURRENT",
        "properties": { "date": 593910000000i64 },
        "created_at": "2025-11-29T08:00:00Z"
    })
}

#[cfg(test)]
mod serialization_tests {
    use super::*;
    use crate::graph::{label, relationship, Edge, Node, NodeId, PropertyValue};

    #[test]
    fn entity_deserializes_without_created_at() {
        let node: Node = serde_json::from_value(entity_fixture()).unwrap();
        assert_eq!(node.id, NodeId::from("entity:immutable"));
        assert_eq!(node.label, label::ENTITY);
        assert!(node.created_at.is_none());
        assert_eq!(
            node.property("key"),
            Some(&PropertyValue::String("immutableValue".into()))
        );
    }

    #[test]
    fn created_at_skipped_when_none() {
        let node: Node = serde_json::from_value(entity_fixture()).unwrap();
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn current_edge_round_trips_date_as_integer() {
        let edge: Edge = serde_json::from_value(current_edge_fixture()).unwrap();
        assert_eq!(edge.relationship, relationship::CURRENT);
        assert_eq!(edge.date().map(|d| d.timestamp_millis()), Some(593_910_000_000));

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["properties"]["date"], json!(593910000000i64));
        assert_eq!(json["id"], "rel:current");
    }

    #[test]
    fn edge_without_created_at_gets_one() {
        let mut fixture = current_edge_fixture();
        fixture.as_object_mut().unwrap().remove("created_at");
        let edge: Edge = serde_json::from_value(fixture).unwrap();
        assert!(edge.created_at.timestamp() > 0);
    }
}
