//! Edge representation: the three version-tracking relationships

use super::node::{NodeId, Properties, PropertyValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Create a new random EdgeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relationship types of the version graph
pub mod relationship {
    /// Entity → its active State. Exactly one per entity.
    pub const CURRENT: &str = "CURRENT";
    /// Entity → every State it ever held, with validity bounds.
    pub const HAS_STATE: &str = "HAS_STATE";
    /// State → its immediate predecessor State.
    pub const PREVIOUS: &str = "PREVIOUS";
}

/// Edge property keys
pub mod property {
    /// Activation instant on CURRENT, transition instant on PREVIOUS
    pub const DATE: &str = "date";
    /// Start of validity on HAS_STATE
    pub const START_DATE: &str = "startDate";
    /// End of validity on HAS_STATE, set once a successor begins
    pub const END_DATE: &str = "endDate";
}

/// A directed, attributed edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier
    pub id: EdgeId,
    /// Source node
    pub source: NodeId,
    /// Target node
    pub target: NodeId,
    /// Type of relationship (`CURRENT`, `HAS_STATE`, `PREVIOUS`, ...)
    pub relationship: String,
    /// Edge attributes (dates are epoch milliseconds)
    #[serde(default)]
    pub properties: Properties,
    /// When the edge was written
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Edge {
    /// Create a new edge with no properties
    pub fn new(source: NodeId, target: NodeId, relationship: impl Into<String>) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            target,
            relationship: relationship.into(),
            properties: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// `(entity)-[:CURRENT {date}]->(state)`
    pub fn current(entity: NodeId, state: NodeId, date: DateTime<Utc>) -> Self {
        Self::new(entity, state, relationship::CURRENT).with_property(property::DATE, date)
    }

    /// `(entity)-[:HAS_STATE {startDate, endDate?}]->(state)`
    pub fn has_state(
        entity: NodeId,
        state: NodeId,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        let edge = Self::new(entity, state, relationship::HAS_STATE)
            .with_property(property::START_DATE, start);
        match end {
            Some(end) => edge.with_property(property::END_DATE, end),
            None => edge,
        }
    }

    /// `(newer)-[:PREVIOUS {date}]->(older)`
    pub fn previous(newer: NodeId, older: NodeId, date: DateTime<Utc>) -> Self {
        Self::new(newer, older, relationship::PREVIOUS).with_property(property::DATE, date)
    }

    /// Replace the generated ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = EdgeId::from_string(id);
        self
    }

    /// Add a property to the edge
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn is(&self, relationship: &str) -> bool {
        self.relationship == relationship
    }

    /// Read a temporal property
    pub fn instant(&self, key: &str) -> Option<DateTime<Utc>> {
        self.properties.get(key).and_then(PropertyValue::as_instant)
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.instant(property::DATE)
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.instant(property::START_DATE)
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.instant(property::END_DATE)
    }

    /// Whether the edge joins the two nodes, in either direction
    pub fn touches(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }
}
