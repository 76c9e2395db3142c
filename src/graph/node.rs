//! Node representation in the version graph

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a node
///
/// Serializes as a plain string (UUID or caller-chosen ID like "entity:order-17").
/// This is the opaque entity reference accepted by every history query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new random NodeId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a NodeId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Node labels used by the version graph
pub mod label {
    /// A real-world thing with a stable identity
    pub const ENTITY: &str = "Entity";
    /// An immutable snapshot of an entity's attributes
    pub const STATE: &str = "State";
}

/// Typed property values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<PropertyValue>),
    Object(HashMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Interpret the value as an instant.
    ///
    /// Integers are epoch milliseconds; strings must be RFC 3339.
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::Int(millis) => DateTime::from_timestamp_millis(*millis),
            PropertyValue::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(instant: DateTime<Utc>) -> Self {
        PropertyValue::Int(instant.timestamp_millis())
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

/// Properties collection
pub type Properties = HashMap<String, PropertyValue>;

/// A node in the version graph
///
/// Entities carry immutable identity attributes; states carry the domain
/// attributes frozen when that version was created. Neither is edited
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Node label (`Entity`, `State`, or a caller-defined label)
    pub label: String,
    /// Domain-specific properties
    #[serde(default)]
    pub properties: Properties,
    /// When the node was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Node {
    /// Create a new node with the given label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            label: label.into(),
            properties: HashMap::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Create a new `Entity` node
    pub fn entity() -> Self {
        Self::new(label::ENTITY)
    }

    /// Create a new `State` node
    pub fn state() -> Self {
        Self::new(label::STATE)
    }

    /// Replace the generated ID
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Add a property to the node
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a property
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn is_entity(&self) -> bool {
        self.label == label::ENTITY
    }

    pub fn is_state(&self) -> bool {
        self.label == label::STATE
    }
}
