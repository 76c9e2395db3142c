//! Version graph data model
//!
//! An `Entity` owns an append-only chain of immutable `State` snapshots:
//!
//! ```text
//! (Entity)-[:CURRENT {date}]------------------>(S3)
//! (Entity)-[:HAS_STATE {startDate}]----------->(S3)
//! (Entity)-[:HAS_STATE {startDate, endDate}]-->(S2)<-[:PREVIOUS {date}]-(S3)
//! (Entity)-[:HAS_STATE {startDate, endDate}]-->(S1)<-[:PREVIOUS {date}]-(S2)
//! ```
//!
//! Invariants relied upon by the query layer (maintained by the write path):
//! 1. exactly one CURRENT edge per entity;
//! 2. the CURRENT target also has exactly one HAS_STATE edge, with no `endDate`;
//! 3. PREVIOUS forms a single non-branching chain with strictly decreasing dates;
//! 4. a state's `endDate` equals its successor's `startDate`.

mod edge;
mod node;

#[cfg(test)]
mod tests;

pub use edge::{property, relationship, Edge, EdgeId};
pub use node::{label, Node, NodeId, Properties, PropertyValue};
