//! Common test utilities for the history integration tests
//!
//! The library only reads version graphs, so the tests bring their own
//! write path: `HistoryBuilder` creates entities and appends versions the
//! way an external writer would, and can also corrupt a history on purpose.

#![allow(dead_code)]

pub mod history_builder;

pub use history_builder::{at, HistoryBuilder};

use graph_versioner::{GraphStore, MemoryStore, OpenStore, SqliteStore};
use std::sync::Arc;

/// One fresh store per backend, labelled for assertion messages
pub fn backends() -> Vec<(&'static str, Arc<dyn GraphStore>)> {
    vec![
        ("memory", Arc::new(MemoryStore::new())),
        ("sqlite", Arc::new(SqliteStore::open_in_memory().unwrap())),
    ]
}
