//! Storage backends for the version graph
//!
//! History queries run against any backend implementing the `GraphStore`
//! trait. `SqliteStore` is the persistent implementation; `MemoryStore`
//! holds an adjacency table in memory.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{GraphStore, OpenStore, StorageError, StorageResult, Subgraph};
