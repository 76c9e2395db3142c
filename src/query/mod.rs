//! History traversal engine
//!
//! Reconstructs an entity's version history from the graph by explicit
//! walks over the store's `(source, relationship)` adjacency: the current
//! state, the path joining entity and current state, the full chain back
//! to the origin state, the state active at an instant, and an integrity
//! audit of the whole chain.

mod audit;
mod current;
mod history;
mod types;

pub use audit::IntegrityCheck;
pub use current::{CurrentPathQuery, CurrentStateQuery};
pub use history::{HistoryQuery, StateAtQuery};
pub use types::{HistoryError, HistoryResult, IntegrityReport, Path, Violation};
