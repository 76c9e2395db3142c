//! Transport-independent query façade.
//!
//! `VersionerApi` is the single entry point for the callable history
//! procedures. Front ends (the CLI, an embedding host) call `VersionerApi`
//! methods; they never build traversal queries themselves. Each call takes
//! one entity reference and yields one row, has no side effects, and may
//! run concurrently with any other call.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{Node, NodeId};
use crate::query::{
    CurrentPathQuery, CurrentStateQuery, HistoryError, HistoryQuery, HistoryResult,
    IntegrityCheck, IntegrityReport, Path, StateAtQuery,
};
use crate::storage::GraphStore;

/// The callable history procedures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    /// `get.current.state`
    CurrentState,
    /// `get.current.path`
    CurrentPath,
    /// `get.all`
    All,
    /// `get.by.date`
    ByDate,
}

impl Procedure {
    pub const ALL: [Procedure; 4] = [
        Procedure::CurrentState,
        Procedure::CurrentPath,
        Procedure::All,
        Procedure::ByDate,
    ];

    /// The name the procedure is registered under
    pub fn as_str(&self) -> &'static str {
        match self {
            Procedure::CurrentState => "get.current.state",
            Procedure::CurrentPath => "get.current.path",
            Procedure::All => "get.all",
            Procedure::ByDate => "get.by.date",
        }
    }
}

impl std::fmt::Display for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Procedure {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("graph.versioner.").unwrap_or(s);
        Procedure::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| ApiError::UnknownProcedure(s.to_string()))
    }
}

/// What a procedure returns when the entity has no history to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundPolicy {
    /// `NotFound` becomes an empty result (`Ok(None)`)
    #[default]
    Absent,
    /// `NotFound` is returned as an error
    Error,
}

/// A single result row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    Node { node: Node },
    Path { path: Path },
}

/// Errors from name-based dispatch
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown procedure: {0}")]
    UnknownProcedure(String),

    #[error("{0} requires an instant")]
    MissingInstant(Procedure),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Single entry point for the history procedures.
#[derive(Clone)]
pub struct VersionerApi {
    store: Arc<dyn GraphStore>,
    not_found: NotFoundPolicy,
}

impl VersionerApi {
    /// Create a new API instance with the default `Absent` policy.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            not_found: NotFoundPolicy::default(),
        }
    }

    pub fn with_not_found(mut self, policy: NotFoundPolicy) -> Self {
        self.not_found = policy;
        self
    }

    pub fn not_found_policy(&self) -> NotFoundPolicy {
        self.not_found
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    // --- Procedures ---

    /// `get.current.state`
    pub fn get_current_state(&self, entity: &NodeId) -> HistoryResult<Option<Node>> {
        self.settle(CurrentStateQuery::of(entity.clone()).execute(self.store()))
    }

    /// `get.current.path`
    pub fn get_current_path(&self, entity: &NodeId) -> HistoryResult<Option<Path>> {
        self.settle(CurrentPathQuery::of(entity.clone()).execute(self.store()))
    }

    /// `get.all`
    pub fn get_all(&self, entity: &NodeId) -> HistoryResult<Option<Path>> {
        self.settle(HistoryQuery::of(entity.clone()).execute(self.store()))
    }

    /// `get.by.date`: `None` also when the instant predates the origin state
    pub fn get_by_date(
        &self,
        entity: &NodeId,
        at: DateTime<Utc>,
    ) -> HistoryResult<Option<Node>> {
        self.settle(StateAtQuery::of(entity.clone(), at).execute(self.store()))
            .map(Option::flatten)
    }

    /// Audit the entity's history against every model invariant
    pub fn audit(&self, entity: &NodeId) -> HistoryResult<Option<IntegrityReport>> {
        self.settle(IntegrityCheck::of(entity.clone()).execute(self.store()))
    }

    /// Dispatch a procedure by value, producing at most one row
    pub fn call(
        &self,
        procedure: Procedure,
        entity: &NodeId,
        at: Option<DateTime<Utc>>,
    ) -> Result<Option<Row>, ApiError> {
        tracing::debug!(procedure = %procedure, entity = %entity, "calling procedure");
        let row = match procedure {
            Procedure::CurrentState => self
                .get_current_state(entity)?
                .map(|node| Row::Node { node }),
            Procedure::CurrentPath => self
                .get_current_path(entity)?
                .map(|path| Row::Path { path }),
            Procedure::All => self.get_all(entity)?.map(|path| Row::Path { path }),
            Procedure::ByDate => {
                let at = at.ok_or(ApiError::MissingInstant(procedure))?;
                self.get_by_date(entity, at)?.map(|node| Row::Node { node })
            }
        };
        Ok(row)
    }

    /// Apply the not-found policy; every other error passes through unchanged
    fn settle<T>(&self, result: HistoryResult<T>) -> HistoryResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() && self.not_found == NotFoundPolicy::Absent => {
                tracing::debug!(error = %e, "no history, returning empty result");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
