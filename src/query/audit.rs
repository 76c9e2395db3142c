//! Integrity audit of one entity's version history
//!
//! The history queries trust the write path and stop at the first broken
//! invariant. The audit walks the same chain but keeps going where it can,
//! and also checks the temporal invariants the queries never look at:
//! the current interval is open, PREVIOUS dates strictly descend, and each
//! closed interval ends exactly where its successor's begins.

use chrono::{DateTime, Utc};

use crate::graph::{property, relationship, Edge, NodeId};
use crate::storage::GraphStore;

use super::current::{resolve_head, Cardinality};
use super::history::ChainWalker;
use super::types::{HistoryError, HistoryResult, IntegrityReport, Violation};

/// Audit query for a single entity
#[derive(Debug, Clone)]
pub struct IntegrityCheck {
    /// Entity reference
    pub entity: NodeId,
}

impl IntegrityCheck {
    pub fn of(entity: impl Into<NodeId>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    /// Run the audit. `NotFound` and storage failures are still errors;
    /// invariant violations are collected into the report.
    pub fn execute<S: GraphStore + ?Sized>(&self, store: &S) -> HistoryResult<IntegrityReport> {
        let mut report = IntegrityReport {
            entity: self.entity.clone(),
            states_visited: 0,
            violations: Vec::new(),
        };

        let head = match resolve_head(store, &self.entity) {
            Ok(head) => head,
            Err(HistoryError::InvariantViolation(v)) => {
                report.violations.push(v);
                return Ok(report);
            }
            Err(e) => return Err(e),
        };
        report.states_visited = 1;

        let mut newer_interval = self.interval(store, &head.state.id, &mut report)?;
        if newer_interval.as_ref().is_some_and(|e| e.end_date().is_some()) {
            report.violations.push(Violation::OpenHasStateEnded {
                state: head.state.id.clone(),
            });
        }

        let mut walker = ChainWalker::new(self.entity.clone(), head.state.id.clone());
        let mut newer_date: Option<DateTime<Utc>> = None;

        loop {
            let newer = walker.tail().clone();
            let (previous, older) = match walker.step(store) {
                Ok(Some(step)) => step,
                Ok(None) => break,
                // The chain cannot be followed past a structural break
                Err(HistoryError::InvariantViolation(v)) => {
                    report.violations.push(v);
                    break;
                }
                Err(e) => return Err(e),
            };
            report.states_visited += 1;

            match previous.date() {
                Some(date) => {
                    if newer_date.is_some_and(|d| date >= d) {
                        report.violations.push(Violation::NonDescendingPrevious {
                            newer: newer.clone(),
                            older: older.id.clone(),
                        });
                    }
                    newer_date = Some(date);
                }
                None => report.violations.push(Violation::MissingDate {
                    edge: previous.id.clone(),
                    property: property::DATE.to_string(),
                }),
            }

            let older_interval = self.interval(store, &older.id, &mut report)?;
            if let (Some(older_edge), Some(newer_edge)) = (&older_interval, &newer_interval) {
                let end = older_edge.end_date();
                let successor_start = newer_edge.start_date();
                if end.is_none() || end != successor_start {
                    report.violations.push(Violation::TemporalGap {
                        state: older.id.clone(),
                        end,
                        successor_start,
                    });
                }
            }
            newer_interval = older_interval;
        }

        if report.is_consistent() {
            tracing::debug!(
                entity = %self.entity,
                states = report.states_visited,
                "history consistent"
            );
        } else {
            tracing::warn!(
                entity = %self.entity,
                violations = report.violations.len(),
                "history audit found violations"
            );
        }
        Ok(report)
    }

    /// The HAS_STATE edge for `state`, recording a violation when there isn't exactly one
    fn interval<S: GraphStore + ?Sized>(
        &self,
        store: &S,
        state: &NodeId,
        report: &mut IntegrityReport,
    ) -> HistoryResult<Option<Edge>> {
        let edges = store.edges_between(&self.entity, relationship::HAS_STATE, state)?;
        Ok(match Cardinality::of(edges) {
            Cardinality::One(edge) => {
                if edge.start_date().is_none() {
                    report.violations.push(Violation::MissingDate {
                        edge: edge.id.clone(),
                        property: property::START_DATE.to_string(),
                    });
                }
                Some(edge)
            }
            Cardinality::Zero => {
                report.violations.push(Violation::MissingHasState {
                    entity: self.entity.clone(),
                    state: state.clone(),
                });
                None
            }
            Cardinality::Many(count) => {
                report.violations.push(Violation::MultipleHasState {
                    entity: self.entity.clone(),
                    state: state.clone(),
                    count,
                });
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};
    use crate::storage::MemoryStore;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    /// Two versions: s-new (current) and s-old
    fn two_versions(old_end: Option<i64>, previous_date: i64) -> MemoryStore {
        let store = MemoryStore::new();
        store.save_node(&Node::entity().with_id("e")).unwrap();
        store
            .save_node(&Node::state().with_id("s-new").with_property("key", "initialValue"))
            .unwrap();
        store
            .save_node(&Node::state().with_id("s-old").with_property("key", "oldState"))
            .unwrap();
        store
            .save_edge(&Edge::current("e".into(), "s-new".into(), at(593_910_000_000)))
            .unwrap();
        store
            .save_edge(&Edge::has_state("e".into(), "s-new".into(), at(593_910_000_000), None))
            .unwrap();
        store
            .save_edge(&Edge::has_state(
                "e".into(),
                "s-old".into(),
                at(593_900_000_000),
                old_end.map(at),
            ))
            .unwrap();
        store
            .save_edge(&Edge::previous("s-new".into(), "s-old".into(), at(previous_date)))
            .unwrap();
        store
    }

    #[test]
    fn test_consistent_history() {
        let store = two_versions(Some(593_910_000_000), 593_900_000_000);
        let report = IntegrityCheck::of("e").execute(&store).unwrap();
        assert!(report.is_consistent(), "{:?}", report.violations);
        assert_eq!(report.states_visited, 2);
    }

    #[test]
    fn test_gap_between_intervals() {
        let store = two_versions(Some(593_905_000_000), 593_900_000_000);
        let report = IntegrityCheck::of("e").execute(&store).unwrap();
        assert_eq!(
            report.violations,
            vec![Violation::TemporalGap {
                state: NodeId::from("s-old"),
                end: Some(at(593_905_000_000)),
                successor_start: Some(at(593_910_000_000)),
            }]
        );
    }

    #[test]
    fn test_unclosed_older_interval() {
        let store = two_versions(None, 593_900_000_000);
        let report = IntegrityCheck::of("e").execute(&store).unwrap();
        assert!(matches!(
            report.violations.as_slice(),
            [Violation::TemporalGap { end: None, .. }]
        ));
    }

    #[test]
    fn test_current_interval_must_be_open() {
        let store = two_versions(Some(593_910_000_000), 593_900_000_000);
        let closed = store
            .edges_between(&NodeId::from("e"), relationship::HAS_STATE, &NodeId::from("s-new"))
            .unwrap()
            .remove(0)
            .with_property(property::END_DATE, at(593_920_000_000));
        store.save_edge(&closed).unwrap();

        let report = IntegrityCheck::of("e").execute(&store).unwrap();
        assert!(report
            .violations
            .contains(&Violation::OpenHasStateEnded { state: NodeId::from("s-new") }));
    }

    #[test]
    fn test_previous_dates_must_descend() {
        let store = two_versions(Some(593_910_000_000), 593_900_000_000);
        store.save_node(&Node::state().with_id("s-oldest")).unwrap();
        store
            .save_edge(&Edge::has_state(
                "e".into(),
                "s-oldest".into(),
                at(593_800_000_000),
                Some(at(593_900_000_000)),
            ))
            .unwrap();
        // Later than the PREVIOUS edge above it in the chain
        store
            .save_edge(&Edge::previous("s-old".into(), "s-oldest".into(), at(593_950_000_000)))
            .unwrap();

        let report = IntegrityCheck::of("e").execute(&store).unwrap();
        assert_eq!(report.states_visited, 3);
        assert_eq!(
            report.violations,
            vec![Violation::NonDescendingPrevious {
                newer: NodeId::from("s-old"),
                older: NodeId::from("s-oldest"),
            }]
        );
    }

    #[test]
    fn test_structural_break_is_reported_not_raised() {
        let store = two_versions(Some(593_910_000_000), 593_900_000_000);
        store
            .save_edge(&Edge::previous("s-old".into(), "s-new".into(), at(593_000_000_000)))
            .unwrap();

        let report = IntegrityCheck::of("e").execute(&store).unwrap();
        assert!(report
            .violations
            .contains(&Violation::PreviousCycle { state: NodeId::from("s-new") }));
    }

    #[test]
    fn test_multiple_current_reported() {
        let store = two_versions(Some(593_910_000_000), 593_900_000_000);
        store
            .save_edge(&Edge::current("e".into(), "s-old".into(), at(593_900_000_000)))
            .unwrap();

        let report = IntegrityCheck::of("e").execute(&store).unwrap();
        assert_eq!(report.states_visited, 0);
        assert!(matches!(
            report.violations.as_slice(),
            [Violation::MultipleCurrent { count: 2, .. }]
        ));
    }

    #[test]
    fn test_unknown_entity_is_an_error() {
        let store = MemoryStore::new();
        let err = IntegrityCheck::of("nobody").execute(&store).unwrap_err();
        assert!(err.is_not_found());
    }
}
