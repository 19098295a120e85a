//! Edge types, including conditional routing.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::state::StateSnapshot;
use crate::types::StageKind;

/// Symbolic routing outcome returned by a predicate.
pub type Route = &'static str;

/// Pure routing decision over the post-barrier snapshot.
pub type RoutePredicate = Arc<dyn Fn(&StateSnapshot) -> Route + Send + Sync + 'static>;

/// A conditional edge: after `from` completes, the predicate inspects the
/// merged snapshot and selects one outcome's successor set.
#[derive(Clone)]
pub struct ConditionalEdge {
    from: StageKind,
    predicate: RoutePredicate,
    routes: FxHashMap<Route, Vec<StageKind>>,
}

impl ConditionalEdge {
    pub fn new(from: StageKind, predicate: RoutePredicate) -> Self {
        Self {
            from,
            predicate,
            routes: FxHashMap::default(),
        }
    }

    /// Map an outcome to its successor stages.
    #[must_use]
    pub fn route(mut self, outcome: Route, targets: Vec<StageKind>) -> Self {
        self.routes.insert(outcome, targets);
        self
    }

    pub fn from(&self) -> StageKind {
        self.from
    }

    /// All stages reachable through any outcome, for compile-time validation.
    pub fn targets(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.routes.values().flatten().copied()
    }

    /// Evaluate the predicate and return the selected successors.
    ///
    /// An outcome with no declared route yields no successors; the unknown
    /// outcome is logged rather than treated as fatal.
    pub fn resolve(&self, snapshot: &StateSnapshot) -> &[StageKind] {
        let outcome = (self.predicate)(snapshot);
        match self.routes.get(outcome) {
            Some(targets) => targets,
            None => {
                tracing::warn!(
                    from = %self.from,
                    outcome,
                    "conditional edge returned undeclared outcome; no successors scheduled"
                );
                &[]
            }
        }
    }
}

impl std::fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("from", &self.from)
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AuditState, RunInputs};
    use std::path::PathBuf;

    fn snapshot(aborted: bool) -> StateSnapshot {
        let mut state = AuditState::new(RunInputs {
            repo_url: "https://example.com/repo.git".into(),
            doc_path: PathBuf::from("spec.pdf"),
        });
        state.aborted = aborted;
        state.snapshot()
    }

    #[test]
    fn resolves_declared_outcome() {
        let edge = ConditionalEdge::new(
            StageKind::Aggregator,
            Arc::new(|snap: &StateSnapshot| if snap.aborted { "abort" } else { "proceed" }),
        )
        .route("proceed", vec![StageKind::Synthesis])
        .route("abort", vec![StageKind::End]);

        assert_eq!(edge.resolve(&snapshot(false)), &[StageKind::Synthesis]);
        assert_eq!(edge.resolve(&snapshot(true)), &[StageKind::End]);
    }

    #[test]
    fn undeclared_outcome_yields_no_successors() {
        let edge = ConditionalEdge::new(StageKind::Aggregator, Arc::new(|_| "mystery"))
            .route("proceed", vec![StageKind::Synthesis]);
        assert!(edge.resolve(&snapshot(false)).is_empty());
    }
}
