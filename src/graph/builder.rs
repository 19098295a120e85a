//! Fluent construction of audit workflow graphs.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::{ConditionalEdge, RoutePredicate};
use crate::stage::Stage;
use crate::types::StageKind;

/// Collects stages and edges before compilation.
///
/// `Start` and `End` are virtual: they may appear in edge declarations but
/// cannot be registered as stages. Registration attempts for them are logged
/// and ignored.
pub struct GraphBuilder {
    pub(crate) stages: FxHashMap<StageKind, Arc<dyn Stage>>,
    pub(crate) edges: FxHashMap<StageKind, Vec<StageKind>>,
    pub(crate) conditional_edges: Vec<ConditionalEdge>,
    pub(crate) concurrency_limit: Option<usize>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            stages: FxHashMap::default(),
            edges: FxHashMap::default(),
            conditional_edges: Vec::new(),
            concurrency_limit: None,
        }
    }

    /// Register a stage implementation under its kind.
    ///
    /// Re-registering a kind replaces the previous implementation.
    #[must_use]
    pub fn add_stage(mut self, kind: StageKind, stage: Arc<dyn Stage>) -> Self {
        if kind.is_virtual() {
            tracing::warn!(stage = %kind, "ignoring attempt to register a virtual endpoint");
            return self;
        }
        self.stages.insert(kind, stage);
        self
    }

    /// Declare an unconditional edge.
    #[must_use]
    pub fn add_edge(mut self, from: StageKind, to: StageKind) -> Self {
        self.edges.entry(from).or_default().push(to);
        self
    }

    /// Declare a conditional edge built with [`ConditionalEdge::route`].
    #[must_use]
    pub fn add_conditional_edge(mut self, edge: ConditionalEdge) -> Self {
        self.conditional_edges.push(edge);
        self
    }

    /// Shorthand for a conditional edge with a predicate and outcome map.
    #[must_use]
    pub fn add_conditional(
        self,
        from: StageKind,
        predicate: RoutePredicate,
        routes: impl IntoIterator<Item = (super::edges::Route, Vec<StageKind>)>,
    ) -> Self {
        let mut edge = ConditionalEdge::new(from, predicate);
        for (outcome, targets) in routes {
            edge = edge.route(outcome, targets);
        }
        self.add_conditional_edge(edge)
    }

    /// Cap on concurrently running stages per wave. Unset means the wave
    /// width is the cap.
    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit.max(1));
        self
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
