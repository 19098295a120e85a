//! Compiled, executable audit application.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{info_span, instrument};

use crate::errors::{ErrorEvent, ErrorScope};
use crate::graph::edges::ConditionalEdge;
use crate::reducers::{ReducerError, ReducerRegistry};
use crate::runner::{Runner, RunnerError};
use crate::stage::{Stage, StagePartial};
use crate::state::AuditState;
use crate::types::{ChannelType, StageKind};

/// Validated graph plus the reducer registry that merges wave output.
///
/// Produced by [`crate::graph::GraphBuilder::compile`]; cheap to clone.
#[derive(Clone)]
pub struct App {
    stages: FxHashMap<StageKind, Arc<dyn Stage>>,
    edges: FxHashMap<StageKind, Vec<StageKind>>,
    conditional_edges: Vec<ConditionalEdge>,
    predecessors: FxHashMap<StageKind, FxHashSet<StageKind>>,
    reducer_registry: ReducerRegistry,
    concurrency_limit: Option<usize>,
}

// Stage trait objects are not Debug; show the topology instead.
impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("stages", &self.stages.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("concurrency_limit", &self.concurrency_limit)
            .finish_non_exhaustive()
    }
}

/// What a barrier application changed.
#[derive(Debug, Clone, Default)]
pub struct BarrierOutcome {
    pub updated_channels: Vec<ChannelType>,
    /// Error events merged this barrier, in deterministic order.
    pub errors: Vec<ErrorEvent>,
}

impl App {
    pub(crate) fn from_parts(
        stages: FxHashMap<StageKind, Arc<dyn Stage>>,
        edges: FxHashMap<StageKind, Vec<StageKind>>,
        conditional_edges: Vec<ConditionalEdge>,
        concurrency_limit: Option<usize>,
    ) -> Self {
        let mut predecessors: FxHashMap<StageKind, FxHashSet<StageKind>> = FxHashMap::default();
        for (from, targets) in &edges {
            for to in targets {
                predecessors.entry(*to).or_default().insert(*from);
            }
        }
        for edge in &conditional_edges {
            for target in edge.targets() {
                predecessors.entry(target).or_default().insert(edge.from());
            }
        }

        Self {
            stages,
            edges,
            conditional_edges,
            predecessors,
            reducer_registry: ReducerRegistry::default(),
            concurrency_limit,
        }
    }

    pub fn stages(&self) -> &FxHashMap<StageKind, Arc<dyn Stage>> {
        &self.stages
    }

    pub fn edges(&self) -> &FxHashMap<StageKind, Vec<StageKind>> {
        &self.edges
    }

    pub fn conditional_edges(&self) -> &[ConditionalEdge] {
        &self.conditional_edges
    }

    pub fn predecessors(&self) -> &FxHashMap<StageKind, FxHashSet<StageKind>> {
        &self.predecessors
    }

    pub fn concurrency_limit(&self) -> Option<usize> {
        self.concurrency_limit
    }

    /// Fold a wave's partials into the state atomically.
    ///
    /// Partials are aggregated into one combined update before reduction, so
    /// the set of touched channels is reported once per barrier. Error events
    /// are sorted into a deterministic order (scope class, then timestamp,
    /// then message) regardless of stage completion order.
    #[instrument(skip(self, state, partials), fields(ran = ran.len()), err)]
    pub fn apply_barrier(
        &self,
        state: &mut AuditState,
        ran: &[StageKind],
        partials: Vec<StagePartial>,
    ) -> Result<BarrierOutcome, ReducerError> {
        let span = info_span!("barrier", stages = ran.len());
        let _guard = span.enter();

        let combined = combine_partials(partials);
        let merged_errors = combined.errors.clone().unwrap_or_default();
        let updated_channels = self.reducer_registry.apply_all(state, &combined)?;

        Ok(BarrierOutcome {
            updated_channels,
            errors: merged_errors,
        })
    }

    /// Run the graph to completion from the given initial state.
    pub async fn invoke(&self, initial: AuditState) -> Result<AuditState, RunnerError> {
        let mut runner = Runner::new(Arc::new(self.clone()))?;
        runner.run_until_complete(initial).await
    }
}

/// Aggregate a wave's partials into a single combined update.
fn combine_partials(partials: Vec<StagePartial>) -> StagePartial {
    let mut combined = StagePartial::new();
    for partial in partials {
        if let Some(evidence) = partial.evidence {
            match &mut combined.evidence {
                Some(existing) => existing.merge(&evidence),
                None => combined.evidence = Some(evidence),
            }
        }
        if let Some(opinions) = partial.opinions {
            combined.opinions.get_or_insert_with(Vec::new).extend(opinions);
        }
        if let Some(errors) = partial.errors {
            combined.errors.get_or_insert_with(Vec::new).extend(errors);
        }
        if let Some(aborted) = partial.aborted {
            let flag = combined.aborted.get_or_insert(false);
            *flag |= aborted;
        }
        if let Some(rubric) = partial.rubric {
            combined.rubric = Some(rubric);
        }
        if let Some(report) = partial.report {
            combined.report = Some(report);
        }
    }
    if let Some(errors) = &mut combined.errors {
        errors.sort_by(|a, b| {
            scope_sort_key(&a.scope)
                .cmp(&scope_sort_key(&b.scope))
                .then_with(|| a.when.cmp(&b.when))
                .then_with(|| a.error.message.cmp(&b.error.message))
        });
    }
    combined
}

fn scope_sort_key(scope: &ErrorScope) -> (u8, String, u64) {
    match scope {
        ErrorScope::Stage { kind, step } => (0, kind.clone(), *step),
        ErrorScope::Scheduler { step } => (1, String::new(), *step),
        ErrorScope::Runner { step } => (2, String::new(), *step),
        ErrorScope::App => (3, String::new(), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Fault;
    use crate::evidence::{CollectorId, Evidence, EvidenceMap};

    #[test]
    fn combine_merges_evidence_and_sorts_errors() {
        let first = StagePartial::new()
            .with_evidence(EvidenceMap::singleton(
                CollectorId::Repo,
                vec![Evidence::new("manifest", true, "Cargo.toml", "present", 0.9)],
            ))
            .with_errors(vec![ErrorEvent::stage("repo_collector", 2, Fault::msg("b"))]);
        let second = StagePartial::new()
            .with_evidence(EvidenceMap::singleton(
                CollectorId::Doc,
                vec![Evidence::new("doc", true, "spec.pdf", "read", 0.8)],
            ))
            .with_errors(vec![ErrorEvent::stage("doc_collector", 2, Fault::msg("a"))]);

        let combined = combine_partials(vec![first, second]);
        let evidence = combined.evidence.expect("evidence");
        assert_eq!(evidence.len(), 2);

        let errors = combined.errors.expect("errors");
        assert_eq!(errors.len(), 2);
        // Stage scope sorts by stage label first.
        assert!(matches!(
            &errors[0].scope,
            ErrorScope::Stage { kind, .. } if kind == "doc_collector"
        ));
    }

    #[test]
    fn combine_folds_aborted_with_or() {
        let partials = vec![
            StagePartial::new().with_aborted(false),
            StagePartial::new().with_aborted(true),
            StagePartial::new().with_aborted(false),
        ];
        assert_eq!(combine_partials(partials).aborted, Some(true));
    }
}
