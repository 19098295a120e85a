//! Canonical audit graph wiring.

use std::sync::Arc;

use crate::app::App;
use crate::collaborators::{DocInspector, RepoInspector, ReviewerBackend};
use crate::config::AuditConfig;
use crate::graph::edges::ConditionalEdge;
use crate::graph::{GraphBuilder, GraphError, Route};
use crate::stages::{
    AggregatorStage, ContextStage, DocCollectorStage, RepoCollectorStage, ReviewerStage,
    SynthesisStage,
};
use crate::state::StateSnapshot;
use crate::types::{Persona, StageKind};

/// Outcome selecting the reviewer wave.
pub const ROUTE_PROCEED: Route = "proceed";
/// Outcome skipping deliberation after a fatal evidence failure.
pub const ROUTE_ABORT: Route = "abort";

/// Collaborator bundle wired into the canonical graph.
#[derive(Clone)]
pub struct Collaborators {
    pub repo: Arc<dyn RepoInspector>,
    pub doc: Arc<dyn DocInspector>,
    pub reviewer: Arc<dyn ReviewerBackend>,
}

/// Build the canonical audit graph:
///
/// ```text
/// Start -> Context -> {RepoCollector, DocCollector} -> Aggregator
/// Aggregator --proceed--> {Reviewer x3} -> Synthesis -> End
/// Aggregator --abort----> Synthesis -> End
/// ```
///
/// Synthesis always runs, so even an aborted run produces a report.
pub fn build_audit_graph(
    config: &AuditConfig,
    collaborators: &Collaborators,
) -> Result<App, GraphError> {
    let reviewers = Persona::ALL.map(StageKind::Reviewer);

    let mut builder = GraphBuilder::new()
        .with_concurrency_limit(config.concurrency_limit)
        .add_stage(
            StageKind::Context,
            Arc::new(ContextStage::new(config.rubric_path.clone())),
        )
        .add_stage(
            StageKind::RepoCollector,
            Arc::new(RepoCollectorStage::new(collaborators.repo.clone())),
        )
        .add_stage(
            StageKind::DocCollector,
            Arc::new(DocCollectorStage::new(collaborators.doc.clone())),
        )
        .add_stage(StageKind::Aggregator, Arc::new(AggregatorStage))
        .add_stage(StageKind::Synthesis, Arc::new(SynthesisStage))
        .add_edge(StageKind::Start, StageKind::Context)
        .add_edge(StageKind::Context, StageKind::RepoCollector)
        .add_edge(StageKind::Context, StageKind::DocCollector)
        .add_edge(StageKind::RepoCollector, StageKind::Aggregator)
        .add_edge(StageKind::DocCollector, StageKind::Aggregator)
        .add_edge(StageKind::Synthesis, StageKind::End);

    for persona in Persona::ALL {
        builder = builder
            .add_stage(
                StageKind::Reviewer(persona),
                Arc::new(ReviewerStage::new(persona, collaborators.reviewer.clone())),
            )
            .add_edge(StageKind::Reviewer(persona), StageKind::Synthesis);
    }

    builder
        .add_conditional_edge(
            ConditionalEdge::new(
                StageKind::Aggregator,
                Arc::new(|snapshot: &StateSnapshot| {
                    if snapshot.aborted {
                        ROUTE_ABORT
                    } else {
                        ROUTE_PROCEED
                    }
                }),
            )
            .route(ROUTE_PROCEED, reviewers.to_vec())
            .route(ROUTE_ABORT, vec![StageKind::Synthesis]),
        )
        .compile()
}
