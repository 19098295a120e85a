mod common;

use std::sync::Arc;

use common::StaticStage;
use tribunal::graph::edges::ConditionalEdge;
use tribunal::graph::{GraphBuilder, GraphError};
use tribunal::state::StateSnapshot;
use tribunal::types::{Persona, StageKind};

fn stage() -> Arc<StaticStage> {
    Arc::new(StaticStage::empty())
}

/* ---------------------- successful compilation ---------------------- */

#[test]
fn compiles_linear_graph_and_records_predecessors() {
    let app = GraphBuilder::new()
        .add_stage(StageKind::Context, stage())
        .add_stage(StageKind::Aggregator, stage())
        .add_edge(StageKind::Start, StageKind::Context)
        .add_edge(StageKind::Context, StageKind::Aggregator)
        .add_edge(StageKind::Aggregator, StageKind::End)
        .compile()
        .expect("compile");

    let preds = app.predecessors();
    assert!(preds[&StageKind::Aggregator].contains(&StageKind::Context));
    assert!(preds[&StageKind::Context].contains(&StageKind::Start));
}

#[test]
fn conditional_targets_count_as_reachable() {
    let app = GraphBuilder::new()
        .add_stage(StageKind::Aggregator, stage())
        .add_stage(StageKind::Synthesis, stage())
        .add_edge(StageKind::Start, StageKind::Aggregator)
        .add_conditional_edge(
            ConditionalEdge::new(StageKind::Aggregator, Arc::new(|_: &StateSnapshot| "go"))
                .route("go", vec![StageKind::Synthesis]),
        )
        .add_edge(StageKind::Synthesis, StageKind::End)
        .compile()
        .expect("compile");

    assert!(app.predecessors()[&StageKind::Synthesis].contains(&StageKind::Aggregator));
}

#[test]
fn registering_virtual_endpoints_is_ignored() {
    let app = GraphBuilder::new()
        .add_stage(StageKind::Start, stage())
        .add_stage(StageKind::End, stage())
        .add_stage(StageKind::Context, stage())
        .add_edge(StageKind::Start, StageKind::Context)
        .compile()
        .expect("compile");
    assert_eq!(app.stages().len(), 1);
}

/* ------------------------- rejected graphs ------------------------- */

#[test]
fn rejects_missing_entry_edges() {
    let err = GraphBuilder::new()
        .add_stage(StageKind::Context, stage())
        .compile()
        .unwrap_err();
    assert_eq!(err, GraphError::NoEntryEdges);
}

#[test]
fn rejects_edges_to_undeclared_stages() {
    let err = GraphBuilder::new()
        .add_stage(StageKind::Context, stage())
        .add_edge(StageKind::Start, StageKind::Context)
        .add_edge(StageKind::Context, StageKind::Aggregator)
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::UndeclaredStage {
            stage: StageKind::Aggregator
        }
    );
}

#[test]
fn rejects_undeclared_conditional_targets() {
    let err = GraphBuilder::new()
        .add_stage(StageKind::Aggregator, stage())
        .add_edge(StageKind::Start, StageKind::Aggregator)
        .add_conditional_edge(
            ConditionalEdge::new(StageKind::Aggregator, Arc::new(|_: &StateSnapshot| "go"))
                .route("go", vec![StageKind::Reviewer(Persona::Critic)]),
        )
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::UndeclaredStage {
            stage: StageKind::Reviewer(Persona::Critic)
        }
    );
}

#[test]
fn rejects_cycles() {
    let err = GraphBuilder::new()
        .add_stage(StageKind::Context, stage())
        .add_stage(StageKind::RepoCollector, stage())
        .add_edge(StageKind::Start, StageKind::Context)
        .add_edge(StageKind::Context, StageKind::RepoCollector)
        .add_edge(StageKind::RepoCollector, StageKind::Context)
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }));
}

#[test]
fn rejects_unreachable_stages() {
    let err = GraphBuilder::new()
        .add_stage(StageKind::Context, stage())
        .add_stage(StageKind::Synthesis, stage())
        .add_edge(StageKind::Start, StageKind::Context)
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::Unreachable {
            stage: StageKind::Synthesis
        }
    );
}
