mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{base_state, repo_evidence, DelayedStage, FailingStage, StaticStage};
use rustc_hash::{FxHashMap, FxHashSet};
use tribunal::scheduler::{Scheduler, SchedulerError, SchedulerState};
use tribunal::stage::{Stage, StagePartial};
use tribunal::types::StageKind;

fn stage_map(
    entries: Vec<(StageKind, Arc<dyn Stage>)>,
) -> FxHashMap<StageKind, Arc<dyn Stage>> {
    entries.into_iter().collect()
}

fn no_predecessors() -> FxHashMap<StageKind, FxHashSet<StageKind>> {
    FxHashMap::default()
}

/* --------------------------- ready vs deferred --------------------------- */

#[tokio::test]
async fn virtual_endpoints_are_deferred() {
    let scheduler = Scheduler::new(4);
    let mut sched_state = SchedulerState::default();
    let stages = stage_map(vec![(
        StageKind::Context,
        Arc::new(StaticStage::empty()) as Arc<dyn Stage>,
    )]);

    let result = scheduler
        .superstep(
            &mut sched_state,
            &stages,
            &no_predecessors(),
            &[StageKind::Context, StageKind::End],
            base_state().snapshot(),
            1,
        )
        .await
        .expect("superstep");

    assert_eq!(result.ran_stages, vec![StageKind::Context]);
    assert_eq!(result.deferred_stages, vec![StageKind::End]);
}

#[tokio::test]
async fn stages_with_unresolved_predecessors_are_deferred() {
    let scheduler = Scheduler::new(4);
    let mut sched_state = SchedulerState::default();
    // Aggregator's predecessor has neither completed nor been skipped.

    let stages = stage_map(vec![
        (
            StageKind::RepoCollector,
            Arc::new(StaticStage::empty()) as Arc<dyn Stage>,
        ),
        (
            StageKind::Aggregator,
            Arc::new(StaticStage::empty()) as Arc<dyn Stage>,
        ),
    ]);
    let mut predecessors = no_predecessors();
    predecessors
        .entry(StageKind::Aggregator)
        .or_default()
        .insert(StageKind::RepoCollector);

    let result = scheduler
        .superstep(
            &mut sched_state,
            &stages,
            &predecessors,
            &[StageKind::Aggregator],
            base_state().snapshot(),
            1,
        )
        .await
        .expect("superstep");

    assert!(result.ran_stages.is_empty());
    assert_eq!(result.deferred_stages, vec![StageKind::Aggregator]);
}

#[tokio::test]
async fn completed_predecessors_do_not_block() {
    let scheduler = Scheduler::new(4);
    let mut sched_state = SchedulerState::default();
    sched_state.completed.insert(StageKind::RepoCollector);

    let stages = stage_map(vec![(
        StageKind::Aggregator,
        Arc::new(StaticStage::empty()) as Arc<dyn Stage>,
    )]);
    let mut predecessors = no_predecessors();
    predecessors
        .entry(StageKind::Aggregator)
        .or_default()
        .insert(StageKind::RepoCollector);

    let result = scheduler
        .superstep(
            &mut sched_state,
            &stages,
            &predecessors,
            &[StageKind::Aggregator],
            base_state().snapshot(),
            2,
        )
        .await
        .expect("superstep");

    assert_eq!(result.ran_stages, vec![StageKind::Aggregator]);
    assert!(sched_state.completed.contains(&StageKind::Aggregator));
}

#[tokio::test]
async fn skipped_predecessors_do_not_block() {
    let scheduler = Scheduler::new(4);
    let mut sched_state = SchedulerState::default();
    // Routing ruled the reviewer out; synthesis must not wait for it.
    sched_state
        .skipped
        .insert(StageKind::Reviewer(tribunal::types::Persona::Critic));

    let stages = stage_map(vec![(
        StageKind::Synthesis,
        Arc::new(StaticStage::empty()) as Arc<dyn Stage>,
    )]);
    let mut predecessors = no_predecessors();
    predecessors
        .entry(StageKind::Synthesis)
        .or_default()
        .insert(StageKind::Reviewer(tribunal::types::Persona::Critic));

    let result = scheduler
        .superstep(
            &mut sched_state,
            &stages,
            &predecessors,
            &[StageKind::Synthesis],
            base_state().snapshot(),
            3,
        )
        .await
        .expect("superstep");

    assert_eq!(result.ran_stages, vec![StageKind::Synthesis]);
}

/* ------------------------------ degradation ------------------------------ */

#[tokio::test]
async fn failing_stage_degrades_to_an_error_partial() {
    let scheduler = Scheduler::new(4);
    let mut sched_state = SchedulerState::default();
    let stages = stage_map(vec![(
        StageKind::RepoCollector,
        Arc::new(FailingStage) as Arc<dyn Stage>,
    )]);

    let result = scheduler
        .superstep(
            &mut sched_state,
            &stages,
            &no_predecessors(),
            &[StageKind::RepoCollector],
            base_state().snapshot(),
            1,
        )
        .await
        .expect("superstep must not propagate stage failures");

    let (kind, partial) = &result.outputs[0];
    assert_eq!(*kind, StageKind::RepoCollector);
    let errors = partial.errors.as_ref().expect("error record");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].tags.iter().any(|t| t == "degraded"));
    assert!(sched_state.completed.contains(&StageKind::RepoCollector));
}

/* ------------------------- concurrency and order ------------------------- */

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn outputs_follow_launch_order_even_with_limit_one() {
    let scheduler = Scheduler::new(1);
    let mut sched_state = SchedulerState::default();

    let slow: Arc<dyn Stage> = Arc::new(DelayedStage {
        delay: Duration::from_millis(30),
        partial: StagePartial::new().with_evidence(repo_evidence("slow", true)),
    });
    let fast: Arc<dyn Stage> = Arc::new(StaticStage::evidence(repo_evidence("fast", true)));
    let stages = stage_map(vec![
        (StageKind::RepoCollector, slow),
        (StageKind::DocCollector, fast),
    ]);

    let result = scheduler
        .superstep(
            &mut sched_state,
            &stages,
            &no_predecessors(),
            &[StageKind::RepoCollector, StageKind::DocCollector],
            base_state().snapshot(),
            1,
        )
        .await
        .expect("superstep");

    let order: Vec<StageKind> = result.outputs.iter().map(|(k, _)| *k).collect();
    assert_eq!(order, vec![StageKind::RepoCollector, StageKind::DocCollector]);
}

#[tokio::test]
async fn unregistered_frontier_stage_is_an_error() {
    let scheduler = Scheduler::new(2);
    let mut sched_state = SchedulerState::default();
    let stages = stage_map(vec![]);

    let err = scheduler
        .superstep(
            &mut sched_state,
            &stages,
            &no_predecessors(),
            &[StageKind::Synthesis],
            base_state().snapshot(),
            1,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SchedulerError::MissingStage {
            stage: StageKind::Synthesis
        }
    ));
}
