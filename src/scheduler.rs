//! Wave scheduler: partitions the frontier into ready and deferred stages
//! and runs the ready set concurrently under a semaphore.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{info_span, instrument, Instrument};

use crate::errors::Fault;
use crate::stage::{Stage, StageContext, StagePartial};
use crate::state::StateSnapshot;
use crate::types::StageKind;

/// Bookkeeping across supersteps: which stages have completed and which
/// have been ruled out by conditional routing.
#[derive(Debug, Default, Clone)]
pub struct SchedulerState {
    pub completed: FxHashSet<StageKind>,
    /// Stages that conditional routing skipped; they will never run, so
    /// fan-in successors must not wait on them.
    pub skipped: FxHashSet<StageKind>,
}

impl SchedulerState {
    /// A stage is resolved once it has run or routing has ruled it out.
    pub fn is_resolved(&self, kind: StageKind) -> bool {
        self.completed.contains(&kind) || self.skipped.contains(&kind)
    }
}

/// Outcome of one superstep.
#[derive(Debug, Default)]
pub struct StepRunResult {
    pub ran_stages: Vec<StageKind>,
    /// Frontier members held back this wave: virtual endpoints and stages
    /// with an in-flight predecessor.
    pub deferred_stages: Vec<StageKind>,
    /// Partials in the order stages were launched.
    pub outputs: Vec<(StageKind, StagePartial)>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    #[error("frontier references stage `{stage}` with no registered implementation")]
    #[diagnostic(code(tribunal::scheduler::missing_stage))]
    MissingStage { stage: StageKind },

    #[error("stage task join failure")]
    #[diagnostic(code(tribunal::scheduler::join))]
    Join(#[from] JoinError),
}

/// Runs frontier stages as a bounded concurrent wave.
#[derive(Debug, Clone)]
pub struct Scheduler {
    concurrency_limit: usize,
}

impl Scheduler {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Execute one wave over the frontier.
    ///
    /// A frontier stage is deferred while any non-virtual predecessor is
    /// unresolved (neither completed nor skipped by routing); it stays in
    /// the frontier for a later wave, so a fan-in stage never runs before
    /// every contributing predecessor's output has been merged. Stage
    /// failures never propagate: an `Err` from a stage is folded into an
    /// error-only partial so the round degrades instead of crashing.
    #[instrument(skip(self, sched_state, stages, predecessors, snapshot), fields(step, frontier = frontier.len()), err)]
    pub async fn superstep(
        &self,
        sched_state: &mut SchedulerState,
        stages: &FxHashMap<StageKind, Arc<dyn Stage>>,
        predecessors: &FxHashMap<StageKind, FxHashSet<StageKind>>,
        frontier: &[StageKind],
        snapshot: StateSnapshot,
        step: u64,
    ) -> Result<StepRunResult, SchedulerError> {
        let mut ready = Vec::new();
        let mut deferred = Vec::new();

        for &kind in frontier {
            if kind.is_virtual() {
                deferred.push(kind);
                continue;
            }
            let blocked = predecessors.get(&kind).is_some_and(|preds| {
                preds
                    .iter()
                    .any(|p| !p.is_virtual() && !sched_state.is_resolved(*p))
            });
            if blocked {
                deferred.push(kind);
            } else {
                ready.push(kind);
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut join_set: JoinSet<(usize, StageKind, StagePartial)> = JoinSet::new();

        for (index, &kind) in ready.iter().enumerate() {
            let stage = stages
                .get(&kind)
                .ok_or(SchedulerError::MissingStage { stage: kind })?
                .clone();

            let permit_source = Arc::clone(&semaphore);
            let snapshot = snapshot.clone();
            let span = info_span!("schedule", stage = %kind, step);
            join_set.spawn(
                async move {
                    let _permit = permit_source.acquire_owned().await.ok();
                    let ctx = StageContext::new(kind, step);
                    let partial = match stage.run(snapshot, ctx.clone()).await {
                        Ok(partial) => partial,
                        Err(err) => {
                            tracing::warn!(stage = %kind, error = %err, "stage failed; degrading");
                            StagePartial::new().with_errors(vec![
                                ctx.error_event(Fault::msg(err.to_string()))
                                    .with_tag("degraded"),
                            ])
                        }
                    };
                    (index, kind, partial)
                }
                .instrument(span),
            );
        }

        let mut collected: Vec<(usize, StageKind, StagePartial)> = Vec::with_capacity(ready.len());
        while let Some(joined) = join_set.join_next().await {
            let (index, kind, partial) = joined?;
            sched_state.completed.insert(kind);
            collected.push((index, kind, partial));
        }
        // Launch order, not completion order, so barrier input is stable.
        collected.sort_by_key(|(index, _, _)| *index);

        Ok(StepRunResult {
            ran_stages: ready,
            deferred_stages: deferred,
            outputs: collected
                .into_iter()
                .map(|(_, kind, partial)| (kind, partial))
                .collect(),
        })
    }
}
