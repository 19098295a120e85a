//! Step loop: superstep, barrier, frontier advance, repeat until done.

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info_span, instrument};

use crate::app::App;
use crate::reducers::ReducerError;
use crate::scheduler::{Scheduler, SchedulerError, SchedulerState};
use crate::state::AuditState;
use crate::types::{ChannelType, StageKind};

/// What one step of the run did.
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    pub step: u64,
    pub ran_stages: Vec<StageKind>,
    pub deferred_stages: Vec<StageKind>,
    pub updated_channels: Vec<ChannelType>,
    /// Error events merged at this step's barrier.
    pub error_count: usize,
    pub next_frontier: Vec<StageKind>,
    pub completed: bool,
}

#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("graph has no entry stages")]
    #[diagnostic(
        code(tribunal::runner::no_entry_stages),
        help("the compiled graph must declare edges out of the start endpoint")
    )]
    NoEntryStages,

    #[error("run stalled: frontier {frontier:?} cannot make progress")]
    #[diagnostic(
        code(tribunal::runner::stalled),
        help("every frontier stage is blocked on a predecessor that will never complete")
    )]
    Stalled { frontier: Vec<StageKind> },

    #[error(transparent)]
    #[diagnostic(code(tribunal::runner::scheduler))]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    #[diagnostic(code(tribunal::runner::barrier))]
    Barrier(#[from] ReducerError),
}

/// Drives a compiled [`App`] step by step.
pub struct Runner {
    app: Arc<App>,
    scheduler: Scheduler,
    scheduler_state: SchedulerState,
    frontier: Vec<StageKind>,
    step: u64,
}

impl Runner {
    /// Seed the frontier from the start endpoint's successors.
    pub fn new(app: Arc<App>) -> Result<Self, RunnerError> {
        let frontier = app
            .edges()
            .get(&StageKind::Start)
            .cloned()
            .filter(|f| !f.is_empty())
            .ok_or(RunnerError::NoEntryStages)?;
        let width = frontier.len();
        let limit = app.concurrency_limit().unwrap_or(width.max(1));
        Ok(Self {
            app,
            scheduler: Scheduler::new(limit),
            scheduler_state: SchedulerState::default(),
            frontier,
            step: 0,
        })
    }

    pub fn frontier(&self) -> &[StageKind] {
        &self.frontier
    }

    /// Run one superstep and its barrier, then advance the frontier.
    #[instrument(skip(self, state), fields(step = self.step + 1), err)]
    pub async fn run_step(&mut self, state: &mut AuditState) -> Result<StepReport, RunnerError> {
        self.step += 1;
        let snapshot = state.snapshot();

        let run = self
            .scheduler
            .superstep(
                &mut self.scheduler_state,
                self.app.stages(),
                self.app.predecessors(),
                &self.frontier,
                snapshot,
                self.step,
            )
            .await?;

        // Nothing ran and something non-virtual is still waiting: the wait
        // can never be satisfied, since no new completions are coming.
        if run.ran_stages.is_empty()
            && run.deferred_stages.iter().any(|s| !s.is_virtual())
        {
            return Err(RunnerError::Stalled {
                frontier: run.deferred_stages,
            });
        }

        let partials: Vec<_> = run.outputs.into_iter().map(|(_, p)| p).collect();
        let barrier = self.app.apply_barrier(state, &run.ran_stages, partials)?;

        let next_frontier = self.compute_next_frontier(&run.ran_stages, &run.deferred_stages, state);
        self.mark_routed_out(&next_frontier);
        let completed = next_frontier.is_empty()
            || next_frontier.iter().all(|s| *s == StageKind::End);

        let report = StepReport {
            step: self.step,
            ran_stages: run.ran_stages,
            deferred_stages: run.deferred_stages,
            updated_channels: barrier.updated_channels,
            error_count: barrier.errors.len(),
            next_frontier: next_frontier.clone(),
            completed,
        };
        self.frontier = next_frontier;
        Ok(report)
    }

    /// Loop until the frontier drains or reaches the end endpoint.
    pub async fn run_until_complete(
        &mut self,
        mut state: AuditState,
    ) -> Result<AuditState, RunnerError> {
        loop {
            let report = self.run_step(&mut state).await?;
            tracing::info!(
                step = report.step,
                ran = report.ran_stages.len(),
                deferred = report.deferred_stages.len(),
                errors = report.error_count,
                "step complete"
            );
            if report.completed {
                return Ok(state);
            }
        }
    }

    /// Successors of the stages that ran, resolved against the post-barrier
    /// state, plus any deferred stages carried over.
    ///
    /// Conditional routing reads the merged snapshot, so a decision always
    /// sees the output of the stage it gates. Unknown targets are logged and
    /// skipped; duplicates are collapsed; a stage that already completed is
    /// never re-admitted.
    fn compute_next_frontier(
        &self,
        ran: &[StageKind],
        deferred: &[StageKind],
        state: &AuditState,
    ) -> Vec<StageKind> {
        let span = info_span!("frontier", ran = ran.len());
        let _guard = span.enter();
        let snapshot = state.snapshot();

        let mut next = Vec::new();
        let mut seen = FxHashSet::default();

        for &kind in deferred {
            if seen.insert(kind) {
                next.push(kind);
            }
        }

        for &kind in ran {
            if let Some(successors) = self.app.edges().get(&kind) {
                for &succ in successors {
                    if self.admissible(succ) && seen.insert(succ) {
                        next.push(succ);
                    }
                }
            }
            for edge in self.app.conditional_edges() {
                if edge.from() != kind {
                    continue;
                }
                for &succ in edge.resolve(&snapshot) {
                    if self.admissible(succ) && seen.insert(succ) {
                        next.push(succ);
                    }
                }
            }
        }
        next
    }

    fn admissible(&self, kind: StageKind) -> bool {
        if self.scheduler_state.completed.contains(&kind) {
            return false;
        }
        if kind.is_virtual() || self.app.stages().contains_key(&kind) {
            true
        } else {
            tracing::warn!(stage = %kind, "skipping unknown frontier target");
            false
        }
    }

    /// Mark stages that conditional routing has ruled out.
    ///
    /// A stage whose predecessors are all resolved but which was never
    /// admitted to the frontier can only have been bypassed by a routing
    /// decision; it will never run. Marking it resolved keeps fan-in
    /// successors (which wait on every predecessor) from blocking forever.
    /// Runs to a fixpoint so skips propagate along chains.
    fn mark_routed_out(&mut self, next_frontier: &[StageKind]) {
        let frontier: FxHashSet<StageKind> = next_frontier.iter().copied().collect();
        loop {
            let mut changed = false;
            for &kind in self.app.stages().keys() {
                if self.scheduler_state.is_resolved(kind) || frontier.contains(&kind) {
                    continue;
                }
                let ruled_out = self.app.predecessors().get(&kind).is_some_and(|preds| {
                    preds
                        .iter()
                        .all(|p| p.is_virtual() || self.scheduler_state.is_resolved(*p))
                });
                if ruled_out {
                    tracing::debug!(stage = %kind, "stage ruled out by routing");
                    self.scheduler_state.skipped.insert(kind);
                    changed = true;
                }
            }
            if !changed {
                return;
            }
        }
    }
}
