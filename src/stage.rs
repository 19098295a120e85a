//! The stage abstraction: units of work scheduled in concurrent waves.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::collaborators::CollaboratorError;
use crate::errors::{ErrorEvent, Fault};
use crate::evidence::EvidenceMap;
use crate::opinion::Opinion;
use crate::rubric::RubricDimension;
use crate::state::StateSnapshot;
use crate::types::StageKind;

/// A unit of work in the audit graph.
///
/// Stages receive an immutable snapshot of state as of the last barrier and
/// return a [`StagePartial`]; they never mutate shared state directly.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: StageContext,
    ) -> Result<StagePartial, StageError>;
}

/// Execution context handed to a stage invocation.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub stage: StageKind,
    pub step: u64,
}

impl StageContext {
    pub fn new(stage: StageKind, step: u64) -> Self {
        Self { stage, step }
    }

    /// Emit a progress line attributed to this stage.
    pub fn emit(&self, scope: &str, message: &str) {
        tracing::info!(
            target: "tribunal::stage",
            stage = %self.stage,
            step = self.step,
            scope,
            "{message}"
        );
    }

    /// Build an error event scoped to this stage invocation.
    pub fn error_event(&self, fault: Fault) -> ErrorEvent {
        ErrorEvent::stage(self.stage.as_str(), self.step, fault)
    }
}

/// Partial state update produced by one stage invocation.
///
/// Every field is optional; `None` means "no update for that channel" and is
/// skipped by the reducer guard at the barrier.
#[derive(Debug, Clone, Default)]
pub struct StagePartial {
    pub evidence: Option<EvidenceMap>,
    pub opinions: Option<Vec<Opinion>>,
    pub errors: Option<Vec<ErrorEvent>>,
    pub aborted: Option<bool>,
    pub rubric: Option<Vec<RubricDimension>>,
    pub report: Option<String>,
}

impl StagePartial {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_evidence(mut self, evidence: EvidenceMap) -> Self {
        self.evidence = Some(evidence);
        self
    }

    #[must_use]
    pub fn with_opinions(mut self, opinions: Vec<Opinion>) -> Self {
        self.opinions = Some(opinions);
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorEvent>) -> Self {
        self.errors = Some(errors);
        self
    }

    #[must_use]
    pub fn with_aborted(mut self, aborted: bool) -> Self {
        self.aborted = Some(aborted);
        self
    }

    #[must_use]
    pub fn with_rubric(mut self, rubric: Vec<RubricDimension>) -> Self {
        self.rubric = Some(rubric);
        self
    }

    #[must_use]
    pub fn with_report(mut self, report: impl Into<String>) -> Self {
        self.report = Some(report.into());
        self
    }
}

/// Failures a stage can surface to the scheduler.
///
/// The scheduler converts these into error events on the state rather than
/// letting them abort the run.
#[derive(Debug, Error, Diagnostic)]
pub enum StageError {
    #[error("missing required input: {what}")]
    #[diagnostic(
        code(tribunal::stage::missing_input),
        help("an upstream stage should have populated this channel")
    )]
    MissingInput { what: &'static str },

    #[error("collaborator failure")]
    #[diagnostic(code(tribunal::stage::collaborator))]
    Collaborator(#[from] CollaboratorError),

    #[error("serialization failure")]
    #[diagnostic(code(tribunal::stage::serde))]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_partial_updates_nothing() {
        let partial = StagePartial::new();
        assert!(partial.evidence.is_none());
        assert!(partial.opinions.is_none());
        assert!(partial.errors.is_none());
        assert!(partial.aborted.is_none());
        assert!(partial.rubric.is_none());
        assert!(partial.report.is_none());
    }
}
