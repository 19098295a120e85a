#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use tribunal::evidence::{CollectorId, Evidence, EvidenceMap};
use tribunal::opinion::Opinion;
use tribunal::rubric::{Artifact, PersonaGuidance, RubricDimension};
use tribunal::stage::{Stage, StageContext, StageError, StagePartial};
use tribunal::state::{AuditState, RunInputs, StateSnapshot};
use tribunal::types::Persona;

pub fn base_inputs() -> RunInputs {
    RunInputs {
        repo_url: "https://example.com/audited.git".into(),
        doc_path: PathBuf::from("/tmp/audited-spec.pdf"),
    }
}

pub fn base_state() -> AuditState {
    AuditState::new(base_inputs())
}

pub fn sample_evidence(goal: &str, found: bool) -> Evidence {
    Evidence::new(goal, found, "src/", "observed during the scan", 0.8)
}

pub fn repo_evidence(goal: &str, found: bool) -> EvidenceMap {
    EvidenceMap::singleton(CollectorId::Repo, vec![sample_evidence(goal, found)])
}

pub fn sample_opinion(persona: Persona, criterion: &str, score: i64) -> Opinion {
    Opinion::new(persona, criterion, score, "sample argument")
}

pub fn sample_dimension(id: &str) -> RubricDimension {
    RubricDimension {
        id: id.into(),
        name: format!("Dimension {id}"),
        target_artifact: Artifact::Repo,
        instruction: "Judge this dimension.".into(),
        guidance: PersonaGuidance {
            critic: "look for flaws".into(),
            advocate: "look for strengths".into(),
            pragmatist: "look for viability".into(),
        },
    }
}

/// Stage that always returns a clone of a fixed partial.
pub struct StaticStage {
    pub partial: StagePartial,
}

impl StaticStage {
    pub fn evidence(map: EvidenceMap) -> Self {
        Self {
            partial: StagePartial::new().with_evidence(map),
        }
    }

    pub fn empty() -> Self {
        Self {
            partial: StagePartial::new(),
        }
    }
}

#[async_trait]
impl Stage for StaticStage {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: StageContext,
    ) -> Result<StagePartial, StageError> {
        Ok(self.partial.clone())
    }
}

/// Stage that always fails, for degradation tests.
pub struct FailingStage;

#[async_trait]
impl Stage for FailingStage {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: StageContext,
    ) -> Result<StagePartial, StageError> {
        Err(StageError::MissingInput {
            what: "deliberately absent",
        })
    }
}

/// Stage that sleeps before returning its partial, for concurrency tests.
pub struct DelayedStage {
    pub delay: Duration,
    pub partial: StagePartial,
}

#[async_trait]
impl Stage for DelayedStage {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: StageContext,
    ) -> Result<StagePartial, StageError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.partial.clone())
    }
}
