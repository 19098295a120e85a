//! Stage implementations for the audit workflow.

use async_trait::async_trait;
use futures_util::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;

use crate::collaborators::{DocInspector, RepoInspector, ReviewerBackend};
use crate::errors::Fault;
use crate::evidence::{CollectorId, EvidenceMap};
use crate::opinion::Opinion;
use crate::rubric::{default_rubric, load_rubric, Artifact};
use crate::stage::{Stage, StageContext, StageError, StagePartial};
use crate::state::StateSnapshot;
use crate::synthesis;
use crate::types::Persona;

/// Seeds the run: loads the rubric, falling back to the built-in default
/// when the rubric file is missing, unreadable, or empty.
pub struct ContextStage {
    rubric_path: PathBuf,
}

impl ContextStage {
    pub fn new(rubric_path: PathBuf) -> Self {
        Self { rubric_path }
    }
}

#[async_trait]
impl Stage for ContextStage {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: StageContext,
    ) -> Result<StagePartial, StageError> {
        match load_rubric(&self.rubric_path) {
            Ok(rubric) if !rubric.is_empty() => {
                ctx.emit(
                    "rubric",
                    &format!("loaded {} dimensions from rubric file", rubric.len()),
                );
                Ok(StagePartial::new().with_rubric(rubric))
            }
            Ok(_) => {
                ctx.emit("rubric", "rubric file has no dimensions; using default rubric");
                Ok(StagePartial::new()
                    .with_rubric(default_rubric())
                    .with_errors(vec![ctx.error_event(Fault::msg(
                        "rubric file contained no dimensions; default rubric substituted",
                    ))]))
            }
            Err(err) => {
                ctx.emit("rubric", "rubric unavailable; using default rubric");
                Ok(StagePartial::new()
                    .with_rubric(default_rubric())
                    .with_errors(vec![ctx.error_event(
                        Fault::msg("rubric could not be loaded; default rubric substituted")
                            .with_cause(Fault::msg(err.to_string())),
                    )]))
            }
        }
    }
}

/// Collects repository evidence through a [`RepoInspector`].
///
/// A collection failure yields an error record and no evidence; whether
/// that is fatal is the aggregator's call.
pub struct RepoCollectorStage {
    inspector: Arc<dyn RepoInspector>,
}

impl RepoCollectorStage {
    pub fn new(inspector: Arc<dyn RepoInspector>) -> Self {
        Self { inspector }
    }
}

#[async_trait]
impl Stage for RepoCollectorStage {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: StageContext,
    ) -> Result<StagePartial, StageError> {
        match self.inspector.collect(&snapshot.inputs.repo_url).await {
            Ok(items) => {
                ctx.emit("collect", &format!("collected {} repository findings", items.len()));
                Ok(StagePartial::new()
                    .with_evidence(EvidenceMap::singleton(CollectorId::Repo, items)))
            }
            Err(err) => {
                ctx.emit("collect", "repository inspection failed");
                Ok(StagePartial::new().with_errors(vec![ctx
                    .error_event(
                        Fault::msg("repository inspection failed")
                            .with_cause(Fault::msg(err.to_string())),
                    )
                    .with_tag("collector")]))
            }
        }
    }
}

/// Collects document evidence through a [`DocInspector`].
///
/// Document failures are never fatal; deliberation can proceed on
/// repository evidence alone.
pub struct DocCollectorStage {
    inspector: Arc<dyn DocInspector>,
}

impl DocCollectorStage {
    pub fn new(inspector: Arc<dyn DocInspector>) -> Self {
        Self { inspector }
    }
}

#[async_trait]
impl Stage for DocCollectorStage {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: StageContext,
    ) -> Result<StagePartial, StageError> {
        match self.inspector.collect(&snapshot.inputs.doc_path).await {
            Ok(items) => {
                ctx.emit("collect", &format!("collected {} document findings", items.len()));
                Ok(StagePartial::new()
                    .with_evidence(EvidenceMap::singleton(CollectorId::Doc, items)))
            }
            Err(err) => {
                ctx.emit("collect", "document inspection failed; continuing without it");
                Ok(StagePartial::new().with_errors(vec![ctx
                    .error_event(
                        Fault::msg("document inspection failed")
                            .with_cause(Fault::msg(err.to_string())),
                    )
                    .with_tag("collector")]))
            }
        }
    }
}

/// Fan-in checkpoint after the collectors.
///
/// Raises the abort flag when no repository evidence exists: without it
/// there is nothing for reviewers to judge, so the run routes straight to
/// synthesis for a degraded report.
pub struct AggregatorStage;

#[async_trait]
impl Stage for AggregatorStage {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: StageContext,
    ) -> Result<StagePartial, StageError> {
        let repo_count = snapshot.evidence.get(CollectorId::Repo).len();
        let doc_count = snapshot.evidence.get(CollectorId::Doc).len();
        ctx.emit(
            "aggregate",
            &format!("{repo_count} repository findings, {doc_count} document findings"),
        );

        if repo_count == 0 {
            return Ok(StagePartial::new().with_aborted(true).with_errors(vec![ctx
                .error_event(Fault::msg(
                    "no repository evidence collected; deliberation aborted",
                ))
                .with_tag("fatal")]));
        }
        Ok(StagePartial::new())
    }
}

/// One persona's deliberation over every repository-targeted criterion.
///
/// Criteria are reviewed concurrently. A failed review degrades to the
/// neutral opinion instead of failing the stage.
pub struct ReviewerStage {
    persona: Persona,
    backend: Arc<dyn ReviewerBackend>,
}

impl ReviewerStage {
    pub fn new(persona: Persona, backend: Arc<dyn ReviewerBackend>) -> Self {
        Self { persona, backend }
    }
}

#[async_trait]
impl Stage for ReviewerStage {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: StageContext,
    ) -> Result<StagePartial, StageError> {
        let dimensions: Vec<_> = snapshot
            .rubric
            .iter()
            .filter(|d| d.target_artifact == Artifact::Repo)
            .collect();
        ctx.emit(
            "review",
            &format!("{} reviewing {} criteria", self.persona, dimensions.len()),
        );

        let reviews = join_all(dimensions.iter().map(|dim| async {
            let result = self
                .backend
                .review(self.persona, dim, &snapshot.evidence)
                .await;
            (*dim, result)
        }))
        .await;

        let mut opinions = Vec::with_capacity(reviews.len());
        let mut errors = Vec::new();
        for (dim, result) in reviews {
            match result {
                Ok(opinion) => {
                    // Re-sanitize at the trust boundary; backends are not
                    // trusted to stay in band.
                    opinions.push(
                        Opinion::new(
                            self.persona,
                            dim.id.clone(),
                            i64::from(opinion.score),
                            opinion.argument,
                        )
                        .with_cited_evidence(opinion.cited_evidence),
                    );
                }
                Err(err) => {
                    opinions.push(Opinion::neutral(
                        self.persona,
                        dim.id.clone(),
                        "Review unavailable; neutral default applied.",
                    ));
                    errors.push(
                        ctx.error_event(
                            Fault::msg(format!("review of `{}` failed", dim.id))
                                .with_cause(Fault::msg(err.to_string())),
                        )
                        .with_tag("degraded"),
                    );
                }
            }
        }

        let mut partial = StagePartial::new().with_opinions(opinions);
        if !errors.is_empty() {
            partial = partial.with_errors(errors);
        }
        Ok(partial)
    }
}

/// Resolves opinions into verdicts and renders the final report.
///
/// Always emits a report, even on aborted runs: a degraded report with
/// neutral verdicts beats no report.
pub struct SynthesisStage;

#[async_trait]
impl Stage for SynthesisStage {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: StageContext,
    ) -> Result<StagePartial, StageError> {
        let outcome = synthesis::synthesize(&snapshot.rubric, &snapshot.opinions);
        ctx.emit(
            "synthesize",
            &format!(
                "{} verdicts, overall {:.2}",
                outcome.verdicts.len(),
                outcome.overall
            ),
        );
        let report = synthesis::render_report(&snapshot, &outcome, chrono::Utc::now());
        Ok(StagePartial::new().with_report(report))
    }
}
