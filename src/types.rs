//! Stage and channel identifiers for the audit workflow graph.
//!
//! Stage identity is a closed enum: the audit topology is fixed at compile
//! time, so there is no string-keyed registry to typo against. `Start` and
//! `End` are virtual endpoints used only for edge declarations; they never
//! execute.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reviewer persona participating in deliberation.
///
/// Each persona evaluates every matching rubric criterion through its own
/// lens. The pragmatist acts as tie-breaker and is weighted double during
/// synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// Adversarial lens: hunts for defects and missing work.
    Critic,
    /// Charitable lens: recognises effort and partial implementations.
    Advocate,
    /// Practical lens: assesses real-world viability. Weighted double.
    Pragmatist,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Critic, Persona::Advocate, Persona::Pragmatist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Critic => "critic",
            Persona::Advocate => "advocate",
            Persona::Pragmatist => "pragmatist",
        }
    }

    /// Human-readable label used in reports.
    pub fn lens(&self) -> &'static str {
        match self {
            Persona::Critic => "Critic (Critical Lens)",
            Persona::Advocate => "Advocate (Charitable Lens)",
            Persona::Pragmatist => "Pragmatist (Practical Lens)",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a stage in the audit graph.
///
/// `Start` and `End` are virtual structural endpoints: they can appear in
/// edge declarations but are never registered or executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Start,
    End,
    /// Loads the rubric and seeds the run.
    Context,
    /// Collects evidence from the repository under audit.
    RepoCollector,
    /// Collects evidence from the accompanying document.
    DocCollector,
    /// Fan-in checkpoint that gates deliberation on evidence quality.
    Aggregator,
    /// One reviewer stage per persona, run as a concurrent wave.
    Reviewer(Persona),
    /// Resolves opinions into verdicts and renders the report.
    Synthesis,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Start => "start",
            StageKind::End => "end",
            StageKind::Context => "context",
            StageKind::RepoCollector => "repo_collector",
            StageKind::DocCollector => "doc_collector",
            StageKind::Aggregator => "aggregator",
            StageKind::Reviewer(Persona::Critic) => "reviewer:critic",
            StageKind::Reviewer(Persona::Advocate) => "reviewer:advocate",
            StageKind::Reviewer(Persona::Pragmatist) => "reviewer:pragmatist",
            StageKind::Synthesis => "synthesis",
        }
    }

    /// Virtual endpoints are topology markers only; the scheduler never runs them.
    pub fn is_virtual(&self) -> bool {
        matches!(self, StageKind::Start | StageKind::End)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State channels that reducers can update at a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Evidence,
    Opinions,
    Errors,
    Aborted,
    Rubric,
    Report,
}

impl ChannelType {
    pub const ALL: [ChannelType; 6] = [
        ChannelType::Evidence,
        ChannelType::Opinions,
        ChannelType::Errors,
        ChannelType::Aborted,
        ChannelType::Rubric,
        ChannelType::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Evidence => "evidence",
            ChannelType::Opinions => "opinions",
            ChannelType::Errors => "errors",
            ChannelType::Aborted => "aborted",
            ChannelType::Rubric => "rubric",
            ChannelType::Report => "report",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
