//! Audit state: the channels stages read from and reducers write to.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::ErrorEvent;
use crate::evidence::EvidenceMap;
use crate::opinion::Opinion;
use crate::rubric::RubricDimension;

/// Inputs naming the artifacts under audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInputs {
    pub repo_url: String,
    pub doc_path: PathBuf,
}

/// Full mutable state of an audit run.
///
/// Stages never touch this directly: they receive an immutable
/// [`StateSnapshot`] and return partial updates that reducers fold in at the
/// wave barrier.
#[derive(Debug, Clone)]
pub struct AuditState {
    pub inputs: RunInputs,
    pub rubric: Vec<RubricDimension>,
    pub evidence: EvidenceMap,
    pub opinions: Vec<Opinion>,
    pub errors: Vec<ErrorEvent>,
    /// Set once evidence quality rules out meaningful deliberation.
    /// Monotone: reducers can raise it, never clear it.
    pub aborted: bool,
    pub report: Option<String>,
}

impl AuditState {
    pub fn new(inputs: RunInputs) -> Self {
        Self {
            inputs,
            rubric: Vec::new(),
            evidence: EvidenceMap::new(),
            opinions: Vec::new(),
            errors: Vec::new(),
            aborted: false,
            report: None,
        }
    }

    /// Immutable copy handed to stages and routing predicates.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            inputs: self.inputs.clone(),
            rubric: self.rubric.clone(),
            evidence: self.evidence.clone(),
            opinions: self.opinions.clone(),
            errors: self.errors.clone(),
            aborted: self.aborted,
            report: self.report.clone(),
        }
    }
}

/// Point-in-time view of [`AuditState`] as of the last barrier.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub inputs: RunInputs,
    pub rubric: Vec<RubricDimension>,
    pub evidence: EvidenceMap,
    pub opinions: Vec<Opinion>,
    pub errors: Vec<ErrorEvent>,
    pub aborted: bool,
    pub report: Option<String>,
}

impl StateSnapshot {
    /// Whether any error event carries the given tag.
    pub fn has_error_tagged(&self, tag: &str) -> bool {
        self.errors.iter().any(|e| e.tags.iter().any(|t| t == tag))
    }
}
