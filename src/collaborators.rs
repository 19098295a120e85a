//! External collaborator seams: repository inspection, document inspection,
//! and persona review.
//!
//! The orchestration core depends only on these traits; production wiring
//! plugs in the built-in implementations from [`crate::providers`], and tests
//! substitute deterministic stand-ins.

use async_trait::async_trait;
use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

use crate::evidence::{Evidence, EvidenceMap};
use crate::opinion::Opinion;
use crate::rubric::RubricDimension;
use crate::types::Persona;

/// Collects evidence from the repository under audit.
#[async_trait]
pub trait RepoInspector: Send + Sync {
    async fn collect(&self, repo_url: &str) -> Result<Vec<Evidence>, CollaboratorError>;
}

/// Collects evidence from the accompanying document.
#[async_trait]
pub trait DocInspector: Send + Sync {
    async fn collect(&self, doc_path: &Path) -> Result<Vec<Evidence>, CollaboratorError>;
}

/// Produces one persona's opinion on one rubric dimension.
#[async_trait]
pub trait ReviewerBackend: Send + Sync {
    async fn review(
        &self,
        persona: Persona,
        dimension: &RubricDimension,
        evidence: &EvidenceMap,
    ) -> Result<Opinion, CollaboratorError>;
}

/// Failures crossing the collaborator boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum CollaboratorError {
    #[error("{which} unavailable: {message}")]
    #[diagnostic(code(tribunal::collaborator::unavailable))]
    Unavailable {
        which: &'static str,
        message: String,
    },

    #[error("{program} exited with status {status}")]
    #[diagnostic(
        code(tribunal::collaborator::command_failed),
        help("stderr is attached; check the command output")
    )]
    CommandFailed {
        program: &'static str,
        status: String,
        stderr: String,
    },

    #[error("collaborator I/O failure")]
    #[diagnostic(code(tribunal::collaborator::io))]
    Io(#[from] std::io::Error),

    #[error("collaborator timed out after {seconds}s")]
    #[diagnostic(
        code(tribunal::collaborator::timeout),
        help("raise the timeout or check connectivity to the remote")
    )]
    Timeout { seconds: u64 },
}
