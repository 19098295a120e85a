//! Rubric model: the criteria reviewers score and the per-persona guidance
//! attached to each criterion.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::types::Persona;

/// Which collected artifact a rubric dimension targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Repo,
    Doc,
}

/// Per-persona instructions for evaluating one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaGuidance {
    pub critic: String,
    pub advocate: String,
    pub pragmatist: String,
}

impl PersonaGuidance {
    pub fn for_persona(&self, persona: Persona) -> &str {
        match persona {
            Persona::Critic => &self.critic,
            Persona::Advocate => &self.advocate,
            Persona::Pragmatist => &self.pragmatist,
        }
    }
}

/// One scored criterion of the audit rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricDimension {
    pub id: String,
    pub name: String,
    pub target_artifact: Artifact,
    /// What the reviewers are asked to establish.
    pub instruction: String,
    pub guidance: PersonaGuidance,
}

#[derive(Debug, Deserialize)]
struct RubricFile {
    dimensions: Vec<RubricDimension>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum RubricError {
    #[error("failed to read rubric file")]
    #[diagnostic(
        code(tribunal::rubric::io),
        help("check that the rubric path exists and is readable")
    )]
    Io(#[from] std::io::Error),

    #[error("failed to parse rubric file")]
    #[diagnostic(
        code(tribunal::rubric::parse),
        help("the rubric must be a JSON object with a `dimensions` array")
    )]
    Parse(#[from] serde_json::Error),
}

/// Load rubric dimensions from a JSON file.
pub fn load_rubric(path: &Path) -> Result<Vec<RubricDimension>, RubricError> {
    let raw = std::fs::read_to_string(path)?;
    let file: RubricFile = serde_json::from_str(&raw)?;
    Ok(file.dimensions)
}

/// Built-in two-dimension rubric used when no rubric file is available.
///
/// Keeps a degraded run meaningful: completeness and structure can be judged
/// from repository evidence alone.
pub fn default_rubric() -> Vec<RubricDimension> {
    vec![
        RubricDimension {
            id: "implementation_completeness".into(),
            name: "Implementation Completeness".into(),
            target_artifact: Artifact::Repo,
            instruction: "Assess whether the promised functionality is actually implemented."
                .into(),
            guidance: PersonaGuidance {
                critic: "Identify missing or broken implementations".into(),
                advocate: "Recognize effort and partial implementations".into(),
                pragmatist: "Assess practical viability".into(),
            },
        },
        RubricDimension {
            id: "architecture_quality".into(),
            name: "Architecture Quality".into(),
            target_artifact: Artifact::Repo,
            instruction: "Assess the structure and organisation of the codebase.".into(),
            guidance: PersonaGuidance {
                critic: "Flag monolithic or broken structure".into(),
                advocate: "Appreciate deliberate design decisions".into(),
                pragmatist: "Evaluate maintainability".into(),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rubric_targets_repo() {
        let rubric = default_rubric();
        assert_eq!(rubric.len(), 2);
        assert!(rubric.iter().all(|d| d.target_artifact == Artifact::Repo));
    }

    #[test]
    fn parses_rubric_json() {
        let raw = serde_json::json!({
            "dimensions": [{
                "id": "security_posture",
                "name": "Security Posture",
                "target_artifact": "repo",
                "instruction": "Look for injection risks.",
                "guidance": {
                    "critic": "Hunt for unsanitized inputs",
                    "advocate": "Credit defensive checks",
                    "pragmatist": "Judge exposure in practice"
                }
            }]
        });
        let file: RubricFile = serde_json::from_value(raw).expect("parse");
        assert_eq!(file.dimensions[0].id, "security_posture");
        assert_eq!(file.dimensions[0].target_artifact, Artifact::Repo);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_rubric(Path::new("/nonexistent/rubric.json")).unwrap_err();
        assert!(matches!(err, RubricError::Io(_)));
    }
}
