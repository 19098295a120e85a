//! Built-in collaborator implementations.
//!
//! These keep the engine useful without network credentials: repository
//! inspection shells out to the git CLI, document inspection reads the file
//! directly, and the reviewer derives scores from the evidence pool.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::collaborators::{CollaboratorError, DocInspector, RepoInspector, ReviewerBackend};
use crate::evidence::{Evidence, EvidenceMap};
use crate::opinion::Opinion;
use crate::rubric::RubricDimension;
use crate::types::Persona;

/// Clones the repository with a shallow `git clone` into a scratch
/// directory and inspects the working tree.
pub struct GitRepoInspector {
    timeout: Duration,
}

impl GitRepoInspector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RepoInspector for GitRepoInspector {
    async fn collect(&self, repo_url: &str) -> Result<Vec<Evidence>, CollaboratorError> {
        let scratch = tempfile::tempdir()?;
        let checkout = scratch.path().join("checkout");

        let clone = tokio::process::Command::new("git")
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg(repo_url)
            .arg(&checkout)
            .output();

        let output = tokio::time::timeout(self.timeout, clone)
            .await
            .map_err(|_| CollaboratorError::Timeout {
                seconds: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(CollaboratorError::CommandFailed {
                program: "git",
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        // Scratch directory is dropped (and removed) when this returns.
        Ok(inspect_tree(&checkout))
    }
}

/// Shallow working-tree scan for the structural signals reviewers care
/// about. Deterministic: entries are visited in sorted order.
fn inspect_tree(root: &Path) -> Vec<Evidence> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();

    let has = |predicate: &dyn Fn(&str) -> bool| names.iter().any(|n| predicate(n));

    let manifest = has(&|n| {
        matches!(
            n,
            "Cargo.toml" | "package.json" | "pyproject.toml" | "go.mod" | "pom.xml"
        )
    });
    let tests = has(&|n| n == "tests" || n == "test" || n.starts_with("test_"));
    let docs = has(&|n| n.to_lowercase().starts_with("readme") || n == "docs");
    let ci = has(&|n| n == ".github" || n == ".gitlab-ci.yml" || n == ".circleci");

    vec![
        Evidence::new(
            "Project Manifest",
            manifest,
            root.display().to_string(),
            if manifest {
                "a recognised build manifest is present at the repository root"
            } else {
                "no recognised build manifest at the repository root"
            },
            0.9,
        ),
        Evidence::new(
            "Automated Tests",
            tests,
            root.display().to_string(),
            if tests {
                "a test directory is present"
            } else {
                "no test directory found"
            },
            0.7,
        ),
        Evidence::new(
            "Documentation",
            docs,
            root.display().to_string(),
            if docs {
                "a readme or docs directory is present"
            } else {
                "no readme or docs directory found"
            },
            0.8,
        ),
        Evidence::new(
            "Continuous Integration",
            ci,
            root.display().to_string(),
            if ci {
                "a CI configuration is present"
            } else {
                "no CI configuration found"
            },
            0.6,
        ),
    ]
}

/// Reads the accompanying document and scans it for the concepts it is
/// expected to cover.
pub struct TextDocInspector {
    concepts: Vec<String>,
}

impl TextDocInspector {
    pub fn new(concepts: Vec<String>) -> Self {
        Self { concepts }
    }
}

impl Default for TextDocInspector {
    fn default() -> Self {
        Self::new(
            ["architecture", "testing", "security", "deployment"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }
}

#[async_trait]
impl DocInspector for TextDocInspector {
    async fn collect(&self, doc_path: &Path) -> Result<Vec<Evidence>, CollaboratorError> {
        let bytes = tokio::fs::read(doc_path).await?;
        // Lossy scan is good enough for keyword presence, PDFs included.
        let text = String::from_utf8_lossy(&bytes).to_lowercase();
        let location = doc_path.display().to_string();

        let mut findings = vec![Evidence::new(
            "Document Present",
            true,
            location.clone(),
            format!("document read, {} bytes", bytes.len()),
            1.0,
        )];
        for concept in &self.concepts {
            let found = text.contains(&concept.to_lowercase());
            findings.push(Evidence::new(
                format!("Covers: {concept}"),
                found,
                location.clone(),
                if found {
                    format!("the document mentions `{concept}`")
                } else {
                    format!("no mention of `{concept}` in the document")
                },
                0.5,
            ));
        }
        Ok(findings)
    }
}

/// Deterministic reviewer derived from the evidence pool.
///
/// The base score scales with the fraction of goals found and the mean
/// collector confidence; each persona applies its lens as a fixed bias.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceReviewer;

#[async_trait]
impl ReviewerBackend for EvidenceReviewer {
    async fn review(
        &self,
        persona: Persona,
        dimension: &RubricDimension,
        evidence: &EvidenceMap,
    ) -> Result<Opinion, CollaboratorError> {
        let pool: Vec<_> = evidence.values().collect();
        if pool.is_empty() {
            return Ok(Opinion::neutral(
                persona,
                dimension.id.clone(),
                "No evidence available to review; neutral default applied.",
            ));
        }

        let found = pool.iter().filter(|e| e.found).count() as f64;
        let ratio = found / pool.len() as f64;
        let mean_confidence =
            pool.iter().map(|e| e.confidence).sum::<f64>() / pool.len() as f64;

        let bias = match persona {
            Persona::Critic => -0.5,
            Persona::Advocate => 0.5,
            Persona::Pragmatist => 0.0,
        };
        // The advocate bias can push a perfect pool past 5; clamp into the
        // valid band so the bias never wraps a top score to the neutral
        // default downstream.
        let raw = ((1.0 + 4.0 * ratio * mean_confidence + bias).round() as i64).clamp(1, 5);

        let cited: Vec<String> = pool
            .iter()
            .filter(|e| e.found)
            .map(|e| e.goal.clone())
            .collect();
        let argument = format!(
            "{}: {:.0}% of evidence goals were satisfied (mean confidence {:.0}%). {}.",
            dimension.name,
            ratio * 100.0,
            mean_confidence * 100.0,
            dimension.guidance.for_persona(persona)
        );

        Ok(Opinion::new(persona, dimension.id.clone(), raw, argument)
            .with_cited_evidence(cited))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::CollectorId;
    use crate::rubric::default_rubric;

    #[tokio::test]
    async fn reviewer_is_neutral_without_evidence() {
        let dim = &default_rubric()[0];
        let opinion = EvidenceReviewer
            .review(Persona::Critic, dim, &EvidenceMap::new())
            .await
            .expect("review");
        assert_eq!(opinion.score, 3);
    }

    #[tokio::test]
    async fn reviewer_biases_by_persona() {
        let evidence = EvidenceMap::singleton(
            CollectorId::Repo,
            vec![
                Evidence::new("a", true, "x", "r", 1.0),
                Evidence::new("b", true, "y", "r", 1.0),
            ],
        );
        let dim = &default_rubric()[0];
        let critic = EvidenceReviewer
            .review(Persona::Critic, dim, &evidence)
            .await
            .expect("review");
        let advocate = EvidenceReviewer
            .review(Persona::Advocate, dim, &evidence)
            .await
            .expect("review");
        assert!(critic.score <= advocate.score);
        assert!(!advocate.cited_evidence.is_empty());
    }

    #[tokio::test]
    async fn perfect_evidence_scores_top_marks_for_the_advocate() {
        let evidence = EvidenceMap::singleton(
            CollectorId::Repo,
            vec![
                Evidence::new("a", true, "x", "r", 1.0),
                Evidence::new("b", true, "y", "r", 1.0),
            ],
        );
        let dim = &default_rubric()[0];
        let advocate = EvidenceReviewer
            .review(Persona::Advocate, dim, &evidence)
            .await
            .expect("review");
        assert_eq!(advocate.score, 5);
    }

    #[tokio::test]
    async fn doc_inspector_flags_concepts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("spec.md");
        std::fs::write(&path, "We discuss testing and security here.").expect("write");

        let findings = TextDocInspector::default()
            .collect(&path)
            .await
            .expect("collect");
        assert!(findings[0].found);
        let testing = findings
            .iter()
            .find(|e| e.goal == "Covers: testing")
            .expect("testing finding");
        assert!(testing.found);
        let deployment = findings
            .iter()
            .find(|e| e.goal == "Covers: deployment")
            .expect("deployment finding");
        assert!(!deployment.found);
    }
}
