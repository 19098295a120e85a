//! Deterministic verdict synthesis and report rendering.
//!
//! Synthesis is pure arithmetic over collected opinions: no external
//! collaborator is consulted, so the same opinions always produce the same
//! verdicts. The report renderer takes its timestamp as an argument for the
//! same reason.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use crate::evidence::CollectorId;
use crate::opinion::{Opinion, NEUTRAL_SCORE};
use crate::rubric::{Artifact, RubricDimension};
use crate::state::StateSnapshot;
use crate::types::Persona;

/// Argument phrases that mark a finding as severe enough to cap the verdict.
pub const SEVERITY_KEYWORDS: [&str; 5] = [
    "security",
    "injection",
    "sanitization",
    "command execution",
    "unsafe",
];

/// Final synthesized judgement for one rubric criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub criterion_id: String,
    pub criterion_name: String,
    pub score: u8,
    /// How the persona scores were resolved into the final score.
    pub resolution: String,
}

/// All verdicts plus the overall score.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutcome {
    pub verdicts: Vec<Verdict>,
    /// Mean of verdict scores; `0.0` when there were no criteria to judge.
    pub overall: f64,
}

impl SynthesisOutcome {
    /// Explanatory note for the zero-criteria sentinel.
    pub fn overall_note(&self) -> Option<&'static str> {
        if self.verdicts.is_empty() {
            Some("No criteria were eligible for judgement; the overall score is a sentinel, not an assessment.")
        } else {
            None
        }
    }
}

/// Synthesize verdicts for every repository-targeted rubric criterion.
///
/// Criteria are processed in rubric order, so output order is stable.
pub fn synthesize(rubric: &[RubricDimension], opinions: &[Opinion]) -> SynthesisOutcome {
    let verdicts: Vec<Verdict> = rubric
        .iter()
        .filter(|dim| dim.target_artifact == Artifact::Repo)
        .map(|dim| synthesize_criterion(dim, opinions))
        .collect();

    let overall = if verdicts.is_empty() {
        0.0
    } else {
        let sum: f64 = verdicts.iter().map(|v| f64::from(v.score)).sum();
        sum / verdicts.len() as f64
    };

    SynthesisOutcome { verdicts, overall }
}

struct PersonaView<'a> {
    score: u8,
    argument: &'a str,
}

fn persona_view<'a>(
    opinions: &'a [Opinion],
    criterion_id: &str,
    persona: Persona,
) -> PersonaView<'a> {
    opinions
        .iter()
        .find(|o| o.criterion_id == criterion_id && o.persona == persona)
        .map(|o| PersonaView {
            score: o.score,
            argument: o.argument.as_str(),
        })
        .unwrap_or(PersonaView {
            score: NEUTRAL_SCORE,
            argument: "",
        })
}

/// Resolve one criterion's persona opinions into a verdict.
///
/// A missing persona opinion participates as the neutral score. If the
/// critic scores at or below 2 and its argument names a severity keyword,
/// the verdict is capped at 3 regardless of the other lenses. Otherwise the
/// verdict is the rounded weighted mean with the pragmatist counted twice.
fn synthesize_criterion(dim: &RubricDimension, opinions: &[Opinion]) -> Verdict {
    let critic = persona_view(opinions, &dim.id, Persona::Critic);
    let advocate = persona_view(opinions, &dim.id, Persona::Advocate);
    let pragmatist = persona_view(opinions, &dim.id, Persona::Pragmatist);

    let scores = [critic.score, advocate.score, pragmatist.score];
    let high = scores.iter().copied().max().unwrap_or(NEUTRAL_SCORE);
    let low = scores.iter().copied().min().unwrap_or(NEUTRAL_SCORE);
    let variance = high - low;

    let critic_argument = critic.argument.to_lowercase();
    let severe = critic.score <= 2
        && SEVERITY_KEYWORDS
            .iter()
            .any(|kw| critic_argument.contains(kw));

    let (score, resolution) = if severe {
        let capped = high.min(3);
        (
            capped,
            format!(
                "Severity override applied: the critic flagged a severe finding at score {}, capping the verdict at {} despite more favourable lenses.",
                critic.score, capped
            ),
        )
    } else {
        let weighted = (f64::from(critic.score)
            + f64::from(advocate.score)
            + 2.0 * f64::from(pragmatist.score))
            / 4.0;
        // Ties round to even, so a 4.5 settles at 4 and a 2.5 at 2.
        let rounded = weighted.round_ties_even().clamp(1.0, 5.0) as u8;
        let resolution = if variance > 2 {
            format!(
                "Significant disagreement (variance: {variance}). Critic: {}, Advocate: {}, Pragmatist: {}. The pragmatic assessment is weighted double in synthesis.",
                critic.score, advocate.score, pragmatist.score
            )
        } else {
            format!("Reviewers reached consensus. Scores ranged from {low} to {high}.")
        };
        (rounded, resolution)
    };

    Verdict {
        criterion_id: dim.id.clone(),
        criterion_name: dim.name.clone(),
        score,
        resolution,
    }
}

fn snippet(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}...")
    }
}

/// Render the final markdown report.
///
/// Pure with respect to its inputs: the generation timestamp is a parameter,
/// so re-rendering the same snapshot reproduces the same document.
pub fn render_report(
    snapshot: &StateSnapshot,
    outcome: &SynthesisOutcome,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Tribunal Audit Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "## Executive Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Repository: {}", snapshot.inputs.repo_url);
    let _ = writeln!(out, "- Document: {}", snapshot.inputs.doc_path.display());
    let _ = writeln!(
        out,
        "- Date: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "- Overall Score: {:.2}/5.0", outcome.overall);
    if let Some(note) = outcome.overall_note() {
        let _ = writeln!(out, "- Note: {note}");
    }
    if snapshot.aborted {
        let _ = writeln!(
            out,
            "- Notice: the run was aborted before deliberation; verdicts below reflect neutral defaults."
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Evidence");
    let _ = writeln!(out);
    for collector in CollectorId::ALL {
        let entries = snapshot.evidence.get(collector);
        let _ = writeln!(out, "### {}", collector.title());
        let _ = writeln!(out);
        if entries.is_empty() {
            let _ = writeln!(out, "No evidence collected.");
            let _ = writeln!(out);
            continue;
        }
        for item in entries {
            let _ = writeln!(out, "- **Goal:** {}", item.goal);
            let _ = writeln!(out, "  - Found: {}", if item.found { "yes" } else { "no" });
            let _ = writeln!(out, "  - Location: {}", item.location);
            let _ = writeln!(
                out,
                "  - Content: {}",
                item.content.as_deref().unwrap_or("N/A")
            );
            let _ = writeln!(out, "  - Rationale: {}", item.rationale);
            let _ = writeln!(out, "  - Confidence: {:.0}%", item.confidence * 100.0);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Final Verdicts");
    let _ = writeln!(out);
    if outcome.verdicts.is_empty() {
        let _ = writeln!(out, "No criteria were judged.");
        let _ = writeln!(out);
    }
    for verdict in &outcome.verdicts {
        let _ = writeln!(out, "### {} — {}/5", verdict.criterion_name, verdict.score);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", verdict.resolution);
        let _ = writeln!(out);
        for persona in Persona::ALL {
            let view = persona_view(&snapshot.opinions, &verdict.criterion_id, persona);
            let argument = if view.argument.is_empty() {
                "No opinion recorded; neutral default applied.".to_string()
            } else {
                snippet(view.argument, 200)
            };
            let _ = writeln!(out, "- {} scored {}: {argument}", persona.lens(), view.score);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Dialectical Analysis");
    let _ = writeln!(out);
    for verdict in &outcome.verdicts {
        let _ = writeln!(out, "### {}", verdict.criterion_name);
        let _ = writeln!(out);
        for persona in Persona::ALL {
            let view = persona_view(&snapshot.opinions, &verdict.criterion_id, persona);
            let argument = if view.argument.is_empty() {
                "no opinion recorded".to_string()
            } else {
                view.argument.to_string()
            };
            let _ = writeln!(out, "- **{}** ({}): {argument}", persona.lens(), view.score);
        }
        let _ = writeln!(out, "- **Resolution:** {}", verdict.resolution);
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Remediation Plan");
    let _ = writeln!(out);
    let mut remediation_items = 0;
    for verdict in &outcome.verdicts {
        if verdict.score >= 4 {
            continue;
        }
        remediation_items += 1;
        let critic = persona_view(&snapshot.opinions, &verdict.criterion_id, Persona::Critic);
        let lowered = critic.argument.to_lowercase();
        let action = if lowered.contains("missing") {
            "Implement missing components".to_string()
        } else if lowered.contains("security") {
            "Address security vulnerabilities".to_string()
        } else if critic.argument.is_empty() {
            format!("Review {} in depth", verdict.criterion_name)
        } else {
            snippet(critic.argument, 100)
        };
        let _ = writeln!(
            out,
            "- **{}** (scored {}): {action}",
            verdict.criterion_name, verdict.score
        );
    }
    if remediation_items == 0 {
        let _ = writeln!(out, "No remediation required; all verdicts scored 4 or above.");
    }
    let _ = writeln!(out);

    if !snapshot.errors.is_empty() {
        let _ = writeln!(out, "## Errors");
        let _ = writeln!(out);
        for event in &snapshot.errors {
            let _ = writeln!(out, "- [{}] {}", event.scope.label(), event.error.message);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Methodology");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Evidence was collected concurrently from the repository and its accompanying \
         document, then reviewed by three independent personas (critical, charitable, \
         and practical lenses). Verdicts are synthesized deterministically: the \
         pragmatist's score is weighted double, and severe findings flagged by the \
         critic cap the verdict regardless of the other lenses."
    );

    out
}

/// Convenience wrapper combining synthesis and rendering.
pub fn synthesize_and_render(snapshot: &StateSnapshot, generated_at: DateTime<Utc>) -> String {
    let outcome = synthesize(&snapshot.rubric, &snapshot.opinions);
    render_report(snapshot, &outcome, generated_at)
}
