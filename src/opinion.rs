//! Reviewer opinions and score sanitation.

use crate::types::Persona;
use serde::{Deserialize, Serialize};

/// Default applied whenever a reviewer score is missing or malformed.
pub const NEUTRAL_SCORE: u8 = 3;

/// Map a raw score into the valid `[1, 5]` band.
///
/// Out-of-range values are not clamped to the nearest bound: an invalid
/// score says nothing trustworthy about the artifact, so it degrades to the
/// neutral default instead.
pub fn sanitize_score(raw: i64) -> u8 {
    if (1..=5).contains(&raw) {
        raw as u8
    } else {
        NEUTRAL_SCORE
    }
}

/// A persona's scored judgement of one rubric criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub persona: Persona,
    pub criterion_id: String,
    /// Always within `[1, 5]`; enforced at construction.
    pub score: u8,
    pub argument: String,
    /// Goals of the evidence entries this opinion cites.
    #[serde(default)]
    pub cited_evidence: Vec<String>,
}

impl Opinion {
    /// Build an opinion, sanitizing the raw score at the boundary.
    pub fn new(
        persona: Persona,
        criterion_id: impl Into<String>,
        raw_score: i64,
        argument: impl Into<String>,
    ) -> Self {
        Self {
            persona,
            criterion_id: criterion_id.into(),
            score: sanitize_score(raw_score),
            argument: argument.into(),
            cited_evidence: Vec::new(),
        }
    }

    /// Neutral-default opinion recorded when a review could not be produced.
    pub fn neutral(
        persona: Persona,
        criterion_id: impl Into<String>,
        argument: impl Into<String>,
    ) -> Self {
        Self {
            persona,
            criterion_id: criterion_id.into(),
            score: NEUTRAL_SCORE,
            argument: argument.into(),
            cited_evidence: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cited_evidence(mut self, cited: Vec<String>) -> Self {
        self.cited_evidence = cited;
        self
    }
}
