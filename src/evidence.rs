//! Evidence records produced by collector stages.
//!
//! Evidence accumulates in an [`EvidenceMap`] keyed by the collector that
//! produced it. The merge is a pure map union with list concatenation on key
//! collision: commutative and associative up to the ordering of entries
//! within a key, so concurrent collectors can never drop each other's
//! contributions.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an evidence-producing collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorId {
    Repo,
    Doc,
}

impl CollectorId {
    pub const ALL: [CollectorId; 2] = [CollectorId::Repo, CollectorId::Doc];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorId::Repo => "repo",
            CollectorId::Doc => "doc",
        }
    }

    /// Section heading used in reports.
    pub fn title(&self) -> &'static str {
        match self {
            CollectorId::Repo => "Repository Collector",
            CollectorId::Doc => "Document Collector",
        }
    }
}

impl fmt::Display for CollectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single piece of evidence: what was looked for, whether it was found,
/// and why the finding is believed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// What the collector was trying to establish.
    pub goal: String,
    pub found: bool,
    /// Extracted content supporting the finding, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Where the evidence was (or was expected to be) located.
    pub location: String,
    pub rationale: String,
    /// Collector confidence in the finding, clamped to `[0.0, 1.0]`.
    pub confidence: f64,
}

impl Evidence {
    pub fn new(
        goal: impl Into<String>,
        found: bool,
        location: impl Into<String>,
        rationale: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            goal: goal.into(),
            found,
            content: None,
            location: location.into(),
            rationale: rationale.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Evidence grouped by producing collector.
///
/// # Merge semantics
///
/// [`EvidenceMap::merge`] unions the key sets and concatenates the entry
/// lists on collision. No entry is ever dropped or overwritten; the only
/// merge-order effect is the ordering of entries within a key, which carries
/// no meaning. Use [`EvidenceMap::canonical`] when comparing maps built in
/// different orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMap {
    entries: FxHashMap<CollectorId, Vec<Evidence>>,
}

impl EvidenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map with a single collector's evidence.
    pub fn singleton(collector: CollectorId, items: Vec<Evidence>) -> Self {
        let mut map = Self::new();
        map.insert(collector, items);
        map
    }

    /// Append `items` under `collector`, creating the key if absent.
    pub fn insert(&mut self, collector: CollectorId, items: Vec<Evidence>) {
        self.entries.entry(collector).or_default().extend(items);
    }

    pub fn push(&mut self, collector: CollectorId, item: Evidence) {
        self.entries.entry(collector).or_default().push(item);
    }

    /// Entries for a collector; empty slice if it produced nothing.
    pub fn get(&self, collector: CollectorId) -> &[Evidence] {
        self.entries.get(&collector).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Union the other map into this one, concatenating on key collision.
    pub fn merge(&mut self, other: &EvidenceMap) {
        for (collector, items) in &other.entries {
            self.entries
                .entry(*collector)
                .or_default()
                .extend(items.iter().cloned());
        }
    }

    /// Number of collectors that contributed at least one entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of evidence entries across all collectors.
    pub fn total(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Iterate all entries in fixed collector order (repo first, then doc).
    pub fn values(&self) -> impl Iterator<Item = &Evidence> {
        CollectorId::ALL
            .iter()
            .flat_map(|collector| self.get(*collector).iter())
    }

    /// Copy with each collector's entries sorted into a canonical order.
    ///
    /// Entry order within a key is merge-order dependent and meaningless;
    /// canonical form makes maps comparable regardless of merge order.
    pub fn canonical(&self) -> Self {
        let mut entries = self.entries.clone();
        for items in entries.values_mut() {
            items.sort_by(|a, b| {
                a.goal
                    .cmp(&b.goal)
                    .then_with(|| a.location.cmp(&b.location))
                    .then_with(|| a.rationale.cmp(&b.rationale))
                    .then_with(|| a.found.cmp(&b.found))
            });
        }
        Self { entries }
    }
}
