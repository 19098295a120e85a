use super::Reducer;
use crate::stage::StagePartial;
use crate::state::AuditState;

/// Union-merges evidence maps: key sets union, entry lists concatenate on
/// collision. Concurrent collectors can never drop each other's findings.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEvidence;

impl Reducer for MergeEvidence {
    fn apply(&self, state: &mut AuditState, update: &StagePartial) {
        if let Some(evidence) = &update.evidence {
            state.evidence.merge(evidence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{CollectorId, Evidence, EvidenceMap};
    use crate::state::{AuditState, RunInputs};
    use std::path::PathBuf;

    fn state() -> AuditState {
        AuditState::new(RunInputs {
            repo_url: "https://example.com/repo.git".into(),
            doc_path: PathBuf::from("spec.pdf"),
        })
    }

    #[test]
    fn merges_without_dropping() {
        let mut state = state();
        state.evidence.push(
            CollectorId::Repo,
            Evidence::new("manifest", true, "Cargo.toml", "present", 0.9),
        );

        let update = StagePartial::new().with_evidence(EvidenceMap::singleton(
            CollectorId::Repo,
            vec![Evidence::new("tests", false, "tests/", "absent", 0.8)],
        ));
        MergeEvidence.apply(&mut state, &update);

        assert_eq!(state.evidence.get(CollectorId::Repo).len(), 2);
    }

    #[test]
    fn no_update_is_noop() {
        let mut state = state();
        MergeEvidence.apply(&mut state, &StagePartial::new());
        assert!(state.evidence.is_empty());
    }
}
