use super::Reducer;
use crate::stage::StagePartial;
use crate::state::AuditState;

/// Appends reviewer opinions to the opinions channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddOpinions;

impl Reducer for AddOpinions {
    fn apply(&self, state: &mut AuditState, update: &StagePartial) {
        if let Some(opinions) = &update.opinions {
            state.opinions.extend(opinions.iter().cloned());
        }
    }
}

/// Appends error events to the errors channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddErrors;

impl Reducer for AddErrors {
    fn apply(&self, state: &mut AuditState, update: &StagePartial) {
        if let Some(errors) = &update.errors {
            state.errors.extend(errors.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorEvent, Fault};
    use crate::opinion::Opinion;
    use crate::state::{AuditState, RunInputs};
    use crate::types::Persona;
    use std::path::PathBuf;

    fn state() -> AuditState {
        AuditState::new(RunInputs {
            repo_url: "https://example.com/repo.git".into(),
            doc_path: PathBuf::from("spec.pdf"),
        })
    }

    #[test]
    fn opinions_append_in_order() {
        let mut state = state();
        let first = StagePartial::new()
            .with_opinions(vec![Opinion::new(Persona::Critic, "c1", 2, "broken")]);
        let second = StagePartial::new()
            .with_opinions(vec![Opinion::new(Persona::Advocate, "c1", 4, "decent")]);
        AddOpinions.apply(&mut state, &first);
        AddOpinions.apply(&mut state, &second);
        assert_eq!(state.opinions.len(), 2);
        assert_eq!(state.opinions[0].persona, Persona::Critic);
    }

    #[test]
    fn errors_append() {
        let mut state = state();
        let update = StagePartial::new()
            .with_errors(vec![ErrorEvent::stage("aggregator", 1, Fault::msg("boom"))]);
        AddErrors.apply(&mut state, &update);
        AddErrors.apply(&mut state, &update);
        assert_eq!(state.errors.len(), 2);
    }
}
