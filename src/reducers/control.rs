use super::Reducer;
use crate::stage::StagePartial;
use crate::state::AuditState;

/// Folds the abort flag with logical OR. Once raised it stays raised; no
/// merge order can clear it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FoldAborted;

impl Reducer for FoldAborted {
    fn apply(&self, state: &mut AuditState, update: &StagePartial) {
        if let Some(aborted) = update.aborted {
            state.aborted |= aborted;
        }
    }
}

/// Installs the rubric, last writer wins. Only the context stage writes this
/// channel, so the policy never actually races.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetRubric;

impl Reducer for SetRubric {
    fn apply(&self, state: &mut AuditState, update: &StagePartial) {
        if let Some(rubric) = &update.rubric {
            state.rubric = rubric.clone();
        }
    }
}

/// Installs the rendered report, last writer wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetReport;

impl Reducer for SetReport {
    fn apply(&self, state: &mut AuditState, update: &StagePartial) {
        if let Some(report) = &update.report {
            state.report = Some(report.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AuditState, RunInputs};
    use std::path::PathBuf;

    fn state() -> AuditState {
        AuditState::new(RunInputs {
            repo_url: "https://example.com/repo.git".into(),
            doc_path: PathBuf::from("spec.pdf"),
        })
    }

    #[test]
    fn aborted_is_monotone() {
        let mut state = state();
        FoldAborted.apply(&mut state, &StagePartial::new().with_aborted(true));
        assert!(state.aborted);
        FoldAborted.apply(&mut state, &StagePartial::new().with_aborted(false));
        assert!(state.aborted);
    }

    #[test]
    fn report_last_writer_wins() {
        let mut state = state();
        SetReport.apply(&mut state, &StagePartial::new().with_report("first"));
        SetReport.apply(&mut state, &StagePartial::new().with_report("second"));
        assert_eq!(state.report.as_deref(), Some("second"));
    }
}
