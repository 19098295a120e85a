//! Reducers fold stage partials into the audit state at wave barriers.
//!
//! Each state channel has a fixed merge policy: evidence is a union merge,
//! opinions and errors append, the abort flag folds with logical OR, and the
//! rubric and report channels are last-writer-wins. The
//! [`registry::ReducerRegistry`] routes each populated channel of a partial
//! to its reducers and skips empty updates entirely.

mod append;
mod control;
mod merge_evidence;
pub mod registry;

pub use append::{AddErrors, AddOpinions};
pub use control::{FoldAborted, SetReport, SetRubric};
pub use merge_evidence::MergeEvidence;
pub use registry::ReducerRegistry;

use crate::stage::StagePartial;
use crate::state::AuditState;
use crate::types::ChannelType;

/// A merge policy for one state channel.
///
/// Reducers are infallible by construction: they only run when the registry's
/// channel guard has confirmed the partial carries a real update.
pub trait Reducer: Send + Sync {
    fn apply(&self, state: &mut AuditState, update: &StagePartial);
}

/// Errors surfaced by the reducer registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReducerError {
    UnknownChannel(ChannelType),
}

impl std::fmt::Display for ReducerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReducerError::UnknownChannel(channel) => {
                write!(f, "no reducer registered for channel {channel}")
            }
        }
    }
}

impl std::error::Error for ReducerError {}
