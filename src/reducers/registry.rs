//! Channel-to-reducer routing applied at every wave barrier.

use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::instrument;

use super::{AddErrors, AddOpinions, FoldAborted, MergeEvidence, Reducer, ReducerError, SetReport, SetRubric};
use crate::stage::StagePartial;
use crate::state::AuditState;
use crate::types::ChannelType;

/// Whether a partial carries a real update for the given channel.
///
/// Empty collections count as "no update": a stage returning
/// `Some(vec![])` must not dirty the channel or wake its reducers.
fn channel_guard(channel: ChannelType, update: &StagePartial) -> bool {
    match channel {
        ChannelType::Evidence => update.evidence.as_ref().is_some_and(|e| !e.is_empty()),
        ChannelType::Opinions => update.opinions.as_ref().is_some_and(|o| !o.is_empty()),
        ChannelType::Errors => update.errors.as_ref().is_some_and(|e| !e.is_empty()),
        ChannelType::Aborted => update.aborted.is_some(),
        ChannelType::Rubric => update.rubric.as_ref().is_some_and(|r| !r.is_empty()),
        ChannelType::Report => update.report.is_some(),
    }
}

/// Maps each state channel to the reducers that fold updates into it.
#[derive(Clone)]
pub struct ReducerRegistry {
    reducer_map: FxHashMap<ChannelType, Vec<Arc<dyn Reducer>>>,
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        Self::new()
            .with_reducer(ChannelType::Evidence, Arc::new(MergeEvidence))
            .with_reducer(ChannelType::Opinions, Arc::new(AddOpinions))
            .with_reducer(ChannelType::Errors, Arc::new(AddErrors))
            .with_reducer(ChannelType::Aborted, Arc::new(FoldAborted))
            .with_reducer(ChannelType::Rubric, Arc::new(SetRubric))
            .with_reducer(ChannelType::Report, Arc::new(SetReport))
    }
}

impl ReducerRegistry {
    pub fn new() -> Self {
        Self {
            reducer_map: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, channel: ChannelType, reducer: Arc<dyn Reducer>) {
        self.reducer_map.entry(channel).or_default().push(reducer);
    }

    #[must_use]
    pub fn with_reducer(mut self, channel: ChannelType, reducer: Arc<dyn Reducer>) -> Self {
        self.register(channel, reducer);
        self
    }

    /// Apply one partial to one channel.
    ///
    /// Returns `Ok(true)` if the channel was updated, `Ok(false)` if the
    /// guard skipped an empty update.
    #[instrument(skip(self, state, update), fields(channel = %channel), err)]
    pub fn try_update(
        &self,
        channel: ChannelType,
        state: &mut AuditState,
        update: &StagePartial,
    ) -> Result<bool, ReducerError> {
        if !channel_guard(channel, update) {
            return Ok(false);
        }
        let reducers = self
            .reducer_map
            .get(&channel)
            .ok_or(ReducerError::UnknownChannel(channel))?;
        for reducer in reducers {
            reducer.apply(state, update);
        }
        Ok(true)
    }

    /// Apply one partial across every channel; returns the channels that
    /// actually changed.
    #[instrument(skip(self, state, update), err)]
    pub fn apply_all(
        &self,
        state: &mut AuditState,
        update: &StagePartial,
    ) -> Result<Vec<ChannelType>, ReducerError> {
        let mut updated = Vec::new();
        for channel in ChannelType::ALL {
            if self.try_update(channel, state, update)? {
                updated.push(channel);
            }
        }
        Ok(updated)
    }
}
