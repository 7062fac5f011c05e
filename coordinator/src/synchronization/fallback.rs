use log::warn;

use crate::{
    error::{CoordinatorErr, Result},
    storage::{ParameterStore, Round, StoreErr},
};

/// Completes a round that timed out with the previous round's bundles.
///
/// Keeps the denominator of the mean equal to the size of the participant set.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResolver;

impl FallbackResolver {
    /// Carries every participant still missing from `round` forward from `round - 1`.
    ///
    /// All or nothing: if any missing participant has no previous bundle the store is left
    /// as it was. Participants that uploaded in the meantime keep their own bundle.
    ///
    /// # Arguments
    /// * `store` - The staging area.
    /// * `participants` - The participant set, in order.
    /// * `round` - The round to complete.
    ///
    /// # Returns
    /// The participants that were carried forward, or `MissingPreviousRound` naming the
    /// first participant without a previous bundle.
    pub fn resolve(
        &self,
        store: &ParameterStore,
        participants: &[String],
        round: Round,
    ) -> Result<Vec<String>> {
        let carried = store
            .carry_forward(participants, round)
            .map_err(|e| match e {
                StoreErr::NoPreviousBundle { node } => {
                    CoordinatorErr::MissingPreviousRound { node }
                }
                other => CoordinatorErr::Operational(other.to_string()),
            })?;

        for node in &carried {
            warn!("node {node} missed round {round}, reusing its previous bundle");
        }

        Ok(carried)
    }
}
