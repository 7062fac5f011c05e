use serde::{Deserialize, Serialize};

use crate::storage::{LstmTensors, Round};

/// The global model of a round, tagged with the round's leader.
///
/// Serializes with the exact field names `nodeId`, `Wi`, `Wf`, `Wo`, `Wc`, `bi`, `bf`,
/// `bo`, `bc` and `round`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(flatten)]
    pub tensors: LstmTensors,
    pub round: Round,
}

impl AggregatedResult {
    /// Creates a new `AggregatedResult`.
    ///
    /// # Arguments
    /// * `leader` - The participant designated for the round.
    /// * `tensors` - The averaged tensors.
    /// * `round` - The aggregated round.
    pub fn new<S: Into<String>>(leader: S, tensors: LstmTensors, round: Round) -> Self {
        Self {
            node_id: leader.into(),
            tensors,
            round,
        }
    }
}
