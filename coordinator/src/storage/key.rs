use std::fmt::{self, Display};

use super::Round;

/// Identifies one participant's contribution for one round.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StagingKey {
    pub node_id: String,
    pub round: Round,
}

impl StagingKey {
    /// Creates a new `StagingKey`.
    ///
    /// # Arguments
    /// * `node_id` - The participant owning the bundle.
    /// * `round` - The round the bundle was contributed for.
    pub fn new<S: Into<String>>(node_id: S, round: Round) -> Self {
        Self {
            node_id: node_id.into(),
            round,
        }
    }
}

impl Display for StagingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.node_id, self.round)
    }
}
