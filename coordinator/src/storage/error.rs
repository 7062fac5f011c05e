use std::{
    error::Error,
    fmt::{self, Display},
};

use super::Round;

/// The specific result type for lookups spanning several keys of the `ParameterStore`.
pub type Result<T> = std::result::Result<T, StoreErr>;

/// Error returned when a bundle a multi-key operation depends on isn't staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreErr {
    /// The participant has no bundle for the requested round.
    NotStaged { node: String, round: Round },
    /// The participant has to be carried forward but has no bundle in the previous round.
    NoPreviousBundle { node: String },
}

impl Display for StoreErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStaged { node, round } => {
                write!(f, "parameter for node {node} not staged for round {round}")
            }
            Self::NoPreviousBundle { node } => {
                write!(f, "parameter for node {node} not found in previous round")
            }
        }
    }
}

impl Error for StoreErr {}
