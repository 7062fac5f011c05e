use std::{error::Error, fmt, io};

use crate::{
    aggregation::AggregationErr,
    events::SinkErr,
    ledger::LedgerErr,
    storage::{Round, ShapeErr},
};

/// The coordinator's result type.
pub type Result<T> = std::result::Result<T, CoordinatorErr>;

/// Every failure an entry point of the coordinator can report.
#[derive(Debug)]
pub enum CoordinatorErr {
    /// The uploading node isn't part of the participant set.
    UnknownParticipant { node: String },
    /// A bundle breaks its own shape invariants or doesn't match the round's shape.
    ShapeMismatch { node: String, source: ShapeErr },
    /// A participant had to be carried forward but has no previous round bundle.
    MissingPreviousRound { node: String },
    /// The aggregated result couldn't be serialized.
    Marshal(serde_json::Error),
    /// The ledger refused the aggregated result. Nothing was announced nor purged.
    Persistence(LedgerErr),
    /// The event sink refused the update. The result stays persisted, staged state is kept.
    EventEmission { node: String, source: SinkErr },
    /// Another aggregation of the same round is still running.
    RoundInProgress(Round),
    /// The ledger holds no aggregated result for the round.
    ResultNotFound(Round),
    /// An invocation argument couldn't be decoded.
    InvalidArgument { name: &'static str, reason: String },
    /// The invoked function doesn't exist.
    UnknownFunction(String),
    /// A lower level failure, surfaced verbatim.
    Operational(String),
}

impl fmt::Display for CoordinatorErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownParticipant { node } => {
                write!(f, "node {node} is not a known participant")
            }
            Self::ShapeMismatch { node, source } => write!(f, "node {node}: {source}"),
            Self::MissingPreviousRound { node } => {
                write!(f, "parameter for node {node} not found in previous round")
            }
            Self::Marshal(e) => write!(f, "failed to marshal result: {e}"),
            Self::Persistence(e) => write!(f, "failed to put state: {e}"),
            Self::EventEmission { node, source } => {
                write!(f, "failed to send global model to node {node}: {source}")
            }
            Self::RoundInProgress(round) => {
                write!(f, "aggregation for round {round} already in progress")
            }
            Self::ResultNotFound(round) => write!(f, "no aggregated result for round {round}"),
            Self::InvalidArgument { name, reason } => {
                write!(f, "invalid argument {name}: {reason}")
            }
            Self::UnknownFunction(name) => write!(f, "unknown function {name}"),
            Self::Operational(msg) => f.write_str(msg),
        }
    }
}

impl Error for CoordinatorErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ShapeMismatch { source, .. } => Some(source),
            Self::Marshal(e) => Some(e),
            Self::Persistence(e) => Some(e),
            Self::EventEmission { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<AggregationErr> for CoordinatorErr {
    fn from(value: AggregationErr) -> Self {
        match value {
            AggregationErr::Shape { node, source } => Self::ShapeMismatch { node, source },
            AggregationErr::NoContributions => {
                Self::Operational(AggregationErr::NoContributions.to_string())
            }
        }
    }
}

impl From<LedgerErr> for CoordinatorErr {
    fn from(value: LedgerErr) -> Self {
        Self::Persistence(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<CoordinatorErr> for io::Error {
    fn from(value: CoordinatorErr) -> Self {
        io::Error::other(value)
    }
}
