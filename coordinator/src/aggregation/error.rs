use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::storage::ShapeErr;

/// Error returned when a set of bundles can't be averaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationErr {
    NoContributions,
    /// The bundle of `node` doesn't match the shape set by the first contribution.
    Shape { node: String, source: ShapeErr },
}

impl Display for AggregationErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoContributions => f.write_str("no contributions to aggregate"),
            Self::Shape { node, source } => write!(f, "node {node}: {source}"),
        }
    }
}

impl Error for AggregationErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Shape { source, .. } => Some(source),
            Self::NoContributions => None,
        }
    }
}
