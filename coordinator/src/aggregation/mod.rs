mod error;
mod mean;

pub use error::AggregationErr;
pub use mean::mean;
