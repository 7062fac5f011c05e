mod finalizer;
mod result;

pub use finalizer::Finalizer;
pub use result::AggregatedResult;
