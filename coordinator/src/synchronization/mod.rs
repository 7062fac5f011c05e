mod barrier;
mod fallback;

pub use barrier::{BarrierOutcome, PollingBarrier};
pub use fallback::FallbackResolver;
