mod broadcast;
mod error;
mod event;
mod sink;

pub use broadcast::BroadcastSink;
pub use error::SinkErr;
pub use event::{GLOBAL_MODEL_UPDATE, ModelEvent};
pub use sink::EventSink;
