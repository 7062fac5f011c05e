use super::{ModelEvent, SinkErr};

/// Publishes coordinator events to the participants.
///
/// A sink is single-shot: an event handed over successfully is never replayed.
#[allow(unused)]
#[trait_variant::make(EventSink: Send)]
pub trait EventSinkTemplate: Sync {
    /// Should publish `event` to all of its recipients.
    ///
    /// # Arguments
    /// * `event` - The event to publish.
    ///
    /// # Returns
    /// A `SinkErr` if the event couldn't be handed over.
    async fn emit(&self, event: ModelEvent) -> Result<(), SinkErr>;
}
