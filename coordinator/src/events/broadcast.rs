use log::debug;
use tokio::sync::broadcast;

use super::{EventSink, ModelEvent, SinkErr};

/// Fans events out to every live subscriber through a tokio broadcast channel.
///
/// Delivery is at-most-once per subscriber: a subscriber lagging more than `capacity`
/// events behind loses the oldest ones. Emitting with no subscriber is not an error,
/// the event is simply not observed by anyone.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<ModelEvent>,
}

impl BroadcastSink {
    /// Creates a new `BroadcastSink`.
    ///
    /// # Arguments
    /// * `capacity` - How many events a subscriber may lag behind.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Registers a new subscriber, it observes every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    async fn emit(&self, event: ModelEvent) -> Result<(), SinkErr> {
        match self.tx.send(event) {
            Ok(subscribers) => debug!(subscribers = subscribers; "event published"),
            Err(_) => debug!("event published without subscribers"),
        }

        Ok(())
    }
}
