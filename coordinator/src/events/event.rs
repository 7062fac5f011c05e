use std::sync::Arc;

/// The only event the coordinator emits, once per finalized round.
pub const GLOBAL_MODEL_UPDATE: &str = "GlobalModelUpdate";

/// A new global model announced to the participant set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEvent {
    pub name: &'static str,
    /// The serialized aggregated result, identical to what was persisted.
    pub payload: Arc<str>,
    pub recipients: Arc<[String]>,
}

impl ModelEvent {
    /// Creates a new `GlobalModelUpdate` event.
    ///
    /// # Arguments
    /// * `payload` - The serialized aggregated result.
    /// * `recipients` - The participant set.
    pub fn global_model_update(payload: Arc<str>, recipients: Arc<[String]>) -> Self {
        Self {
            name: GLOBAL_MODEL_UPDATE,
            payload,
            recipients,
        }
    }
}
