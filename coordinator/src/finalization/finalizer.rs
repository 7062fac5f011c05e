use std::sync::Arc;

use log::{error, info};
use serde::ser::Error as _;

use super::AggregatedResult;
use crate::{
    error::{CoordinatorErr, Result},
    events::{EventSink, ModelEvent},
    ledger::{Ledger, result_key},
    storage::ParameterStore,
};

/// Closes a round: persist, announce, release.
///
/// A result holding a non-finite element can't be marshalled and leaves everything as it
/// was. Persistence precedes the event and the purge follows it. A failed write leaves both
/// the event and the staged bundles untouched, a failed emission keeps the persisted
/// result but skips the purge so a retry still observes the staged bundles.
pub struct Finalizer<E: EventSink> {
    ledger: Arc<dyn Ledger>,
    sink: E,
    store: ParameterStore,
}

impl<E: EventSink> Finalizer<E> {
    /// Creates a new `Finalizer`.
    ///
    /// # Arguments
    /// * `ledger` - Where aggregated results are persisted.
    /// * `sink` - Where the update event is published.
    /// * `store` - The staging area to release rounds from.
    pub fn new(ledger: Arc<dyn Ledger>, sink: E, store: ParameterStore) -> Self {
        Self {
            ledger,
            sink,
            store,
        }
    }

    /// The ledger results are persisted to.
    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    /// Finalizes the round of `result`.
    ///
    /// # Arguments
    /// * `result` - The aggregated result of the round.
    /// * `recipients` - The participant set the update is announced to.
    ///
    /// # Returns
    /// The serialized result, exactly as persisted and announced.
    pub async fn finalize(
        &self,
        result: &AggregatedResult,
        recipients: Arc<[String]>,
    ) -> Result<String> {
        let round = result.round;

        // serde_json writes non-finite floats as `null`.
        if let Some((tensor, value)) = result.tensors.non_finite() {
            error!(round = round; "aggregated {tensor} holds {value}");
            let e = serde_json::Error::custom(format!("unsupported value: {value} in {tensor}"));
            return Err(CoordinatorErr::Marshal(e));
        }

        let payload = serde_json::to_string(result).map_err(CoordinatorErr::Marshal)?;

        let key = result_key(round);
        if let Err(e) = self.ledger.put_state(&key, payload.as_bytes()) {
            error!(round = round; "failed to persist {key}: {e}");
            return Err(CoordinatorErr::Persistence(e));
        }

        let event = ModelEvent::global_model_update(Arc::from(payload.as_str()), recipients);
        if let Err(source) = self.sink.emit(event).await {
            error!(round = round; "failed to announce the global model: {source}");
            return Err(CoordinatorErr::EventEmission {
                node: result.node_id.clone(),
                source,
            });
        }

        let released = self.store.purge_round(round);
        info!(round = round, released = released; "round finalized under {key}");

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::{
        events::SinkErr,
        ledger::{LedgerErr, MemoryLedger},
        storage::{LstmTensors, StagingKey, TensorBundle},
    };

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<ModelEvent>>);

    impl EventSink for RecordingSink {
        async fn emit(&self, event: ModelEvent) -> std::result::Result<(), SinkErr> {
            self.0.lock().push(event);
            Ok(())
        }
    }

    struct RefusingSink;

    impl EventSink for RefusingSink {
        async fn emit(&self, _: ModelEvent) -> std::result::Result<(), SinkErr> {
            Err(SinkErr::new("sink closed"))
        }
    }

    struct BrokenLedger;

    impl Ledger for BrokenLedger {
        fn put_state(&self, _: &str, _: &[u8]) -> std::result::Result<(), LedgerErr> {
            Err(LedgerErr::new("read-only"))
        }

        fn get_state(&self, _: &str) -> std::result::Result<Option<Vec<u8>>, LedgerErr> {
            Ok(None)
        }
    }

    fn recipients() -> Arc<[String]> {
        Arc::from(vec!["soft".to_string(), "web".to_string()])
    }

    fn staged_store(round: u32) -> ParameterStore {
        let store = ParameterStore::new();
        store.put(TensorBundle::new("soft", LstmTensors::default(), round));
        store.put(TensorBundle::new("web", LstmTensors::default(), round));
        store.put(TensorBundle::new("web", LstmTensors::default(), round - 1));
        store
    }

    fn result(round: u32) -> AggregatedResult {
        AggregatedResult::new("web", LstmTensors::default(), round)
    }

    #[tokio::test]
    async fn test_persists_announces_then_purges() {
        let ledger = Arc::new(MemoryLedger::new());
        let store = staged_store(3);
        let finalizer = Finalizer::new(ledger.clone(), RecordingSink::default(), store.clone());

        let payload = finalizer.finalize(&result(3), recipients()).await.unwrap();

        let persisted = ledger.get_state("RESULT_Aggregated_3").unwrap().unwrap();
        assert_eq!(persisted, payload.as_bytes());

        let events = finalizer.sink.0.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "GlobalModelUpdate");
        assert_eq!(&*events[0].payload, payload);

        assert!(!store.exists(&StagingKey::new("soft", 3)));
        assert!(store.exists(&StagingKey::new("web", 2)));
    }

    #[tokio::test]
    async fn test_failed_persistence_keeps_everything() {
        let store = staged_store(3);
        let finalizer = Finalizer::new(
            Arc::new(BrokenLedger),
            RecordingSink::default(),
            store.clone(),
        );

        let err = finalizer.finalize(&result(3), recipients()).await.unwrap_err();

        assert!(matches!(err, CoordinatorErr::Persistence(_)));
        assert!(err.to_string().starts_with("failed to put state"));
        assert!(finalizer.sink.0.lock().is_empty());
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_non_finite_result_is_not_marshalled() {
        let ledger = Arc::new(MemoryLedger::new());
        let store = staged_store(3);
        let finalizer = Finalizer::new(ledger.clone(), RecordingSink::default(), store.clone());

        let tensors = LstmTensors {
            wi: vec![vec![f64::INFINITY]],
            bi: vec![0.0],
            ..Default::default()
        };
        let result = AggregatedResult::new("web", tensors, 3);

        let err = finalizer.finalize(&result, recipients()).await.unwrap_err();

        assert!(matches!(err, CoordinatorErr::Marshal(_)));
        assert_eq!(
            err.to_string(),
            "failed to marshal result: unsupported value: inf in Wi"
        );
        assert!(ledger.keys().is_empty());
        assert!(finalizer.sink.0.lock().is_empty());
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_emission_keeps_result_and_staged_bundles() {
        let ledger = Arc::new(MemoryLedger::new());
        let store = staged_store(3);
        let finalizer = Finalizer::new(ledger.clone(), RefusingSink, store.clone());

        let err = finalizer.finalize(&result(3), recipients()).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to send global model to node web: sink closed"
        );
        assert!(ledger.get_state("RESULT_Aggregated_3").unwrap().is_some());
        assert_eq!(store.len(), 3);
    }
}
