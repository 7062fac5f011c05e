use std::sync::Arc;

use log::info;

use super::Coordinator;
use crate::{
    config::{ConfigErr, CoordinatorConfig},
    election::{Clock, LeaderSelector, SystemClock},
    events::EventSink,
    finalization::Finalizer,
    ledger::{Ledger, MemoryLedger},
    storage::ParameterStore,
    synchronization::PollingBarrier,
};

/// Builds `Coordinator`s out of a `CoordinatorConfig`.
///
/// Unless told otherwise, results go to a `MemoryLedger` and leaders are picked from the
/// system clock.
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
    ledger: Option<Arc<dyn Ledger>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoordinatorBuilder {
    /// Creates a new `CoordinatorBuilder`.
    ///
    /// # Arguments
    /// * `config` - The configuration of the coordinators to build.
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            ledger: None,
            clock: None,
        }
    }

    /// Sets the ledger aggregated results are persisted to.
    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Sets the time source of the leader selection.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds a new `Coordinator` publishing its events through `sink`.
    ///
    /// # Arguments
    /// * `sink` - Where `GlobalModelUpdate` events are published.
    ///
    /// # Returns
    /// The coordinator or a `ConfigErr` if the configuration is invalid.
    pub fn build<E: EventSink>(self, sink: E) -> Result<Coordinator<E>, ConfigErr> {
        self.config.validate()?;

        let CoordinatorConfig {
            participants,
            aggregation_timeout,
            check_interval,
        } = self.config;

        info!("coordinating {participants:?}");
        info!("waiting up to {aggregation_timeout:?}, checking every {check_interval:?}");

        let ledger = self.ledger.unwrap_or_else(|| Arc::new(MemoryLedger::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = ParameterStore::new();

        Ok(Coordinator::new(
            Arc::from(participants),
            PollingBarrier::new(check_interval, aggregation_timeout),
            LeaderSelector::new(clock),
            Finalizer::new(ledger, sink, store.clone()),
            store,
        ))
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BroadcastSink;

    #[test]
    fn test_default_builder_uses_default_participants() {
        let coordinator = CoordinatorBuilder::default()
            .build(BroadcastSink::new(1))
            .unwrap();

        assert_eq!(coordinator.participants(), ["soft", "web", "hard"]);
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let config = CoordinatorConfig {
            participants: vec!["soft".into(), "soft".into()],
            ..Default::default()
        };

        let err = CoordinatorBuilder::new(config)
            .build(BroadcastSink::new(1))
            .err()
            .unwrap();

        assert!(matches!(err, ConfigErr::Invalid(_)));
    }
}
