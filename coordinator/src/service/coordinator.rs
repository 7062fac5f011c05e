use std::{collections::HashSet, sync::Arc};

use log::{debug, info};
use parking_lot::Mutex;

use crate::{
    aggregation,
    election::LeaderSelector,
    error::{CoordinatorErr, Result},
    events::EventSink,
    finalization::{AggregatedResult, Finalizer},
    ledger::result_key,
    storage::{ParameterStore, Round, TensorBundle},
    synchronization::{BarrierOutcome, FallbackResolver, PollingBarrier},
};

/// The reply of the `CheckWorking` liveness probe.
pub const CHECK_WORKING_REPLY: &str = "chaincode is working";

/// Hosts the round-scoped aggregation of a fixed participant set.
///
/// Uploads never suspend. An aggregation suspends only while its barrier waits and runs
/// exclusively for its round, aggregations of different rounds proceed concurrently.
pub struct Coordinator<E: EventSink> {
    participants: Arc<[String]>,
    store: ParameterStore,
    barrier: PollingBarrier,
    fallback: FallbackResolver,
    leader: LeaderSelector,
    finalizer: Finalizer<E>,
    in_flight: Mutex<HashSet<Round>>,
}

impl<E: EventSink> Coordinator<E> {
    /// Creates a new `Coordinator`, use `CoordinatorBuilder` for validated construction.
    pub(super) fn new(
        participants: Arc<[String]>,
        barrier: PollingBarrier,
        leader: LeaderSelector,
        finalizer: Finalizer<E>,
        store: ParameterStore,
    ) -> Self {
        Self {
            participants,
            store,
            barrier,
            fallback: FallbackResolver,
            leader,
            finalizer,
            in_flight: Mutex::default(),
        }
    }

    /// The participant set, in its configured order.
    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    /// A handle to the staging area.
    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// Stages a participant's contribution, replacing a previous one for the same round.
    ///
    /// # Arguments
    /// * `bundle` - The contribution.
    ///
    /// # Returns
    /// `UnknownParticipant` or `ShapeMismatch` if the bundle is refused.
    pub fn upload_parameter(&self, bundle: TensorBundle) -> Result<()> {
        if !self.participants.contains(&bundle.node_id) {
            return Err(CoordinatorErr::UnknownParticipant {
                node: bundle.node_id,
            });
        }

        let shape = bundle
            .tensors
            .shape()
            .map_err(|source| CoordinatorErr::ShapeMismatch {
                node: bundle.node_id.clone(),
                source,
            })?;

        let key = bundle.key();
        let replaced = self.store.put(bundle).is_some();
        debug!(replaced = replaced; "staged {key} with shape {shape}");

        Ok(())
    }

    /// Aggregates `round` and finalizes it.
    ///
    /// Waits for the round to fill up, carries missing participants forward from the
    /// previous round when the deadline elapses, averages the contributions, picks the
    /// leader and finally persists, announces and releases the round.
    ///
    /// # Arguments
    /// * `round` - The round to aggregate.
    ///
    /// # Returns
    /// The serialized aggregated result, or the error of the first stage that failed.
    pub async fn start_aggregation(&self, round: Round) -> Result<String> {
        let _guard = self.claim(round)?;
        info!(round = round; "aggregation started");

        if let BarrierOutcome::Incomplete { .. } =
            self.barrier.wait(&self.store, &self.participants, round).await
        {
            self.fallback.resolve(&self.store, &self.participants, round)?;
        }

        let bundles = self
            .store
            .collect(&self.participants, round)
            .map_err(|e| CoordinatorErr::Operational(e.to_string()))?;

        let tensors = aggregation::mean(&bundles)?;

        let leader = self
            .leader
            .select(&self.participants)
            .ok_or_else(|| CoordinatorErr::Operational("participant set is empty".into()))?;

        info!(
            "round {round} aggregated over {} contributions, leader is {leader}",
            bundles.len()
        );

        let result = AggregatedResult::new(leader, tensors, round);
        self.finalizer
            .finalize(&result, self.participants.clone())
            .await
    }

    /// The liveness probe, answers `CHECK_WORKING_REPLY`.
    pub fn check_working(&self) -> &'static str {
        CHECK_WORKING_REPLY
    }

    /// Reads the persisted aggregated result of `round` back from the ledger.
    ///
    /// # Returns
    /// The serialized result or `ResultNotFound` if the round was never finalized.
    pub fn aggregated_result(&self, round: Round) -> Result<String> {
        let bytes = self
            .finalizer
            .ledger()
            .get_state(&result_key(round))?
            .ok_or(CoordinatorErr::ResultNotFound(round))?;

        String::from_utf8(bytes).map_err(|e| CoordinatorErr::Operational(e.to_string()))
    }

    /// Marks `round` as being aggregated until the returned guard is dropped.
    fn claim(&self, round: Round) -> Result<RoundGuard<'_>> {
        if !self.in_flight.lock().insert(round) {
            return Err(CoordinatorErr::RoundInProgress(round));
        }

        Ok(RoundGuard {
            in_flight: &self.in_flight,
            round,
        })
    }
}

/// Releases a round claimed by `Coordinator::claim`, whatever the aggregation's outcome.
struct RoundGuard<'a> {
    in_flight: &'a Mutex<HashSet<Round>>,
    round: Round,
}

impl Drop for RoundGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.round);
    }
}
