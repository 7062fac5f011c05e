use std::time::Duration;

use log::{debug, info};
use tokio::time::{self, Instant};

use crate::storage::{ParameterStore, Round};

/// What the barrier observed when it stopped waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarrierOutcome {
    /// Every participant has a bundle staged for the round.
    Complete,
    /// The deadline elapsed, `missing` is in participant order.
    Incomplete { missing: Vec<String> },
}

/// Waits for a round to fill up by polling the `ParameterStore`.
///
/// The first check happens right away. Between checks it sleeps for `interval`, cut short
/// so it never sleeps past `deadline`. Each check holds the store's shared lock only for
/// the duration of the lookup, uploads are never blocked by a waiting barrier.
#[derive(Debug, Clone, Copy)]
pub struct PollingBarrier {
    interval: Duration,
    deadline: Duration,
}

impl PollingBarrier {
    /// Creates a new `PollingBarrier`.
    ///
    /// # Arguments
    /// * `interval` - The pause between two checks, must not be zero.
    /// * `deadline` - How long to wait at most, measured from the first check.
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }

    /// Waits until every participant has a bundle for `round` or the deadline elapses.
    ///
    /// # Arguments
    /// * `store` - The staging area to poll.
    /// * `participants` - The expected participants, in order.
    /// * `round` - The round to wait on.
    ///
    /// # Returns
    /// The outcome of the last check.
    pub async fn wait(
        &self,
        store: &ParameterStore,
        participants: &[String],
        round: Round,
    ) -> BarrierOutcome {
        let deadline = Instant::now() + self.deadline;
        let mut checks = 0usize;

        loop {
            checks += 1;
            let missing = store.missing(participants, round);

            if missing.is_empty() {
                info!(round = round, checks = checks; "all participants submitted");
                return BarrierOutcome::Complete;
            }

            let now = Instant::now();
            if now >= deadline {
                info!(
                    "deadline reached for round {round}, {} participant(s) missing: {missing:?}",
                    missing.len()
                );
                return BarrierOutcome::Incomplete { missing };
            }

            debug!(round = round, missing = missing.len(); "waiting for participants");
            time::sleep(self.interval.min(deadline - now)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LstmTensors, TensorBundle};

    fn participants() -> Vec<String> {
        ["soft", "web", "hard"].map(String::from).to_vec()
    }

    fn upload(store: &ParameterStore, node: &str, round: Round) {
        store.put(TensorBundle::new(node, LstmTensors::default(), round));
    }

    fn barrier() -> PollingBarrier {
        PollingBarrier::new(Duration::from_secs(10), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_round_completes_without_waiting() {
        let store = ParameterStore::new();
        for node in participants() {
            upload(&store, &node, 1);
        }

        let start = Instant::now();
        let outcome = barrier().wait(&store, &participants(), 1).await;

        assert_eq!(outcome, BarrierOutcome::Complete);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_at_the_deadline() {
        let store = ParameterStore::new();
        upload(&store, "web", 1);

        let start = Instant::now();
        let outcome = barrier().wait(&store, &participants(), 1).await;

        assert_eq!(
            outcome,
            BarrierOutcome::Incomplete {
                missing: vec!["soft".into(), "hard".into()]
            }
        );
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_sleeps_past_the_deadline() {
        let store = ParameterStore::new();
        let barrier = PollingBarrier::new(Duration::from_secs(25), Duration::from_secs(60));

        let start = Instant::now();
        barrier.wait(&store, &participants(), 1).await;

        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_upload_is_seen_on_the_next_check() {
        let store = ParameterStore::new();
        upload(&store, "soft", 2);
        upload(&store, "web", 2);

        let late = store.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(15)).await;
            upload(&late, "hard", 2);
        });

        let start = Instant::now();
        let outcome = barrier().wait(&store, &participants(), 2).await;

        assert_eq!(outcome, BarrierOutcome::Complete);
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }
}
