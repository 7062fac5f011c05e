use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use super::{Result, Round, StagingKey, StoreErr, TensorBundle};

type Partition = HashMap<String, TensorBundle>;

/// The staging area for uploaded bundles, keyed by `(node, round)`.
///
/// Reads take the shared side of the lock, every mutation the exclusive one. Bundles are
/// partitioned by round so a whole round can be released in a single exclusive section.
/// Cloning the store yields another handle to the same staged bundles.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    rounds: Arc<RwLock<HashMap<Round, Partition>>>,
}

impl ParameterStore {
    /// Creates a new, empty `ParameterStore`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `bundle` under its own key, replacing any previous bundle for that key.
    ///
    /// # Arguments
    /// * `bundle` - The bundle to stage.
    ///
    /// # Returns
    /// The bundle that was replaced, if any.
    pub fn put(&self, bundle: TensorBundle) -> Option<TensorBundle> {
        let mut rounds = self.rounds.write();
        rounds
            .entry(bundle.round)
            .or_default()
            .insert(bundle.node_id.clone(), bundle)
    }

    /// Whether a bundle is staged under `key`.
    pub fn exists(&self, key: &StagingKey) -> bool {
        self.rounds
            .read()
            .get(&key.round)
            .is_some_and(|partition| partition.contains_key(&key.node_id))
    }

    /// Returns a copy of the bundle staged under `key`.
    pub fn get(&self, key: &StagingKey) -> Option<TensorBundle> {
        self.rounds
            .read()
            .get(&key.round)
            .and_then(|partition| partition.get(&key.node_id))
            .cloned()
    }

    /// Removes the bundle staged under `key`.
    ///
    /// # Returns
    /// The removed bundle, if any.
    pub fn delete(&self, key: &StagingKey) -> Option<TensorBundle> {
        let mut rounds = self.rounds.write();
        let partition = rounds.get_mut(&key.round)?;
        let removed = partition.remove(&key.node_id);

        if partition.is_empty() {
            rounds.remove(&key.round);
        }

        removed
    }

    /// Lists the participants without a bundle for `round`.
    ///
    /// # Arguments
    /// * `participants` - The expected participants, in order.
    /// * `round` - The round to inspect.
    ///
    /// # Returns
    /// The missing participants, in the same order as `participants`.
    pub fn missing(&self, participants: &[String], round: Round) -> Vec<String> {
        let rounds = self.rounds.read();
        let partition = rounds.get(&round);

        participants
            .iter()
            .filter(|node| !partition.is_some_and(|p| p.contains_key(node.as_str())))
            .cloned()
            .collect()
    }

    /// Copies the bundles of every participant for `round` out of the store.
    ///
    /// # Arguments
    /// * `participants` - The expected participants, in order.
    /// * `round` - The round to collect.
    ///
    /// # Returns
    /// The bundles in participant order, or `StoreErr::NotStaged` for the first absent one.
    pub fn collect(&self, participants: &[String], round: Round) -> Result<Vec<TensorBundle>> {
        let rounds = self.rounds.read();
        let partition = rounds.get(&round);

        participants
            .iter()
            .map(|node| {
                partition
                    .and_then(|p| p.get(node.as_str()))
                    .cloned()
                    .ok_or_else(|| StoreErr::NotStaged {
                        node: node.clone(),
                        round,
                    })
            })
            .collect()
    }

    /// Fills the gaps of `round` with copies of the previous round's bundles.
    ///
    /// Runs as one exclusive section. Participants that got a bundle for `round` in the
    /// meantime keep it. Either every gap is filled or nothing is written.
    ///
    /// # Arguments
    /// * `participants` - The participants to fill in when absent, in order.
    /// * `round` - The round to complete.
    ///
    /// # Returns
    /// The participants that were carried forward, or `StoreErr::NoPreviousBundle`
    /// for the first one without a bundle in `round - 1`.
    pub fn carry_forward(&self, participants: &[String], round: Round) -> Result<Vec<String>> {
        let mut rounds = self.rounds.write();
        let current = rounds.get(&round);
        let previous = round.checked_sub(1).and_then(|prev| rounds.get(&prev));

        let mut carried = Vec::new();
        for node in participants {
            if current.is_some_and(|p| p.contains_key(node.as_str())) {
                continue;
            }

            let Some(bundle) = previous.and_then(|p| p.get(node.as_str())) else {
                return Err(StoreErr::NoPreviousBundle { node: node.clone() });
            };

            let mut copy = bundle.clone();
            copy.round = round;
            carried.push(copy);
        }

        let nodes = carried.iter().map(|b| b.node_id.clone()).collect();
        let partition = rounds.entry(round).or_default();
        for bundle in carried {
            partition.insert(bundle.node_id.clone(), bundle);
        }

        Ok(nodes)
    }

    /// Releases every bundle staged for `round`, leaving other rounds untouched.
    ///
    /// # Returns
    /// The amount of bundles released.
    pub fn purge_round(&self, round: Round) -> usize {
        self.rounds
            .write()
            .remove(&round)
            .map_or(0, |partition| partition.len())
    }

    /// The rounds that currently have staged bundles, in ascending order.
    pub fn rounds(&self) -> Vec<Round> {
        let mut rounds: Vec<_> = self.rounds.read().keys().copied().collect();
        rounds.sort_unstable();
        rounds
    }

    /// The total amount of staged bundles.
    pub fn len(&self) -> usize {
        self.rounds.read().values().map(HashMap::len).sum()
    }

    /// Whether no bundle is staged at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
