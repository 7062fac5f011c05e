use std::sync::Arc;

use super::{Clock, SystemClock};

/// Maps a timestamp onto a participant index: `unix_seconds mod participants`.
///
/// Reproducible by anyone who knows the second the round was aggregated at, but not
/// adversary resistant, and rounds aggregated within the same second share a leader.
///
/// # Returns
/// `None` when there are no participants.
pub fn leader_index(unix_seconds: u64, participants: usize) -> Option<usize> {
    (participants > 0).then(|| (unix_seconds % participants as u64) as usize)
}

/// Designates the leader of a round out of the participant set.
#[derive(Clone)]
pub struct LeaderSelector {
    clock: Arc<dyn Clock>,
}

impl LeaderSelector {
    /// Creates a new `LeaderSelector`.
    ///
    /// # Arguments
    /// * `clock` - The time source the selection is derived from.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Picks the leader for a round being aggregated now.
    ///
    /// # Arguments
    /// * `participants` - The participant set, in its configured order.
    ///
    /// # Returns
    /// The selected participant, `None` if the set is empty.
    pub fn select<'a>(&self, participants: &'a [String]) -> Option<&'a str> {
        let now = self.clock.unix_seconds();
        leader_index(now, participants.len()).map(|idx| participants[idx].as_str())
    }
}

impl Default for LeaderSelector {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::FixedClock;

    fn participants() -> Vec<String> {
        ["soft", "web", "hard"].map(String::from).to_vec()
    }

    #[test]
    fn test_index_is_seconds_modulo_participants() {
        assert_eq!(leader_index(0, 3), Some(0));
        assert_eq!(leader_index(1_700_000_000, 3), Some(2));
        assert_eq!(leader_index(1_700_000_001, 3), Some(0));
        assert_eq!(leader_index(42, 0), None);
    }

    #[test]
    fn test_selector_follows_the_clock() {
        let participants = participants();

        let selector = LeaderSelector::new(Arc::new(FixedClock(4)));
        assert_eq!(selector.select(&participants), Some("web"));

        let selector = LeaderSelector::new(Arc::new(FixedClock(5)));
        assert_eq!(selector.select(&participants), Some("hard"));
    }

    #[test]
    fn test_system_clock_picks_a_participant() {
        let participants = participants();
        let leader = LeaderSelector::default().select(&participants).unwrap();
        assert!(participants.iter().any(|p| p == leader));
    }
}
