use super::LedgerErr;
use crate::storage::Round;

/// Prefix of the keys aggregated results are persisted under.
pub const RESULT_KEY_PREFIX: &str = "RESULT_Aggregated_";

/// The key the aggregated result of `round` is persisted under.
pub fn result_key(round: Round) -> String {
    format!("{RESULT_KEY_PREFIX}{round}")
}

/// Durable key/value state, atomic for single-key writes.
pub trait Ledger: Send + Sync {
    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Arguments
    /// * `key` - The state key.
    /// * `value` - The raw bytes to store.
    ///
    /// # Returns
    /// A `LedgerErr` if the write couldn't be made durable.
    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), LedgerErr>;

    /// Reads the value stored under `key`.
    ///
    /// # Returns
    /// The stored bytes, `None` if the key was never written.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerErr>;
}
