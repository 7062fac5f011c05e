use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Ledger, LedgerErr};

/// A process-local ledger, its state is lost on shutdown.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryLedger {
    /// Creates a new, empty `MemoryLedger`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The keys written so far, in ascending order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.state.read().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }
}

impl Ledger for MemoryLedger {
    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), LedgerErr> {
        self.state.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerErr> {
        Ok(self.state.read().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::result_key;

    #[test]
    fn test_put_then_get() {
        let ledger = MemoryLedger::new();
        let key = result_key(7);

        assert_eq!(ledger.get_state(&key).unwrap(), None);
        ledger.put_state(&key, b"first").unwrap();
        ledger.put_state(&key, b"second").unwrap();

        assert_eq!(ledger.get_state(&key).unwrap().as_deref(), Some(&b"second"[..]));
        assert_eq!(ledger.keys(), vec!["RESULT_Aggregated_7"]);
    }
}
