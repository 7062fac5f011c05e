use std::path::Path;

use super::{Ledger, LedgerErr};

/// A ledger persisted on disk through an embedded `sled` database.
#[derive(Clone)]
pub struct SledLedger {
    db: sled::Db,
}

impl SledLedger {
    /// Opens (or creates) the database at `path`.
    ///
    /// # Returns
    /// A new `SledLedger` or a `LedgerErr` if the database can't be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerErr> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Opens a database that is removed once dropped.
    pub fn temporary() -> Result<Self, LedgerErr> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

impl Ledger for SledLedger {
    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), LedgerErr> {
        self.db.insert(key, value)?;
        self.db.flush()?;
        Ok(())
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerErr> {
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }
}
