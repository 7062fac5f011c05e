mod error;
mod ledger;
mod memory;
mod sled_ledger;

pub use error::LedgerErr;
pub use ledger::{Ledger, RESULT_KEY_PREFIX, result_key};
pub use memory::MemoryLedger;
pub use sled_ledger::SledLedger;
