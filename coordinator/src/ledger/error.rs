use std::{
    error::Error,
    fmt::{self, Display},
};

/// Error returned by a `Ledger` whenever it can't read or write a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerErr(String);

impl LedgerErr {
    /// Creates a new `LedgerErr` carrying `msg`.
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self(msg.into())
    }
}

impl From<sled::Error> for LedgerErr {
    fn from(value: sled::Error) -> Self {
        Self(value.to_string())
    }
}

impl Display for LedgerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for LedgerErr {}
