use std::{
    error::Error,
    fmt::{self, Display},
};

/// Error returned by an `EventSink` that refused to publish an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkErr(String);

impl SinkErr {
    /// Creates a new `SinkErr` carrying `msg`.
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self(msg.into())
    }
}

impl Display for SinkErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for SinkErr {}
