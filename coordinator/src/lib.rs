//! Round-scoped aggregation of LSTM parameters contributed by a fixed set of participants.
//!
//! Participants stage their tensors with `UploadParameter`; `StartAggregation` waits for the
//! round to fill up (carrying laggards forward from the previous round), averages the
//! contributions, persists the result, announces it and releases the round.

pub mod aggregation;
pub mod config;
pub mod election;
pub mod error;
pub mod events;
pub mod finalization;
pub mod ledger;
pub mod service;
pub mod storage;
pub mod synchronization;

pub use config::{ConfigErr, CoordinatorConfig};
pub use error::{CoordinatorErr, Result};
pub use service::{CHECK_WORKING_REPLY, Coordinator, CoordinatorBuilder, Invocation};
pub use storage::{LstmTensors, Matrix, ParameterStore, Round, StagingKey, TensorBundle, Vector};
