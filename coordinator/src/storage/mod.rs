mod bundle;
mod error;
mod key;
mod shape;
mod store;

pub use bundle::{LstmTensors, Matrix, Round, TensorBundle, Vector};
pub use error::{Result, StoreErr};
pub use key::StagingKey;
pub use shape::{Shape, ShapeErr};
pub use store::ParameterStore;
