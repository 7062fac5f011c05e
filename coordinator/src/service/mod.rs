mod builder;
mod coordinator;
mod invocation;

pub use builder::CoordinatorBuilder;
pub use coordinator::{CHECK_WORKING_REPLY, Coordinator};
pub use invocation::Invocation;
