pub mod status;

pub use status::{ExecutionSource, ExecutionStatus, OrderStatus};
