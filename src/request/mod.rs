//! Request Module
//!
//! Stateful execution of asynchronous backend operations: in-flight,
//! result and error tracking observable by any number of readers.

mod executor;
mod operation;
mod state;

pub use executor::{ExecutorOptions, RequestExecutor};
pub use operation::{Operation, OperationFuture};
pub use state::RequestState;
