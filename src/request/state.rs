//! Request State Module
//!
//! Snapshot of one executor's progress.

use crate::error::RequestError;

// == Request State ==
/// Observable state of a [`RequestExecutor`](super::RequestExecutor).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<A, T> {
    /// Last successful result; never cleared by a failure
    pub data: Option<T>,
    /// True while at least one invocation is unsettled
    pub loading: bool,
    /// Normalized error of the last failed settlement, cleared on success
    pub error: Option<RequestError>,
    /// Arguments of the most recent invocation, recorded when it starts
    pub last_args: Option<A>,
    /// Arguments of the most recent invocation that settled successfully
    pub last_success_args: Option<A>,
}

impl<A, T> Default for RequestState<A, T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_args: None,
            last_success_args: None,
        }
    }
}

impl<A, T> RequestState<A, T> {
    /// True once any invocation has succeeded since the last reset.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}
