//! Operation Module
//!
//! The asynchronous call a request executor wraps.

use std::future::Future;

use futures::future::BoxFuture;

use crate::error::OperationError;
use crate::models::ApiResponse;

/// Future returned by an [`Operation`].
pub type OperationFuture<T> = BoxFuture<'static, Result<ApiResponse<T>, OperationError>>;

/// An asynchronous call from arguments `A` to a response wrapping `T`.
///
/// Implemented for any `Fn(A) -> impl Future` closure, so a plain async
/// closure over an API client is an operation.
pub trait Operation<A, T>: Send + Sync + 'static {
    fn call(&self, args: A) -> OperationFuture<T>;
}

impl<A, T, F, Fut> Operation<A, T> for F
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse<T>, OperationError>> + Send + 'static,
{
    fn call(&self, args: A) -> OperationFuture<T> {
        Box::pin(self(args))
    }
}
