//! Request Executor Module
//!
//! Wraps one asynchronous operation and tracks its loading, result and
//! error state.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::error::{OperationError, RequestError, Result};
use crate::models::ApiResponse;
use crate::request::{Operation, RequestState};

/// Behavior switches for a [`RequestExecutor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutorOptions {
    /// Drop a settlement from an invocation older than one whose result was
    /// already applied. Callers still receive their own result. When off,
    /// overlapping invocations apply in settlement order and the last one to
    /// settle wins.
    pub discard_stale_responses: bool,
}

struct Shared<A, T> {
    operation: Box<dyn Operation<A, T>>,
    state: watch::Sender<RequestState<A, T>>,
    options: ExecutorOptions,
    in_flight: AtomicUsize,
    issued: AtomicU64,
    applied: AtomicU64,
}

// == Request Executor ==
/// Stateful wrapper around one asynchronous operation.
///
/// Cloning yields another handle to the same executor and state. There is
/// no cancellation: overlapping `execute` calls all run to completion and
/// each one mutates the shared state when it settles.
pub struct RequestExecutor<A, T> {
    shared: Arc<Shared<A, T>>,
}

impl<A, T> Clone for RequestExecutor<A, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A, T> RequestExecutor<A, T>
where
    A: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an executor over `operation` with default options.
    pub fn new(operation: impl Operation<A, T>) -> Self {
        Self::with_options(operation, ExecutorOptions::default())
    }

    pub fn with_options(operation: impl Operation<A, T>, options: ExecutorOptions) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            shared: Arc::new(Shared {
                operation: Box::new(operation),
                state,
                options,
                in_flight: AtomicUsize::new(0),
                issued: AtomicU64::new(0),
                applied: AtomicU64::new(0),
            }),
        }
    }

    // == Execute ==
    /// Invokes the operation with `args`.
    ///
    /// `loading` and `last_args` are updated before this returns, not when
    /// the future is first polled. The operation runs on its own task, so it
    /// settles and updates state even if the returned future is dropped. On
    /// success the value becomes `data` and `error` is cleared; on failure
    /// `error` holds the normalized message, `data` keeps its previous value
    /// and the same error is returned. Must be called within a tokio runtime.
    pub fn execute(&self, args: A) -> impl Future<Output = Result<T>> + Send + 'static {
        let seq = self.begin(args.clone());
        let call = self.shared.operation.call(args.clone());
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(result) => result.map(ApiResponse::into_data).map_err(RequestError::from),
                Err(_) => {
                    error!(seq, "operation panicked");
                    Err(OperationError::Unknown.normalize())
                }
            };
            shared.settle(seq, args, &outcome);
            outcome
        });

        async move {
            task.await.unwrap_or_else(|err| {
                warn!(error = %err, "request task did not complete");
                Err(RequestError::new(err.to_string()))
            })
        }
    }

    fn begin(&self, args: A) -> u64 {
        let seq = self.shared.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.state.send_modify(|state| {
            self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
            state.loading = true;
            state.last_args = Some(args);
        });
        seq
    }

    // == Reset ==
    /// Returns data, loading, error and last arguments to their initial
    /// values. Invocations still pending will settle into the fresh state.
    pub fn reset(&self) {
        self.shared.state.send_modify(|state| {
            self.shared.in_flight.store(0, Ordering::SeqCst);
            *state = RequestState::default();
        });
    }

    // == Accessors ==
    /// Snapshot of the full state.
    pub fn state(&self) -> RequestState<A, T> {
        self.shared.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.shared.state.borrow().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.shared.state.borrow().loading
    }

    pub fn error(&self) -> Option<RequestError> {
        self.shared.state.borrow().error.clone()
    }

    pub fn last_args(&self) -> Option<A> {
        self.shared.state.borrow().last_args.clone()
    }

    /// Arguments of the last invocation whose success was applied.
    pub fn last_success_args(&self) -> Option<A> {
        self.shared.state.borrow().last_success_args.clone()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<RequestState<A, T>> {
        self.shared.state.subscribe()
    }
}

impl<A, T: Clone> Shared<A, T> {
    fn settle(&self, seq: u64, args: A, outcome: &Result<T>) {
        self.state.send_modify(|state| {
            let remaining = self
                .in_flight
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
                .map(|prev| prev.saturating_sub(1))
                .unwrap_or(0);
            state.loading = remaining > 0;

            if self.options.discard_stale_responses {
                if seq < self.applied.load(Ordering::SeqCst) {
                    debug!(seq, "discarding stale response");
                    return;
                }
                self.applied.store(seq, Ordering::SeqCst);
            }

            match outcome {
                Ok(data) => {
                    state.data = Some(data.clone());
                    state.error = None;
                    state.last_success_args = Some(args);
                }
                Err(err) => {
                    warn!(error = %err, "request failed");
                    state.error = Some(err.clone());
                }
            }
        });
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready};

    type Reply = std::result::Result<ApiResponse<String>, OperationError>;

    /// Operation that answers `(label, delay_ms)` with `label` after the delay.
    fn delayed() -> impl Operation<(String, u64), String> {
        |(label, delay): (String, u64)| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok::<_, OperationError>(ApiResponse::new(label))
        }
    }

    /// Operation whose next reply is supplied by the test.
    fn gated() -> (impl Operation<u32, String>, Arc<Mutex<Vec<oneshot::Sender<Reply>>>>) {
        let gates = Arc::new(Mutex::new(Vec::new()));
        let senders = Arc::clone(&gates);
        let op = move |_: u32| {
            let (tx, rx) = oneshot::channel::<Reply>();
            gates.lock().unwrap().push(tx);
            async move { rx.await.unwrap_or(Err(OperationError::Unknown)) }
        };
        (op, senders)
    }

    #[tokio::test]
    async fn test_initial_state() {
        let executor = RequestExecutor::new(delayed());
        assert_eq!(executor.state(), RequestState::default());
        assert!(!executor.loading());
    }

    #[tokio::test]
    async fn test_execute_success_updates_state() {
        let executor = RequestExecutor::new(delayed());

        let value = executor.execute(("vitals".to_string(), 0)).await.unwrap();

        assert_eq!(value, "vitals");
        assert_eq!(executor.data(), Some("vitals".to_string()));
        assert!(executor.error().is_none());
        assert!(!executor.loading());
        assert_eq!(executor.last_args(), Some(("vitals".to_string(), 0)));
    }

    #[tokio::test]
    async fn test_loading_set_before_first_poll() {
        let (op, gates) = gated();
        let executor = RequestExecutor::new(op);

        let mut pending = tokio_test::task::spawn(executor.execute(7));

        // Nothing polled yet, state already reflects the call
        assert!(executor.loading());
        assert_eq!(executor.last_args(), Some(7));

        assert_pending!(pending.poll());
        assert!(executor.loading());

        let gate = gates.lock().unwrap().remove(0);
        gate.send(Ok(ApiResponse::new("done".to_string()))).unwrap();
        executor.watch().wait_for(|s| !s.loading).await.unwrap();

        let value = assert_ready!(pending.poll()).unwrap();
        assert_eq!(value, "done");
        assert!(!executor.loading());
    }

    #[tokio::test]
    async fn test_failure_preserves_data() {
        let (op, gates) = gated();
        let executor = RequestExecutor::new(op);

        let first = executor.execute(1);
        gates.lock().unwrap().remove(0).send(Ok(ApiResponse::new("first".to_string()))).unwrap();
        first.await.unwrap();

        let second = executor.execute(2);
        gates
            .lock()
            .unwrap()
            .remove(0)
            .send(Err(OperationError::Rejected {
                status: 404,
                body: json!({ "message": "report not found" }),
            }))
            .unwrap();
        let err = second.await.unwrap_err();

        assert_eq!(err.message, "report not found");
        assert_eq!(executor.error(), Some(err));
        assert_eq!(executor.data(), Some("first".to_string()));
        assert!(!executor.loading());
        assert_eq!(executor.last_args(), Some(2));
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let (op, gates) = gated();
        let executor = RequestExecutor::new(op);

        let failed = executor.execute(1);
        gates.lock().unwrap().remove(0).send(Err(OperationError::Unknown)).unwrap();
        assert_eq!(failed.await.unwrap_err().message, "unknown error");

        let ok = executor.execute(2);
        gates.lock().unwrap().remove(0).send(Ok(ApiResponse::new("ok".to_string()))).unwrap();
        ok.await.unwrap();

        assert!(executor.error().is_none());
        assert_eq!(executor.data(), Some("ok".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_to_settle_wins() {
        let executor = RequestExecutor::new(delayed());

        let a = executor.execute(("a".to_string(), 200));
        let b = executor.execute(("b".to_string(), 100));
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a.unwrap(), "a");
        assert_eq!(b.unwrap(), "b");
        // b was issued later but settled first, so a overwrites it
        assert_eq!(executor.data(), Some("a".to_string()));
        assert_eq!(executor.last_args(), Some(("b".to_string(), 100)));
        assert!(!executor.loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_spans_overlapping_calls() {
        let executor = RequestExecutor::new(delayed());

        let slow = tokio::spawn(executor.execute(("slow".to_string(), 300)));
        let fast = executor.execute(("fast".to_string(), 100));

        fast.await.unwrap();
        assert!(executor.loading(), "slow call still in flight");

        slow.await.unwrap().unwrap();
        assert!(!executor.loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_call_still_settles() {
        let executor = RequestExecutor::new(delayed());

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            executor.execute(("late".to_string(), 1000)),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(executor.loading());

        let value = executor.execute(("quick".to_string(), 5)).await.unwrap();
        assert_eq!(value, "quick");
        assert!(executor.loading(), "abandoned call still in flight");

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(!executor.loading());
        assert_eq!(executor.data(), Some("late".to_string()));
        assert_eq!(executor.last_success_args(), Some(("late".to_string(), 1000)));
    }

    #[tokio::test]
    async fn test_panicking_operation_settles_as_error() {
        let executor = RequestExecutor::new(|n: u32| async move {
            if n == 0 {
                panic!("operation blew up");
            }
            Ok::<_, OperationError>(ApiResponse::new(n))
        });

        let err = executor.execute(0).await.unwrap_err();

        assert_eq!(err.message, "unknown error");
        assert_eq!(executor.error(), Some(err));
        assert!(!executor.loading());
        assert_eq!(executor.execute(3).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_last_success_args_skip_failures() {
        let (op, gates) = gated();
        let executor = RequestExecutor::new(op);

        let ok = executor.execute(1);
        gates.lock().unwrap().remove(0).send(Ok(ApiResponse::new("one".to_string()))).unwrap();
        ok.await.unwrap();

        let failed = executor.execute(2);
        gates.lock().unwrap().remove(0).send(Err(OperationError::Unknown)).unwrap();
        failed.await.unwrap_err();

        assert_eq!(executor.last_args(), Some(2));
        assert_eq!(executor.last_success_args(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_stale_responses() {
        let executor = RequestExecutor::with_options(
            delayed(),
            ExecutorOptions {
                discard_stale_responses: true,
            },
        );

        let a = executor.execute(("a".to_string(), 200));
        let b = executor.execute(("b".to_string(), 100));
        let (a, _) = tokio::join!(a, b);

        // Caller of the stale call still gets its value
        assert_eq!(a.unwrap(), "a");
        assert_eq!(executor.data(), Some("b".to_string()));
        assert!(!executor.loading());
    }

    #[tokio::test]
    async fn test_reset() {
        let executor = RequestExecutor::new(delayed());
        executor.execute(("x".to_string(), 0)).await.unwrap();

        executor.reset();

        assert_eq!(executor.state(), RequestState::default());
    }

    #[tokio::test]
    async fn test_watch_observes_updates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let executor = RequestExecutor::new(move |n: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, OperationError>(ApiResponse::new(n + 1)) }
        });
        let mut rx = executor.watch();

        executor.execute(1).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.data, Some(2));
        assert!(!seen.loading);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
