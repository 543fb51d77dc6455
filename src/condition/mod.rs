// src/condition/mod.rs
pub mod runner;

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::check::Check;

/// Error type for user-supplied condition calls. Errors are never downgraded
/// to a "fail" status; they propagate out of the aggregation so the serving
/// layer can report a broken check as a server error.
pub type CallError = Box<dyn std::error::Error + Send + Sync>;

/// A zero-argument health call. User conditions are either plain async
/// functions or blocking closures offloaded to the blocking pool; both are
/// dispatched uniformly through this trait.
#[async_trait]
pub trait CheckCall: Send + Sync {
    async fn evaluate(&self) -> Result<Check, CallError>;
}

struct AsyncCall<F>(F);

#[async_trait]
impl<F, Fut> CheckCall for AsyncCall<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Check, CallError>> + Send,
{
    async fn evaluate(&self) -> Result<Check, CallError> {
        (self.0)().await
    }
}

struct BlockingCall<F>(F);

#[async_trait]
impl<F> CheckCall for BlockingCall<F>
where
    F: Fn() -> Result<Check, CallError> + Send + Sync + Clone + 'static,
{
    async fn evaluate(&self) -> Result<Check, CallError> {
        let call = self.0.clone();
        match tokio::task::spawn_blocking(call).await {
            Ok(result) => result,
            Err(join_error) => Err(Box::new(join_error)),
        }
    }
}

/// A named unit of health evaluation. One condition may carry several calls;
/// each contributes its own check under the condition's name.
#[derive(Clone)]
pub struct Condition {
    pub name: String,
    calls: Vec<Arc<dyn CheckCall>>,
}

impl Condition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Vec::new(),
        }
    }

    /// Add an async call.
    pub fn call<F, Fut>(mut self, call: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Check, CallError>> + Send + 'static,
    {
        self.calls.push(Arc::new(AsyncCall(call)));
        self
    }

    /// Add a blocking call; it runs on the blocking pool so a slow check
    /// cannot stall the other conditions.
    pub fn blocking_call<F>(mut self, call: F) -> Self
    where
        F: Fn() -> Result<Check, CallError> + Send + Sync + Clone + 'static,
    {
        self.calls.push(Arc::new(BlockingCall(call)));
        self
    }

    /// Add a pre-built call such as one of the probes in [`crate::probes`].
    pub fn with_call(mut self, call: impl CheckCall + 'static) -> Self {
        self.calls.push(Arc::new(call));
        self
    }

    pub fn calls(&self) -> &[Arc<dyn CheckCall>] {
        &self.calls
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .field("calls", &self.calls.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn async_call_is_evaluated_directly() {
        let condition = Condition::new("redis:connection")
            .call(|| async { Ok(Check::new().with_status("pass")) });
        let check = condition.calls()[0].evaluate().await.unwrap();
        assert_eq!(check.status.as_deref(), Some("pass"));
    }

    #[tokio::test]
    async fn blocking_call_is_offloaded() {
        let condition = Condition::new("disk:space")
            .blocking_call(|| Ok(Check::new().with_status("warn")));
        let check = condition.calls()[0].evaluate().await.unwrap();
        assert_eq!(check.status.as_deref(), Some("warn"));
    }

    #[tokio::test]
    async fn call_errors_surface_unchanged() {
        let condition = Condition::new("postgres:connection")
            .call(|| async { Err::<Check, CallError>("connection refused".into()) });
        let err = condition.calls()[0].evaluate().await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }
}
