// src/route/mod.rs
//
// The boolean/dict flavour of the endpoint: conditions report plain truthy
// values instead of structured checks, the service is healthy iff all of
// them are truthy, and dict-valued outputs are merged into the body.
use async_trait::async_trait;
use futures::future::{try_join_all, BoxFuture};
use hyper::StatusCode;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::condition::CallError;

/// Raw outcome of one boolean-style condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionOutput {
    Flag(bool),
    Data(Map<String, Value>),
}

impl ConditionOutput {
    /// Truthiness: `true`, or a non-empty data map.
    pub fn is_healthy(&self) -> bool {
        match self {
            ConditionOutput::Flag(flag) => *flag,
            ConditionOutput::Data(map) => !map.is_empty(),
        }
    }
}

impl From<bool> for ConditionOutput {
    fn from(flag: bool) -> Self {
        ConditionOutput::Flag(flag)
    }
}

impl From<Map<String, Value>> for ConditionOutput {
    fn from(map: Map<String, Value>) -> Self {
        ConditionOutput::Data(map)
    }
}

#[async_trait]
trait OutputCall: Send + Sync {
    async fn evaluate(&self) -> Result<ConditionOutput, CallError>;
}

struct AsyncCall<F>(F);

#[async_trait]
impl<F, Fut, O> OutputCall for AsyncCall<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, CallError>> + Send,
    O: Into<ConditionOutput>,
{
    async fn evaluate(&self) -> Result<ConditionOutput, CallError> {
        Ok((self.0)().await?.into())
    }
}

struct BlockingCall<F>(F);

#[async_trait]
impl<F, O> OutputCall for BlockingCall<F>
where
    F: Fn() -> Result<O, CallError> + Send + Sync + Clone + 'static,
    O: Into<ConditionOutput> + Send + 'static,
{
    async fn evaluate(&self) -> Result<ConditionOutput, CallError> {
        let call = self.0.clone();
        match tokio::task::spawn_blocking(call).await {
            Ok(result) => Ok(result?.into()),
            Err(join_error) => Err(Box::new(join_error)),
        }
    }
}

type OutputHandler =
    Arc<dyn Fn(Vec<(String, ConditionOutput)>) -> BoxFuture<'static, Value> + Send + Sync>;

/// The simple health route. Without custom handlers the body is the
/// left-to-right merge of all dict-valued outputs (later conditions
/// overwrite overlapping keys).
#[derive(Clone, Default)]
pub struct HealthRoute {
    conditions: Vec<(String, Arc<dyn OutputCall>)>,
    success_handler: Option<OutputHandler>,
    failure_handler: Option<OutputHandler>,
    success_output: Option<Value>,
    failure_output: Option<Value>,
    success_status: Option<StatusCode>,
    failure_status: Option<StatusCode>,
}

impl HealthRoute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named async condition returning `bool` or a data map.
    pub fn condition<F, Fut, O>(mut self, name: impl Into<String>, call: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, CallError>> + Send + 'static,
        O: Into<ConditionOutput> + 'static,
    {
        self.conditions.push((name.into(), Arc::new(AsyncCall(call))));
        self
    }

    /// Add a named blocking condition, offloaded to the blocking pool.
    pub fn blocking_condition<F, O>(mut self, name: impl Into<String>, call: F) -> Self
    where
        F: Fn() -> Result<O, CallError> + Send + Sync + Clone + 'static,
        O: Into<ConditionOutput> + Send + 'static,
    {
        self.conditions
            .push((name.into(), Arc::new(BlockingCall(call))));
        self
    }

    /// Replace the default merge with a reducer over all named outputs when
    /// the service is healthy.
    pub fn success_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Vec<(String, ConditionOutput)>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        self.success_handler = Some(Arc::new(move |outputs| Box::pin(handler(outputs))));
        self
    }

    /// Same as [`Self::success_handler`], for the unhealthy case.
    pub fn failure_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Vec<(String, ConditionOutput)>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        self.failure_handler = Some(Arc::new(move |outputs| Box::pin(handler(outputs))));
        self
    }

    /// Static body returned instead of the merged outputs when the service
    /// is healthy. A configured handler still takes precedence.
    pub fn success_output(mut self, output: Value) -> Self {
        self.success_output = Some(output);
        self
    }

    /// Same as [`Self::success_output`], for the unhealthy case.
    pub fn failure_output(mut self, output: Value) -> Self {
        self.failure_output = Some(output);
        self
    }

    pub fn success_status(mut self, status: StatusCode) -> Self {
        self.success_status = Some(status);
        self
    }

    pub fn failure_status(mut self, status: StatusCode) -> Self {
        self.failure_status = Some(status);
        self
    }

    /// Handle one request: run all conditions concurrently, then reduce.
    /// Healthy iff every output is truthy; no warn tier in this flavour.
    pub async fn handle(&self) -> Result<(StatusCode, Value), CallError> {
        let outputs = try_join_all(self.conditions.iter().map(|(name, call)| {
            let name = name.clone();
            let call = call.clone();
            async move { Ok::<_, CallError>((name, call.evaluate().await?)) }
        }))
        .await?;

        let healthy = outputs.iter().all(|(_, output)| output.is_healthy());
        let (handler, static_output, code) = if healthy {
            debug!(conditions = outputs.len(), "all conditions healthy");
            (
                self.success_handler.as_ref(),
                self.success_output.as_ref(),
                self.success_status.unwrap_or(StatusCode::OK),
            )
        } else {
            warn!("at least one condition is unhealthy");
            (
                self.failure_handler.as_ref(),
                self.failure_output.as_ref(),
                self.failure_status
                    .unwrap_or(StatusCode::SERVICE_UNAVAILABLE),
            )
        };

        let body = match (handler, static_output) {
            (Some(handler), _) => handler(outputs).await,
            (None, Some(output)) => output.clone(),
            (None, None) => Value::Object(merge_outputs(&outputs)),
        };
        Ok((code, body))
    }
}

impl fmt::Debug for HealthRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthRoute")
            .field("conditions", &self.conditions.len())
            .finish()
    }
}

fn merge_outputs(outputs: &[(String, ConditionOutput)]) -> Map<String, Value> {
    let mut merged = Map::new();
    for (_, output) in outputs {
        if let ConditionOutput::Data(map) = output {
            for (key, value) in map {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn single_truthy_condition_succeeds() {
        let route = HealthRoute::new().condition("healthy", || async { Ok(true) });
        let (code, body) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn any_falsy_condition_fails() {
        let route = HealthRoute::new()
            .condition("sick", || async { Ok(false) })
            .condition("healthy", || async { Ok(true) });
        let (code, _) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn dict_outputs_are_merged_left_to_right() {
        let route = HealthRoute::new()
            .condition("potato", || async { Ok(data(json!({"potato": "yes"}))) })
            .condition("banana", || async { Ok(data(json!({"banana": "yes"}))) });
        let (code, body) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, json!({"potato": "yes", "banana": "yes"}));
    }

    #[tokio::test]
    async fn later_conditions_overwrite_overlapping_keys() {
        let route = HealthRoute::new()
            .condition("first", || async { Ok(data(json!({"shared": "old"}))) })
            .condition("second", || async { Ok(data(json!({"shared": "new"}))) });
        let (_, body) = route.handle().await.unwrap();
        assert_eq!(body, json!({"shared": "new"}));
    }

    #[tokio::test]
    async fn failed_run_still_merges_dict_outputs() {
        let route = HealthRoute::new()
            .condition("banana", || async { Ok(data(json!({"banana": "yes"}))) })
            .condition("sick", || async { Ok(false) });
        let (code, body) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"banana": "yes"}));
    }

    #[tokio::test]
    async fn empty_dict_output_counts_as_unhealthy() {
        let route = HealthRoute::new().condition("empty", || async { Ok(Map::new()) });
        let (code, _) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn blocking_conditions_participate() {
        let route = HealthRoute::new()
            .blocking_condition("cpu", || Ok(data(json!({"cpu": "fine"}))));
        let (code, body) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, json!({"cpu": "fine"}));
    }

    #[tokio::test]
    async fn success_handler_receives_all_named_outputs() {
        let route = HealthRoute::new()
            .condition("healthy", || async { Ok(true) })
            .condition("another_healthy", || async { Ok(true) })
            .success_handler(|outputs| async move {
                let entries: Map<String, Value> = outputs
                    .into_iter()
                    .map(|(name, output)| (name, Value::Bool(output.is_healthy())))
                    .collect();
                Value::Object(entries)
            });
        let (code, body) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, json!({"healthy": true, "another_healthy": true}));
    }

    #[tokio::test]
    async fn failure_handler_builds_the_body_directly() {
        let route = HealthRoute::new()
            .condition("sick", || async { Ok(false) })
            .condition("healthy", || async { Ok(true) })
            .failure_handler(|outputs| async move {
                json!({
                    "status": "failure",
                    "results": outputs
                        .iter()
                        .map(|(name, output)| json!({
                            "condition": name,
                            "output": output.is_healthy(),
                        }))
                        .collect::<Vec<_>>(),
                })
            });
        let (code, body) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            json!({
                "status": "failure",
                "results": [
                    {"condition": "sick", "output": false},
                    {"condition": "healthy", "output": true},
                ],
            })
        );
    }

    #[tokio::test]
    async fn static_success_output_replaces_the_merge() {
        let route = HealthRoute::new()
            .condition("potato", || async { Ok(data(json!({"potato": "yes"}))) })
            .success_output(json!({"everything": "fine"}));
        let (code, body) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, json!({"everything": "fine"}));
    }

    #[tokio::test]
    async fn static_failure_output_replaces_the_merge() {
        let route = HealthRoute::new()
            .condition("banana", || async { Ok(data(json!({"banana": "yes"}))) })
            .condition("sick", || async { Ok(false) })
            .success_output(json!({"everything": "fine"}))
            .failure_output(json!({"everything": "broken"}));
        let (code, body) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"everything": "broken"}));
    }

    #[tokio::test]
    async fn handlers_take_precedence_over_static_outputs() {
        let route = HealthRoute::new()
            .condition("healthy", || async { Ok(true) })
            .success_output(json!({"everything": "fine"}))
            .success_handler(|_| async move { json!({"from": "handler"}) });
        let (_, body) = route.handle().await.unwrap();
        assert_eq!(body, json!({"from": "handler"}));
    }

    #[tokio::test]
    async fn custom_statuses_replace_the_defaults() {
        let route = HealthRoute::new()
            .condition("sick", || async { Ok(false) })
            .failure_status(StatusCode::IM_A_TEAPOT);
        let (code, _) = route.handle().await.unwrap();
        assert_eq!(code, StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn condition_errors_abort_the_request() {
        let route = HealthRoute::new()
            .condition("broken", || async { Err::<bool, CallError>("boom".into()) });
        assert!(route.handle().await.is_err());
    }
}
