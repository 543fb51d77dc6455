// src/server/handler.rs
use async_trait::async_trait;
use hyper::{Body, Request, Response, StatusCode};
use std::sync::Arc;
use tower::Service;

use crate::condition::CallError;
use crate::endpoint::HealthEndpoint;
use crate::route::HealthRoute;

/// Anything that can answer a health request with a full HTTP response.
/// Implemented by both endpoint flavours so `HealthService` can serve either.
#[async_trait]
pub trait HttpEndpoint: Send + Sync {
    async fn respond(&self) -> Result<Response<Body>, CallError>;
}

#[async_trait]
impl HttpEndpoint for HealthEndpoint {
    async fn respond(&self) -> Result<Response<Body>, CallError> {
        self.handle().await?.to_http()
    }
}

#[async_trait]
impl HttpEndpoint for HealthRoute {
    async fn respond(&self) -> Result<Response<Body>, CallError> {
        let (code, body) = self.handle().await?;
        let response = Response::builder()
            .status(code)
            .header(hyper::header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?;
        Ok(response)
    }
}

/// Tower service wrapping an endpoint. The method and path are up to the
/// mounting layer; every request reaching this service gets the health
/// response. A condition call error is reported as a plain 500, never as a
/// well-formed health body.
pub struct HealthService<E> {
    endpoint: Arc<E>,
}

impl<E> HealthService<E> {
    pub fn new(endpoint: E) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
        }
    }
}

impl<E> Clone for HealthService<E> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
        }
    }
}

impl<E> Service<Request<Body>> for HealthService<E>
where
    E: HttpEndpoint + 'static,
{
    type Response = Response<Body>;
    type Error = CallError;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: Request<Body>) -> Self::Future {
        let endpoint = self.endpoint.clone();
        Box::pin(async move {
            match endpoint.respond().await {
                Ok(response) => Ok(response),
                Err(e) => {
                    tracing::error!(%e, "health endpoint error");
                    Ok(Response::builder()
                        .status(StatusCode::INTERNAL_SERVER_ERROR)
                        .body(Body::from("Internal Server Error"))
                        .unwrap())
                }
            }
        })
    }
}
