// src/endpoint/mod.rs
use hyper::{Body, Response, StatusCode};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::body::HealthBody;
use crate::condition::runner::run_conditions;
use crate::condition::{CallError, Condition};
use crate::status::{Status, StatusPolicy};

pub const HEALTH_CONTENT_TYPE: &str = "application/health+json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("version '{0}' was provided, but the version field is not allowed")]
    VersionNotAllowed(String),
    #[error("a description was provided, but the description field is not allowed")]
    DescriptionNotAllowed,
}

type Supplier<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// The structured-check health endpoint. Configuration is fixed at
/// construction; `handle` is pure given that configuration, so requests
/// share nothing but read-only state.
pub struct HealthEndpoint {
    conditions: Vec<Condition>,
    policy: StatusPolicy,
    allow_version: bool,
    version: Option<String>,
    service_version: Option<String>,
    allow_description: bool,
    description: Option<String>,
    service_description: Option<String>,
    release_id: Option<Supplier<Option<String>>>,
    notes: Option<Supplier<Option<Vec<String>>>>,
    service_id: Option<String>,
    links: Option<BTreeMap<String, String>>,
}

impl std::fmt::Debug for HealthEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthEndpoint")
            .field("conditions", &self.conditions)
            .field("policy", &self.policy)
            .field("allow_version", &self.allow_version)
            .field("version", &self.version)
            .field("service_version", &self.service_version)
            .field("allow_description", &self.allow_description)
            .field("description", &self.description)
            .field("service_description", &self.service_description)
            .field("release_id", &self.release_id.is_some())
            .field("notes", &self.notes.is_some())
            .field("service_id", &self.service_id)
            .field("links", &self.links)
            .finish()
    }
}

/// One aggregation outcome: the HTTP status code to return and the body to
/// serialize. How this becomes a network response is up to the caller;
/// `to_http` covers the hyper case.
#[derive(Debug)]
pub struct HealthResponse {
    pub code: StatusCode,
    pub body: HealthBody,
}

impl HealthResponse {
    pub fn to_http(&self) -> Result<Response<Body>, CallError> {
        let payload = serde_json::to_vec(&self.body)?;
        let response = Response::builder()
            .status(self.code)
            .header(hyper::header::CONTENT_TYPE, HEALTH_CONTENT_TYPE)
            .body(Body::from(payload))?;
        Ok(response)
    }
}

impl HealthEndpoint {
    pub fn builder() -> HealthEndpointBuilder {
        HealthEndpointBuilder::default()
    }

    /// Handle one health request: run all conditions, aggregate, build the
    /// body. A condition call error aborts the request and propagates; it is
    /// never reported as a "fail" body.
    pub async fn handle(&self) -> Result<HealthResponse, CallError> {
        let checks = run_conditions(&self.conditions).await?;
        let status = self.policy.aggregate(checks.values().flatten());
        if status == self.policy.pass {
            debug!(conditions = checks.len(), "service healthy");
        } else {
            warn!(status = %status.name, "service health degraded");
        }

        let mut body = HealthBody::new(status.name.clone());
        if self.allow_version {
            body.version = self.version.clone().or_else(|| self.service_version.clone());
        }
        if self.allow_description {
            body.description = self
                .description
                .clone()
                .or_else(|| self.service_description.clone());
        }
        body.release_id = self.release_id.as_ref().and_then(|supplier| supplier());
        body.notes = self.notes.as_ref().and_then(|supplier| supplier());
        body.service_id = self.service_id.clone();
        body.links = self.links.clone();
        let body = body.with_checks(checks);

        Ok(HealthResponse {
            code: status.code,
            body,
        })
    }
}

/// Builder for [`HealthEndpoint`].
///
/// Supplying a literal `version`/`description` implies allowing the field;
/// explicitly disallowing it while a literal is set is a configuration error
/// raised once by `build`, never per request. The `service_*` values are the
/// owning service's own attributes, used as fallbacks when the field is
/// allowed without a literal.
#[derive(Default)]
pub struct HealthEndpointBuilder {
    conditions: Vec<Condition>,
    policy: StatusPolicy,
    allow_version: Option<bool>,
    version: Option<String>,
    service_version: Option<String>,
    allow_description: Option<bool>,
    description: Option<String>,
    service_description: Option<String>,
    release_id: Option<Supplier<Option<String>>>,
    notes: Option<Supplier<Option<Vec<String>>>>,
    service_id: Option<String>,
    links: Option<BTreeMap<String, String>>,
}

impl HealthEndpointBuilder {
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn allow_version(mut self, allow: bool) -> Self {
        self.allow_version = Some(allow);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    pub fn allow_description(mut self, allow: bool) -> Self {
        self.allow_description = Some(allow);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn service_description(mut self, description: impl Into<String>) -> Self {
        self.service_description = Some(description.into());
        self
    }

    /// Per-request supplier of the `releaseId` field.
    pub fn release_id<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.release_id = Some(Arc::new(supplier));
        self
    }

    /// Per-request supplier of the `notes` field.
    pub fn notes<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> Option<Vec<String>> + Send + Sync + 'static,
    {
        self.notes = Some(Arc::new(supplier));
        self
    }

    pub fn service_id(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = Some(service_id.into());
        self
    }

    pub fn link(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.links
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), url.into());
        self
    }

    pub fn pass_status(mut self, status: Status) -> Self {
        self.policy.pass = status;
        self
    }

    pub fn warn_status(mut self, status: Status) -> Self {
        self.policy.warn = status;
        self
    }

    pub fn fail_status(mut self, status: Status) -> Self {
        self.policy.fail = status;
        self
    }

    pub fn build(self) -> Result<HealthEndpoint, ConfigError> {
        if self.allow_version == Some(false) {
            if let Some(version) = &self.version {
                return Err(ConfigError::VersionNotAllowed(version.clone()));
            }
        }
        if self.allow_description == Some(false) && self.description.is_some() {
            return Err(ConfigError::DescriptionNotAllowed);
        }
        Ok(HealthEndpoint {
            allow_version: self.allow_version.unwrap_or(self.version.is_some()),
            allow_description: self.allow_description.unwrap_or(self.description.is_some()),
            conditions: self.conditions,
            policy: self.policy,
            version: self.version,
            service_version: self.service_version,
            description: self.description,
            service_description: self.service_description,
            release_id: self.release_id,
            notes: self.notes,
            service_id: self.service_id,
            links: self.links,
        })
    }
}
