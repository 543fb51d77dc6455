// src/check/mod.rs
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid ISO-8601 time '{value}': {source}")]
    InvalidTime {
        value: String,
        source: chrono::ParseError,
    },
}

/// One observation of a sub-component's health, following the checks object
/// of https://inadarei.github.io/rfc-healthcheck/.
///
/// Every field is optional and absent fields are omitted from the serialized
/// form, so a default `Check` serializes to `{}` and carries no signal.
/// `status` is an open string: only the configured fail/warn names carry
/// aggregation meaning, anything else counts as pass-equivalent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Check {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_endpoints: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<BTreeMap<String, String>>,
}

impl Check {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component_id(mut self, id: impl Into<String>) -> Self {
        self.component_id = Some(id.into());
        self
    }

    pub fn with_component_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = Some(component_type.into());
        self
    }

    pub fn with_observed_value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.observed_value = Some(value.into());
        self
    }

    pub fn with_observed_unit(mut self, unit: impl Into<String>) -> Self {
        self.observed_unit = Some(unit.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_affected_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.affected_endpoints = Some(endpoints);
        self
    }

    /// Set the observation time. The value must be ISO-8601 (either RFC 3339
    /// or a naive `YYYY-MM-DDTHH:MM:SS[.f]` datetime); anything else fails
    /// construction.
    pub fn with_time(mut self, time: impl Into<String>) -> Result<Self, FormatError> {
        let time = time.into();
        parse_iso8601(&time)?;
        self.time = Some(time);
        Ok(self)
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_links(mut self, links: BTreeMap<String, String>) -> Self {
        self.links = Some(links);
        self
    }

    /// True when every field is absent, i.e. the check serializes to `{}`.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_iso8601(value: &str) -> Result<(), FormatError> {
    if DateTime::parse_from_rfc3339(value).is_ok() {
        return Ok(());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|_| ())
        .map_err(|source| FormatError::InvalidTime {
            value: value.to_string(),
            source,
        })
}
