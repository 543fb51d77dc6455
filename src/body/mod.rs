// src/body/mod.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::condition::runner::CheckMap;

/// The `application/health+json` response payload. Only `status` is
/// required; everything absent is omitted from the serialized form rather
/// than emitted as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "releaseId", skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<CheckMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<BTreeMap<String, String>>,
    #[serde(rename = "serviceId", skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HealthBody {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Self::default()
        }
    }

    /// Attach the checks mapping. Entries whose check list is empty are
    /// dropped, and when nothing remains the field is omitted entirely.
    pub fn with_checks(mut self, checks: CheckMap) -> Self {
        let retained: CheckMap = checks
            .into_iter()
            .filter(|(_, checks)| !checks.is_empty())
            .collect();
        if !retained.is_empty() {
            self.checks = Some(retained);
        }
        self
    }
}
