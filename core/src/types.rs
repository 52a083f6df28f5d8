//! Domain types exchanged with the Airlock service.
//!
//! # Design
//! Policies travel as opaque text and are never modelled here. `FilterResult`
//! is likewise kept opaque: the client guarantees only that it decoded a JSON
//! object, and exposes field lookup on top of it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input for one apply-filter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    /// Arbitrary label the service uses to group related requests.
    pub context: Option<String>,
    /// Document identifier. The service assigns one when absent.
    pub document_id: Option<String>,
    pub policy_name: String,
    /// Raw text, sent as `text/plain`.
    pub text: String,
}

impl FilterRequest {
    pub fn new(policy_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            context: None,
            document_id: None,
            policy_name: policy_name.into(),
            text: text.into(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }
}

/// Outcome of an apply-filter call, as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterResult(Map<String, Value>);

impl FilterResult {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Field lookup narrowed to string values.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// `true` when the service returned an empty body or `{}`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for FilterResult {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Health indicator reported by `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
}

impl ServiceStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
