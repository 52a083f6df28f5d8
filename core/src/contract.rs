//! The fixed set of remote operations exposed by the Airlock service.
//!
//! Each [`Operation`] knows its method, path template and content
//! negotiation. The codec reads these instead of hard-coding them per call.

use std::fmt;

use crate::http::HttpMethod;

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// Query parameter carrying the apply context.
pub const PARAM_CONTEXT: &str = "c";
/// Query parameter carrying the policy name to apply.
pub const PARAM_POLICY: &str = "p";
/// Query parameter carrying the document identifier.
pub const PARAM_DOCUMENT_ID: &str = "d";

/// Placeholder segment replaced by a percent-encoded policy name.
pub const NAME_SEGMENT: &str = "{name}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Status,
    Apply,
    ListPolicies,
    GetPolicy,
    SavePolicy,
    DeletePolicy,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Status,
        Operation::Apply,
        Operation::ListPolicies,
        Operation::GetPolicy,
        Operation::SavePolicy,
        Operation::DeletePolicy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Status => "status",
            Operation::Apply => "apply",
            Operation::ListPolicies => "list_policies",
            Operation::GetPolicy => "get_policy",
            Operation::SavePolicy => "save_policy",
            Operation::DeletePolicy => "delete_policy",
        }
    }

    pub fn method(self) -> HttpMethod {
        match self {
            Operation::Status | Operation::ListPolicies | Operation::GetPolicy => HttpMethod::Get,
            Operation::Apply | Operation::SavePolicy => HttpMethod::Post,
            Operation::DeletePolicy => HttpMethod::Delete,
        }
    }

    /// Absolute path, with [`NAME_SEGMENT`] standing in for a policy name.
    pub fn path_template(self) -> &'static str {
        match self {
            Operation::Status => "/api/status",
            Operation::Apply => "/api/policies/apply",
            Operation::ListPolicies | Operation::SavePolicy => "/api/policies",
            Operation::GetPolicy | Operation::DeletePolicy => "/api/policies/{name}",
        }
    }

    /// Value of the `Accept` header, if the operation negotiates one.
    pub fn accept(self) -> Option<&'static str> {
        match self {
            Operation::Status | Operation::ListPolicies => Some(APPLICATION_JSON),
            Operation::Apply | Operation::GetPolicy => Some(TEXT_PLAIN),
            Operation::SavePolicy | Operation::DeletePolicy => None,
        }
    }

    /// Value of the `Content-Type` header for operations that send a body.
    pub fn content_type(self) -> Option<&'static str> {
        match self {
            Operation::Apply => Some(TEXT_PLAIN),
            Operation::SavePolicy => Some(APPLICATION_JSON),
            _ => None,
        }
    }

    pub fn has_body(self) -> bool {
        self.content_type().is_some()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
