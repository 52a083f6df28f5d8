//! Error types for the Airlock client.
//!
//! # Design
//! Every facade operation funnels a non-2xx status through [`classify`], so
//! 401 and 503 always surface as their dedicated variants and every other
//! status lands in `UnknownResponse` with the literal code. `Transport` is
//! reserved for calls that produced no HTTP response at all (timeout, refused
//! connection, TLS handshake failure); it never carries a status code.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned by `AirlockClient` and its building blocks.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration was missing or invalid, or TLS material could not be
    /// loaded. Only returned while constructing a client.
    #[error("invalid client configuration: {0}")]
    Configuration(String),

    /// A policy name that cannot be carried as a URL path segment (`.` or
    /// `..`). Rejected before any request is sent.
    #[error("policy name '{0}' cannot be addressed in a URL path")]
    InvalidPolicyName(String),

    /// The service answered 401.
    #[error("unauthorized: the service rejected the client (HTTP 401)")]
    Unauthorized,

    /// The service answered 503.
    #[error("service unavailable (HTTP 503)")]
    ServiceUnavailable,

    /// The service answered with a non-2xx status other than 401 or 503.
    #[error("unknown error: HTTP {status}")]
    UnknownResponse { status: u16 },

    /// No HTTP response was obtained.
    #[error("transport failure: {0}")]
    Transport(#[source] ureq::Error),

    /// A 2xx response body could not be decoded into the expected type.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Fieldless tag for matching on a [`ClientError`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    InvalidPolicyName,
    Unauthorized,
    ServiceUnavailable,
    UnknownResponse,
    Transport,
    Decode,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Configuration(_) => ErrorKind::Configuration,
            ClientError::InvalidPolicyName(_) => ErrorKind::InvalidPolicyName,
            ClientError::Unauthorized => ErrorKind::Unauthorized,
            ClientError::ServiceUnavailable => ErrorKind::ServiceUnavailable,
            ClientError::UnknownResponse { .. } => ErrorKind::UnknownResponse,
            ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// The HTTP status behind this error, if the service responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized => Some(401),
            ClientError::ServiceUnavailable => Some(503),
            ClientError::UnknownResponse { status } => Some(*status),
            _ => None,
        }
    }
}

/// Map a non-2xx status code to its error variant.
///
/// Callers are expected to have already handled 2xx; passing a success code
/// yields `UnknownResponse` carrying that code.
pub fn classify(status: u16) -> ClientError {
    match status {
        401 => ClientError::Unauthorized,
        503 => ClientError::ServiceUnavailable,
        status => ClientError::UnknownResponse { status },
    }
}
