//! Blocking client for the Airlock text-filtering service.
//!
//! # Overview
//! Submit text for filtering, check service health, and manage named
//! filtering policies over HTTPS, optionally with mutual TLS.
//!
//! # Design
//! - `AirlockClient` is the facade: one method per remote operation, each a
//!   single blocking HTTP call.
//! - `Codec` builds `HttpRequest` values and parses `HttpResponse` values
//!   without I/O; `Operation` describes each endpoint's method, path and
//!   content negotiation.
//! - `Transport` owns the pooled `ureq` agent and TLS context, created once
//!   from `ClientConfig`.
//! - Every non-2xx status is mapped by `error::classify`; calls with no
//!   response at all fail with `ClientError::Transport`.

pub mod client;
pub mod codec;
pub mod config;
pub mod contract;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::AirlockClient;
pub use codec::Codec;
pub use config::{ClientConfig, MutualTlsConfig};
pub use contract::Operation;
pub use error::{classify, ClientError, ErrorKind, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::Transport;
pub use types::{FilterRequest, FilterResult, ServiceStatus};
