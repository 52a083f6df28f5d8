//! Connection configuration for `AirlockClient`.
//!
//! # Design
//! `ClientConfig` is plain data with named defaults. It derives `Deserialize`
//! so a host application can embed it in its own configuration file; the
//! crate itself never reads files or environment variables for settings.
//! Validation happens once, when a client is built from it.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, Result};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 20;
pub const DEFAULT_KEEP_ALIVE_MS: u64 = 30_000;

/// Settings fixed at client construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the service. Only scheme, host and port are used; operation
    /// paths are absolute.
    pub endpoint: String,

    /// Applied to name resolution, connect, send and receive alike.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,

    /// Idle pooled connections older than this are evicted.
    #[serde(default = "default_keep_alive_ms")]
    pub keep_alive_ms: u64,

    #[serde(default)]
    pub mutual_tls: Option<MutualTlsConfig>,
}

/// Key and trust stores for mutual TLS.
///
/// The identity is a password-protected PKCS#12 keystore holding the client
/// private key and its certificate chain. The trust store is either a
/// PKCS#12 file (opened with `trust_password`) or a PEM bundle of CA
/// certificates. Passwords are never serialized.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutualTlsConfig {
    pub identity_path: PathBuf,
    #[serde(default, skip_serializing)]
    pub identity_password: Option<String>,
    pub trust_path: PathBuf,
    #[serde(default, skip_serializing)]
    pub trust_password: Option<String>,
}

impl MutualTlsConfig {
    pub fn new(
        identity_path: impl Into<PathBuf>,
        identity_password: impl Into<String>,
        trust_path: impl Into<PathBuf>,
        trust_password: impl Into<String>,
    ) -> Self {
        Self {
            identity_path: identity_path.into(),
            identity_password: Some(identity_password.into()),
            trust_path: trust_path.into(),
            trust_password: Some(trust_password.into()),
        }
    }
}

impl fmt::Debug for MutualTlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |password: &Option<String>| password.as_ref().map(|_| "***");
        f.debug_struct("MutualTlsConfig")
            .field("identity_path", &self.identity_path)
            .field("identity_password", &redact(&self.identity_password))
            .field("trust_path", &self.trust_path)
            .field("trust_password", &redact(&self.trust_password))
            .finish()
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_idle_connections() -> usize {
    DEFAULT_MAX_IDLE_CONNECTIONS
}

fn default_keep_alive_ms() -> u64 {
    DEFAULT_KEEP_ALIVE_MS
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
            keep_alive_ms: DEFAULT_KEEP_ALIVE_MS,
            mutual_tls: None,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_idle_connections(mut self, max_idle_connections: usize) -> Self {
        self.max_idle_connections = max_idle_connections;
        self
    }

    pub fn with_keep_alive_ms(mut self, keep_alive_ms: u64) -> Self {
        self.keep_alive_ms = keep_alive_ms;
        self
    }

    pub fn with_mutual_tls(mut self, mutual_tls: MutualTlsConfig) -> Self {
        self.mutual_tls = Some(mutual_tls);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    /// Parse and check the endpoint. Must be an absolute `http`/`https` URL
    /// with a host.
    pub fn endpoint_url(&self) -> Result<Url> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ClientError::Configuration(
                "endpoint is required".to_string(),
            ));
        }
        let url = Url::parse(endpoint).map_err(|e| {
            ClientError::Configuration(format!("invalid endpoint '{endpoint}': {e}"))
        })?;
        check_endpoint(&url)?;
        Ok(url)
    }

    /// Mutual-TLS material to load, or `None` for platform trust.
    ///
    /// Mutual TLS is enabled only by a non-empty identity path. An identity
    /// without a password or without a trust store is rejected.
    pub fn mutual_tls_material(&self) -> Result<Option<&MutualTlsConfig>> {
        let Some(mtls) = &self.mutual_tls else {
            return Ok(None);
        };
        if mtls.identity_path.as_os_str().is_empty() {
            return Ok(None);
        }
        if mtls.identity_password.is_none() {
            return Err(ClientError::Configuration(format!(
                "identity '{}' is set but no identity password was given",
                mtls.identity_path.display()
            )));
        }
        if mtls.trust_path.as_os_str().is_empty() {
            return Err(ClientError::Configuration(format!(
                "identity '{}' is set but no trust bundle was given",
                mtls.identity_path.display()
            )));
        }
        Ok(Some(mtls))
    }

    /// Check everything that can be checked without reading files.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        if self.timeout_secs == 0 {
            return Err(ClientError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        self.mutual_tls_material()?;
        Ok(())
    }
}

/// An endpoint must be an `http`/`https` URL with a host, usable as a base
/// for operation paths.
pub(crate) fn check_endpoint(url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Configuration(format!(
            "endpoint scheme '{}' is not http or https",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
        return Err(ClientError::Configuration(format!(
            "endpoint '{url}' has no host"
        )));
    }
    Ok(())
}
