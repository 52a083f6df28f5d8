//! Blocking client for the Airlock filtering service.
//!
//! # Design
//! `AirlockClient` pairs a [`Codec`] with a [`Transport`]. Every operation
//! goes through [`AirlockClient::call`]: build the request, execute it once,
//! parse the response. No retries, no caching; each call re-fetches.
//!
//! The client is `Send + Sync` and cheap to clone. Clones share the
//! transport's connection pool and TLS context.

use tracing::{debug, warn};

use crate::codec::Codec;
use crate::config::ClientConfig;
use crate::contract::Operation;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{FilterRequest, FilterResult, ServiceStatus};

/// Typed handle to one Airlock endpoint.
///
/// ```no_run
/// use airlock_core::{AirlockClient, ClientConfig, FilterRequest};
///
/// let client = AirlockClient::new(ClientConfig::new("https://airlock.local:8080"))?;
/// let result = client.apply(&FilterRequest::new("default", "My SSN is 123-45-6789."))?;
/// println!("{:?}", result.get_str("filteredText"));
/// # Ok::<(), airlock_core::ClientError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AirlockClient {
    config: ClientConfig,
    codec: Codec,
    transport: Transport,
}

impl AirlockClient {
    /// Validate `config`, load any TLS material and set up the connection
    /// pool. Fails with `ClientError::Configuration`; never touches the
    /// network.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        let transport = Transport::new(&config)?;
        debug!(
            endpoint = %endpoint,
            timeout_secs = config.timeout_secs,
            max_idle_connections = config.max_idle_connections,
            keep_alive_ms = config.keep_alive_ms,
            mutual_tls = config.mutual_tls_material()?.is_some(),
            "airlock client ready"
        );
        Ok(Self {
            config,
            codec: Codec::new(endpoint)?,
            transport,
        })
    }

    /// Send through a caller-built `ureq::Agent` instead of one built from
    /// `config`.
    ///
    /// Only `config.endpoint` is used; timeouts, pooling and TLS are whatever
    /// the agent was configured with. An agent that reports statuses as
    /// errors still gets the usual 401/503 mapping.
    pub fn with_agent(config: ClientConfig, agent: ureq::Agent) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        debug!(endpoint = %endpoint, "airlock client ready with caller-supplied agent");
        Ok(Self {
            config,
            codec: Codec::new(endpoint)?,
            transport: Transport::from_agent(agent),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Filter `request.text` with the named policy.
    pub fn apply(&self, request: &FilterRequest) -> Result<FilterResult> {
        self.call(
            Operation::Apply,
            self.codec.build_apply(request),
            Codec::parse_apply,
        )
    }

    pub fn status(&self) -> Result<ServiceStatus> {
        self.call(
            Operation::Status,
            self.codec.build_status(),
            Codec::parse_status,
        )
    }

    /// Policy names in the order the service returns them.
    pub fn list_policies(&self) -> Result<Vec<String>> {
        self.call(
            Operation::ListPolicies,
            self.codec.build_list_policies(),
            Codec::parse_list_policies,
        )
    }

    /// Raw policy document. `.` and `..` are rejected with
    /// `ClientError::InvalidPolicyName` without a request.
    pub fn get_policy(&self, name: &str) -> Result<String> {
        self.call(
            Operation::GetPolicy,
            self.codec.build_get_policy(name)?,
            Codec::parse_get_policy,
        )
    }

    /// Store or overwrite a policy. The service takes the name from the
    /// document itself.
    pub fn save_policy(&self, content: &str) -> Result<()> {
        self.call(
            Operation::SavePolicy,
            self.codec.build_save_policy(content),
            Codec::parse_save_policy,
        )
    }

    pub fn delete_policy(&self, name: &str) -> Result<()> {
        self.call(
            Operation::DeletePolicy,
            self.codec.build_delete_policy(name)?,
            Codec::parse_delete_policy,
        )
    }

    fn call<T>(
        &self,
        operation: Operation,
        request: HttpRequest,
        parse: impl FnOnce(&Codec, HttpResponse) -> Result<T>,
    ) -> Result<T> {
        debug!(%operation, method = %request.method, url = %request.url, "sending request");
        let response = self.transport.execute(&request).inspect_err(|err| {
            warn!(%operation, error = %err, "request failed without a response");
        })?;

        let status = response.status;
        debug!(%operation, status, "received response");
        parse(&self.codec, response).inspect_err(|err| {
            warn!(%operation, status, error = %err, "request failed");
        })
    }
}
