//! Blocking HTTP(S) transport built once from a [`ClientConfig`].
//!
//! # Design
//! A single `ureq::Agent` owns the connection pool and TLS context. Cloning a
//! `Transport` clones the agent handle, so all clones share one pool; the
//! agent synchronizes pool access internally. Status codes are returned as
//! data and interpreted by the codec, so an `Err` from `execute` always means
//! no response was obtained.
//!
//! Building a transport reads TLS material from disk but performs no network
//! I/O. Identities are PKCS#12 keystores; trust stores are PKCS#12 or PEM.
//! A caller may instead supply a ready-made agent via
//! [`Transport::from_agent`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use p12_keystore::{KeyStore, KeyStoreEntry};
use ureq::tls::{
    parse_pem, Certificate, ClientCert, KeyKind, PemItem, PrivateKey, RootCerts, TlsConfig,
};
use ureq::Agent;

use crate::config::{ClientConfig, MutualTlsConfig};
use crate::error::{ClientError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[derive(Clone)]
pub struct Transport {
    agent: Agent,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let timeout = Some(config.timeout());

        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_resolve(timeout)
            .timeout_connect(timeout)
            .timeout_send_request(timeout)
            .timeout_send_body(timeout)
            .timeout_recv_response(timeout)
            .timeout_recv_body(timeout)
            .max_idle_connections(config.max_idle_connections)
            .max_idle_connections_per_host(config.max_idle_connections)
            .max_idle_age(config.keep_alive())
            .tls_config(tls_config(config.mutual_tls_material()?)?)
            .build()
            .new_agent();

        Ok(Self { agent })
    }

    /// Wrap a caller-built agent. None of the timeout, pool or TLS settings
    /// of a `ClientConfig` are applied to it.
    pub fn from_agent(agent: Agent) -> Self {
        Self { agent }
    }

    /// Execute `request` and return the response, whatever its status.
    ///
    /// Agents built by [`Transport::new`] return 4xx/5xx responses as data.
    /// An injected agent that turns statuses into `ureq::Error::StatusCode`
    /// gets the same treatment: the status comes back as a bodiless response,
    /// so only I/O failures are `Err`.
    pub fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = request.url.as_str();
        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), &request.headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), &request.headers).call(),
            HttpMethod::Post => {
                let builder = with_headers(self.agent.post(url), &request.headers);
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = match result {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(status)) => {
                return Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: String::new(),
                })
            }
            Err(e) => return Err(ClientError::Transport(e)),
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = if (200..300).contains(&status) {
            response
                .body_mut()
                .read_to_string()
                .map_err(ClientError::Transport)?
        } else {
            response.body_mut().read_to_string().unwrap_or_default()
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Platform trust without a client certificate, or the configured identity
/// and trust store.
fn tls_config(mutual_tls: Option<&MutualTlsConfig>) -> Result<TlsConfig> {
    let Some(mtls) = mutual_tls else {
        tracing::debug!("using platform trust roots, no client certificate");
        return Ok(TlsConfig::builder()
            .root_certs(RootCerts::PlatformVerifier)
            .build());
    };

    let identity = load_identity(&mtls.identity_path, mtls.identity_password.as_deref())?;
    let roots = load_trust(&mtls.trust_path, mtls.trust_password.as_deref())?;
    tracing::debug!(
        identity = %mtls.identity_path.display(),
        trust = %mtls.trust_path.display(),
        trusted_certs = roots.len(),
        "mutual TLS enabled"
    );

    Ok(TlsConfig::builder()
        .client_cert(Some(identity))
        .root_certs(RootCerts::Specific(Arc::new(roots)))
        .build())
}

/// A PKCS#12 keystore holding exactly one private key and its certificate
/// chain.
fn load_identity(path: &Path, password: Option<&str>) -> Result<ClientCert> {
    let password = password.ok_or_else(|| {
        ClientError::Configuration(format!(
            "identity '{}' requires a password",
            path.display()
        ))
    })?;
    let data = read_material(path, "identity")?;
    let store = open_keystore(path, &data, password)?;

    let mut chains = store.entries().filter_map(|(_, entry)| match entry {
        KeyStoreEntry::PrivateKeyChain(chain) => Some(chain),
        _ => None,
    });
    let chain = chains.next().ok_or_else(|| {
        ClientError::Configuration(format!(
            "identity '{}' contains no private key",
            path.display()
        ))
    })?;
    if chains.next().is_some() {
        return Err(ClientError::Configuration(format!(
            "identity '{}' contains more than one private key",
            path.display()
        )));
    }

    let certs: Vec<Certificate<'static>> = chain
        .chain()
        .iter()
        .map(|cert| Certificate::from_der(cert.as_der()).to_owned())
        .collect();
    if certs.is_empty() {
        return Err(ClientError::Configuration(format!(
            "identity '{}' contains no certificate",
            path.display()
        )));
    }
    let key = PrivateKey::from_der(KeyKind::Pkcs8, chain.key()).to_owned();

    Ok(ClientCert::new_with_certs(&certs, key))
}

/// CA certificates from a PEM bundle, or from a PKCS#12 keystore opened with
/// `password`.
fn load_trust(path: &Path, password: Option<&str>) -> Result<Vec<Certificate<'static>>> {
    let data = read_material(path, "trust store")?;
    let roots = if is_pem(&data) {
        trust_from_pem(path, &data)?
    } else {
        let password = password.ok_or_else(|| {
            ClientError::Configuration(format!(
                "trust store '{}' is PKCS#12 and requires a password",
                path.display()
            ))
        })?;
        trust_from_keystore(&open_keystore(path, &data, password)?)
    };
    if roots.is_empty() {
        return Err(ClientError::Configuration(format!(
            "trust store '{}' contains no certificate",
            path.display()
        )));
    }
    Ok(roots)
}

fn trust_from_pem(path: &Path, pem: &[u8]) -> Result<Vec<Certificate<'static>>> {
    let mut roots = Vec::new();
    for item in parse_pem(pem) {
        let item = item.map_err(|e| {
            ClientError::Configuration(format!("malformed PEM in '{}': {e}", path.display()))
        })?;
        if let PemItem::Certificate(cert) = item {
            roots.push(cert.to_owned());
        }
    }
    Ok(roots)
}

fn trust_from_keystore(store: &KeyStore) -> Vec<Certificate<'static>> {
    let mut roots = Vec::new();
    for (_, entry) in store.entries() {
        match entry {
            KeyStoreEntry::Certificate(cert) => {
                roots.push(Certificate::from_der(cert.as_der()).to_owned());
            }
            KeyStoreEntry::PrivateKeyChain(chain) => roots.extend(
                chain
                    .chain()
                    .iter()
                    .map(|cert| Certificate::from_der(cert.as_der()).to_owned()),
            ),
            _ => {}
        }
    }
    roots
}

/// A wrong password and a corrupt file are indistinguishable here: both fail
/// the PKCS#12 integrity check.
fn open_keystore(path: &Path, data: &[u8], password: &str) -> Result<KeyStore> {
    KeyStore::from_pkcs12(data, password).map_err(|e| {
        ClientError::Configuration(format!(
            "cannot open PKCS#12 keystore '{}' (wrong password or corrupt file): {e}",
            path.display()
        ))
    })
}

fn is_pem(data: &[u8]) -> bool {
    data.trim_ascii_start().starts_with(b"-----BEGIN")
}

fn read_material(path: &Path, what: &str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        ClientError::Configuration(format!("cannot read {what} '{}': {e}", path.display()))
    })
}
