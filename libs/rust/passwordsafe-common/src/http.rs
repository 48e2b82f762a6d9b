//! HTTP client configuration and building.
//!
//! Every Password Safe session owns exactly one pooled client built here.
//! Dropping the client releases its idle connections.

use crate::{SafeError, SafeResult};
use reqwest::{Client, ClientBuilder, Identity};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// PEM-encoded client certificate used for mutual TLS.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// Certificate chain in PEM format
    pub certificate_pem: String,
    /// Private key in PEM format
    pub key_pem: SecretString,
}

impl ClientIdentity {
    /// Create a client identity from PEM strings.
    #[must_use]
    pub fn new(certificate_pem: impl Into<String>, key_pem: impl Into<String>) -> Self {
        Self {
            certificate_pem: certificate_pem.into(),
            key_pem: SecretString::from(key_pem.into()),
        }
    }

    fn to_identity(&self) -> SafeResult<Identity> {
        let mut pem = Vec::with_capacity(
            self.certificate_pem.len() + self.key_pem.expose_secret().len() + 1,
        );
        pem.extend_from_slice(self.certificate_pem.as_bytes());
        pem.push(b'\n');
        pem.extend_from_slice(self.key_pem.expose_secret().as_bytes());
        Identity::from_pem(&pem).map_err(SafeError::HttpClient)
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout (default: 30s)
    pub timeout: Duration,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// Pool idle timeout (default: 90s)
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host (default: 10)
    pub pool_max_idle_per_host: usize,
    /// User agent string
    pub user_agent: String,
    /// Verify the server certificate chain (default: true)
    pub verify_ca: bool,
    /// Optional client certificate for mutual TLS
    pub identity: Option<ClientIdentity>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: concat!("passwordsafe-rust/", env!("CARGO_PKG_VERSION")).to_string(),
            verify_ca: true,
            identity: None,
        }
    }
}

impl HttpConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable or disable server certificate verification.
    #[must_use]
    pub const fn with_verify_ca(mut self, verify: bool) -> Self {
        self.verify_ca = verify;
        self
    }

    /// Present a client certificate on every connection.
    #[must_use]
    pub fn with_identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = Some(identity);
        self
    }
}

/// Build a configured HTTP client.
///
/// The client uses rustls, keeps a cookie store for the server-side session
/// cookie, and pools connections per host.
///
/// # Errors
///
/// Returns an error if the client identity is not valid PEM or the client
/// cannot be built.
pub fn build_http_client(config: &HttpConfig) -> SafeResult<Client> {
    let mut builder = ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .cookie_store(true)
        .use_rustls_tls()
        .danger_accept_invalid_certs(!config.verify_ca);

    if let Some(identity) = &config.identity {
        builder = builder.identity(identity.to_identity()?);
    }

    builder.build().map_err(SafeError::HttpClient)
}
