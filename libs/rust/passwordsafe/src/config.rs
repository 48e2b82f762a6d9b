//! Client configuration.
//!
//! Configuration is built per client instance, either through the `with_*`
//! builders or from `PASSWORD_SAFE_*` environment variables.

use passwordsafe_common::{ClientIdentity, HttpConfig, RetryConfig, SafeError, SafeResult};
use secrecy::SecretString;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Path segment every API URL must contain.
pub const API_PATH_SEGMENT: &str = "/BeyondTrust/api/public/v3";

/// Default lease length of an access request.
pub const DEFAULT_REQUEST_DURATION_MINUTES: u32 = 5;

/// Upper bound for `max_file_secret_size`.
pub const MAX_FILE_SECRET_SIZE_LIMIT: u64 = 5_000_000;

/// How the client proves its identity to the API.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// OAuth client-credentials grant
    OAuth {
        /// OAuth client id
        client_id: String,
        /// OAuth client secret
        client_secret: SecretString,
    },
    /// Static API key registered for the application
    ApiKey(SecretString),
}

impl Credentials {
    /// OAuth client credentials.
    #[must_use]
    pub fn oauth(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::OAuth {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
        }
    }

    /// Static API key.
    #[must_use]
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(SecretString::from(key.into()))
    }
}

/// Managed-system API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApiVersion {
    /// Version 3.0
    #[default]
    V30,
    /// Version 3.1, adds the remote client type
    V31,
    /// Version 3.2, adds application host settings
    V32,
}

impl ApiVersion {
    /// Version string as sent in the `version` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V30 => "3.0",
            Self::V31 => "3.1",
            Self::V32 => "3.2",
        }
    }
}

impl FromStr for ApiVersion {
    type Err = SafeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "3.0" => Ok(Self::V30),
            "3.1" => Ok(Self::V31),
            "3.2" => Ok(Self::V32),
            other => Err(SafeError::validation(format!(
                "unsupported API version: {other}"
            ))),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Password Safe client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base API URL, e.g. `https://host/BeyondTrust/api/public/v3`
    pub api_url: String,
    /// OAuth client credentials or API key
    pub credentials: Credentials,
    /// Managed-system API version
    pub api_version: ApiVersion,
    /// HTTP client settings (timeouts, TLS)
    pub http: HttpConfig,
    /// Backoff settings for every API call
    pub retry: RetryConfig,
    /// Separator between system/account or folder/title in paths
    pub separator: char,
    /// Largest file secret accepted, in bytes
    pub max_file_secret_size: u64,
    /// Lease length of access requests
    pub request_duration_minutes: u32,
    /// Reason attached to access requests
    pub request_reason: String,
}

impl ClientConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new(api_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            api_url: api_url.into(),
            credentials,
            api_version: ApiVersion::default(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            separator: '/',
            max_file_secret_size: MAX_FILE_SECRET_SIZE_LIMIT,
            request_duration_minutes: DEFAULT_REQUEST_DURATION_MINUTES,
            request_reason: "Password Safe client credential request".to_string(),
        }
    }

    /// Load configuration from environment variables (and `.env`).
    ///
    /// # Errors
    ///
    /// Returns a validation error if required variables are missing or a
    /// value cannot be parsed.
    pub fn from_env() -> SafeResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> SafeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("PASSWORD_SAFE_API_URL")
            .ok_or_else(|| SafeError::validation("PASSWORD_SAFE_API_URL is not set"))?;

        let credentials = match (
            lookup("PASSWORD_SAFE_API_KEY"),
            lookup("PASSWORD_SAFE_CLIENT_ID"),
            lookup("PASSWORD_SAFE_CLIENT_SECRET"),
        ) {
            (Some(key), _, _) => Credentials::api_key(key),
            (None, Some(id), Some(secret)) => Credentials::oauth(id, secret),
            _ => {
                return Err(SafeError::validation(concat!(
                    "set PASSWORD_SAFE_API_KEY or ",
                    "PASSWORD_SAFE_CLIENT_ID and PASSWORD_SAFE_CLIENT_SECRET",
                )));
            }
        };

        let mut config = Self::new(api_url, credentials)
            .with_timeout(Duration::from_secs(parse_var(
                &lookup,
                "PASSWORD_SAFE_TIMEOUT_SECONDS",
                30,
            )?))
            .with_verify_ca(parse_var(&lookup, "PASSWORD_SAFE_VERIFY_CA", true)?)
            .with_max_file_secret_size(parse_var(
                &lookup,
                "PASSWORD_SAFE_MAX_FILE_SECRET_SIZE",
                MAX_FILE_SECRET_SIZE_LIMIT,
            )?)
            .with_separator(parse_var(&lookup, "PASSWORD_SAFE_SEPARATOR", '/')?)
            .with_api_version(parse_var(
                &lookup,
                "PASSWORD_SAFE_API_VERSION",
                ApiVersion::default(),
            )?);

        let max_elapsed = parse_var(&lookup, "PASSWORD_SAFE_RETRY_MAX_ELAPSED_SECONDS", 120)?;
        config.retry = config
            .retry
            .with_max_elapsed_time(Duration::from_secs(max_elapsed));

        match (
            lookup("PASSWORD_SAFE_CLIENT_CERTIFICATE"),
            lookup("PASSWORD_SAFE_CLIENT_CERTIFICATE_KEY"),
        ) {
            (Some(cert), Some(key)) => {
                config = config.with_client_identity(ClientIdentity::new(cert, key));
            }
            (None, None) => {}
            _ => {
                return Err(SafeError::validation(
                    "client certificate and key must be configured together",
                ));
            }
        }

        Ok(config)
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    /// Enable or disable server certificate verification.
    #[must_use]
    pub const fn with_verify_ca(mut self, verify: bool) -> Self {
        self.http.verify_ca = verify;
        self
    }

    /// Present a client certificate.
    #[must_use]
    pub fn with_client_identity(mut self, identity: ClientIdentity) -> Self {
        self.http.identity = Some(identity);
        self
    }

    /// Replace the retry settings.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the path separator.
    #[must_use]
    pub const fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Set the largest accepted file secret, in bytes.
    #[must_use]
    pub const fn with_max_file_secret_size(mut self, bytes: u64) -> Self {
        self.max_file_secret_size = bytes;
        self
    }

    /// Set the managed-system API version.
    #[must_use]
    pub const fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Set the reason attached to access requests.
    #[must_use]
    pub fn with_request_reason(mut self, reason: impl Into<String>) -> Self {
        self.request_reason = reason.into();
        self
    }

    /// Set the lease length of access requests.
    #[must_use]
    pub const fn with_request_duration(mut self, minutes: u32) -> Self {
        self.request_duration_minutes = minutes;
        self
    }

    /// Check the configuration before any network call.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the first invalid setting.
    pub fn validate(&self) -> SafeResult<()> {
        crate::validation::validate_config(self)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> SafeResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| SafeError::validation(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}
