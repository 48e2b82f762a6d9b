//! Password Safe API client.
//!
//! This crate provides:
//! - Configuration from code or `PASSWORD_SAFE_*` environment variables
//! - OAuth client-credentials and API-key sign-in
//! - Managed-account credential release (lookup, request, fetch, check-in)
//! - Secrets Safe retrieval, including file secrets
//! - Managed system creation for API versions 3.0 to 3.2
//!
//! ```no_run
//! use passwordsafe_client::{Authenticator, ClientConfig, ManagedAccountWorkflow};
//!
//! # async fn run() -> passwordsafe_client::SafeResult<()> {
//! let config = ClientConfig::from_env()?;
//! let session = Authenticator::new(config)?.authenticate().await?;
//! let accounts = ManagedAccountWorkflow::new(&session)
//!     .get_managed_accounts(&["server01/admin"])
//!     .await;
//! println!("released {} credentials", accounts.len());
//! session.sign_out().await
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authentication;
pub mod config;
pub mod managed_account;
pub mod managed_system;
pub mod models;
pub mod provider;
pub mod secrets;
pub mod transport;
pub mod validation;

pub use authentication::{Authenticator, Session};
pub use config::{ApiVersion, ClientConfig, Credentials};
pub use managed_account::{ManagedAccountWorkflow, ReleaseStep, RequestId};
pub use managed_system::{
    ManagedSystem, ManagedSystemClient, ManagedSystemDetails, ManagedSystemV30, ManagedSystemV31,
    ManagedSystemV32,
};
pub use models::{SecretRecord, SecretType, SignInUser};
pub use provider::{BatchResult, SecretSource};
pub use secrets::SecretWorkflow;
pub use transport::{ApiRequest, ApiResponse, AuthHeader, Transport};

pub use passwordsafe_common::{
    ErrorKind, RetryConfig, SafeError, SafeResult, TracingConfig, init_tracing,
};
