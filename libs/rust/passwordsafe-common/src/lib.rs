//! Shared plumbing for the Password Safe client crates.
//!
//! This crate provides:
//! - The error taxonomy (technical / business / validation)
//! - Retry policy with randomized exponential backoff
//! - HTTP client configuration and building
//! - Tracing subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod retry;
pub mod tracing_config;

pub use error::{ErrorKind, SafeError, SafeResult};
pub use http::{ClientIdentity, HttpConfig, build_http_client};
pub use retry::{Backoff, RetryConfig, RetryPolicy};
pub use tracing_config::{TracingConfig, init_tracing, try_init_tracing};
