//! Local input checks run before any request is sent.

use crate::config::{API_PATH_SEGMENT, ClientConfig, Credentials, MAX_FILE_SECRET_SIZE_LIMIT};
use passwordsafe_common::{SafeError, SafeResult};
use secrecy::ExposeSecret;
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Longest managed system name accepted by the API.
pub const MAX_SYSTEM_NAME_LENGTH: usize = 129;
/// Longest managed account name accepted by the API.
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 246;
/// Longest secret folder path accepted by the API.
pub const MAX_SECRET_PATH_LENGTH: usize = 1792;
/// Longest secret title accepted by the API.
pub const MAX_SECRET_TITLE_LENGTH: usize = 256;

const MAX_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_RETRY_BUDGET: Duration = Duration::from_secs(15 * 60);
const MAX_REQUEST_DURATION_MINUTES: u32 = 7 * 24 * 60;

/// Shape a path must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// `<system><sep><account>`, exactly one separator
    ManagedAccount,
    /// `<folder>[<sep><folder>...]<sep><title>`
    Secret,
}

/// Outcome of [`validate_paths`].
#[derive(Debug, Default)]
pub struct ValidatedPaths {
    /// Trimmed, de-duplicated paths in first-seen order
    pub valid: Vec<String>,
    /// Rejected input paths with the reason
    pub rejected: Vec<(String, SafeError)>,
}

/// Trim, de-duplicate and check each path.
#[must_use]
pub fn validate_paths<S: AsRef<str>>(
    paths: &[S],
    separator: char,
    kind: PathKind,
) -> ValidatedPaths {
    let mut seen = HashSet::new();
    let mut out = ValidatedPaths::default();

    for raw in paths {
        let path = raw.as_ref().trim();
        if !seen.insert(path.to_string()) {
            continue;
        }
        match validate_path(path, separator, kind) {
            Ok(()) => out.valid.push(path.to_string()),
            Err(e) => {
                warn!(path, error = %e, "Skipping invalid path");
                out.rejected.push((path.to_string(), e));
            }
        }
    }

    out
}

/// Check a single trimmed path.
///
/// # Errors
///
/// Returns a validation error naming the broken rule.
pub fn validate_path(path: &str, separator: char, kind: PathKind) -> SafeResult<()> {
    let segments: Vec<&str> = path.split(separator).collect();
    match kind {
        PathKind::ManagedAccount => {
            let [system, account] = segments.as_slice() else {
                return Err(SafeError::validation(format!(
                    "managed account path {path:?} must contain exactly one {separator:?}"
                )));
            };
            check_segment("system name", system, MAX_SYSTEM_NAME_LENGTH)?;
            check_segment("account name", account, MAX_ACCOUNT_NAME_LENGTH)
        }
        PathKind::Secret => {
            let Some((title, folders)) = segments.split_last().filter(|(_, f)| !f.is_empty())
            else {
                return Err(SafeError::validation(format!(
                    "secret path {path:?} must contain a folder and a title"
                )));
            };
            check_segment("secret title", title, MAX_SECRET_TITLE_LENGTH)?;
            let folder_path = folders.join("/");
            check_segment("secret path", &folder_path, MAX_SECRET_PATH_LENGTH)
        }
    }
}

fn check_segment(what: &str, value: &str, max: usize) -> SafeResult<()> {
    if value.trim().is_empty() {
        return Err(SafeError::validation(format!("{what} is empty")));
    }
    let len = value.chars().count();
    if len > max {
        return Err(SafeError::validation(format!(
            "{what} is {len} characters, above the {max} character limit"
        )));
    }
    Ok(())
}

/// Check a client configuration.
///
/// # Errors
///
/// Returns a validation error describing the first invalid setting.
pub fn validate_config(config: &ClientConfig) -> SafeResult<()> {
    let url = Url::parse(&config.api_url)
        .map_err(|e| SafeError::validation(format!("invalid API URL: {e}")))?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(SafeError::validation(format!(
            "API URL scheme must be https, got {}",
            url.scheme()
        )));
    }
    if !url.path().contains(API_PATH_SEGMENT) {
        return Err(SafeError::validation(format!(
            "API URL must contain {API_PATH_SEGMENT}"
        )));
    }

    match &config.credentials {
        Credentials::OAuth {
            client_id,
            client_secret,
        } => {
            if client_id.is_empty() || client_id.chars().any(char::is_whitespace) {
                return Err(SafeError::validation("client id is empty or contains whitespace"));
            }
            if client_secret.expose_secret().is_empty() {
                return Err(SafeError::validation("client secret is empty"));
            }
        }
        Credentials::ApiKey(key) => {
            if key.expose_secret().trim().is_empty() {
                return Err(SafeError::validation("API key is empty"));
            }
        }
    }

    let timeout = config.http.timeout;
    if timeout < Duration::from_secs(1) || timeout > MAX_TIMEOUT {
        return Err(SafeError::validation(format!(
            "timeout must be between 1 and {} seconds",
            MAX_TIMEOUT.as_secs()
        )));
    }

    if config.retry.max_elapsed_time > MAX_RETRY_BUDGET {
        return Err(SafeError::validation(format!(
            "retry budget must not exceed {} minutes",
            MAX_RETRY_BUDGET.as_secs() / 60
        )));
    }

    if config.separator.is_alphanumeric() || config.separator.is_whitespace() {
        return Err(SafeError::validation(format!(
            "separator {:?} must be a punctuation character",
            config.separator
        )));
    }

    if config.max_file_secret_size == 0 || config.max_file_secret_size > MAX_FILE_SECRET_SIZE_LIMIT
    {
        return Err(SafeError::validation(format!(
            "max file secret size must be between 1 and {MAX_FILE_SECRET_SIZE_LIMIT} bytes"
        )));
    }

    if config.request_duration_minutes == 0
        || config.request_duration_minutes > MAX_REQUEST_DURATION_MINUTES
    {
        return Err(SafeError::validation(format!(
            "request duration must be between 1 and {MAX_REQUEST_DURATION_MINUTES} minutes"
        )));
    }

    Ok(())
}
