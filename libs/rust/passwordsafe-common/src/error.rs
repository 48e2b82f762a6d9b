//! Error taxonomy shared by every Password Safe API call.
//!
//! Each failure falls into one of three kinds: technical failures are
//! transient and retried under backoff, business failures are well-formed
//! rejections from the remote service and are never retried, and validation
//! failures are raised locally before any request leaves the process.

use thiserror::Error;

/// Coarse classification of a [`SafeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Infrastructure failure, eligible for retry.
    Technical,
    /// Semantic rejection or empty/invalid result from the remote service.
    Business,
    /// Caller input rejected before any network call.
    Validation,
}

/// Errors raised by the Password Safe client.
#[derive(Error, Debug)]
pub enum SafeError {
    /// Connection failure, timeout or a 5xx/408/429 response.
    #[error("{operation} failed: {cause}")]
    Technical {
        /// Name of the API operation
        operation: String,
        /// HTTP status, when the server answered at all
        status: Option<u16>,
        /// Underlying cause
        cause: String,
    },

    /// Well-formed rejection from the remote service.
    #[error("error - status code: {status} - {body}")]
    Business {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A list endpoint returned no items.
    #[error("empty {0} list")]
    EmptyList(String),

    /// Local input check failed.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// File secret larger than the configured limit.
    #[error("file secret {title} is {size} bytes, above the {limit} byte limit")]
    FileTooLarge {
        /// Secret title
        title: String,
        /// Reported or downloaded size in bytes
        size: u64,
        /// Configured maximum in bytes
        limit: u64,
    },

    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// One item of a batch failed at the given step.
    #[error("{reference}: {step} failed: {source}")]
    ItemFailed {
        /// Path of the item as supplied by the caller
        reference: String,
        /// Workflow step that failed
        step: &'static str,
        /// Underlying error
        #[source]
        source: Box<SafeError>,
    },
}

/// Result type for Password Safe operations.
pub type SafeResult<T> = Result<T, SafeError>;

impl SafeError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Technical { .. } => ErrorKind::Technical,
            Self::Business { .. } | Self::EmptyList(_) | Self::Serialization(_) => {
                ErrorKind::Business
            }
            Self::Validation(_) | Self::FileTooLarge { .. } | Self::HttpClient(_) => {
                ErrorKind::Validation
            }
            Self::ItemFailed { source, .. } => source.kind(),
        }
    }

    /// Check if the error should be retried under backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Technical
    }

    /// Create a technical error.
    #[must_use]
    pub fn technical(
        operation: impl Into<String>,
        status: Option<u16>,
        cause: impl Into<String>,
    ) -> Self {
        Self::Technical {
            operation: operation.into(),
            status,
            cause: cause.into(),
        }
    }

    /// Create a business error from a status code and response body.
    #[must_use]
    pub fn business(status: u16, body: impl Into<String>) -> Self {
        Self::Business {
            status,
            body: body.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Annotate the error with the batch item and step it belongs to.
    #[must_use]
    pub fn for_item(self, reference: impl Into<String>, step: &'static str) -> Self {
        Self::ItemFailed {
            reference: reference.into(),
            step,
            source: Box::new(self),
        }
    }

    /// HTTP status attached to the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Technical { status, .. } => *status,
            Self::Business { status, .. } => Some(*status),
            Self::ItemFailed { source, .. } => source.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_display_carries_status_and_body() {
        let err = SafeError::business(404, "Managed account not found");
        assert_eq!(
            err.to_string(),
            "error - status code: 404 - Managed account not found"
        );
    }

    #[test]
    fn test_empty_list_display() {
        let err = SafeError::EmptyList("managed account".to_string());
        assert_eq!(err.to_string(), "empty managed account list");
        assert_eq!(err.kind(), ErrorKind::Business);
    }

    #[test]
    fn test_only_technical_errors_are_retryable() {
        assert!(SafeError::technical("Lookup", Some(503), "unavailable").is_retryable());
        assert!(!SafeError::business(400, "bad request").is_retryable());
        assert!(!SafeError::validation("empty path").is_retryable());
        assert!(!SafeError::EmptyList("secret".to_string()).is_retryable());
    }

    #[test]
    fn test_item_failed_inherits_kind_and_status() {
        let err = SafeError::technical("CheckIn", Some(504), "gateway timeout")
            .for_item("sysA/acct2", "check-in");

        assert_eq!(err.kind(), ErrorKind::Technical);
        assert_eq!(err.status(), Some(504));
        assert!(err.to_string().starts_with("sysA/acct2: check-in failed:"));
    }
}
