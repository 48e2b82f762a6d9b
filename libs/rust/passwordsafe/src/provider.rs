//! Batch results and the common interface of the retrieval workflows.

use async_trait::async_trait;
use passwordsafe_common::{SafeError, SafeResult};
use secrecy::SecretString;
use std::collections::HashMap;
use tracing::warn;

/// Values retrieved by a batch call.
///
/// A failed item is absent from `values`. `last_error` holds only the most
/// recent failure, so compare the requested paths against `values` to find
/// every failed item.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Retrieved values keyed by the path the caller supplied
    pub values: HashMap<String, SecretString>,
    /// Most recent failure, annotated with its path and step
    pub last_error: Option<SafeError>,
}

impl BatchResult {
    /// A result with no values and a single error.
    #[must_use]
    pub fn failed(error: SafeError) -> Self {
        Self {
            values: HashMap::new(),
            last_error: Some(error),
        }
    }

    pub(crate) fn insert(&mut self, path: String, value: SecretString) {
        self.values.insert(path, value);
    }

    pub(crate) fn record_failure(&mut self, path: &str, step: &'static str, error: SafeError) {
        let error = error.for_item(path, step);
        warn!(path, step, kind = ?error.kind(), error = %error, "Batch item failed");
        self.last_error = Some(error);
    }

    /// Number of retrieved values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value was retrieved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value retrieved for a path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&SecretString> {
        self.values.get(path)
    }

    /// Values if every item succeeded, otherwise the last error.
    ///
    /// # Errors
    ///
    /// Returns `last_error` when any item failed.
    pub fn into_result(self) -> SafeResult<HashMap<String, SecretString>> {
        match self.last_error {
            Some(e) => Err(e),
            None => Ok(self.values),
        }
    }

    pub(crate) fn into_single(mut self, path: &str, what: &str) -> SafeResult<SecretString> {
        if let Some(value) = self.values.remove(path.trim()) {
            return Ok(value);
        }
        Err(self
            .last_error
            .unwrap_or_else(|| SafeError::EmptyList(what.to_string())))
    }
}

/// A source of path-addressed secret values.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Retrieve every path, isolating failures per item.
    async fn get_values(&self, paths: &[String]) -> BatchResult;

    /// Retrieve a single path.
    async fn get_value(&self, path: &str) -> SafeResult<SecretString>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use passwordsafe_common::ErrorKind;
    use secrecy::ExposeSecret;

    #[test]
    fn test_record_failure_keeps_only_last_error() {
        let mut result = BatchResult::default();
        result.insert("sys/a".to_string(), SecretString::from("one".to_string()));
        result.record_failure("sys/b", "lookup", SafeError::business(404, "not found"));
        result.record_failure(
            "sys/c",
            "check-in",
            SafeError::technical("CheckIn", Some(504), "timeout"),
        );

        assert_eq!(result.len(), 1);
        let err = result.last_error.as_ref().unwrap();
        assert_eq!(err.kind(), ErrorKind::Technical);
        assert!(err.to_string().contains("sys/c"));
    }

    #[test]
    fn test_into_result() {
        let mut ok = BatchResult::default();
        ok.insert("sys/a".to_string(), SecretString::from("one".to_string()));
        assert_eq!(ok.into_result().unwrap()["sys/a"].expose_secret(), "one");

        let failed = BatchResult::failed(SafeError::EmptyList("secret".to_string()));
        assert_eq!(failed.into_result().unwrap_err().to_string(), "empty secret list");
    }

    #[test]
    fn test_into_single_falls_back_to_error() {
        let result = BatchResult::default();
        let err = result.into_single("sys/a", "managed account").unwrap_err();
        assert!(matches!(err, SafeError::EmptyList(_)));
    }
}
