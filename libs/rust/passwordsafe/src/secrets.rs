//! Secrets Safe retrieval.
//!
//! A secret path is `<folder>[<sep><folder>...]<sep><title>`. Text and
//! credential secrets yield their password field; file secrets are
//! downloaded, subject to the configured size limit.

use crate::authentication::Session;
use crate::models::{SecretRecord, SecretType};
use crate::provider::{BatchResult, SecretSource};
use crate::transport::ApiRequest;
use crate::validation::{PathKind, validate_paths};
use async_trait::async_trait;
use passwordsafe_common::{SafeError, SafeResult};
use secrecy::SecretString;
use tracing::{debug, instrument};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Split a secret path into its folder path (joined with `/`) and title.
#[must_use]
pub fn split_secret_path(path: &str, separator: char) -> Option<(String, &str)> {
    let (folders, title) = path.rsplit_once(separator)?;
    let folder_path = folders.split(separator).collect::<Vec<_>>().join("/");
    Some((folder_path, title))
}

/// Secret retrieval workflow bound to a session.
#[derive(Debug, Clone, Copy)]
pub struct SecretWorkflow<'a> {
    session: &'a Session,
}

impl<'a> SecretWorkflow<'a> {
    /// Bind the workflow to a signed-in session.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Retrieve every secret path, isolating failures per item.
    ///
    /// An empty input fails with `empty secret list` without any network
    /// call.
    #[instrument(skip_all, fields(count = paths.len()))]
    pub async fn get_secrets<S: AsRef<str> + Sync>(&self, paths: &[S]) -> BatchResult {
        if paths.is_empty() {
            return BatchResult::failed(SafeError::EmptyList("secret".to_string()));
        }

        let separator = self.session.config().separator;
        let validated = validate_paths(paths, separator, PathKind::Secret);
        let mut result = BatchResult::default();

        for (path, error) in validated.rejected {
            result.record_failure(&path, "validate path", error);
        }

        for path in validated.valid {
            let Some((folder_path, title)) = split_secret_path(&path, separator) else {
                continue;
            };
            match self.retrieve(&folder_path, title).await {
                Ok(value) => result.insert(path, value),
                Err((step, error)) => result.record_failure(&path, step, error),
            }
        }

        result
    }

    /// Retrieve a single secret path.
    ///
    /// # Errors
    ///
    /// Returns the failure of the lookup or download.
    pub async fn get_secret(&self, path: &str) -> SafeResult<SecretString> {
        self.get_secrets(&[path]).await.into_single(path, "secret")
    }

    async fn retrieve(
        &self,
        folder_path: &str,
        title: &str,
    ) -> Result<SecretString, (&'static str, SafeError)> {
        let record = self
            .lookup(folder_path, title)
            .await
            .map_err(|e| ("lookup", e))?;

        if record.secret_type != SecretType::File {
            return Ok(SecretString::from(record.password.unwrap_or_default()));
        }

        let limit = self.session.config().max_file_secret_size;
        if let Some(size) = record.file_size.filter(|size| *size > limit) {
            return Err((
                "download file",
                SafeError::FileTooLarge {
                    title: record.title,
                    size,
                    limit,
                },
            ));
        }

        self.download_file(record.id, &record.title)
            .await
            .map_err(|e| ("download file", e))
    }

    /// Find a secret by folder path and title.
    ///
    /// # Errors
    ///
    /// [`SafeError::EmptyList`] when nothing matches, transport errors
    /// otherwise.
    #[instrument(skip(self))]
    pub async fn lookup(&self, folder_path: &str, title: &str) -> SafeResult<SecretRecord> {
        let request = ApiRequest::get("SecretGetSecretByPath", "Secrets-Safe/Secrets")
            .with_query("title", title)
            .with_query("path", folder_path);
        let mut records: Vec<SecretRecord> = self.session.get_list(&request, "secret").await?;
        debug!(matches = records.len(), "Secret lookup completed");
        Ok(records.swap_remove(0))
    }

    /// Download the content of a file secret.
    ///
    /// A payload larger than the configured limit is discarded whole.
    ///
    /// # Errors
    ///
    /// Transport errors, or [`SafeError::FileTooLarge`].
    #[instrument(skip(self))]
    pub async fn download_file(&self, id: Uuid, title: &str) -> SafeResult<SecretString> {
        let request = ApiRequest::get(
            "SecretGetFileSecret",
            format!("Secrets-Safe/Secrets/{id}/file/download"),
        );
        let response = self.session.send(&request).await?;
        let content = Zeroizing::new(response.body);

        let limit = self.session.config().max_file_secret_size;
        let size = content.len() as u64;
        if size > limit {
            return Err(SafeError::FileTooLarge {
                title: title.to_string(),
                size,
                limit,
            });
        }

        Ok(SecretString::from(String::from_utf8_lossy(&content).into_owned()))
    }
}

#[async_trait]
impl SecretSource for SecretWorkflow<'_> {
    async fn get_values(&self, paths: &[String]) -> BatchResult {
        self.get_secrets(paths).await
    }

    async fn get_value(&self, path: &str) -> SafeResult<SecretString> {
        self.get_secret(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_secret_path() {
        assert_eq!(
            split_secret_path("folder/title", '/'),
            Some(("folder".to_string(), "title"))
        );
        assert_eq!(
            split_secret_path("a#b#c#title", '#'),
            Some(("a/b/c".to_string(), "title"))
        );
        assert_eq!(split_secret_path("title", '/'), None);
    }
}
