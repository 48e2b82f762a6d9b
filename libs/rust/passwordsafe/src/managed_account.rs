//! Managed-account credential release.
//!
//! Every account goes through the same four steps, strictly in order:
//!
//! ```text
//! lookup -> create request -> fetch credential -> check-in
//! ```
//!
//! A value is reported only when all four steps succeed. A failure at any
//! step skips the account and the batch moves on to the next one.

use crate::authentication::Session;
use crate::models::{AccessRequestBody, ConflictOption, ManagedAccountIdentity};
use crate::provider::{BatchResult, SecretSource};
use crate::transport::ApiRequest;
use crate::validation::{PathKind, validate_paths};
use async_trait::async_trait;
use passwordsafe_common::{SafeError, SafeResult};
use secrecy::SecretString;
use std::fmt;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

/// Step of the release sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    /// Resolve system and account ids
    Lookup,
    /// Open the access request
    RequestCreate,
    /// Read the released credential
    CredentialFetch,
    /// Release the access request
    CheckIn,
}

impl ReleaseStep {
    /// Step name used in errors and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::RequestCreate => "create request",
            Self::CredentialFetch => "fetch credential",
            Self::CheckIn => "check-in",
        }
    }
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of an open access request.
///
/// `Debug` and `Display` mask the value so it never reaches the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Raw identifier, for building request URLs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestId").field(&"****").finish()
    }
}

/// Credential release workflow bound to a session.
#[derive(Debug, Clone, Copy)]
pub struct ManagedAccountWorkflow<'a> {
    session: &'a Session,
}

impl<'a> ManagedAccountWorkflow<'a> {
    /// Bind the workflow to a signed-in session.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Release the credential of every `<system><sep><account>` path.
    ///
    /// Failed items are logged, left out of the result, and the most recent
    /// failure is kept in [`BatchResult::last_error`]. An empty input fails
    /// with `empty managed account list` without any network call.
    #[instrument(skip_all, fields(count = paths.len()))]
    pub async fn get_managed_accounts<S: AsRef<str> + Sync>(&self, paths: &[S]) -> BatchResult {
        if paths.is_empty() {
            return BatchResult::failed(SafeError::EmptyList("managed account".to_string()));
        }

        let separator = self.session.config().separator;
        let validated = validate_paths(paths, separator, PathKind::ManagedAccount);
        let mut result = BatchResult::default();

        for (path, error) in validated.rejected {
            result.record_failure(&path, "validate path", error);
        }

        for path in validated.valid {
            let Some((system, account)) = path.split_once(separator) else {
                continue;
            };
            match self.release(system, account).await {
                Ok(value) => result.insert(path, value),
                Err((step, error)) => result.record_failure(&path, step.as_str(), error),
            }
        }

        result
    }

    /// Release the credential of a single path.
    ///
    /// # Errors
    ///
    /// Returns the failure of whichever step did not complete.
    pub async fn get_managed_account(&self, path: &str) -> SafeResult<SecretString> {
        self.get_managed_accounts(&[path])
            .await
            .into_single(path, "managed account")
    }

    /// Run lookup, request, fetch and check-in for one account.
    ///
    /// If fetching the credential fails the request is still checked in. If
    /// check-in fails the credential is discarded.
    ///
    /// # Errors
    ///
    /// Returns the failed step together with its error.
    pub async fn release(
        &self,
        system: &str,
        account: &str,
    ) -> Result<SecretString, (ReleaseStep, SafeError)> {
        let identity = self
            .lookup(system, account)
            .await
            .map_err(|e| (ReleaseStep::Lookup, e))?;

        let request_id = self
            .create_request(identity)
            .await
            .map_err(|e| (ReleaseStep::RequestCreate, e))?;

        let credential = match self.fetch_credential(&request_id).await {
            Ok(credential) => credential,
            Err(e) => {
                if let Err(check_in_error) = self.check_in(&request_id).await {
                    warn!(
                        request_id = %request_id,
                        error = %check_in_error,
                        "Check-in after failed credential fetch failed, request left open"
                    );
                }
                return Err((ReleaseStep::CredentialFetch, e));
            }
        };

        if let Err(e) = self.check_in(&request_id).await {
            warn!(
                request_id = %request_id,
                system,
                account,
                "Check-in failed, credential discarded and request left open until it expires"
            );
            return Err((ReleaseStep::CheckIn, e));
        }

        Ok(credential)
    }

    /// Resolve system and account ids.
    ///
    /// # Errors
    ///
    /// Business error when the account does not exist.
    #[instrument(skip(self))]
    pub async fn lookup(&self, system: &str, account: &str) -> SafeResult<ManagedAccountIdentity> {
        let request = ApiRequest::get("ManagedAccountGet", "ManagedAccounts")
            .with_query("systemName", system)
            .with_query("accountName", account);
        let identity: ManagedAccountIdentity = self.session.send_json(&request).await?;
        debug!(
            system_id = identity.system_id,
            account_id = identity.account_id,
            "Resolved managed account"
        );
        Ok(identity)
    }

    /// Open a time-boxed access request, reusing an open one.
    ///
    /// # Errors
    ///
    /// Transport errors, or a business error for an empty identifier.
    #[instrument(skip(self))]
    pub async fn create_request(&self, identity: ManagedAccountIdentity) -> SafeResult<RequestId> {
        let config = self.session.config();
        let body = AccessRequestBody {
            system_id: identity.system_id,
            account_id: identity.account_id,
            duration_minutes: config.request_duration_minutes,
            reason: config.request_reason.clone(),
            conflict_option: ConflictOption::Reuse,
        };
        let request = ApiRequest::post("ManagedAccountCreateRequest", "Requests")
            .with_json(serde_json::to_value(&body)?);

        let response = self.session.send(&request).await?;
        let text = response.text();
        let id = text.trim().trim_matches('"');
        if id.is_empty() {
            return Err(SafeError::business(
                response.status.as_u16(),
                "empty request identifier",
            ));
        }

        let request_id = RequestId(id.to_string());
        debug!(request_id = %request_id, "Access request opened");
        Ok(request_id)
    }

    /// Read the credential released by a request.
    ///
    /// The body is a JSON string literal and is unquoted before use.
    ///
    /// # Errors
    ///
    /// Transport errors, or a serialization error for a body that is not a
    /// JSON string.
    #[instrument(skip(self))]
    pub async fn fetch_credential(&self, request_id: &RequestId) -> SafeResult<SecretString> {
        let request = ApiRequest::get(
            "CredentialByRequestId",
            format!("Credentials/{}", request_id.as_str()),
        );
        let response = self.session.send(&request).await?;
        let raw = Zeroizing::new(response.body);
        let value: String = serde_json::from_slice(&raw)?;
        Ok(SecretString::from(value))
    }

    /// Release the access request.
    ///
    /// # Errors
    ///
    /// Transport errors.
    #[instrument(skip(self))]
    pub async fn check_in(&self, request_id: &RequestId) -> SafeResult<()> {
        let request = ApiRequest::put(
            "ManagedAccountRequestCheckIn",
            format!("Requests/{}/checkin", request_id.as_str()),
        )
        .with_json(serde_json::json!({}));
        self.session.send(&request).await?;
        debug!(request_id = %request_id, "Access request checked in");
        Ok(())
    }
}

#[async_trait]
impl SecretSource for ManagedAccountWorkflow<'_> {
    async fn get_values(&self, paths: &[String]) -> BatchResult {
        self.get_managed_accounts(paths).await
    }

    async fn get_value(&self, path: &str) -> SafeResult<SecretString> {
        self.get_managed_account(path).await
    }
}
