//! Authentication and application sessions.
//!
//! An [`Authenticator`] turns a configuration into a signed-in [`Session`].
//! A session is consumed by [`Session::sign_out`], which also drops the
//! pooled HTTP client so no connection outlives it.

use crate::config::{ClientConfig, Credentials};
use crate::models::{SignInUser, TokenResponse};
use crate::transport::{ApiRequest, ApiResponse, AuthHeader, Transport};
use chrono::{DateTime, TimeDelta, Utc};
use passwordsafe_common::SafeResult;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{error, info, instrument, warn};

/// Builds signed-in sessions from a configuration.
#[derive(Debug)]
pub struct Authenticator {
    config: ClientConfig,
    transport: Transport,
}

impl Authenticator {
    /// Validate the configuration and build the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid configuration, or an error
    /// if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> SafeResult<Self> {
        config.validate()?;
        let transport = Transport::new(&config)?;
        Ok(Self { config, transport })
    }

    /// Borrow the configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Obtain credentials if needed and open the application session.
    ///
    /// # Errors
    ///
    /// Business errors for rejected credentials, technical errors once the
    /// retry budget is spent.
    #[instrument(skip(self))]
    pub async fn authenticate(self) -> SafeResult<Session> {
        let (auth, token_expires_at) = match &self.config.credentials {
            Credentials::OAuth {
                client_id,
                client_secret,
            } => {
                let token = self.fetch_token(client_id, client_secret).await?;
                let expires_at = token_expiry(Utc::now(), token.expires_in);
                (
                    AuthHeader::Bearer(SecretString::from(token.access_token)),
                    expires_at,
                )
            }
            Credentials::ApiKey(key) => (AuthHeader::ApiKey(key.clone()), None),
        };

        let user = self.sign_app_in(&auth).await?;
        info!(user = %user.user_name, "Signed in to Password Safe");

        Ok(Session {
            config: self.config,
            transport: self.transport,
            auth,
            user,
            token_expires_at,
        })
    }

    async fn fetch_token(
        &self,
        client_id: &str,
        client_secret: &SecretString,
    ) -> SafeResult<TokenResponse> {
        let request = ApiRequest::post("GetToken", "Auth/connect/token").with_form(vec![
            ("client_id", SecretString::from(client_id.to_string())),
            ("client_secret", client_secret.clone()),
            ("grant_type", SecretString::from("client_credentials".to_string())),
        ]);
        self.transport.send(&request, None).await?.json()
    }

    async fn sign_app_in(&self, auth: &AuthHeader) -> SafeResult<SignInUser> {
        let request = ApiRequest::post("SignAppIn", "Auth/SignAppIn");
        self.transport.send(&request, Some(auth)).await?.json()
    }
}

/// Expiry of a token issued at `now`, `None` when `expires_in` is out of range.
fn token_expiry(now: DateTime<Utc>, expires_in: i64) -> Option<DateTime<Utc>> {
    let expiry = TimeDelta::try_seconds(expires_in).and_then(|ttl| now.checked_add_signed(ttl));
    if expiry.is_none() {
        warn!(expires_in, "Token lifetime out of range, expiry unknown");
    }
    expiry
}

/// A signed-in application session.
#[derive(Debug)]
pub struct Session {
    config: ClientConfig,
    transport: Transport,
    auth: AuthHeader,
    user: SignInUser,
    token_expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// User the application signed in as.
    #[must_use]
    pub const fn user(&self) -> &SignInUser {
        &self.user
    }

    /// Configuration the session was opened with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Expiry of the OAuth token, `None` in API-key mode.
    #[must_use]
    pub const fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.token_expires_at
    }

    /// Send an authenticated request under the retry policy.
    ///
    /// # Errors
    ///
    /// See [`Transport::send`].
    pub async fn send(&self, request: &ApiRequest) -> SafeResult<ApiResponse> {
        self.transport.send(request, Some(&self.auth)).await
    }

    /// Send an authenticated request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Transport::send`]; also fails on malformed JSON.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> SafeResult<T> {
        self.send(request).await?.json()
    }

    /// Fetch a non-empty JSON array.
    ///
    /// # Errors
    ///
    /// See [`Transport::get_list`].
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        what: &str,
    ) -> SafeResult<Vec<T>> {
        self.transport.get_list(request, Some(&self.auth), what).await
    }

    /// Close the server-side session and release pooled connections.
    ///
    /// Connections are released even when the server rejects the sign-out.
    ///
    /// # Errors
    ///
    /// Returns the sign-out failure after local cleanup.
    #[instrument(skip(self), fields(user = %self.user.user_name))]
    pub async fn sign_out(self) -> SafeResult<()> {
        let request = ApiRequest::post("SignOut", "Auth/Signout");
        let result = self.send(&request).await.map(|_| ());

        match &result {
            Ok(()) => info!("Signed out of Password Safe"),
            Err(e) => error!(error = %e, "Sign-out failed, releasing connections anyway"),
        }

        drop(self.transport);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry_in_range() {
        let now = Utc::now();
        assert_eq!(token_expiry(now, 3600), Some(now + TimeDelta::hours(1)));
    }

    #[test]
    fn test_token_expiry_out_of_range() {
        let now = Utc::now();
        assert_eq!(token_expiry(now, i64::MAX), None);
        assert_eq!(token_expiry(now, i64::MIN), None);
    }
}
