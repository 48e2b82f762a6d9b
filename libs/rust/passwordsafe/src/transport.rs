//! Single-request transport and outcome classification.
//!
//! `call` performs one attempt and sorts the outcome into success, technical
//! error or business error. `send` wraps `call` in the retry policy.

use crate::config::ClientConfig;
use passwordsafe_common::{RetryPolicy, SafeError, SafeResult, build_http_client};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

/// Authorization header attached to API calls.
#[derive(Debug, Clone)]
pub enum AuthHeader {
    /// `Authorization: Bearer <token>`
    Bearer(SecretString),
    /// `Authorization: PS-Auth key=<key>;`
    ApiKey(SecretString),
}

impl AuthHeader {
    fn header_value(&self) -> SafeResult<HeaderValue> {
        let raw = match self {
            Self::Bearer(token) => format!("Bearer {}", token.expose_secret()),
            Self::ApiKey(key) => format!("PS-Auth key={};", key.expose_secret()),
        };
        let mut value = HeaderValue::from_str(&raw).map_err(|_| {
            SafeError::validation("credential contains characters not allowed in a header")
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// Request body.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// No body
    Empty,
    /// JSON document
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` fields
    Form(Vec<(&'static str, SecretString)>),
}

/// Description of one API call, replayable across retries.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Operation name used in logs and errors
    pub operation: &'static str,
    /// HTTP method
    pub method: Method,
    /// Path relative to the API base URL
    pub path: String,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Body
    pub body: RequestBody,
}

impl ApiRequest {
    /// Create a request with no query and no body.
    #[must_use]
    pub fn new(operation: &'static str, method: Method, path: impl Into<String>) -> Self {
        Self {
            operation,
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// GET request.
    #[must_use]
    pub fn get(operation: &'static str, path: impl Into<String>) -> Self {
        Self::new(operation, Method::GET, path)
    }

    /// POST request.
    #[must_use]
    pub fn post(operation: &'static str, path: impl Into<String>) -> Self {
        Self::new(operation, Method::POST, path)
    }

    /// PUT request.
    #[must_use]
    pub fn put(operation: &'static str, path: impl Into<String>) -> Self {
        Self::new(operation, Method::PUT, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Attach a form body.
    #[must_use]
    pub fn with_form(mut self, fields: Vec<(&'static str, SecretString)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }
}

/// Successful response, fully read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Raw body
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Body as UTF-8 text (lossy).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the body is not the expected JSON.
    pub fn json<T: DeserializeOwned>(&self) -> SafeResult<T> {
        serde_json::from_slice(&self.body).map_err(SafeError::from)
    }
}

/// Sort a response status into success, technical error or business error.
///
/// # Errors
///
/// 5xx, 408 and 429 are technical; any other non-2xx status is a business
/// error carrying the response body.
pub fn classify(operation: &str, status: StatusCode, body: &[u8]) -> SafeResult<()> {
    if status.is_success() {
        return Ok(());
    }
    let text = String::from_utf8_lossy(body);
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        return Err(SafeError::technical(
            operation,
            Some(status.as_u16()),
            format!("status code: {} - {text}", status.as_u16()),
        ));
    }
    Err(SafeError::business(status.as_u16(), text))
}

/// HTTP transport bound to one API base URL.
#[derive(Debug)]
pub struct Transport {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl Transport {
    /// Build the transport and its pooled HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> SafeResult<Self> {
        Ok(Self {
            http: build_http_client(&config.http)?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(config.retry.clone()),
        })
    }

    /// Base API URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry policy applied by [`Transport::send`].
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Perform one attempt of the request.
    ///
    /// # Errors
    ///
    /// Technical errors for send failures and 5xx/408/429 responses, business
    /// errors for other non-2xx responses.
    #[instrument(skip_all, fields(operation = request.operation, method = %request.method))]
    pub async fn call(
        &self,
        request: &ApiRequest,
        auth: Option<&AuthHeader>,
    ) -> SafeResult<ApiResponse> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth.header_value()?);
        }
        builder = match &request.body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => {
                let pairs: Vec<(&str, &str)> = fields
                    .iter()
                    .map(|(k, v)| (*k, v.expose_secret()))
                    .collect();
                builder.form(&pairs)
            }
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                SafeError::validation(format!("{}: {e}", request.operation))
            } else {
                SafeError::technical(request.operation, None, e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                SafeError::technical(request.operation, Some(status.as_u16()), e.to_string())
            })?
            .to_vec();

        debug!(status = status.as_u16(), bytes = body.len(), "API call completed");
        classify(request.operation, status, &body)?;

        Ok(ApiResponse { status, body })
    }

    /// Perform the request under the retry policy.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last technical error
    /// once the retry budget is exhausted.
    pub async fn send(
        &self,
        request: &ApiRequest,
        auth: Option<&AuthHeader>,
    ) -> SafeResult<ApiResponse> {
        self.retry
            .execute(request.operation, || self.call(request, auth))
            .await
    }

    /// Fetch a JSON array, treating an empty array as a business error.
    ///
    /// # Errors
    ///
    /// Transport errors as for [`Transport::send`], a serialization error for
    /// malformed JSON, and [`SafeError::EmptyList`] for `[]`.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        auth: Option<&AuthHeader>,
        what: &str,
    ) -> SafeResult<Vec<T>> {
        let response = self.send(request, auth).await?;
        let items: Vec<T> = response.json()?;
        if items.is_empty() {
            return Err(SafeError::EmptyList(what.to_string()));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passwordsafe_common::ErrorKind;

    #[test]
    fn test_classify_success() {
        assert!(classify("Op", StatusCode::OK, b"").is_ok());
        assert!(classify("Op", StatusCode::NO_CONTENT, b"").is_ok());
    }

    #[test]
    fn test_classify_server_errors_are_technical() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::GATEWAY_TIMEOUT,
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::TOO_MANY_REQUESTS,
        ] {
            let err = classify("CheckIn", status, b"upstream").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Technical, "{status}");
            assert_eq!(err.status(), Some(status.as_u16()));
        }
    }

    #[test]
    fn test_classify_client_errors_are_business() {
        let err =
            classify("Lookup", StatusCode::NOT_FOUND, b"Managed account not found").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Business);
        assert_eq!(
            err.to_string(),
            "error - status code: 404 - Managed account not found"
        );
    }

    #[test]
    fn test_api_key_header_format() {
        let header = AuthHeader::ApiKey(SecretString::from("abc123".to_string()))
            .header_value()
            .unwrap();
        assert_eq!(header.to_str().unwrap(), "PS-Auth key=abc123;");
        assert!(header.is_sensitive());
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get("Lookup", "ManagedAccounts")
            .with_query("systemName", "sysA")
            .with_query("accountName", "acct1");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.query.len(), 2);
        assert!(matches!(request.body, RequestBody::Empty));
    }

    #[test]
    fn test_form_body_debug_hides_secret() {
        let request = ApiRequest::post("Token", "Auth/connect/token").with_form(vec![(
            "client_secret",
            SecretString::from("hunter2".to_string()),
        )]);
        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
