//! Mock Password Safe server for workflow tests.
//!
//! Wraps a [`MockServer`] and mounts the API endpoints under the fixed
//! `/BeyondTrust/api/public/v3` prefix.

use crate::fixtures;
use serde_json::{Value, json};
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path prefix of every API endpoint.
pub const API_PATH: &str = "/BeyondTrust/api/public/v3";

/// Mock Password Safe API.
#[derive(Debug)]
pub struct MockPasswordSafe {
    server: MockServer,
}

impl MockPasswordSafe {
    /// Start a server with no endpoints mounted.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Underlying server, for custom mocks.
    #[must_use]
    pub const fn server(&self) -> &MockServer {
        &self.server
    }

    /// API base URL to configure the client with.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}{API_PATH}", self.server.uri())
    }

    /// Full request path of an endpoint.
    #[must_use]
    pub fn endpoint(endpoint: &str) -> String {
        format!("{API_PATH}/{}", endpoint.trim_start_matches('/'))
    }

    /// Mount the OAuth token endpoint.
    pub async fn mount_token(&self) {
        Mock::given(method("POST"))
            .and(path(Self::endpoint("Auth/connect/token")))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::token_response()))
            .mount(&self.server)
            .await;
    }

    /// Mount `Auth/SignAppIn`.
    pub async fn mount_sign_in(&self) {
        Mock::given(method("POST"))
            .and(path(Self::endpoint("Auth/SignAppIn")))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::sign_in_user()))
            .mount(&self.server)
            .await;
    }

    /// Mount the token endpoint and `Auth/SignAppIn`.
    pub async fn mount_auth(&self) {
        self.mount_token().await;
        self.mount_sign_in().await;
    }

    /// Mount `Auth/Signout` answering with `status`.
    pub async fn mount_sign_out(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(Self::endpoint("Auth/Signout")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Mount a successful managed account lookup.
    pub async fn mount_managed_account(
        &self,
        system: &str,
        account: &str,
        system_id: u64,
        account_id: u64,
    ) {
        Mock::given(method("GET"))
            .and(path(Self::endpoint("ManagedAccounts")))
            .and(query_param("systemName", system))
            .and(query_param("accountName", account))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(fixtures::managed_account(system_id, account_id)),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a managed account lookup answering with `status` and `body`.
    pub async fn mount_managed_account_error(
        &self,
        system: &str,
        account: &str,
        status: u16,
        body: &str,
    ) {
        Mock::given(method("GET"))
            .and(path(Self::endpoint("ManagedAccounts")))
            .and(query_param("systemName", system))
            .and(query_param("accountName", account))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mount `POST Requests` returning `request_id` as plain text.
    pub async fn mount_request(&self, request_id: &str) {
        Mock::given(method("POST"))
            .and(path(Self::endpoint("Requests")))
            .and(body_string_contains("\"ConflictOption\":\"reuse\""))
            .respond_with(ResponseTemplate::new(201).set_body_string(request_id))
            .mount(&self.server)
            .await;
    }

    /// Mount `GET Credentials/{request_id}` returning a JSON string.
    pub async fn mount_credential(&self, request_id: &str, credential: &str) {
        Mock::given(method("GET"))
            .and(path(Self::endpoint(&format!("Credentials/{request_id}"))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(credential)))
            .mount(&self.server)
            .await;
    }

    /// Mount `PUT Requests/{request_id}/checkin` answering with `status`.
    pub async fn mount_check_in(&self, request_id: &str, status: u16) {
        self.mount_check_in_times(request_id, status, None).await;
    }

    /// Mount a check-in that only answers the first `times` calls.
    ///
    /// Mocks mounted later take over once it is spent.
    pub async fn mount_check_in_times(&self, request_id: &str, status: u16, times: Option<u64>) {
        let mock = Mock::given(method("PUT"))
            .and(path(Self::endpoint(&format!("Requests/{request_id}/checkin"))))
            .respond_with(ResponseTemplate::new(status));
        let mock = match times {
            Some(n) => mock.up_to_n_times(n),
            None => mock,
        };
        mock.mount(&self.server).await;
    }

    /// Mount every step of a successful credential release.
    pub async fn mount_release(
        &self,
        system: &str,
        account: &str,
        request_id: &str,
        credential: &str,
    ) {
        self.mount_managed_account(system, account, 1, 1).await;
        self.mount_request(request_id).await;
        self.mount_credential(request_id, credential).await;
        self.mount_check_in(request_id, 204).await;
    }

    /// Mount the secrets listing for `title` in `folder`.
    ///
    /// `records` is returned as-is, so `[]` simulates a missing secret.
    pub async fn mount_secret(&self, folder: &str, title: &str, records: Value) {
        Mock::given(method("GET"))
            .and(path(Self::endpoint("Secrets-Safe/Secrets")))
            .and(query_param("title", title))
            .and(query_param("path", folder))
            .respond_with(ResponseTemplate::new(200).set_body_json(records))
            .mount(&self.server)
            .await;
    }

    /// Mount the download of a file secret.
    pub async fn mount_file_download(&self, id: Uuid, content: &[u8]) {
        Mock::given(method("GET"))
            .and(path(Self::endpoint(&format!(
                "Secrets-Safe/Secrets/{id}/file/download"
            ))))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&self.server)
            .await;
    }

    /// Mount `endpoint` answering `http_method` with a fixed status and body.
    pub async fn mount_status(&self, http_method: &str, endpoint: &str, status: u16, body: &str) {
        Mock::given(method(http_method))
            .and(path(Self::endpoint(endpoint)))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for `http_method` on `endpoint`.
    pub async fn request_count(&self, http_method: &str, endpoint: &str) -> usize {
        let full = Self::endpoint(endpoint);
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path() == full)
            .count()
    }

    /// Number of requests received on any endpoint.
    pub async fn total_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}
