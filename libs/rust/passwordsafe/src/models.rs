//! Wire types exchanged with the Password Safe API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OAuth token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// Token type, normally `Bearer`
    pub token_type: String,
    /// Granted scope
    #[serde(default)]
    pub scope: String,
}

/// User the application signed in as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignInUser {
    /// Numeric user id
    pub user_id: u64,
    /// Email address
    #[serde(default)]
    pub email_address: String,
    /// Login name
    pub user_name: String,
    /// Display name
    #[serde(default)]
    pub name: String,
}

/// Identifiers of a managed account, resolved from its system and name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedAccountIdentity {
    /// Managed system id
    pub system_id: u64,
    /// Managed account id
    pub account_id: u64,
}

/// Behavior when an open request already exists for the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictOption {
    /// Return the existing request
    Reuse,
    /// Fail the new request
    Fail,
}

/// Body of `POST Requests`.
#[derive(Debug, Clone, Serialize)]
pub struct AccessRequestBody {
    /// Managed system id
    #[serde(rename = "SystemID")]
    pub system_id: u64,
    /// Managed account id
    #[serde(rename = "AccountID")]
    pub account_id: u64,
    /// Lease length
    #[serde(rename = "DurationMinutes")]
    pub duration_minutes: u32,
    /// Free-text reason recorded by the server
    #[serde(rename = "Reason")]
    pub reason: String,
    /// Conflict policy
    #[serde(rename = "ConflictOption")]
    pub conflict_option: ConflictOption,
}

/// Kind of a vault secret.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum SecretType {
    /// Free text
    #[serde(rename = "TEXT", alias = "Text")]
    Text,
    /// Username/password pair
    #[serde(rename = "CREDENTIAL", alias = "Credential")]
    Credential,
    /// Uploaded file
    #[serde(rename = "FILE", alias = "File")]
    File,
}

/// Entry of the secrets listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretRecord {
    /// Secret id
    pub id: Uuid,
    /// Title, the last path segment
    pub title: String,
    /// Secret kind
    pub secret_type: SecretType,
    /// Folder path
    #[serde(default)]
    pub folder_path: Option<String>,
    /// Username of credential secrets
    #[serde(default)]
    pub username: Option<String>,
    /// Value of text and credential secrets
    #[serde(default)]
    pub password: Option<String>,
    /// File name of file secrets
    #[serde(default)]
    pub file_name: Option<String>,
    /// Size of file secrets in bytes, when reported
    #[serde(default)]
    pub file_size: Option<u64>,
}
