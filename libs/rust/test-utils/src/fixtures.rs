//! JSON payloads returned by the mock server.

use serde_json::{Value, json};
use uuid::Uuid;

/// Access token issued by the mock token endpoint.
pub const ACCESS_TOKEN: &str = "fake_access_token";

/// OAuth client id accepted by the mock server.
pub const CLIENT_ID: &str = "6138d050-e266-4b05-9ced-35e7dd5093ae";

/// OAuth client secret accepted by the mock server.
pub const CLIENT_SECRET: &str = "71svdPLh2AR97sPs5gfPjGjpVkUzCMYk6bs3CnPw3tg=";

/// API key accepted by the mock server.
pub const API_KEY: &str = "fake_api_key_0123456789";

/// Token endpoint response.
#[must_use]
pub fn token_response() -> Value {
    json!({
        "access_token": ACCESS_TOKEN,
        "expires_in": 3600,
        "token_type": "Bearer",
        "scope": "publicapi"
    })
}

/// `Auth/SignAppIn` response.
#[must_use]
pub fn sign_in_user() -> Value {
    json!({
        "UserId": 1,
        "EmailAddress": "app@example.com",
        "UserName": "integration-app",
        "Name": "Integration App"
    })
}

/// `ManagedAccounts` lookup response.
#[must_use]
pub fn managed_account(system_id: u64, account_id: u64) -> Value {
    json!({ "SystemId": system_id, "AccountId": account_id })
}

/// Text or credential entry of the secrets listing.
#[must_use]
pub fn credential_secret(id: Uuid, folder: &str, title: &str, password: &str) -> Value {
    json!({
        "Id": id,
        "Title": title,
        "SecretType": "CREDENTIAL",
        "FolderPath": folder,
        "Username": "svc",
        "Password": password
    })
}

/// File entry of the secrets listing.
#[must_use]
pub fn file_secret(id: Uuid, folder: &str, title: &str, file_name: &str, size: u64) -> Value {
    json!({
        "Id": id,
        "Title": title,
        "SecretType": "FILE",
        "FolderPath": folder,
        "FileName": file_name,
        "FileSize": size
    })
}

/// Managed system as returned by create and list.
#[must_use]
pub fn managed_system(managed_system_id: u64, asset_id: u64) -> Value {
    json!({
        "ManagedSystemID": managed_system_id,
        "AssetID": asset_id,
        "PlatformID": 4,
        "SystemName": "linux-host",
        "HostName": "linux-host.example.com",
        "DnsName": "linux-host.example.com"
    })
}
