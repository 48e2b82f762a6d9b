//! Managed system creation and listing.
//!
//! Each API version has its own request body. Later versions embed the
//! previous one and add fields, and [`ManagedSystemDetails`] selects the
//! version explicitly.

use crate::authentication::Session;
use crate::config::ApiVersion;
use crate::transport::ApiRequest;
use passwordsafe_common::{SafeError, SafeResult};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

const MAX_RELEASE_DURATION_MINUTES: u32 = 525_600;
const MAX_CHANGE_FREQUENCY_DAYS: u32 = 999;
const MAX_DESCRIPTION_LENGTH: usize = 255;
const MAX_CONTACT_EMAIL_LENGTH: usize = 1000;

/// Fields common to every API version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedSystemV30 {
    /// Platform of the system
    #[serde(rename = "PlatformID")]
    pub platform_id: u32,
    /// Contact email
    pub contact_email: String,
    /// Free-text description
    pub description: String,
    /// Connection port, platform default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Connection timeout in seconds
    pub timeout: u32,
    /// SSH key enforcement mode (0 none, 1 auto-accept, 2 strict)
    pub ssh_key_enforcement_mode: u8,
    /// Password rule
    #[serde(rename = "PasswordRuleID")]
    pub password_rule_id: u32,
    /// DSS key rule
    #[serde(rename = "DSSKeyRuleID")]
    pub dss_key_rule_id: u32,
    /// Login account used to connect
    #[serde(rename = "LoginAccountID", skip_serializing_if = "Option::is_none")]
    pub login_account_id: Option<u32>,
    /// Default release duration in minutes
    pub release_duration: u32,
    /// Maximum release duration in minutes
    pub max_release_duration: u32,
    /// Information-systems-administrator release duration in minutes
    #[serde(rename = "ISAReleaseDuration")]
    pub isa_release_duration: u32,
    /// Whether passwords are managed automatically
    pub auto_management_flag: bool,
    /// Functional account used for automatic management
    #[serde(rename = "FunctionalAccountID", skip_serializing_if = "Option::is_none")]
    pub functional_account_id: Option<u32>,
    /// Elevation command (`sudo`, `pbrun`, `pmrun`) or empty
    pub elevation_command: String,
    /// Check passwords on a schedule
    pub check_password_flag: bool,
    /// Rotate after any release
    pub change_password_after_any_release_flag: bool,
    /// Reset on mismatch
    pub reset_password_on_mismatch_flag: bool,
    /// `first`, `last` or `xdays`
    pub change_frequency_type: String,
    /// Days between changes when the type is `xdays`
    pub change_frequency_days: u32,
    /// Time of day for changes, `HH:MM`
    pub change_time: String,
}

impl Default for ManagedSystemV30 {
    fn default() -> Self {
        Self {
            platform_id: 0,
            contact_email: String::new(),
            description: String::new(),
            port: None,
            timeout: 30,
            ssh_key_enforcement_mode: 0,
            password_rule_id: 0,
            dss_key_rule_id: 0,
            login_account_id: None,
            release_duration: 120,
            max_release_duration: 10_080,
            isa_release_duration: 120,
            auto_management_flag: false,
            functional_account_id: None,
            elevation_command: String::new(),
            check_password_flag: false,
            change_password_after_any_release_flag: false,
            reset_password_on_mismatch_flag: false,
            change_frequency_type: "first".to_string(),
            change_frequency_days: 30,
            change_time: "23:30".to_string(),
        }
    }
}

/// Version 3.1 body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedSystemV31 {
    /// Version 3.0 fields
    #[serde(flatten)]
    pub base: ManagedSystemV30,
    /// `None` or `EPM`
    pub remote_client_type: String,
}

/// Version 3.2 body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedSystemV32 {
    /// Version 3.1 fields
    #[serde(flatten)]
    pub base: ManagedSystemV31,
    /// Application host, required when `is_application_host` is false and one is used
    #[serde(rename = "ApplicationHostID", skip_serializing_if = "Option::is_none")]
    pub application_host_id: Option<u32>,
    /// Whether the system is itself an application host
    pub is_application_host: bool,
}

/// Version-tagged managed system body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ManagedSystemDetails {
    /// API 3.0
    V30(ManagedSystemV30),
    /// API 3.1
    V31(ManagedSystemV31),
    /// API 3.2
    V32(ManagedSystemV32),
}

impl ManagedSystemDetails {
    /// API version the body belongs to.
    #[must_use]
    pub const fn api_version(&self) -> ApiVersion {
        match self {
            Self::V30(_) => ApiVersion::V30,
            Self::V31(_) => ApiVersion::V31,
            Self::V32(_) => ApiVersion::V32,
        }
    }

    /// Check the body against the rules of its version.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first broken rule.
    pub fn validate(&self) -> SafeResult<()> {
        match self {
            Self::V30(details) => validate_v30(details),
            Self::V31(details) => validate_v31(details),
            Self::V32(details) => validate_v32(details),
        }
    }
}

fn validate_v30(details: &ManagedSystemV30) -> SafeResult<()> {
    if details.platform_id == 0 {
        return Err(SafeError::validation("platform id is required"));
    }
    if details.description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(SafeError::validation(format!(
            "description exceeds {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    if details.contact_email.len() > MAX_CONTACT_EMAIL_LENGTH
        || (!details.contact_email.is_empty() && !details.contact_email.contains('@'))
    {
        return Err(SafeError::validation("contact email is not a valid address"));
    }
    if details.port == Some(0) {
        return Err(SafeError::validation("port must be between 1 and 65535"));
    }
    for (name, minutes) in [
        ("release duration", details.release_duration),
        ("max release duration", details.max_release_duration),
        ("ISA release duration", details.isa_release_duration),
    ] {
        if minutes == 0 || minutes > MAX_RELEASE_DURATION_MINUTES {
            return Err(SafeError::validation(format!(
                "{name} must be between 1 and {MAX_RELEASE_DURATION_MINUTES} minutes"
            )));
        }
    }
    if details.release_duration > details.max_release_duration {
        return Err(SafeError::validation(
            "release duration exceeds max release duration",
        ));
    }
    if details.ssh_key_enforcement_mode > 2 {
        return Err(SafeError::validation("SSH key enforcement mode must be 0, 1 or 2"));
    }
    if !matches!(details.elevation_command.as_str(), "" | "sudo" | "pbrun" | "pmrun") {
        return Err(SafeError::validation(format!(
            "unsupported elevation command: {}",
            details.elevation_command
        )));
    }
    match details.change_frequency_type.as_str() {
        "first" | "last" => {}
        "xdays" => {
            if details.change_frequency_days == 0
                || details.change_frequency_days > MAX_CHANGE_FREQUENCY_DAYS
            {
                return Err(SafeError::validation(format!(
                    "change frequency days must be between 1 and {MAX_CHANGE_FREQUENCY_DAYS}"
                )));
            }
        }
        other => {
            return Err(SafeError::validation(format!(
                "unsupported change frequency type: {other}"
            )));
        }
    }
    if !is_valid_change_time(&details.change_time) {
        return Err(SafeError::validation(format!(
            "change time must be HH:MM, got {}",
            details.change_time
        )));
    }
    if details.auto_management_flag && details.functional_account_id.is_none() {
        return Err(SafeError::validation(
            "automatic management requires a functional account",
        ));
    }
    Ok(())
}

fn validate_v31(details: &ManagedSystemV31) -> SafeResult<()> {
    validate_v30(&details.base)?;
    if !matches!(details.remote_client_type.as_str(), "None" | "EPM") {
        return Err(SafeError::validation(format!(
            "unsupported remote client type: {}",
            details.remote_client_type
        )));
    }
    Ok(())
}

fn validate_v32(details: &ManagedSystemV32) -> SafeResult<()> {
    validate_v31(&details.base)?;
    if details.is_application_host && details.application_host_id.is_some() {
        return Err(SafeError::validation(
            "an application host cannot reference another application host",
        ));
    }
    Ok(())
}

fn is_valid_change_time(value: &str) -> bool {
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    hours.len() == 2
        && minutes.len() == 2
        && hours.parse::<u8>().is_ok_and(|h| h < 24)
        && minutes.parse::<u8>().is_ok_and(|m| m < 60)
}

/// Managed system as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedSystem {
    /// Managed system id
    #[serde(rename = "ManagedSystemID")]
    pub managed_system_id: u64,
    /// Owning asset, if any
    #[serde(rename = "AssetID", default)]
    pub asset_id: Option<u64>,
    /// Platform id
    #[serde(rename = "PlatformID", default)]
    pub platform_id: Option<u32>,
    /// System name
    #[serde(default)]
    pub system_name: Option<String>,
    /// Host name
    #[serde(default)]
    pub host_name: Option<String>,
    /// DNS name
    #[serde(default)]
    pub dns_name: Option<String>,
}

/// Managed system operations bound to a session.
#[derive(Debug, Clone, Copy)]
pub struct ManagedSystemClient<'a> {
    session: &'a Session,
}

impl<'a> ManagedSystemClient<'a> {
    /// Bind to a signed-in session.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Create a managed system on an asset.
    ///
    /// # Errors
    ///
    /// A validation error when the body does not match the configured API
    /// version or breaks a rule of its version, transport errors otherwise.
    #[instrument(skip(self, details), fields(version = %details.api_version()))]
    pub async fn create_managed_system(
        &self,
        asset_id: u64,
        details: &ManagedSystemDetails,
    ) -> SafeResult<ManagedSystem> {
        let configured = self.session.config().api_version;
        if details.api_version() != configured {
            return Err(SafeError::validation(format!(
                "body is for API version {} but the client is configured for {configured}",
                details.api_version()
            )));
        }
        details.validate()?;

        let request = ApiRequest::post(
            "ManagedSystemCreate",
            format!("Assets/{asset_id}/ManagedSystems"),
        )
        .with_query("version", configured.as_str())
        .with_json(serde_json::to_value(details)?);

        let system: ManagedSystem = self.session.send_json(&request).await?;
        info!(
            managed_system_id = system.managed_system_id,
            "Managed system created"
        );
        Ok(system)
    }

    /// List managed systems.
    ///
    /// # Errors
    ///
    /// [`SafeError::EmptyList`] when there are none, transport errors
    /// otherwise.
    pub async fn list_managed_systems(&self) -> SafeResult<Vec<ManagedSystem>> {
        let request = ApiRequest::get("ManagedSystemList", "ManagedSystems");
        self.session.get_list(&request, "managed system").await
    }
}
