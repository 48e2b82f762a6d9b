//! Tracing subscriber setup for applications embedding the client.
//!
//! The client crates only emit `tracing` events; installing a subscriber is
//! left to the host application.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_output: bool,
    /// Colorize human-readable output
    pub ansi: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "passwordsafe_client=info,passwordsafe_common=info".to_string(),
            json_output: false,
            ansi: true,
        }
    }
}

impl TracingConfig {
    /// Set the default filter directive.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Disable ANSI colors.
    #[must_use]
    pub const fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }
}

/// Install the global subscriber, returning an error if one is already set.
///
/// # Errors
///
/// Fails when a global subscriber has already been installed.
pub fn try_init_tracing(
    config: &TracingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let registry = tracing_subscriber::registry().with(config.filter());
    if config.json_output {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(config.ansi))
            .try_init()
    }
}

/// Install the global subscriber, ignoring a subscriber that is already set.
pub fn init_tracing(config: &TracingConfig) {
    if try_init_tracing(config).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
