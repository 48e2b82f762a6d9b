//! Helpers shared by the end-to-end scenarios.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use passwordsafe_client::{ClientConfig, Credentials, RetryConfig};
use passwordsafe_common::TracingConfig;
use std::time::Duration;
use test_utils::MockPasswordSafe;
use test_utils::fixtures::{CLIENT_ID, CLIENT_SECRET};

/// Retry budget short enough for a technical failure to surface quickly.
pub const SCENARIO_RETRY_BUDGET: Duration = Duration::from_millis(250);

/// OAuth configuration pointing at `mock` with a short retry budget.
#[must_use]
pub fn scenario_config(mock: &MockPasswordSafe) -> ClientConfig {
    ClientConfig::new(mock.base_url(), Credentials::oauth(CLIENT_ID, CLIENT_SECRET)).with_retry(
        RetryConfig::default()
            .with_initial_interval(Duration::from_millis(10))
            .with_max_interval(Duration::from_millis(40))
            .with_max_elapsed_time(SCENARIO_RETRY_BUDGET),
    )
}

/// Install a test subscriber once per process; later calls are no-ops.
pub fn init_scenario_tracing() {
    let config = TracingConfig::default()
        .with_log_level("passwordsafe_client=debug,warn")
        .without_ansi();
    passwordsafe_common::init_tracing(&config);
}
