//! Retry policy with randomized exponential backoff.
//!
//! Only technical errors are retried. The loop is bounded by a total
//! elapsed-time budget rather than an attempt count.

use crate::{SafeError, SafeResult};
use std::time::{Duration, Instant};
use tracing::warn;

/// Backoff configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry
    pub initial_interval: Duration,
    /// Growth factor applied to the interval after each retry
    pub multiplier: f64,
    /// Relative jitter applied to every interval, in `[0, 1]`
    pub randomization_factor: f64,
    /// Upper bound for a single interval
    pub max_interval: Duration,
    /// Total time budget across all attempts
    pub max_elapsed_time: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_interval: Duration::from_secs(60),
            max_elapsed_time: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Set the initial interval.
    #[must_use]
    pub const fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Set the randomization factor (clamped to 0.0-1.0).
    #[must_use]
    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Set the multiplier (values below 1.0 are raised to 1.0).
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Set the maximum single interval.
    #[must_use]
    pub const fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Set the total elapsed-time budget.
    #[must_use]
    pub const fn with_max_elapsed_time(mut self, budget: Duration) -> Self {
        self.max_elapsed_time = budget;
        self
    }

    /// Disable jitter.
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.randomization_factor = 0.0;
        self
    }
}

/// Backoff state for one retried call.
#[derive(Debug)]
pub struct Backoff {
    config: RetryConfig,
    current_interval: Duration,
    started: Instant,
}

impl Backoff {
    fn new(config: RetryConfig) -> Self {
        Self {
            current_interval: config.initial_interval,
            config,
            started: Instant::now(),
        }
    }

    /// Un-randomized interval that the next delay is derived from.
    #[must_use]
    pub const fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Next delay to sleep, or `None` once the elapsed-time budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let delay = self.randomized(self.current_interval);
        if self.started.elapsed() + delay > self.config.max_elapsed_time {
            return None;
        }

        let grown = (self.current_interval.as_nanos() as f64 * self.config.multiplier).round();
        let cap = self.config.max_interval.as_nanos() as f64;
        self.current_interval = Duration::from_nanos(grown.min(cap) as u64);

        Some(delay)
    }

    fn randomized(&self, interval: Duration) -> Duration {
        let factor = self.config.randomization_factor;
        if factor <= 0.0 {
            return interval;
        }
        let base = interval.as_secs_f64();
        let delta = base * factor;
        // uniform in [base - delta, base + delta]
        let offset = rand::random::<f64>().mul_add(2.0 * delta, -delta);
        Duration::from_secs_f64((base + offset).max(0.0))
    }
}

/// Retry policy for executing API calls with automatic retries.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Borrow the configuration.
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Start a fresh backoff sequence.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.config.clone())
    }

    /// Execute an async operation, retrying technical errors.
    ///
    /// Business and validation errors are returned after the first attempt.
    ///
    /// # Errors
    ///
    /// Returns the non-retryable error, or the last technical error once the
    /// elapsed-time budget is exhausted.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut call: F) -> SafeResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = SafeResult<T>>,
    {
        let mut backoff = self.backoff();
        let mut attempt: u32 = 1;
        loop {
            let error: SafeError = match call().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            let Some(delay) = backoff.next_delay() else {
                warn!(operation, attempt, error = %error, "Retry budget exhausted");
                return Err(error);
            };

            warn!(
                operation,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Retrying after technical error"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
