//! Property-based tests for passwordsafe-common.

use passwordsafe_common::{ErrorKind, RetryConfig, RetryPolicy, SafeError};
use proptest::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every jittered delay stays within the randomization window of its interval.
    #[test]
    fn prop_jittered_delay_within_window(
        initial_ms in 1u64..1_000,
        factor in 0.0f64..1.0,
    ) {
        let config = RetryConfig::default()
            .with_initial_interval(Duration::from_millis(initial_ms))
            .with_randomization_factor(factor)
            .with_max_elapsed_time(Duration::from_secs(3600));
        let mut backoff = RetryPolicy::new(config).backoff();

        let base = backoff.current_interval().as_secs_f64();
        let delay = backoff.next_delay().unwrap().as_secs_f64();

        prop_assert!(delay >= base * (1.0 - factor) - 1e-6);
        prop_assert!(delay <= base * (1.0 + factor) + 1e-6);
    }

    /// Intervals never shrink and never exceed the configured cap.
    #[test]
    fn prop_intervals_monotonic_and_capped(
        initial_ms in 1u64..500,
        multiplier in 1.0f64..3.0,
        cap_ms in 500u64..5_000,
    ) {
        let config = RetryConfig::default()
            .without_jitter()
            .with_initial_interval(Duration::from_millis(initial_ms))
            .with_multiplier(multiplier)
            .with_max_interval(Duration::from_millis(cap_ms))
            .with_max_elapsed_time(Duration::from_secs(3600));
        let mut backoff = RetryPolicy::new(config).backoff();

        let mut previous = Duration::ZERO;
        for _ in 0..10 {
            let delay = backoff.next_delay().unwrap();
            prop_assert!(delay >= previous);
            prop_assert!(delay <= Duration::from_millis(cap_ms.max(initial_ms)));
            previous = delay;
        }
    }

    /// Business errors are surfaced after exactly one attempt.
    #[test]
    fn prop_business_errors_called_once(
        status in 400u16..500,
        body in "[a-zA-Z0-9 ]{0,40}",
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let policy = RetryPolicy::new(
                RetryConfig::default().with_initial_interval(Duration::from_millis(1)),
            );
            let calls = AtomicU32::new(0);

            let result: Result<(), SafeError> = policy
                .execute("Op", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let body = body.clone();
                    async move { Err(SafeError::business(status, body)) }
                })
                .await;

            let err = result.unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::Business);
            prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
            Ok(())
        })?;
    }

    /// Item annotation keeps the underlying classification.
    #[test]
    fn prop_item_failed_preserves_kind(
        reference in "[a-z]{1,10}/[a-z]{1,10}",
        status in 500u16..600,
    ) {
        let err = SafeError::technical("Lookup", Some(status), "server error")
            .for_item(reference.clone(), "lookup");

        prop_assert!(err.is_retryable());
        prop_assert_eq!(err.status(), Some(status));
        prop_assert!(err.to_string().contains(&reference));
    }
}

#[tokio::test]
async fn test_technical_errors_retried_more_than_once() {
    let policy = RetryPolicy::new(
        RetryConfig::default()
            .with_initial_interval(Duration::from_millis(2))
            .with_max_interval(Duration::from_millis(10))
            .with_max_elapsed_time(Duration::from_millis(100)),
    );
    let calls = AtomicU32::new(0);

    let result: Result<(), SafeError> = policy
        .execute("Op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(SafeError::technical("Op", None, "connection reset")) }
        })
        .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::Technical);
    assert!(calls.load(Ordering::SeqCst) > 1);
}
