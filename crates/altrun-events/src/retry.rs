//! Back-off for transient events API failures.
//!
//! Supabase answers 429 with a `Retry-After` hint; when present it is used
//! as-is (capped). Network failures, 5xx and hint-less 429s back off
//! exponentially with ±25 % jitter. Anything else fails immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::EventsError;

const MAX_DELAY: Duration = Duration::from_secs(30);

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &EventsError) -> bool {
    match err {
        EventsError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        EventsError::RateLimited { .. } => true,
        EventsError::UnexpectedStatus { status, .. } => *status >= 500,
        EventsError::Deserialize { .. } | EventsError::InvalidBaseUrl { .. } => false,
    }
}

/// Delay before the `retry`-th retry (1-based) after `err`.
pub(crate) fn next_delay(err: &EventsError, retry: u32, backoff_base_ms: u64) -> Duration {
    if let EventsError::RateLimited {
        retry_after: Some(wait),
    } = err
    {
        return (*wait).min(MAX_DELAY);
    }
    let exponent = retry.saturating_sub(1).min(10);
    let base = Duration::from_millis(backoff_base_ms.saturating_mul(1u64 << exponent)).min(MAX_DELAY);
    base.mul_f64(rand::rng().random_range(0.75..=1.25))
}

/// Runs `operation`, retrying transient failures up to `max_retries` times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, EventsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EventsError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retries < max_retries && is_retriable(&err) => err,
            Err(err) => return Err(err),
        };
        retries += 1;
        let delay = next_delay(&err, retries, backoff_base_ms);
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "events request failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn deserialize_err() -> EventsError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        EventsError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    fn rate_limited(secs: Option<u64>) -> EventsError {
        EventsError::RateLimited {
            retry_after: secs.map(Duration::from_secs),
        }
    }

    #[test]
    fn rate_limited_is_retriable() {
        assert!(is_retriable(&rate_limited(None)));
        assert!(is_retriable(&rate_limited(Some(2))));
    }

    #[test]
    fn server_errors_are_retriable_client_errors_are_not() {
        assert!(is_retriable(&EventsError::UnexpectedStatus {
            status: 502,
            url: "u".to_owned()
        }));
        assert!(!is_retriable(&EventsError::UnexpectedStatus {
            status: 401,
            url: "u".to_owned()
        }));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn retry_after_hint_overrides_backoff() {
        assert_eq!(
            next_delay(&rate_limited(Some(4)), 3, 1_000),
            Duration::from_secs(4)
        );
    }

    #[test]
    fn retry_after_hint_is_capped() {
        assert_eq!(next_delay(&rate_limited(Some(600)), 1, 1_000), MAX_DELAY);
    }

    #[test]
    fn backoff_doubles_within_jitter_bounds() {
        let err = rate_limited(None);
        for (retry, nominal_ms) in [(1, 1_000u64), (2, 2_000), (3, 4_000)] {
            let delay = next_delay(&err, retry, 1_000);
            let ms = u64::try_from(delay.as_millis()).unwrap();
            assert!(
                (nominal_ms * 3 / 4..=nominal_ms * 5 / 4).contains(&ms),
                "retry {retry}: {ms}ms"
            );
        }
    }

    #[test]
    fn backoff_never_exceeds_cap() {
        let err = EventsError::UnexpectedStatus {
            status: 503,
            url: "u".to_owned(),
        };
        assert!(next_delay(&err, 20, 10_000) <= MAX_DELAY.mul_f64(1.25));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(rate_limited(None))
                } else {
                    Ok(7u32)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_the_retry_after_hint() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let started = tokio::time::Instant::now();
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(rate_limited(Some(3)))
                } else {
                    Ok(())
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(rate_limited(None))
            }
        })
        .await;
        assert!(matches!(result, Err(EventsError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_deserialize_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(deserialize_err())
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
