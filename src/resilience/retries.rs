//! Bounded retry loop shared by all bootstrap steps.
//!
//! # Responsibilities
//! - Run an operation at least once
//! - Retry failures at a fixed interval until the startup timer elapses
//! - Report attempts and the last error once the window is exhausted
//!
//! Only errors the operation returns are retried, so callers decide what is
//! transient by what they return from the closure. Fatal errors belong
//! outside the loop.

use std::future::Future;

use thiserror::Error;

use crate::resilience::timer::StartupTimer;

/// The retry window closed without a successful attempt.
#[derive(Debug, Error)]
#[error("{what} failed after {attempts} attempt(s): {source}")]
pub struct RetryError<E: std::error::Error + 'static> {
    pub what: &'static str,
    pub attempts: u32,
    #[source]
    pub source: E,
}

/// Run `op` until it succeeds or `timer` elapses.
///
/// The first attempt always happens, so an already elapsed timer means
/// "try once". No attempt starts after the deadline: with window `W` and
/// interval `I` the operation runs `ceil(W / I)` times.
pub async fn retry_until_elapsed<T, E, F, Fut>(
    timer: &StartupTimer,
    what: &'static str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let err = match op().await {
            Ok(value) => {
                if attempts > 1 {
                    tracing::info!(what, attempts, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        tracing::warn!(
            what,
            attempt = attempts,
            remaining_ms = timer.remaining().as_millis() as u64,
            error = %err,
            "Attempt failed"
        );

        if !timer.has_not_elapsed() {
            return Err(RetryError { what, attempts, source: err });
        }
        timer.sleep_for_interval().await;
        if !timer.has_not_elapsed() {
            return Err(RetryError { what, attempts, source: err });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Error)]
    #[error("unreachable")]
    struct Unreachable;

    #[tokio::test(start_paused = true)]
    async fn test_attempt_count_matches_window() {
        let cases = [(10, 3, 4), (9, 3, 3), (10, 1, 10), (1, 5, 1)];
        for (window, interval, expected) in cases {
            let timer = StartupTimer::new(Duration::from_secs(window), Duration::from_secs(interval));
            let mut calls = 0u32;
            let err = retry_until_elapsed(&timer, "core version fetch", || {
                calls += 1;
                async { Err::<(), _>(Unreachable) }
            })
            .await
            .unwrap_err();

            assert_eq!(calls, expected, "window={window} interval={interval}");
            assert_eq!(err.attempts, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_timer_tries_once() {
        let timer = StartupTimer::new(Duration::ZERO, Duration::from_secs(1));
        let start = tokio::time::Instant::now();
        let mut calls = 0;
        let result = retry_until_elapsed(&timer, "core version fetch", || {
            calls += 1;
            async { Err::<(), _>(Unreachable) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_success() {
        let timer = StartupTimer::new(Duration::from_secs(30), Duration::from_secs(1));
        let mut calls = 0;
        let value = retry_until_elapsed(&timer, "core version fetch", || {
            calls += 1;
            let n = calls;
            async move {
                if n < 3 {
                    Err(Unreachable)
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
    }

    #[test]
    fn test_error_display() {
        let err = RetryError {
            what: "database connect",
            attempts: 4,
            source: Unreachable,
        };
        assert_eq!(
            err.to_string(),
            "database connect failed after 4 attempt(s): unreachable"
        );
    }
}
