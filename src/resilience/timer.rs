//! Startup timer bounding every bootstrap retry loop.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::StartupConfig;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A fixed deadline plus a fixed retry interval.
///
/// Each bootstrap step owns its own timer; the deadline is set at
/// construction and never moves.
#[derive(Debug, Clone)]
pub struct StartupTimer {
    deadline: Instant,
    interval: Duration,
}

impl StartupTimer {
    /// Create a timer whose deadline is `duration` from now.
    ///
    /// A zero interval is clamped to one millisecond so retry loops always
    /// yield between attempts.
    pub fn new(duration: Duration, interval: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Create a timer from the configured startup policy.
    pub fn from_config(config: &StartupConfig) -> Self {
        Self::new(config.duration(), config.interval())
    }

    /// True while the deadline has not passed.
    pub fn has_not_elapsed(&self) -> bool {
        Instant::now() < self.deadline
    }

    /// Suspend the calling task for one retry interval.
    pub async fn sleep_for_interval(&self) {
        tokio::time::sleep(self.interval).await;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left before the deadline, zero once elapsed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_elapses_after_duration() {
        let timer = StartupTimer::new(Duration::from_secs(3), Duration::from_secs(1));
        assert!(timer.has_not_elapsed());

        timer.sleep_for_interval().await;
        timer.sleep_for_interval().await;
        assert!(timer.has_not_elapsed());
        assert_eq!(timer.remaining(), Duration::from_secs(1));

        timer.sleep_for_interval().await;
        assert!(!timer.has_not_elapsed());
        assert_eq!(timer.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_is_already_elapsed() {
        let timer = StartupTimer::new(Duration::ZERO, Duration::from_secs(1));
        assert!(!timer.has_not_elapsed());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let timer = StartupTimer::new(Duration::from_secs(1), Duration::ZERO);
        assert_eq!(timer.interval(), MIN_INTERVAL);
    }
}
