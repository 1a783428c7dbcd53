//! Bounded retry schedule with exponential backoff.

use std::time::Duration;

/// A bounded retry schedule.
///
/// Attempts are numbered from 1. The schedule is explicit state rather than
/// an open-ended loop: callers iterate attempt numbers up to `max_attempts`
/// and sleep `delay(attempt)` between them, so exhaustion is an observable
/// transition. Jitter is the caller's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,

    /// Delay after the first failed attempt.
    pub base_delay: Duration,

    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with the given attempt cap and base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Builder method to cap individual delays.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Returns true if another attempt is allowed after `attempt` failed.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Backoff before the attempt following failed attempt number `attempt`.
    ///
    /// Doubles from `base_delay` and saturates at `max_delay`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(20);
        let delay = self.base_delay.saturating_mul(1u32 << exp);
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}
