//! Backoff policy for transient store failures.

use std::time::Duration;

use reelpay_shared::RetryConfig;

use crate::ledger::LedgerError;

/// Exponential backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(RetryConfig::default())
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Longest delay after the given failed attempt (1-based).
    ///
    /// Doubles on every attempt and is capped at `max_delay`.
    #[must_use]
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// Drawn uniformly from the upper half of `backoff_ceiling`, so callers
    /// that failed together do not retry together.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let ceiling =
            u64::try_from(self.backoff_ceiling(attempt).as_micros()).unwrap_or(u64::MAX);
        Duration::from_micros(rand::random_range(ceiling / 2..=ceiling))
    }

    /// Returns true if another attempt should follow a failure of `attempt`.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32, error: &LedgerError) -> bool {
        attempt < self.max_attempts && error.is_retryable()
    }
}
