//! Retry policy for batch items that fail with transient errors.

use std::time::Duration;

use bridge_config::SyncConfig;

/// Capped exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Backoff is capped here.
    pub max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Whether another attempt is allowed after `attempt` failed.
    #[must_use]
    pub const fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        }
    }

    #[rstest]
    #[case(1, 100)]
    #[case(2, 200)]
    #[case(3, 350)]
    #[case(40, 350)]
    fn delay_doubles_until_capped(#[case] attempt: u32, #[case] expected_ms: u64) {
        assert_eq!(policy().delay_after(attempt), Duration::from_millis(expected_ms));
    }

    #[test]
    fn attempts_are_bounded() {
        let policy = policy();
        assert!(policy.allows_retry_after(3));
        assert!(!policy.allows_retry_after(4));
    }

    #[test]
    fn default_config_never_retries() {
        let policy = RetryPolicy::from_config(&SyncConfig::default());
        assert!(!policy.allows_retry_after(1));
    }
}
