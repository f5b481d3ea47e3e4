//! Batch synchronization settings.

use serde::{Deserialize, Serialize};

const fn default_concurrency() -> usize {
    4
}

/// One attempt per item: failures are reported, not retried.
const fn default_max_attempts() -> u32 {
    1
}

const fn default_base_delay_ms() -> u64 {
    200
}

const fn default_max_delay_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Maximum number of entities reconciled at once during a batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Attempts per batch item (including the first) for retryable failures.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff before the first retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff cap.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl SyncConfig {
    /// Whether batch items are retried automatically.
    pub const fn retries_enabled(&self) -> bool {
        self.max_attempts > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = SyncConfig::default();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_attempts, 1);
        assert!(!config.retries_enabled());
    }
}
