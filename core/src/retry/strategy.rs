use std::time::Duration;

use crate::config::RetryConfig;

/// 重试策略：决定两次尝试之间的等待时间
pub trait RetryStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Delay after the failed `attempt` (1-based), or `None` when no attempt remains.
    fn next_delay(&self, attempt: u32, error: &str) -> Option<Duration>;

    fn max_attempts(&self) -> u32;
}

/// Constant delay between attempts (default: 2000 ms, 50 attempts).
#[derive(Debug, Clone)]
pub struct FixedDelayStrategy {
    delay: Duration,
    max_attempts: u32,
}

impl FixedDelayStrategy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(Duration::from_millis(cfg.delay_ms), cfg.max_retries)
    }
}

impl Default for FixedDelayStrategy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(super::RETRY_DELAY_MS),
            super::MAX_RETRIES,
        )
    }
}

impl RetryStrategy for FixedDelayStrategy {
    fn name(&self) -> &str {
        "fixed"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.delay)
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
