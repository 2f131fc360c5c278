use std::time::Duration;

use codepilot_core::config::RetryConfig;
use codepilot_core::retry::RetryStrategy;

/// Doubles the delay after every failed attempt, capped at `max_delay_ms`.
pub struct ExponentialBackoffStrategy {
    config: RetryConfig,
}

/// Grows the delay by `delay_ms` per failed attempt, capped at `max_delay_ms`.
pub struct LinearRetryStrategy {
    config: RetryConfig,
}

impl ExponentialBackoffStrategy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl LinearRetryStrategy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl RetryStrategy for ExponentialBackoffStrategy {
    fn name(&self) -> &str {
        "exponential-backoff"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Option<Duration> {
        if attempt >= self.config.max_retries {
            return None;
        }
        // attempt 从 1 开始：第一次失败后等待 delay_ms
        let exp = 1u64 << attempt.saturating_sub(1).min(30);
        let delay = self.config.delay_ms.saturating_mul(exp);
        let delay = delay.min(self.config.max_delay_ms);
        Some(Duration::from_millis(delay))
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_retries
    }
}

impl RetryStrategy for LinearRetryStrategy {
    fn name(&self) -> &str {
        "linear"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Option<Duration> {
        if attempt >= self.config.max_retries {
            return None;
        }
        let multiplier = attempt.max(1) as u64;
        let delay = self.config.delay_ms.saturating_mul(multiplier);
        let delay = delay.min(self.config.max_delay_ms);
        Some(Duration::from_millis(delay))
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_retries
    }
}
