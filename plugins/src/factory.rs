use std::sync::Arc;

use anyhow::Result;

use codepilot_core::config::AppConfig;
use codepilot_core::executor::{ProcessRunner, ShellProcessRunner};
use codepilot_core::llm::LlmClient;
use codepilot_core::retry::{FixedDelayStrategy, RetryStrategy};

use crate::llm::OpenAiCompatClient;
use crate::strategies::{ExponentialBackoffStrategy, LinearRetryStrategy};

pub fn build_llm(cfg: &AppConfig) -> Result<Arc<dyn LlmClient>> {
    let base_url = cfg.llm.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        anyhow::bail!("llm.base_url must be an http(s) URL, got {:?}", base_url);
    }
    if cfg.llm.api_key.trim().is_empty() {
        tracing::warn!(
            target: "codepilot.plugins",
            base_url = %base_url,
            "llm.api_key is empty; requests are sent without Authorization"
        );
    }
    Ok(Arc::new(OpenAiCompatClient::new(
        base_url.to_string(),
        cfg.llm.api_key.clone(),
        cfg.llm.timeout_ms,
    )?))
}

pub fn build_retry_strategy(cfg: &AppConfig) -> Arc<dyn RetryStrategy> {
    match cfg.retry.strategy.as_str() {
        "linear" => Arc::new(LinearRetryStrategy::new(cfg.retry.clone())),
        "exponential-backoff" | "exponential" => {
            Arc::new(ExponentialBackoffStrategy::new(cfg.retry.clone()))
        }
        "fixed" => Arc::new(FixedDelayStrategy::from_config(&cfg.retry)),
        other => {
            tracing::warn!(
                target: "codepilot.plugins",
                strategy = %other,
                "unknown retry strategy, falling back to fixed"
            );
            Arc::new(FixedDelayStrategy::from_config(&cfg.retry))
        }
    }
}

pub fn build_process_runner(_cfg: &AppConfig) -> Arc<dyn ProcessRunner> {
    Arc::new(ShellProcessRunner::new())
}
