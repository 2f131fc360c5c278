use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Per-request model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 4096,
        }
    }
}

/// Chat-completion collaborator.
///
/// A single instance is built per session and shared (via `Arc`) by the planner,
/// the step driver and the error analyzer.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &ModelConfig,
    ) -> anyhow::Result<String>;
}
