use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::traits::{LlmClient, ModelConfig};

/// A recorded `complete` call.
#[derive(Debug, Clone)]
pub struct RecordedPrompt {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Replays a fixed queue of responses, in order.
///
/// Used for offline runs and tests. An exhausted queue yields an error so a
/// runaway loop surfaces instead of hanging.
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    responses: Mutex<VecDeque<anyhow::Result<String>>>,
    prompts: Mutex<Vec<RecordedPrompt>>,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|s| Ok(s.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut q) = self.responses.lock() {
            q.push_back(Ok(response.into()));
        }
    }

    pub fn push_error(&self, message: impl Into<String>) {
        if let Ok(mut q) = self.responses.lock() {
            q.push_back(Err(anyhow::anyhow!(message.into())));
        }
    }

    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _model: &ModelConfig,
    ) -> anyhow::Result<String> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(RecordedPrompt {
                system_prompt: system_prompt.to_string(),
                user_prompt: user_prompt.to_string(),
            });
        }
        let next = self
            .responses
            .lock()
            .map_err(|_| anyhow::anyhow!("scripted response queue poisoned"))?
            .pop_front();
        next.unwrap_or_else(|| Err(anyhow::anyhow!("scripted responses exhausted")))
    }
}
