use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use codepilot_core::llm::{LlmClient, ModelConfig};

use super::error::{preview_body, provider_message, ChatError};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// Chat-completion client for any endpoint speaking the OpenAI `/chat/completions` shape.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    api_key: String,
    http: reqwest::Client,
    url_completions: String,
}

impl OpenAiCompatClient {
    pub fn new(base_url: String, api_key: String, timeout_ms: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()?;
        let normalized = base_url.trim_end_matches('/');
        Ok(Self {
            api_key,
            http,
            url_completions: format!("{}/chat/completions", normalized),
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.trim().is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &ModelConfig,
    ) -> anyhow::Result<String> {
        let url = &self.url_completions;
        tracing::debug!(
            target: "codepilot.llm",
            stage = "llm.http.complete.in",
            url = %url,
            model = %model.model,
            system_len = system_prompt.len(),
            user_len = user_prompt.len()
        );

        let mut messages = Vec::with_capacity(2);
        if !system_prompt.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user_prompt,
        });
        let body = ChatRequest {
            model: &model.model,
            messages,
            temperature: model.temperature,
            max_tokens: model.max_tokens,
        };

        let req = self.http.post(url).json(&body);
        let resp = self
            .auth(req)
            .send()
            .await
            .map_err(|err| ChatError::from_reqwest(err, url))?;
        let status = resp.status().as_u16();
        let raw = resp
            .text()
            .await
            .map_err(|err| ChatError::from_reqwest(err, url))?;

        if !(200..300).contains(&status) {
            let err = ChatError::from_status(status, &raw);
            tracing::warn!(
                target: "codepilot.llm",
                status,
                transient = err.is_transient(),
                error = %err,
                "chat request rejected"
            );
            return Err(err.into());
        }

        let v: Value = serde_json::from_str(&raw).map_err(|source| ChatError::Decode {
            status,
            preview: preview_body(&raw),
            source,
        })?;
        // 部分网关出错时仍返回 200，把错误放在 body 里
        if let Some(message) = provider_message(&v) {
            return Err(ChatError::Provider { status, message }.into());
        }

        let Some(text) = extract_textish(&v).filter(|s| !s.trim().is_empty()) else {
            return Err(ChatError::EmptyCompletion {
                preview: preview_body(&raw),
            }
            .into());
        };

        tracing::debug!(
            target: "codepilot.llm",
            stage = "llm.http.complete.out",
            status = %status,
            response_len = text.len()
        );
        Ok(text)
    }
}

/// Pulls the completion text out of a chat response.
///
/// Accepts the OpenAI shape plus the flat `text` / `output_text` variants some
/// compatible gateways return.
fn extract_textish(v: &Value) -> Option<String> {
    // { choices: [ { message: { content: "..." } } ] }
    if let Some(s) = v
        .get("choices")
        .and_then(|x| x.get(0))
        .and_then(|x| x.get("message"))
        .and_then(|x| x.get("content"))
        .and_then(|x| x.as_str())
    {
        return Some(s.to_string());
    }
    // legacy completions: { choices: [ { text: "..." } ] }
    if let Some(s) = v
        .get("choices")
        .and_then(|x| x.get(0))
        .and_then(|x| x.get("text"))
        .and_then(|x| x.as_str())
    {
        return Some(s.to_string());
    }
    for key in ["output_text", "text"] {
        if let Some(s) = v.get(key).and_then(|x| x.as_str()) {
            return Some(s.to_string());
        }
    }
    None
}
