use serde_json::Value;
use thiserror::Error;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Failures of a chat-completion call, classified by who is at fault.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat request to {url} timed out")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Connection refused, DNS, TLS, or the body stream broke mid-read.
    #[error("chat request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx status, or a 2xx body carrying an `error` object.
    #[error("provider rejected chat request (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("chat response is not JSON (status {status}): {source} | body={preview}")]
    Decode {
        status: u16,
        preview: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("chat response has no completion text | body={preview}")]
    EmptyCompletion { preview: String },
}

impl ChatError {
    pub(crate) fn from_reqwest(source: reqwest::Error, url: &str) -> Self {
        let url = url.to_string();
        if source.is_timeout() {
            Self::Timeout { url, source }
        } else {
            Self::Transport { url, source }
        }
    }

    /// Builds a `Provider` error from a non-2xx response body.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| provider_message(&v))
            .unwrap_or_else(|| preview_body(body));
        Self::Provider { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Timeout { source, .. } | Self::Transport { source, .. } => {
                source.status().map(|s| s.as_u16())
            }
            Self::EmptyCompletion { .. } => None,
        }
    }

    /// Rate limits, gateway hiccups and network failures may pass on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Provider { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::Decode { .. } | Self::EmptyCompletion { .. } => false,
        }
    }
}

/// Reads the provider's own error text: `{"error":{"message":..}}`, `{"error":".."}`
/// or a top-level `message`.
pub(crate) fn provider_message(v: &Value) -> Option<String> {
    let err = v.get("error");
    let text = err
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| err.and_then(Value::as_str))
        .or_else(|| {
            // 只有带 error 字段时才把顶层 message 当作错误
            err.and_then(|_| v.get("message")).and_then(Value::as_str)
        })?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    match trimmed.char_indices().nth(BODY_PREVIEW_LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
