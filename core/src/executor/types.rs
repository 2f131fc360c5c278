use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ExecutorError;

/// Outcome of one applied operation or command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub description: String,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ResultEntry {
    pub fn ok(description: impl Into<String>, output: Option<String>) -> Self {
        Self {
            description: description.into(),
            succeeded: true,
            output,
        }
    }

    pub fn failed(description: impl Into<String>, output: Option<String>) -> Self {
        Self {
            description: description.into(),
            succeeded: false,
            output,
        }
    }
}

/// Entries produced by one `run`, plus the error that stopped it, if any.
///
/// On failure `entries` holds every completed entry followed by one failed entry.
#[derive(Debug, Default)]
pub struct RunReport {
    pub entries: Vec<ResultEntry>,
    pub error: Option<ExecutorError>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Vec<ResultEntry>, ExecutorError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.entries),
        }
    }
}

/// Executor tuning derived from `ExecutorConfig`.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub max_output_bytes: usize,
    pub command_timeout: Duration,
    pub allow_list: Vec<String>,
    pub legacy_peer_deps_fallback: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_output_bytes: 10 * 1024 * 1024,
            command_timeout: Duration::from_secs(600),
            allow_list: Vec::new(),
            legacy_peer_deps_fallback: true,
        }
    }
}

impl From<&crate::config::ExecutorConfig> for ExecutorOptions {
    fn from(cfg: &crate::config::ExecutorConfig) -> Self {
        Self {
            max_output_bytes: cfg.max_buffer_bytes,
            command_timeout: Duration::from_secs(cfg.command_timeout_secs),
            allow_list: cfg.allow_list.clone(),
            legacy_peer_deps_fallback: cfg.legacy_peer_deps_fallback,
        }
    }
}
