use serde::{Deserialize, Serialize};

use crate::llm::ModelConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory every file operation and command is confined to.
    #[serde(default = "default_root")]
    pub root: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub events_out: EventsOutConfig,
}

fn default_root() -> String {
    ".".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            logging: LoggingConfig::default(),
            llm: LlmConfig::default(),
            executor: ExecutorConfig::default(),
            retry: RetryConfig::default(),
            planner: PlannerConfig::default(),
            events_out: EventsOutConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "codepilot_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Chat-completion endpoint used by the planner, the step driver and error diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout; the retry loop itself has no overall timeout.
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_temperature() -> f32 {
    0.2
}

fn default_llm_max_tokens() -> u32 {
    4096
}

fn default_llm_timeout_ms() -> u64 {
    120_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            temperature: default_llm_temperature(),
            max_tokens: default_llm_max_tokens(),
            timeout_ms: default_llm_timeout_ms(),
        }
    }
}

impl LlmConfig {
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Cap on captured stdout/stderr per foreground command.
    #[serde(default = "default_max_buffer_bytes")]
    pub max_buffer_bytes: usize,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// When non-empty, only these program names may run.
    #[serde(default)]
    pub allow_list: Vec<String>,

    /// Retry a failed `npm install` once with `--legacy-peer-deps`.
    #[serde(default = "default_legacy_peer_deps_fallback")]
    pub legacy_peer_deps_fallback: bool,
}

fn default_max_buffer_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_command_timeout_secs() -> u64 {
    600
}

fn default_legacy_peer_deps_fallback() -> bool {
    true
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: default_max_buffer_bytes(),
            command_timeout_secs: default_command_timeout_secs(),
            allow_list: Vec::new(),
            legacy_peer_deps_fallback: default_legacy_peer_deps_fallback(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// "fixed", "linear" or "exponential-backoff".
    #[serde(default = "default_retry_strategy")]
    pub strategy: String,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_true")]
    pub auto_install_dependencies: bool,

    #[serde(default = "default_true")]
    pub ai_repair: bool,
}

fn default_retry_strategy() -> String {
    "fixed".to_string()
}

fn default_max_retries() -> u32 {
    crate::retry::MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    crate::retry::RETRY_DELAY_MS
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: default_retry_strategy(),
            max_retries: default_max_retries(),
            delay_ms: default_retry_delay_ms(),
            max_delay_ms: default_retry_max_delay_ms(),
            auto_install_dependencies: true,
            ai_repair: true,
        }
    }
}

/// Optional overrides for the fixed instructions sent to the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub planning_prompt: Option<String>,

    #[serde(default)]
    pub step_prompt: Option<String>,

    #[serde(default)]
    pub diagnosis_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsOutConfig {
    #[serde(default)]
    pub enabled: bool,
    /// File path, or "stdout:" to stream JSONL to standard output.
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_true")]
    pub drop_when_full: bool,
}

fn default_channel_capacity() -> usize {
    2048
}

impl Default for EventsOutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: String::new(),
            channel_capacity: default_channel_capacity(),
            drop_when_full: true,
        }
    }
}
