//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `codepilot_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from_path, AppConfig, EventsOutConfig, ExecutorConfig, LlmConfig,
    LoggingConfig, PlannerConfig, RetryConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::engine::{
    apply_response, run_request, NoopSessionObserver, RunSummary, SessionObserver,
};
pub use crate::error::{CliError, ErrorCode, ExecutorError, PlanError, RetryError};
pub use crate::events_out::EventsOutTx;
pub use crate::executor::{
    CommandExecutor, CommandOutput, CommandRequest, ProcessRunner, ResultEntry,
    ShellProcessRunner,
};
pub use crate::llm::{LlmClient, ModelConfig, ScriptedLlmClient};
pub use crate::planner::{ProgressEvent, StepStatus, TaskPlan, TaskPlanner, TaskStep};
pub use crate::protocol::{
    parse_response, FileOperation, FormatValidation, MarkerProtocolParser, ParseOutput,
    ParseWarning, ResponseProtocolParser,
};
pub use crate::retry::{
    EditorBridge, FixedDelayStrategy, RetryController, RetryStrategy, MAX_RETRIES, RETRY_DELAY_MS,
};
