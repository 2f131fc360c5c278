//! Chat-completion abstraction shared by planning, step execution and error diagnosis.

mod scripted;
mod traits;

pub use scripted::{RecordedPrompt, ScriptedLlmClient};
pub use traits::{LlmClient, ModelConfig};
