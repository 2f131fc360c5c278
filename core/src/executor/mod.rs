//! Applies parsed operations to the filesystem and runs shell commands.

mod engine;
mod patch;
mod process;
mod python;
mod sanitize;
mod types;
mod workspace;

pub use engine::{command_env, CommandExecutor};
pub use patch::{apply_edits, PatchOutcome};
pub use process::{CommandOutput, CommandRequest, ProcessRunner, ShellProcessRunner};
pub use python::{is_python_command, normalize_python_error};
pub use sanitize::sanitize_command;
pub use types::{ExecutorOptions, ResultEntry, RunReport};
pub use workspace::Workspace;
