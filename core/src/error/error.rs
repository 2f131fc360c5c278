use thiserror::Error;

use super::code::ErrorCode;
use super::executor::ExecutorError;
use super::planner::PlanError;
use super::retry::RetryError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("planning failed: {0}")]
    Plan(#[from] PlanError),
    #[error("execution failed: {0}")]
    Executor(#[from] ExecutorError),
    #[error("{0}")]
    Retry(#[from] RetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::ValidationError,
            Self::Plan(e) => e.error_code(),
            Self::Executor(e) => e.error_code(),
            Self::Retry(e) => e.error_code(),
            Self::Io(_) => ErrorCode::FileAccessDenied,
            Self::Anyhow(_) => ErrorCode::GeneralError,
        }
    }
}
