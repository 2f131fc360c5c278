use thiserror::Error;

use super::code::ErrorCode;

/// Errors produced while building or advancing a task plan.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("invalid plan format: {0}")]
    Format(String),

    #[error("plan failed structural validation: {0}")]
    Validation(String),

    #[error("planning request failed: {0}")]
    Llm(#[source] anyhow::Error),

    #[error("step {0} is out of range")]
    StepOutOfRange(usize),

    #[error("step {step} cannot start: dependency {dependency} is not completed")]
    DependencyNotMet { step: usize, dependency: usize },
}

impl PlanError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Format(_) => ErrorCode::ParseError,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Llm(_) => ErrorCode::BackendError,
            Self::StepOutOfRange(_) => ErrorCode::ValidationError,
            Self::DependencyNotMet { .. } => ErrorCode::DependencyError,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Format(_) | Self::Validation(_) => "FormatError",
            Self::Llm(_) => "ModelRequestError",
            Self::StepOutOfRange(_) | Self::DependencyNotMet { .. } => "PlanStateError",
        }
    }
}
