use thiserror::Error;

use super::code::ErrorCode;

/// Terminal outcomes of a retry loop.
#[derive(Error, Debug)]
pub enum RetryError {
    #[error("Operation '{context}' failed after {attempts} attempts. Last error: {last_error}")]
    Exhausted {
        context: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Operation '{context}' stopped at attempt {attempt}: {explanation}")]
    EscalatedStop {
        context: String,
        attempt: u32,
        explanation: String,
    },
}

impl RetryError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Exhausted { .. } => ErrorCode::RetryExhausted,
            Self::EscalatedStop { .. } => ErrorCode::EscalatedStop,
        }
    }
}
