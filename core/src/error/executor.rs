use thiserror::Error;

use super::code::ErrorCode;

/// Errors raised while applying file operations or running commands.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("command rejected ({reason}): {command}")]
    Sanitization { command: String, reason: String },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("path traversal detected: {0}")]
    PathTraversal(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed: {command}\nError: {message}\nStderr: {stderr}")]
    CommandFailed {
        command: String,
        message: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("command timed out after {secs}s: {command}")]
    Timeout { command: String, secs: u64 },
}

impl ExecutorError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Sanitization { .. } => ErrorCode::CommandRejected,
            Self::InvalidPath(_) => ErrorCode::InvalidPath,
            Self::PathTraversal(_) => ErrorCode::PathTraversal,
            Self::FileNotFound(_) => ErrorCode::FileNotFound,
            Self::Io { .. } => ErrorCode::FileAccessDenied,
            Self::Spawn { .. } => ErrorCode::CommandFailed,
            Self::CommandFailed { .. } => ErrorCode::CommandFailed,
            Self::Timeout { .. } => ErrorCode::Timeout,
        }
    }

    /// Short error class name, reported to the diagnosis service.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Sanitization { .. } => "SanitizationError",
            Self::InvalidPath(_) | Self::PathTraversal(_) => "PathValidationError",
            Self::FileNotFound(_) => "FileNotFoundError",
            Self::Io { .. } => "IoError",
            Self::Spawn { .. } => "SpawnError",
            Self::CommandFailed { .. } => "CommandExecutionError",
            Self::Timeout { .. } => "TimeoutError",
        }
    }

    /// The command line that produced this error, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Sanitization { command, .. }
            | Self::Spawn { command, .. }
            | Self::CommandFailed { command, .. }
            | Self::Timeout { command, .. } => Some(command),
            _ => None,
        }
    }

    /// Platform error code: the process exit status or the raw OS errno.
    pub fn platform_code(&self) -> Option<String> {
        match self {
            Self::CommandFailed { exit_code, .. } => exit_code.map(|c| c.to_string()),
            Self::Io { source, .. } | Self::Spawn { source, .. } => source
                .raw_os_error()
                .map(|c| c.to_string())
                .or_else(|| Some(format!("{:?}", source.kind()))),
            _ => None,
        }
    }

    pub fn is_path_validation(&self) -> bool {
        matches!(self, Self::InvalidPath(_) | Self::PathTraversal(_))
    }
}
