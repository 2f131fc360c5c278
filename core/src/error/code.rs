/// 错误代码：用于 CLI 退出码与错误诊断报告中的 `code` 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    GeneralError = 1,
    ParseError = 2,
    ValidationError = 3,
    DependencyError = 11,
    CircularDependency = 12,
    BackendError = 20,
    Timeout = 30,
    NetworkError = 40,
    CommandRejected = 50,
    CommandFailed = 52,
    FileNotFound = 60,
    FileAccessDenied = 61,
    InvalidPath = 64,
    PathTraversal = 65,
    RetryExhausted = 80,
    EscalatedStop = 81,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}
