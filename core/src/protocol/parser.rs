//! Response Protocol Parser Trait
//!
//! Defines the abstraction for turning model-authored text into file operations.
//!
//! # Design
//!
//! - `ResponseProtocolParser`: core trait for parsing and validation
//! - `FormatValidation`: validation results with warnings/errors
//! - parsing never fails; skipped directives surface as warnings

use super::types::{ParseOutput, ParseWarning};

/// Response protocol parser trait
///
/// Implementations must be thread-safe (Send + Sync) so one parser can be shared
/// by the step driver and the retry controller.
pub trait ResponseProtocolParser: Send + Sync {
    /// Returns the parser name (e.g., "marker")
    fn name(&self) -> &str;

    /// Parses a model response into operations.
    ///
    /// Never fails: malformed or unterminated directives are skipped and
    /// reported in `ParseOutput::warnings`.
    fn parse(&self, input: &str) -> ParseOutput;

    /// Validates a response without executing anything.
    fn validate_format(&self, input: &str) -> FormatValidation {
        let output = self.parse(input);
        if output.operations.is_empty() && !input.contains(self.format_identifier()) {
            return FormatValidation::with_errors(vec![FormatError::parse_error(
                None,
                format!("No '{}' directive found", self.format_identifier().trim()),
            )]);
        }
        FormatValidation::from_warnings(&output.warnings)
    }

    /// Returns a marker prefix used for auto-detection
    fn format_identifier(&self) -> &str;
}

/// Format validation result
#[derive(Debug, Clone)]
pub struct FormatValidation {
    /// Whether every directive in the input would be applied
    pub is_valid: bool,

    /// Non-fatal warnings (e.g., empty FILE_MODIFY block)
    pub warnings: Vec<FormatWarning>,

    /// Directives that will be dropped
    pub errors: Vec<FormatError>,
}

impl FormatValidation {
    /// Creates a validation result with only errors
    pub fn with_errors(errors: Vec<FormatError>) -> Self {
        Self {
            is_valid: false,
            warnings: vec![],
            errors,
        }
    }

    /// Creates a successful validation result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            warnings: vec![],
            errors: vec![],
        }
    }

    /// Splits parse warnings into dropped-directive errors and soft warnings.
    pub fn from_warnings(parse_warnings: &[ParseWarning]) -> Self {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        for w in parse_warnings {
            if w.is_dropped_operation() {
                errors.push(FormatError::parse_error(Some(w.line), w.message.clone()));
            } else {
                warnings.push(FormatWarning::new(Some(w.line), w.message.clone(), None));
            }
        }
        Self {
            is_valid: errors.is_empty(),
            warnings,
            errors,
        }
    }
}

/// Format warning (non-fatal)
#[derive(Debug, Clone)]
pub struct FormatWarning {
    /// Line number where the warning occurred (1-indexed, None if global)
    pub line: Option<usize>,

    pub message: String,

    /// Optional suggestion for fixing the warning
    pub suggestion: Option<String>,
}

impl FormatWarning {
    pub fn new(line: Option<usize>, message: String, suggestion: Option<String>) -> Self {
        Self {
            line,
            message,
            suggestion,
        }
    }
}

/// Format error (the directive is dropped)
#[derive(Debug, Clone)]
pub struct FormatError {
    /// Line number where the error occurred (1-indexed, None if global)
    pub line: Option<usize>,

    pub code: u16,

    pub message: String,
}

impl FormatError {
    pub fn new(line: Option<usize>, code: u16, message: String) -> Self {
        Self {
            line,
            code,
            message,
        }
    }

    /// Creates a parse error (code 2)
    pub fn parse_error(line: Option<usize>, message: String) -> Self {
        Self::new(line, crate::error::ErrorCode::ParseError.as_u16(), message)
    }
}
