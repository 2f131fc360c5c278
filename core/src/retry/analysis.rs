//! AI-assisted error diagnosis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{ExecutorError, PlanError};
use crate::llm::{LlmClient, ModelConfig};
use crate::util::text::{preview, strip_code_fences};

pub const DIAGNOSIS_PROMPT: &str = r#"You are an expert debugging assistant embedded in an automated coding tool.
You receive a JSON error report with: message, stack, name, code, command, previousSolution, platform.

Respond with ONE JSON object and nothing else:
{
  "analysis": "<root cause>",
  "explanation": "<what the fix does, or why a human is needed>",
  "solution": "<fix to apply, or null>",
  "shouldStop": <true if the error cannot be fixed automatically>
}

The solution may be:
- file operations in the marker format ($$$ FILE_CREATE path ... $$$ FILE_END %%%, $$$ FILE_MODIFY path ... $$$ FILE_END %%%, $$$ FOLDER_CREATE path %%%),
- package manager commands (npm, yarn, pnpm, pip), one per line,
- a single shell command without pipes, redirection or chaining.
Do not repeat previousSolution if it did not work."#;

/// Payload sent to the diagnosis model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,
    pub stack: Vec<String>,
    pub name: String,
    pub code: Option<String>,
    pub command: Option<String>,
    pub previous_solution: Option<String>,
    pub platform: String,
}

impl ErrorReport {
    pub fn from_error(err: &anyhow::Error, previous_solution: Option<&str>) -> Self {
        let stack = err.chain().skip(1).map(|e| e.to_string()).collect();
        let (name, code, command) = if let Some(e) = err.downcast_ref::<ExecutorError>() {
            (
                e.kind_name().to_string(),
                e.platform_code()
                    .or_else(|| Some(e.error_code().as_u16().to_string())),
                e.command().map(str::to_string),
            )
        } else if let Some(e) = err.downcast_ref::<PlanError>() {
            (
                e.kind_name().to_string(),
                Some(e.error_code().as_u16().to_string()),
                None,
            )
        } else {
            ("Error".to_string(), None, None)
        };

        Self {
            message: err.to_string(),
            stack,
            name,
            code,
            command,
            previous_solution: previous_solution.map(str::to_string),
            platform: std::env::consts::OS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorAnalysis {
    pub analysis: String,
    pub explanation: String,
    pub solution: Option<String>,
    pub should_stop: bool,
}

impl ErrorAnalysis {
    /// Analysis used when the diagnosis response cannot be trusted.
    pub fn needs_user_input(reason: impl Into<String>) -> Self {
        Self {
            analysis: "needs_user_input".to_string(),
            explanation: reason.into(),
            solution: None,
            should_stop: true,
        }
    }
}

/// Parses a diagnosis response. Malformed or incomplete responses stop the loop.
pub fn parse_analysis(raw: &str) -> ErrorAnalysis {
    let body = strip_code_fences(raw);
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            return ErrorAnalysis::needs_user_input(format!(
                "diagnosis response is not JSON ({e}): {}",
                preview(body, 200)
            ))
        }
    };

    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    let (Some(analysis), Some(explanation), Some(should_stop)) = (
        text("analysis"),
        text("explanation"),
        value.get("shouldStop").and_then(Value::as_bool),
    ) else {
        return ErrorAnalysis::needs_user_input(
            "diagnosis response is missing analysis, explanation or shouldStop",
        );
    };

    let solution = text("solution").filter(|s| !s.trim().is_empty());
    ErrorAnalysis {
        analysis,
        explanation,
        solution,
        should_stop,
    }
}

#[async_trait]
pub trait ErrorAnalyzer: Send + Sync {
    /// Returns `None` when diagnosis itself is unavailable.
    async fn analyze(&self, report: &ErrorReport) -> Option<ErrorAnalysis>;
}

/// Diagnosis through the session's chat-completion client.
pub struct LlmErrorAnalyzer {
    llm: Arc<dyn LlmClient>,
    model: ModelConfig,
    system_prompt: String,
}

impl LlmErrorAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>, model: ModelConfig) -> Self {
        Self {
            llm,
            model,
            system_prompt: DIAGNOSIS_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[async_trait]
impl ErrorAnalyzer for LlmErrorAnalyzer {
    async fn analyze(&self, report: &ErrorReport) -> Option<ErrorAnalysis> {
        let user = match serde_json::to_string_pretty(report) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(target: "codepilot.retry", error = %e, "cannot encode error report");
                return None;
            }
        };
        match self.llm.complete(&self.system_prompt, &user, &self.model).await {
            Ok(raw) => Some(parse_analysis(&raw)),
            Err(e) => {
                tracing::warn!(target: "codepilot.retry", error = %e, "error diagnosis unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_carries_command_and_exit_code() {
        let err = anyhow::Error::new(ExecutorError::CommandFailed {
            command: "npm run build".into(),
            message: "exited with status 2".into(),
            stderr: "SyntaxError".into(),
            exit_code: Some(2),
        });
        let report = ErrorReport::from_error(&err, Some("npm install"));
        assert_eq!(report.name, "CommandExecutionError");
        assert_eq!(report.code.as_deref(), Some("2"));
        assert_eq!(report.command.as_deref(), Some("npm run build"));
        assert_eq!(report.previous_solution.as_deref(), Some("npm install"));
        assert!(report.message.contains("SyntaxError"));
    }

    #[test]
    fn parses_complete_analysis() {
        let a = parse_analysis(
            r#"```json
{"analysis": "missing script", "explanation": "add build script", "solution": "npm pkg set scripts.build=vite", "shouldStop": false}
```"#,
        );
        assert_eq!(
            a,
            ErrorAnalysis {
                analysis: "missing script".into(),
                explanation: "add build script".into(),
                solution: Some("npm pkg set scripts.build=vite".into()),
                should_stop: false,
            }
        );
    }

    #[test]
    fn malformed_analysis_stops() {
        assert!(parse_analysis("I think you should reinstall").should_stop);
        let a = parse_analysis(r#"{"analysis": "x", "solution": null}"#);
        assert!(a.should_stop);
        assert_eq!(a.analysis, "needs_user_input");
    }

    #[tokio::test]
    async fn llm_failure_yields_no_analysis() {
        let llm = Arc::new(ScriptedLlmClient::default());
        llm.push_error("timeout");
        let analyzer = LlmErrorAnalyzer::new(llm, ModelConfig::default());
        let report = ErrorReport::from_error(&anyhow::anyhow!("boom"), None);
        assert!(analyzer.analyze(&report).await.is_none());
    }
}
