use std::sync::Arc;

use serde_json::Value;

use super::types::{TaskPlan, TaskStep};
use super::validate::{as_index, validate};
use crate::error::PlanError;
use crate::llm::{LlmClient, ModelConfig};
use crate::util::text::{preview, strip_code_fences};

/// Fixed planning instruction sent as the system prompt.
pub const PLANNING_PROMPT: &str = r#"You are a software project planner. Break the user's request into an ordered list of concrete implementation steps.

Respond with ONE JSON object and nothing else:
{
  "totalSteps": <number of steps>,
  "steps": [
    {
      "description": "<what this step does>",
      "files": ["<relative paths this step creates or changes>"],
      "dependencies": [<0-based indices of steps that must finish first>]
    }
  ]
}

Rules:
- totalSteps must equal the length of steps.
- Every description must be non-empty.
- A step may only depend on other steps of this plan; no cycles.
- Do not wrap the JSON in markdown fences."#;

/// Turns a free-text request into a validated `TaskPlan`.
pub struct TaskPlanner {
    llm: Arc<dyn LlmClient>,
    model: ModelConfig,
    system_prompt: String,
}

impl TaskPlanner {
    pub fn new(llm: Arc<dyn LlmClient>, model: ModelConfig) -> Self {
        Self {
            llm,
            model,
            system_prompt: PLANNING_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub async fn plan(&self, request: &str) -> Result<TaskPlan, PlanError> {
        tracing::info!(target: "codepilot.planner", model = %self.model.model, "requesting plan");
        let raw = self
            .llm
            .complete(&self.system_prompt, request, &self.model)
            .await
            .map_err(PlanError::Llm)?;
        let plan = parse_plan(request, &raw)?;
        tracing::info!(target: "codepilot.planner", steps = plan.total_steps, "plan accepted");
        Ok(plan)
    }
}

/// Strips fences and backticks; the remainder must be a `{...}` object.
pub fn normalize_response(raw: &str) -> Result<&str, PlanError> {
    let body = strip_code_fences(raw).trim_matches('`').trim();
    if body.starts_with('{') && body.ends_with('}') {
        Ok(body)
    } else {
        Err(PlanError::Format(format!(
            "expected a JSON object, got: {}",
            preview(body, 200)
        )))
    }
}

/// Parses and validates a planning response into a fresh plan.
///
/// Only `description`, `files` and `dependencies` are read from each step;
/// statuses and the cursor always start over.
pub fn parse_plan(request: &str, raw: &str) -> Result<TaskPlan, PlanError> {
    let body = normalize_response(raw)?;
    let value: Value = serde_json::from_str(body)
        .map_err(|e| PlanError::Format(format!("plan is not valid JSON: {e}")))?;
    validate(&value)?;

    let steps: Vec<TaskStep> = value["steps"]
        .as_array()
        .map(|list| list.iter().map(step_from_value).collect())
        .unwrap_or_default();
    Ok(TaskPlan {
        total_steps: steps.len(),
        current_step: 0,
        steps,
        original_request: request.to_string(),
    })
}

// 已通过 validate，这里只做取值
fn step_from_value(v: &Value) -> TaskStep {
    let mut step = TaskStep::new(v["description"].as_str().unwrap_or_default().trim());
    if let Some(files) = v["files"].as_array() {
        step.files = files
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }
    if let Some(deps) = v["dependencies"].as_array() {
        step.dependencies = deps
            .iter()
            .filter_map(as_index)
            .filter_map(|d| usize::try_from(d).ok())
            .collect();
    }
    step
}
