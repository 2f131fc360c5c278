use serde_json::Value;

use super::graph::StepGraph;
use crate::error::PlanError;

fn invalid(msg: impl Into<String>) -> PlanError {
    PlanError::Validation(msg.into())
}

/// Integer view of a JSON number, accepting integral floats such as `5.0`.
pub(super) fn as_index(v: &Value) -> Option<i64> {
    if let Some(i) = v.as_i64() {
        return Some(i);
    }
    v.as_f64()
        .filter(|f| f.fract() == 0.0 && f.is_finite())
        .map(|f| f as i64)
}

/// Structural validation of a raw planning response.
pub fn validate(plan: &Value) -> Result<(), PlanError> {
    let obj = plan
        .as_object()
        .ok_or_else(|| invalid("plan must be a JSON object"))?;

    let total = obj
        .get("totalSteps")
        .and_then(as_index)
        .ok_or_else(|| invalid("totalSteps must be an integer"))?;
    if total <= 0 {
        return Err(invalid(format!("totalSteps must be positive, got {total}")));
    }

    let steps = obj
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("steps must be a list"))?;
    if steps.is_empty() {
        return Err(invalid("steps must not be empty"));
    }
    if steps.len() as i64 != total {
        return Err(invalid(format!(
            "totalSteps is {total} but {} steps were given",
            steps.len()
        )));
    }

    let mut edges = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let step = step
            .as_object()
            .ok_or_else(|| invalid(format!("step {i} must be an object")))?;

        match step.get("description").and_then(Value::as_str) {
            Some(d) if !d.trim().is_empty() => {}
            _ => return Err(invalid(format!("step {i} needs a non-empty description"))),
        }

        if let Some(files) = step.get("files") {
            let files = files
                .as_array()
                .ok_or_else(|| invalid(format!("step {i}: files must be a list")))?;
            if files.iter().any(|f| !f.is_string()) {
                return Err(invalid(format!("step {i}: files must be strings")));
            }
        }

        let mut deps = Vec::new();
        if let Some(raw) = step.get("dependencies") {
            let list = raw
                .as_array()
                .ok_or_else(|| invalid(format!("step {i}: dependencies must be a list")))?;
            for d in list {
                let d = as_index(d)
                    .ok_or_else(|| invalid(format!("step {i}: dependency {d} is not an integer")))?;
                if d < 0 || d >= total {
                    return Err(invalid(format!("step {i}: dependency {d} is out of range")));
                }
                let d = d as usize;
                if d == i {
                    return Err(invalid(format!("step {i} depends on itself")));
                }
                deps.push(d);
            }
        }
        edges.push(deps);
    }

    if let Some(cycle) = StepGraph::new(edges).detect_cycle() {
        return Err(invalid(format!("circular dependency: {cycle}")));
    }

    Ok(())
}
