//! Builds, validates and tracks dependency-aware step plans.

mod graph;
#[allow(clippy::module_inception)]
mod planner;
mod types;
mod validate;

pub use graph::StepGraph;
pub use planner::{normalize_response, parse_plan, TaskPlanner, PLANNING_PROMPT};
pub use types::{ProgressEvent, StepStatus, TaskPlan, TaskStep};
pub use validate::validate;
