use serde::Serialize;

use crate::executor::ResultEntry;
use crate::planner::{ProgressEvent, TaskPlan, TaskStep};
use crate::protocol::ParseWarning;

/// Outcome of a full `run_request`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub plan: TaskPlan,
    pub results: Vec<ResultEntry>,
}

/// Session callbacks used by the CLI for progress display.
pub trait SessionObserver: Send + Sync {
    fn on_plan(&self, _plan: &TaskPlan) {}
    fn on_step_start(&self, _index: usize, _step: &TaskStep) {}
    fn on_progress(&self, _event: &ProgressEvent) {}
    fn on_result(&self, _entry: &ResultEntry) {}
    fn on_warning(&self, _warning: &ParseWarning) {}
    fn on_error(&self, _error: &anyhow::Error, _attempt: u32) {}
    fn on_retry(&self, _attempt: u32) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionObserver;

impl SessionObserver for NoopSessionObserver {}
