use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::PlanError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStep {
    pub description: String,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default)]
    pub files: Vec<String>,
    /// 0-based indices of steps that must be completed first.
    #[serde(default)]
    pub dependencies: BTreeSet<usize>,
}

impl TaskStep {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: StepStatus::Pending,
            files: Vec::new(),
            dependencies: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPlan {
    pub total_steps: usize,
    /// Cursor over `steps`; the plan is terminal when it equals `total_steps`.
    #[serde(default)]
    pub current_step: usize,
    pub steps: Vec<TaskStep>,
    #[serde(default)]
    pub original_request: String,
}

/// Snapshot emitted after every step transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub current_step: usize,
    pub total_steps: usize,
    pub steps: Vec<TaskStep>,
}

impl TaskPlan {
    pub fn is_terminal(&self) -> bool {
        self.current_step >= self.total_steps
    }

    fn step(&self, index: usize) -> Result<&TaskStep, PlanError> {
        self.steps.get(index).ok_or(PlanError::StepOutOfRange(index))
    }

    fn step_mut(&mut self, index: usize) -> Result<&mut TaskStep, PlanError> {
        self.steps
            .get_mut(index)
            .ok_or(PlanError::StepOutOfRange(index))
    }

    /// First dependency of `index` that is not completed, if any.
    fn unmet_dependency(&self, index: usize) -> Result<Option<usize>, PlanError> {
        let step = self.step(index)?;
        Ok(step.dependencies.iter().copied().find(|&d| {
            self.steps
                .get(d)
                .map(|s| s.status != StepStatus::Completed)
                .unwrap_or(true)
        }))
    }

    pub fn can_start(&self, index: usize) -> bool {
        match self.steps.get(index) {
            Some(s) if s.status == StepStatus::Pending || s.status == StepStatus::Failed => {
                matches!(self.unmet_dependency(index), Ok(None))
            }
            _ => false,
        }
    }

    pub fn start_step(&mut self, index: usize) -> Result<(), PlanError> {
        if let Some(dependency) = self.unmet_dependency(index)? {
            return Err(PlanError::DependencyNotMet {
                step: index,
                dependency,
            });
        }
        self.step_mut(index)?.status = StepStatus::InProgress;
        Ok(())
    }

    /// Marks the step completed and records the files it touched.
    pub fn complete_step(
        &mut self,
        index: usize,
        files: impl IntoIterator<Item = String>,
    ) -> Result<(), PlanError> {
        let step = self.step_mut(index)?;
        step.status = StepStatus::Completed;
        for f in files {
            if !step.files.contains(&f) {
                step.files.push(f);
            }
        }
        Ok(())
    }

    pub fn fail_step(&mut self, index: usize) -> Result<(), PlanError> {
        self.step_mut(index)?.status = StepStatus::Failed;
        Ok(())
    }

    /// Moves the cursor forward by one step, saturating at `total_steps`.
    pub fn advance(&mut self) {
        if self.current_step < self.total_steps {
            self.current_step += 1;
        }
    }

    /// Lowest-index pending step whose dependencies are all completed.
    pub fn next_ready_step(&self) -> Option<usize> {
        (0..self.steps.len())
            .find(|&i| self.steps[i].status == StepStatus::Pending && self.can_start(i))
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = (usize, &TaskStep)> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.status == StepStatus::Completed)
    }

    pub fn progress(&self) -> ProgressEvent {
        ProgressEvent {
            current_step: self.current_step,
            total_steps: self.total_steps,
            steps: self.steps.clone(),
        }
    }
}
