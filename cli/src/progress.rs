use std::sync::Mutex;
use std::time::Duration;

use codepilot_core::api::{ProgressEvent, ResultEntry, SessionObserver, TaskPlan, TaskStep};
use codepilot_core::protocol::ParseWarning;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Step progress for text mode.
///
/// Disabled (all bars hidden) when stderr is not a terminal or JSON output was requested.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    step_bar: Mutex<Option<ProgressBar>>,
    enabled: bool,
}

impl ProgressMonitor {
    pub fn new(enabled: bool) -> Self {
        let multi = MultiProgress::new();
        if !enabled {
            return Self {
                multi,
                overall: ProgressBar::hidden(),
                step_bar: Mutex::new(None),
                enabled: false,
            };
        }

        let overall = multi.add(ProgressBar::new(0));
        overall.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} steps {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );
        overall.set_message("planning...");

        Self {
            multi,
            overall,
            step_bar: Mutex::new(None),
            enabled: true,
        }
    }

    fn println(&self, line: String) {
        if self.enabled {
            let _ = self.multi.println(line);
        } else {
            eprintln!("{line}");
        }
    }

    fn finish_step(&self, success: bool) {
        let Ok(mut guard) = self.step_bar.lock() else {
            return;
        };
        if let Some(bar) = guard.take() {
            let icon = if success { "✅" } else { "❌" };
            let msg = bar.message();
            bar.finish_with_message(format!("{icon} {}", msg.trim_start_matches("⏳ ")));
        }
    }

    pub fn finish(&self, success: bool) {
        self.finish_step(success);
        if !self.enabled {
            return;
        }
        let msg = if success {
            "✅ all steps completed"
        } else {
            "❌ run failed"
        };
        self.overall.finish_with_message(msg);
    }
}

impl SessionObserver for ProgressMonitor {
    fn on_plan(&self, plan: &TaskPlan) {
        self.overall.set_length(plan.total_steps as u64);
        self.overall.set_message("");
        if !self.enabled {
            for (i, step) in plan.steps.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, step.description);
            }
        }
    }

    fn on_step_start(&self, index: usize, step: &TaskStep) {
        self.finish_step(true);
        if !self.enabled {
            eprintln!("▶ step {}: {}", index + 1, step.description);
            return;
        }
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.set_message(format!("⏳ step {}: {}", index + 1, step.description));
        bar.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut guard) = self.step_bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_progress(&self, event: &ProgressEvent) {
        self.overall.set_length(event.total_steps as u64);
        self.overall.set_position(event.current_step as u64);
    }

    fn on_result(&self, entry: &ResultEntry) {
        let icon = if entry.succeeded { "✓" } else { "✗" };
        self.println(format!("    {icon} {}", entry.description));
    }

    fn on_warning(&self, warning: &ParseWarning) {
        self.println(format!("    ⚠ line {}: {}", warning.line, warning.message));
    }

    fn on_error(&self, error: &anyhow::Error, attempt: u32) {
        self.println(format!("    attempt {attempt} failed: {error}"));
    }

    fn on_retry(&self, attempt: u32) {
        self.overall.set_message(format!("retry #{attempt}"));
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.step_bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}
