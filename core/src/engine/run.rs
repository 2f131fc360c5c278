//! 引擎主入口：一次用户请求 → 规划 → 逐步（模型响应 → 解析 → 执行），每个阶段都包在重试控制器里。
use std::sync::Mutex;

use crate::context::AppContext;
use crate::error::CliError;
use crate::events_out::{write_event, write_progress, write_result, EventsOutTx};
use crate::executor::ResultEntry;
use crate::planner::TaskPlan;
use crate::protocol::{FileOperation, ParseOutput};
use crate::retry::RetryObserver;

use super::prompt::{build_step_prompt, with_previous_failure, STEP_PROMPT};
use super::types::{RunSummary, SessionObserver};

/// Forwards retry callbacks to the session observer and remembers the last failure.
struct RetryBridge<'a> {
    observer: &'a dyn SessionObserver,
    last_failure: Mutex<Option<String>>,
}

impl<'a> RetryBridge<'a> {
    fn new(observer: &'a dyn SessionObserver) -> Self {
        Self {
            observer,
            last_failure: Mutex::new(None),
        }
    }

    fn last_failure(&self) -> Option<String> {
        self.last_failure.lock().ok().and_then(|g| g.clone())
    }
}

impl RetryObserver for RetryBridge<'_> {
    fn on_error(&self, error: &anyhow::Error, attempt: u32) {
        if let Ok(mut g) = self.last_failure.lock() {
            *g = Some(format!("{error:#}"));
        }
        self.observer.on_error(error, attempt);
    }

    fn on_retry(&self, attempt: u32) {
        self.observer.on_retry(attempt);
    }
}

/// Plans `request` and drives every step to completion.
pub async fn run_request(
    ctx: &AppContext,
    request: &str,
    observer: &dyn SessionObserver,
) -> Result<RunSummary, CliError> {
    let run_id = ctx.run_id().to_string();
    let controller = ctx.retry_controller();
    let planner = ctx.planner();
    let executor = ctx.executor();
    let parser = ctx.parser();
    let llm = ctx.llm();
    let model = ctx.model_config();
    let step_system_prompt = ctx
        .cfg()
        .planner
        .step_prompt
        .clone()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| STEP_PROMPT.to_string());

    tracing::info!(target: "codepilot.engine", %run_id, "planning request");
    write_event(ctx.events_out(), "run.start", &run_id, &serde_json::json!({ "request": request })).await;

    let bridge = RetryBridge::new(observer);
    let planner_ref = &planner;
    let mut plan: TaskPlan = controller
        .execute_with_retry(
            || async move { planner_ref.plan(request).await.map_err(anyhow::Error::from) },
            "plan",
            &bridge,
        )
        .await?;
    observer.on_plan(&plan);
    let progress = plan.progress();
    observer.on_progress(&progress);
    write_progress(ctx.events_out(), &run_id, &progress).await;

    let mut results = Vec::new();
    while let Some(index) = plan.next_ready_step() {
        plan.start_step(index)?;
        let step = plan.steps[index].clone();
        observer.on_step_start(index, &step);
        tracing::info!(
            target: "codepilot.engine",
            step = index + 1,
            total = plan.total_steps,
            description = %step.description,
            "step started"
        );

        let base_prompt = build_step_prompt(&plan, index, &step);
        let label = format!("step {}: {}", index + 1, step.description);
        let bridge = RetryBridge::new(observer);

        let (llm, model, parser, executor, system, base, bridge_ref) = (
            &llm,
            &model,
            &parser,
            &executor,
            step_system_prompt.as_str(),
            base_prompt.as_str(),
            &bridge,
        );
        let (events_out, run_id_ref) = (ctx.events_out(), run_id.as_str());
        let outcome = controller
            .execute_with_retry(
                || async move {
                    let prompt = with_previous_failure(base, bridge_ref.last_failure().as_deref());
                    let response = llm.complete(system, &prompt, model).await?;
                    let parsed = parser.parse(&response);
                    for w in &parsed.warnings {
                        observer.on_warning(w);
                    }
                    check_parsed(&parsed)?;
                    let report = executor.run_report(&parsed.operations).await;
                    emit_results(observer, events_out, run_id_ref, &report.entries).await;
                    let entries = report.into_result()?;
                    Ok::<_, anyhow::Error>((parsed.operations, entries))
                },
                &label,
                &bridge,
            )
            .await;

        let (operations, entries) = match outcome {
            Ok(v) => v,
            Err(e) => {
                plan.fail_step(index)?;
                let progress = plan.progress();
                observer.on_progress(&progress);
                write_progress(ctx.events_out(), &run_id, &progress).await;
                tracing::error!(target: "codepilot.engine", step = index + 1, error = %e, "step failed");
                return Err(e.into());
            }
        };

        results.extend(entries);

        plan.complete_step(index, touched_paths(&operations))?;
        plan.advance();
        let progress = plan.progress();
        observer.on_progress(&progress);
        write_progress(ctx.events_out(), &run_id, &progress).await;
    }

    tracing::info!(
        target: "codepilot.engine",
        %run_id,
        completed = plan.current_step,
        total = plan.total_steps,
        "request finished"
    );
    Ok(RunSummary {
        run_id,
        plan,
        results,
    })
}

/// Parses and applies a single protocol response, optionally under the retry controller.
pub async fn apply_response(
    ctx: &AppContext,
    response: &str,
    with_retry: bool,
    observer: &dyn SessionObserver,
) -> Result<Vec<ResultEntry>, CliError> {
    let parsed = ctx.parser().parse(response);
    for w in &parsed.warnings {
        observer.on_warning(w);
    }
    let executor = ctx.executor();
    let (events_out, run_id) = (ctx.events_out(), ctx.run_id());

    if with_retry {
        let controller = ctx.retry_controller();
        let bridge = RetryBridge::new(observer);
        let (executor, ops) = (&executor, &parsed.operations);
        let entries = controller
            .execute_with_retry(
                || async move {
                    let report = executor.run_report(ops).await;
                    emit_results(observer, events_out, run_id, &report.entries).await;
                    report.into_result().map_err(anyhow::Error::from)
                },
                "apply",
                &bridge,
            )
            .await?;
        return Ok(entries);
    }

    let report = executor.run_report(&parsed.operations).await;
    emit_results(observer, events_out, run_id, &report.entries).await;
    Ok(report.into_result()?)
}

/// Reports every entry of an attempt, failed ones included.
async fn emit_results(
    observer: &dyn SessionObserver,
    out: Option<&EventsOutTx>,
    run_id: &str,
    entries: &[ResultEntry],
) {
    for entry in entries {
        observer.on_result(entry);
        write_result(out, run_id, entry).await;
    }
}

/// A response whose every directive was dropped is treated as a failed attempt.
fn check_parsed(parsed: &ParseOutput) -> anyhow::Result<()> {
    if parsed.operations.is_empty() {
        let dropped: Vec<&str> = parsed
            .warnings
            .iter()
            .filter(|w| w.is_dropped_operation())
            .map(|w| w.message.as_str())
            .collect();
        if !dropped.is_empty() {
            anyhow::bail!(
                "response contained no complete directive: {}",
                dropped.join("; ")
            );
        }
        tracing::warn!(target: "codepilot.engine", "step response contained no operations");
    }
    Ok(())
}

fn touched_paths(operations: &[FileOperation]) -> Vec<String> {
    operations
        .iter()
        .filter_map(|op| op.path().map(str::to_string))
        .collect()
}
