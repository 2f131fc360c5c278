use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use tracing::Instrument;

use super::analysis::{ErrorAnalyzer, ErrorReport};
use super::dependency::{extract_dependency, DependencyInstaller};
use super::solution::SolutionApplier;
use super::strategy::{FixedDelayStrategy, RetryStrategy};
use crate::error::RetryError;

/// State of one `execute_with_retry` invocation.
#[derive(Debug, Clone, Default)]
pub struct RetryContext {
    pub attempt: u32,
    pub last_error: Option<String>,
    pub last_solution: Option<String>,
    pub resolved_dependencies: BTreeSet<String>,
}

/// Callbacks fired by the retry loop.
pub trait RetryObserver: Send + Sync {
    fn on_error(&self, _error: &anyhow::Error, _attempt: u32) {}
    /// A repair was made (dependency installed or fix applied) and `attempt` is next.
    fn on_retry(&self, _attempt: u32) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RetryObserver for NoopObserver {}

/// Bounded retry with dependency auto-install and AI-directed repair.
pub struct RetryController {
    strategy: Arc<dyn RetryStrategy>,
    installer: Option<Arc<dyn DependencyInstaller>>,
    analyzer: Option<Arc<dyn ErrorAnalyzer>>,
    applier: Option<Arc<SolutionApplier>>,
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new(Arc::new(FixedDelayStrategy::default()))
    }
}

impl RetryController {
    pub fn new(strategy: Arc<dyn RetryStrategy>) -> Self {
        Self {
            strategy,
            installer: None,
            analyzer: None,
            applier: None,
        }
    }

    pub fn with_installer(mut self, installer: Arc<dyn DependencyInstaller>) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn ErrorAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_applier(mut self, applier: Arc<SolutionApplier>) -> Self {
        self.applier = Some(applier);
        self
    }

    pub fn strategy(&self) -> &Arc<dyn RetryStrategy> {
        &self.strategy
    }

    /// Runs `operation` until it succeeds, the analyzer asks to stop, or the
    /// attempt budget is spent.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        mut operation: F,
        context: &str,
        observer: &dyn RetryObserver,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let max_attempts = self.strategy.max_attempts().max(1);
        let mut ctx = RetryContext::default();

        loop {
            ctx.attempt += 1;
            let span = tracing::info_span!("retry.attempt", context = %context, attempt = ctx.attempt);
            let err = match operation().instrument(span).await {
                Ok(value) => {
                    if ctx.attempt > 1 {
                        tracing::info!(target: "codepilot.retry", %context, attempt = ctx.attempt, "recovered");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let message = format!("{err:#}");
            tracing::warn!(
                target: "codepilot.retry",
                %context,
                attempt = ctx.attempt,
                max_attempts,
                error = %message,
                "attempt failed"
            );
            observer.on_error(&err, ctx.attempt);
            ctx.last_error = Some(message.clone());

            if ctx.attempt >= max_attempts {
                tracing::error!(target: "codepilot.retry", %context, attempts = ctx.attempt, "retry budget exhausted");
                return Err(RetryError::Exhausted {
                    context: context.to_string(),
                    attempts: ctx.attempt,
                    last_error: message,
                });
            }

            // 1) 缺失依赖：安装后立即重试，不调用模型
            if self.resolve_dependency(&message, &mut ctx).await {
                observer.on_retry(ctx.attempt + 1);
                continue;
            }

            // 2) AI 诊断与修复
            if let Some(analyzer) = &self.analyzer {
                let report = ErrorReport::from_error(&err, ctx.last_solution.as_deref());
                if let Some(analysis) = analyzer.analyze(&report).await {
                    tracing::info!(
                        target: "codepilot.retry",
                        attempt = ctx.attempt,
                        analysis = %analysis.analysis,
                        should_stop = analysis.should_stop,
                        "error analyzed"
                    );
                    if analysis.should_stop {
                        return Err(RetryError::EscalatedStop {
                            context: context.to_string(),
                            attempt: ctx.attempt,
                            explanation: analysis.explanation,
                        });
                    }
                    if let Some(solution) = analysis.solution {
                        if self.apply_solution(&solution).await {
                            observer.on_retry(ctx.attempt + 1);
                        }
                        ctx.last_solution = Some(solution);
                    }
                }
            }

            if let Some(delay) = self.strategy.next_delay(ctx.attempt, &message) {
                if !delay.is_zero() {
                    tracing::debug!(target: "codepilot.retry", delay_ms = delay.as_millis() as u64, "waiting before retry");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Returns true when a newly detected dependency was installed.
    async fn resolve_dependency(&self, message: &str, ctx: &mut RetryContext) -> bool {
        let Some(installer) = &self.installer else {
            return false;
        };
        let Some(dep) = extract_dependency(message) else {
            return false;
        };
        if !ctx.resolved_dependencies.insert(dep.name.clone()) {
            tracing::debug!(target: "codepilot.retry", name = %dep.name, "dependency already attempted");
            return false;
        }

        let version = installer.pinned_version(&dep).await;
        tracing::info!(
            target: "codepilot.retry",
            name = %dep.name,
            ecosystem = ?dep.ecosystem,
            version = version.as_deref().unwrap_or("latest"),
            "installing missing dependency"
        );
        match installer.install(&dep, version.as_deref()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(target: "codepilot.retry", name = %dep.name, error = %e, "dependency install failed");
                false
            }
        }
    }

    /// Returns true when the proposed fix ran without error.
    async fn apply_solution(&self, solution: &str) -> bool {
        let Some(applier) = &self.applier else {
            tracing::warn!(target: "codepilot.retry", "fix proposed but no solution applier configured");
            return false;
        };
        match applier.apply(solution).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(target: "codepilot.retry", error = %format!("{e:#}"), "proposed fix failed");
                false
            }
        }
    }
}
