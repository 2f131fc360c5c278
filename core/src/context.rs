use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::error::CliError;
use crate::events_out::{start_events_out, EventsOutTx};
use crate::executor::{CommandExecutor, ExecutorOptions, ProcessRunner, Workspace};
use crate::llm::{LlmClient, ModelConfig};
use crate::planner::TaskPlanner;
use crate::protocol::{MarkerProtocolParser, ResponseProtocolParser};
use crate::retry::{
    EditorBridge, LlmErrorAnalyzer, RetryController, RetryStrategy, ShellDependencyInstaller,
    SolutionApplier,
};

/// Collaborators injected into a session.
#[derive(Clone)]
pub struct Services {
    pub llm: Arc<dyn LlmClient>,
    pub retry_strategy: Arc<dyn RetryStrategy>,
    pub process_runner: Arc<dyn ProcessRunner>,
    pub editor: Option<Arc<dyn EditorBridge>>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services>;
}

/// One session: configuration, collaborators and the events sink.
pub struct AppContext {
    cfg: AppConfig,
    services: Services,
    parser: Arc<dyn ResponseProtocolParser>,
    events_out: Option<EventsOutTx>,
    events_task: Option<JoinHandle<()>>,
    run_id: String,
}

impl AppContext {
    pub async fn new(cfg: AppConfig, factory: &dyn ServicesFactory) -> Result<Self, CliError> {
        let services = factory
            .build_services(&cfg)
            .await
            .map_err(|e| CliError::Config(format!("cannot build services: {e:#}")))?;
        Self::from_services(cfg, services).await
    }

    pub async fn from_services(cfg: AppConfig, services: Services) -> Result<Self, CliError> {
        let (events_out, events_task) = match start_events_out(&cfg.events_out)
            .await
            .map_err(CliError::Config)?
        {
            Some((tx, handle)) => (Some(tx), Some(handle)),
            None => (None, None),
        };
        let run_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(
            target: "codepilot.context",
            %run_id,
            llm = services.llm.name(),
            runner = services.process_runner.name(),
            strategy = services.retry_strategy.name(),
            "session started"
        );
        Ok(Self {
            cfg,
            services,
            parser: Arc::new(MarkerProtocolParser),
            events_out,
            events_task,
            run_id,
        })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn root(&self) -> PathBuf {
        PathBuf::from(&self.cfg.root)
    }

    pub fn llm(&self) -> Arc<dyn LlmClient> {
        self.services.llm.clone()
    }

    pub fn model_config(&self) -> ModelConfig {
        self.cfg.llm.model_config()
    }

    pub fn parser(&self) -> Arc<dyn ResponseProtocolParser> {
        self.parser.clone()
    }

    pub fn events_out(&self) -> Option<&EventsOutTx> {
        self.events_out.as_ref()
    }

    pub fn executor(&self) -> CommandExecutor {
        CommandExecutor::new(
            Workspace::new(self.root()),
            self.services.process_runner.clone(),
            ExecutorOptions::from(&self.cfg.executor),
        )
    }

    pub fn planner(&self) -> TaskPlanner {
        let planner = TaskPlanner::new(self.llm(), self.model_config());
        match &self.cfg.planner.planning_prompt {
            Some(p) if !p.trim().is_empty() => planner.with_system_prompt(p.clone()),
            _ => planner,
        }
    }

    pub fn retry_controller(&self) -> RetryController {
        let mut controller = RetryController::new(self.services.retry_strategy.clone());
        let executor = self.executor();

        if self.cfg.retry.auto_install_dependencies {
            controller =
                controller.with_installer(Arc::new(ShellDependencyInstaller::new(executor.clone())));
        }
        if self.cfg.retry.ai_repair {
            let mut analyzer = LlmErrorAnalyzer::new(self.llm(), self.model_config());
            let custom = self.cfg.planner.diagnosis_prompt.as_ref();
            if let Some(p) = custom.filter(|p| !p.trim().is_empty()) {
                analyzer = analyzer.with_system_prompt(p.clone());
            }
            let mut applier = SolutionApplier::new(executor, self.parser());
            if let Some(editor) = &self.services.editor {
                applier = applier.with_editor(editor.clone());
            }
            controller = controller
                .with_analyzer(Arc::new(analyzer))
                .with_applier(Arc::new(applier));
        }
        controller
    }

    /// Closes the events sink and waits for it to flush.
    pub async fn shutdown(mut self) {
        self.events_out.take();
        if let Some(handle) = self.events_task.take() {
            let _ = handle.await;
        }
        tracing::debug!(target: "codepilot.context", run_id = %self.run_id, "session closed");
    }
}
