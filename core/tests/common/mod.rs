#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use codepilot_core::api::{
    AppConfig, AppContext, CommandOutput, CommandRequest, ExecutorError, FixedDelayStrategy,
    ProcessRunner, ScriptedLlmClient, Services,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("codepilot=debug")
        .try_init();
}

/// Records commands and replies from a queue; an empty queue means success.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<Vec<CommandOutput>>,
    pub foreground: Mutex<Vec<String>>,
    pub background: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_failure(&self, exit_code: i32, stderr: &str) {
        self.replies.lock().unwrap().push(CommandOutput {
            exit_code: Some(exit_code),
            stderr: stderr.to_string(),
            ..Default::default()
        });
    }

    pub fn push_stdout(&self, stdout: &str) {
        self.replies.lock().unwrap().push(CommandOutput {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            ..Default::default()
        });
    }

    pub fn commands(&self) -> Vec<String> {
        self.foreground.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run_foreground(&self, req: &CommandRequest) -> Result<CommandOutput, ExecutorError> {
        self.foreground.lock().unwrap().push(req.command.clone());
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            Ok(CommandOutput {
                exit_code: Some(0),
                ..Default::default()
            })
        } else {
            Ok(replies.remove(0))
        }
    }

    async fn spawn_background(&self, req: &CommandRequest) -> Result<Option<u32>, ExecutorError> {
        self.background.lock().unwrap().push(req.command.clone());
        Ok(None)
    }
}

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub llm: Arc<ScriptedLlmClient>,
    pub runner: Arc<ScriptedRunner>,
    pub ctx: AppContext,
}

/// Session rooted in a temp dir with zero retry delay.
pub async fn harness(max_attempts: u32, responses: &[&str]) -> Harness {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = AppConfig::default();
    cfg.root = dir.path().display().to_string();
    cfg.retry.max_retries = max_attempts;
    cfg.retry.delay_ms = 0;

    let llm = Arc::new(ScriptedLlmClient::new(responses.iter().copied()));
    let runner = ScriptedRunner::new();
    let services = Services {
        llm: llm.clone(),
        retry_strategy: Arc::new(FixedDelayStrategy::new(Duration::ZERO, max_attempts)),
        process_runner: runner.clone(),
        editor: None,
    };
    let ctx = AppContext::from_services(cfg, services).await.unwrap();
    Harness {
        dir,
        llm,
        runner,
        ctx,
    }
}
