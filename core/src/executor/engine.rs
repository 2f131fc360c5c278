use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ExecutorError;
use crate::protocol::{CommandSpec, FileOperation};
use crate::util::text::preview;

use super::patch::apply_edits;
use super::process::{CommandOutput, CommandRequest, ProcessRunner};
use super::python::{is_python_command, normalize_python_error};
use super::sanitize::sanitize_command;
use super::types::{ExecutorOptions, ResultEntry, RunReport};
use super::workspace::Workspace;

const FORCED_ENV: [(&str, &str); 6] = [
    ("FORCE_COLOR", "0"),
    ("NO_COLOR", "1"),
    ("LANG", "en_US.UTF-8"),
    ("LC_ALL", "en_US.UTF-8"),
    ("PYTHONIOENCODING", "utf-8"),
    ("CI", "true"),
];

const PEER_DEP_MARKERS: [&str; 4] = [
    "ERESOLVE",
    "unable to resolve dependency tree",
    "conflicting peer dependency",
    "peer dep",
];

/// Applies parsed operations to the workspace and runs commands.
#[derive(Clone)]
pub struct CommandExecutor {
    workspace: Workspace,
    runner: Arc<dyn ProcessRunner>,
    opts: ExecutorOptions,
}

impl CommandExecutor {
    pub fn new(workspace: Workspace, runner: Arc<dyn ProcessRunner>, opts: ExecutorOptions) -> Self {
        Self {
            workspace,
            runner,
            opts,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn runner(&self) -> &Arc<dyn ProcessRunner> {
        &self.runner
    }

    /// Applies operations in order; stops at the first error.
    pub async fn run(&self, operations: &[FileOperation]) -> Result<Vec<ResultEntry>, ExecutorError> {
        self.run_report(operations).await.into_result()
    }

    /// Like `run`, but keeps the entries completed before a failure and
    /// appends a failed entry for the operation that stopped the run.
    pub async fn run_report(&self, operations: &[FileOperation]) -> RunReport {
        let mut entries = Vec::with_capacity(operations.len());
        for op in operations {
            let before = entries.len();
            if let Err(e) = self.apply(op, &mut entries).await {
                let description = match op {
                    // 前面已完成的命令各占一条，失败的是下一条
                    FileOperation::ExecCommand { commands } => commands
                        .get(entries.len() - before)
                        .map(|c| c.label().to_string())
                        .unwrap_or_else(|| op.describe()),
                    _ => op.describe(),
                };
                tracing::warn!(
                    target: "codepilot.executor",
                    operation = %op.describe(),
                    completed = entries.len(),
                    error = %e,
                    "operation failed"
                );
                entries.push(ResultEntry::failed(description, Some(e.to_string())));
                return RunReport {
                    entries,
                    error: Some(e),
                };
            }
        }
        RunReport {
            entries,
            error: None,
        }
    }

    async fn apply(&self, op: &FileOperation, entries: &mut Vec<ResultEntry>) -> Result<(), ExecutorError> {
        match op {
            FileOperation::CreateFolder { path } => {
                self.workspace.create_dir_all(path).await?;
                tracing::debug!(target: "codepilot.executor", %path, "folder created");
                entries.push(ResultEntry::ok(op.describe(), None));
            }
            FileOperation::CreateFile { path, content } => {
                self.workspace.write_file(path, content).await?;
                tracing::debug!(target: "codepilot.executor", %path, bytes = content.len(), "file written");
                entries.push(ResultEntry::ok(op.describe(), None));
            }
            FileOperation::ModifyFile { path, edits } => {
                let original = self.workspace.read_file(path).await?;
                let outcome = apply_edits(&original, edits);
                for reason in &outcome.skipped {
                    tracing::warn!(target: "codepilot.executor", %path, "edit not applied: {reason}");
                }
                // 未命中的编辑不算失败，只在输出里报告
                if outcome.applied > 0 {
                    self.workspace.write_file(path, &outcome.content).await?;
                }
                let output = if outcome.skipped.is_empty() {
                    None
                } else {
                    Some(outcome.skipped.join("\n"))
                };
                entries.push(ResultEntry::ok(op.describe(), output));
            }
            FileOperation::ExecCommand { commands } => {
                for spec in commands {
                    let output = self.execute_command(spec).await?;
                    entries.push(ResultEntry::ok(spec.label(), Some(output)));
                }
            }
        }
        Ok(())
    }

    /// Runs one command. Background commands return "started" immediately;
    /// foreground commands return trimmed stdout or raise on non-zero exit.
    pub async fn execute_command(&self, spec: &CommandSpec) -> Result<String, ExecutorError> {
        let command = sanitize_command(&spec.command, &self.opts.allow_list)?;
        let req = self.request(&command, spec.cwd.as_deref())?;

        if spec.is_background {
            let pid = self.runner.spawn_background(&req).await?;
            tracing::info!(target: "codepilot.executor", %command, ?pid, "background command started");
            return Ok("started".to_string());
        }

        tracing::info!(target: "codepilot.executor", %command, cwd = %req.cwd.display(), "running command");
        let out = self.runner.run_foreground(&req).await?;
        if out.success() {
            return Ok(out.stdout.trim().to_string());
        }

        if self.opts.legacy_peer_deps_fallback && is_npm_install(&command) && is_peer_dep_failure(&out) {
            let retry_cmd = format!("{command} --legacy-peer-deps");
            tracing::warn!(target: "codepilot.executor", command = %retry_cmd, "dependency tree conflict, retrying");
            let retry_req = CommandRequest {
                command: retry_cmd.clone(),
                ..req
            };
            let retry = self.runner.run_foreground(&retry_req).await?;
            if retry.success() {
                return Ok(retry.stdout.trim().to_string());
            }
            return Err(failure(&retry_cmd, &retry));
        }

        Err(failure(&command, &out))
    }

    /// Runs a sanitised foreground command and returns its output whatever the exit status.
    pub async fn capture(&self, command: &str, cwd: Option<&str>) -> Result<CommandOutput, ExecutorError> {
        let command = sanitize_command(command, &self.opts.allow_list)?;
        let req = self.request(&command, cwd)?;
        self.runner.run_foreground(&req).await
    }

    /// Convenience wrapper for a foreground command in the workspace root.
    pub async fn run_shell(&self, command: &str) -> Result<String, ExecutorError> {
        self.execute_command(&CommandSpec::new(command)).await
    }

    fn request(&self, command: &str, cwd: Option<&str>) -> Result<CommandRequest, ExecutorError> {
        Ok(CommandRequest {
            command: command.to_string(),
            cwd: self.workspace.resolve_dir(cwd)?,
            envs: command_env(),
            max_output_bytes: self.opts.max_output_bytes,
            timeout: self.opts.command_timeout,
        })
    }
}

/// Copy of the process environment plus forced colour/locale variables.
pub fn command_env() -> HashMap<String, String> {
    let mut envs: HashMap<String, String> = std::env::vars().collect();
    for (k, v) in FORCED_ENV {
        envs.insert(k.to_string(), v.to_string());
    }
    envs
}

fn is_npm_install(command: &str) -> bool {
    let mut words = command.split_whitespace();
    matches!(
        (words.next(), words.next()),
        (Some("npm"), Some("install" | "i" | "ci"))
    ) && !command.contains("--legacy-peer-deps")
}

fn is_peer_dep_failure(out: &CommandOutput) -> bool {
    PEER_DEP_MARKERS
        .iter()
        .any(|m| out.stderr.contains(m) || out.stdout.contains(m))
}

fn failure(command: &str, out: &CommandOutput) -> ExecutorError {
    let stderr = out.stderr.trim().to_string();
    let mut message = match out.exit_code {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_string(),
    };
    if is_python_command(command) {
        if let Some(py) = normalize_python_error(&stderr) {
            message = py;
        }
    } else if stderr.is_empty() && !out.stdout.trim().is_empty() {
        message = format!("{message}: {}", preview(out.stdout.trim(), 2000));
    }
    ExecutorError::CommandFailed {
        command: command.to_string(),
        message,
        stderr,
        exit_code: out.exit_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PatchEdit;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies from a fixed table and records every request.
    #[derive(Default)]
    struct TableRunner {
        replies: Mutex<Vec<CommandOutput>>,
        seen: Mutex<Vec<String>>,
        background: Mutex<Vec<String>>,
    }

    impl TableRunner {
        fn with(replies: Vec<CommandOutput>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl ProcessRunner for TableRunner {
        fn name(&self) -> &str {
            "table"
        }

        async fn run_foreground(&self, req: &CommandRequest) -> Result<CommandOutput, ExecutorError> {
            self.seen.lock().unwrap().push(req.command.clone());
            assert_eq!(req.envs.get("NO_COLOR").map(String::as_str), Some("1"));
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
            Ok(Some(42))
        }
    }

    fn executor(root: &std::path::Path, runner: Arc<TableRunner>) -> CommandExecutor {
        CommandExecutor::new(Workspace::new(root), runner, ExecutorOptions::default())
    }

    fn failed(code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(code),
            stderr: stderr.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn applies_file_operations() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor(dir.path(), TableRunner::with(vec![]));
        let ops = vec![
            FileOperation::CreateFolder { path: "app/src".into() },
            FileOperation::CreateFile {
                path: "app/src/index.js".into(),
                content: "console.log('a');".into(),
            },
            FileOperation::ModifyFile {
                path: "app/src/index.js".into(),
                edits: vec![PatchEdit::Replace {
                    id: "1".into(),
                    old: "'a'".into(),
                    new: "'b'".into(),
                }],
            },
        ];
        let results = exec.run(&ops).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.succeeded));
        let written = std::fs::read_to_string(dir.path().join("app/src/index.js")).unwrap();
        assert_eq!(written, "console.log('b');");
    }

    #[tokio::test]
    async fn stale_replace_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "const x = 1;").unwrap();
        let exec = executor(dir.path(), TableRunner::with(vec![]));
        let results = exec
            .run(&[FileOperation::ModifyFile {
                path: "a.js".into(),
                edits: vec![PatchEdit::Replace {
                    id: "1".into(),
                    old: "const y = 2;".into(),
                    new: "const y = 3;".into(),
                }],
            }])
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].succeeded);
        let output = results[0].output.as_deref().unwrap();
        assert!(output.contains("REPLACE_BLOCK 1"), "{output}");
        assert!(output.contains("not found"), "{output}");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.js")).unwrap(),
            "const x = 1;"
        );
    }

    #[tokio::test]
    async fn failed_run_keeps_completed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TableRunner::with(vec![failed(1, "boom")]);
        let exec = executor(dir.path(), runner);
        let mut build = CommandSpec::new("npm run build");
        build.description = "Build".into();
        let ops = vec![
            FileOperation::CreateFolder { path: "ok".into() },
            FileOperation::ExecCommand {
                commands: vec![build, CommandSpec::new("npm test")],
            },
            FileOperation::CreateFolder { path: "never".into() },
        ];

        let report = exec.run_report(&ops).await;
        assert!(!report.succeeded());
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0], ResultEntry::ok("Create folder ok", None));
        assert!(!report.entries[1].succeeded);
        assert_eq!(report.entries[1].description, "Build");
        assert!(report.entries[1].output.as_deref().unwrap().contains("boom"));
        assert!(dir.path().join("ok").is_dir());
        assert!(!dir.path().join("never").exists());

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, ExecutorError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn second_command_failure_is_attributed_to_it() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TableRunner::with(vec![
            CommandOutput {
                exit_code: Some(0),
                stdout: "installed".into(),
                ..Default::default()
            },
            failed(2, "lint errors"),
        ]);
        let exec = executor(dir.path(), runner);
        let report = exec
            .run_report(&[FileOperation::ExecCommand {
                commands: vec![CommandSpec::new("npm ci"), CommandSpec::new("npm run lint")],
            }])
            .await;
        let labels: Vec<(&str, bool)> = report
            .entries
            .iter()
            .map(|e| (e.description.as_str(), e.succeeded))
            .collect();
        assert_eq!(labels, vec![("npm ci", true), ("npm run lint", false)]);
    }

    #[tokio::test]
    async fn modify_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor(dir.path(), TableRunner::with(vec![]));
        let err = exec
            .run(&[FileOperation::ModifyFile {
                path: "nope.js".into(),
                edits: vec![PatchEdit::InsertAfter {
                    anchor: "x".into(),
                    code: "y".into(),
                }],
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn foreground_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor(dir.path(), TableRunner::with(vec![failed(1, "Error: boom")]));
        let err = exec.run_shell("npm test").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("npm test"));
        assert!(msg.contains("Error: boom"));
    }

    #[tokio::test]
    async fn npm_install_falls_back_to_legacy_peer_deps() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TableRunner::with(vec![failed(1, "npm ERR! code ERESOLVE")]);
        let exec = executor(dir.path(), runner.clone());
        exec.run_shell("npm install").await.unwrap();
        assert_eq!(
            *runner.seen.lock().unwrap(),
            vec!["npm install".to_string(), "npm install --legacy-peer-deps".to_string()]
        );
    }

    #[tokio::test]
    async fn python_errors_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor(
            dir.path(),
            TableRunner::with(vec![failed(1, "  File \"x.py\"\nSyntaxError: invalid syntax")]),
        );
        match exec.run_shell("python x.py").await.unwrap_err() {
            ExecutorError::CommandFailed { message, .. } => {
                assert_eq!(message, "Python SyntaxError: SyntaxError: invalid syntax");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn background_commands_return_started() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TableRunner::with(vec![]);
        let exec = executor(dir.path(), runner.clone());
        let mut spec = CommandSpec::new("npm run dev");
        spec.is_background = true;
        assert_eq!(exec.execute_command(&spec).await.unwrap(), "started");
        assert_eq!(runner.background.lock().unwrap().len(), 1);
        assert!(runner.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsafe_command_is_rejected_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TableRunner::with(vec![]);
        let exec = executor(dir.path(), runner.clone());
        let err = exec.run_shell("ls; rm -rf /").await.unwrap_err();
        assert!(matches!(err, ExecutorError::Sanitization { .. }));
        assert!(runner.seen.lock().unwrap().is_empty());
    }
}
