//! Process execution seam.
//!
//! `ProcessRunner` is the only place the executor touches the OS process
//! table, so tests can substitute a scripted runner.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::ExecutorError;
use crate::util::TailBuffer;

/// A fully prepared shell command.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub command: String,
    pub cwd: PathBuf,
    /// Complete environment for the child; the parent environment is not inherited.
    pub envs: HashMap<String, String>,
    pub max_output_bytes: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub truncated: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    fn name(&self) -> &str;

    /// Runs to completion and returns captured output regardless of exit status.
    async fn run_foreground(&self, req: &CommandRequest) -> Result<CommandOutput, ExecutorError>;

    /// Starts a detached process and returns its pid, if known.
    async fn spawn_background(&self, req: &CommandRequest) -> Result<Option<u32>, ExecutorError>;
}

/// Runs commands through the platform shell (`sh -c` / `cmd /C`).
#[derive(Debug, Clone, Default)]
pub struct ShellProcessRunner;

impl ShellProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn shell_command(req: &CommandRequest) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&req.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&req.command);
            c
        };
        cmd.current_dir(&req.cwd).env_clear().envs(&req.envs);
        cmd
    }
}

#[async_trait]
impl ProcessRunner for ShellProcessRunner {
    fn name(&self) -> &str {
        "shell"
    }

    async fn run_foreground(&self, req: &CommandRequest) -> Result<CommandOutput, ExecutorError> {
        let mut child = Self::shell_command(req)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                command: req.command.clone(),
                source,
            })?;

        let stdout = child.stdout.take().map(|rd| pump(rd, req.max_output_bytes));
        let stderr = child.stderr.take().map(|rd| pump(rd, req.max_output_bytes));

        let status = match tokio::time::timeout(req.timeout, child.wait()).await {
            Ok(status) => status.map_err(|source| ExecutorError::Spawn {
                command: req.command.clone(),
                source,
            })?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(ExecutorError::Timeout {
                    command: req.command.clone(),
                    secs: req.timeout.as_secs(),
                });
            }
        };

        let stdout = collect(stdout).await;
        let stderr = collect(stderr).await;
        let truncated = stdout.truncated() || stderr.truncated();
        if truncated {
            tracing::warn!(
                target: "codepilot.executor",
                command = %req.command,
                cap = req.max_output_bytes,
                "command output exceeded buffer, keeping tail"
            );
        }

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: stdout.to_string_lossy(),
            stderr: stderr.to_string_lossy(),
            truncated,
        })
    }

    async fn spawn_background(&self, req: &CommandRequest) -> Result<Option<u32>, ExecutorError> {
        let mut cmd = Self::shell_command(req);
        // 独立进程组，终端信号不会波及后台进程
        #[cfg(unix)]
        cmd.process_group(0);
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                command: req.command.clone(),
                source,
            })?;

        let pid = child.id();
        let command = req.command.clone();
        let cap = req.max_output_bytes.min(64 * 1024);
        let stderr = child.stderr.take().map(|rd| pump(rd, cap));

        // 后台进程不等待；仅在退出失败时记录日志
        tokio::spawn(async move {
            let status = child.wait().await;
            let stderr = collect(stderr).await.to_string_lossy();
            match status {
                Ok(s) if s.success() => {
                    tracing::debug!(target: "codepilot.executor", %command, "background command exited");
                }
                Ok(s) => {
                    tracing::warn!(
                        target: "codepilot.executor",
                        %command,
                        exit_code = ?s.code(),
                        stderr = %stderr.trim(),
                        "background command failed"
                    );
                }
                Err(e) => {
                    tracing::warn!(target: "codepilot.executor", %command, error = %e, "background command lost");
                }
            }
        });

        Ok(pid)
    }
}

fn pump<R>(mut rd: R, cap: usize) -> tokio::task::JoinHandle<TailBuffer>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut tail = TailBuffer::new(cap);
        let mut buf = vec![0u8; 16 * 1024];
        loop {
            match rd.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => tail.push(&buf[..n]),
                Err(e) => {
                    tracing::debug!(target: "codepilot.executor", error = %e, "output pipe closed");
                    break;
                }
            }
        }
        tail
    })
}

async fn collect(handle: Option<tokio::task::JoinHandle<TailBuffer>>) -> TailBuffer {
    match handle {
        Some(h) => h.await.unwrap_or_else(|_| TailBuffer::new(0)),
        None => TailBuffer::new(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedLog(Arc<Mutex<Vec<u8>>>);

    impl SharedLog {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn request(command: &str, timeout: Duration) -> CommandRequest {
        CommandRequest {
            command: command.to_string(),
            cwd: std::env::temp_dir(),
            envs: std::env::vars().collect(),
            max_output_bytes: 1024,
            timeout,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let runner = ShellProcessRunner::new();
        let out = runner
            .run_foreground(&request("echo hello", Duration::from_secs(10)))
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");

        let out = runner
            .run_foreground(&request("exit 3", Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(out.exit_code, Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_child() {
        let runner = ShellProcessRunner::new();
        let err = runner
            .run_foreground(&request("sleep 5", Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_is_capped() {
        let runner = ShellProcessRunner::new();
        let mut req = request("head -c 5000 /dev/zero | tr '\\0' a", Duration::from_secs(10));
        req.max_output_bytes = 100;
        let out = runner.run_foreground(&req).await.unwrap();
        assert!(out.truncated);
        assert_eq!(out.stdout.len(), 100);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn background_failure_is_logged_not_raised() {
        let log = SharedLog::default();
        let sink = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let runner = ShellProcessRunner::new();
        let started = std::time::Instant::now();
        let pid = runner
            .spawn_background(&request("sleep 1; echo gone >&2; exit 3", Duration::from_secs(10)))
            .await
            .unwrap();
        assert!(pid.is_some());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!log.text().contains("background command failed"));

        for _ in 0..50 {
            if log.text().contains("background command failed") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let text = log.text();
        assert!(text.contains("background command failed"), "{text}");
        assert!(text.contains("gone"), "{text}");
    }
}
