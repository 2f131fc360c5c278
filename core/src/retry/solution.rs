use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::executor::CommandExecutor;
use crate::protocol::ResponseProtocolParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolutionKind {
    FileOperations,
    PackageManager,
    EditorApi,
    Shell,
}

const PACKAGE_MANAGERS: [&str; 9] = [
    "npm", "npx", "yarn", "pnpm", "bun", "pip", "pip3", "poetry", "pipenv",
];

/// Classifies a proposed fix by its text.
pub fn classify(solution: &str) -> SolutionKind {
    let s = solution.trim();
    if s.lines().any(|l| l.trim_start().starts_with("$$$ ")) {
        return SolutionKind::FileOperations;
    }
    if s.contains("vscode.") {
        return SolutionKind::EditorApi;
    }
    let first = s.split_whitespace().next().unwrap_or_default();
    if PACKAGE_MANAGERS.contains(&first)
        || s.starts_with("python -m pip")
        || s.starts_with("python3 -m pip")
    {
        return SolutionKind::PackageManager;
    }
    SolutionKind::Shell
}

/// Host editor integration for editor-API snippets.
#[async_trait]
pub trait EditorBridge: Send + Sync {
    async fn execute(&self, snippet: &str) -> anyhow::Result<()>;
}

/// Runs a classified solution against the workspace.
pub struct SolutionApplier {
    executor: CommandExecutor,
    parser: Arc<dyn ResponseProtocolParser>,
    editor: Option<Arc<dyn EditorBridge>>,
}

impl SolutionApplier {
    pub fn new(executor: CommandExecutor, parser: Arc<dyn ResponseProtocolParser>) -> Self {
        Self {
            executor,
            parser,
            editor: None,
        }
    }

    pub fn with_editor(mut self, editor: Arc<dyn EditorBridge>) -> Self {
        self.editor = Some(editor);
        self
    }

    pub async fn apply(&self, solution: &str) -> anyhow::Result<SolutionKind> {
        let kind = classify(solution);
        tracing::info!(target: "codepilot.retry", ?kind, "applying proposed fix");
        match kind {
            SolutionKind::FileOperations => {
                let parsed = self.parser.parse(solution);
                self.executor.run(&parsed.operations).await?;
            }
            SolutionKind::EditorApi => match &self.editor {
                Some(editor) => editor.execute(solution).await?,
                None => {
                    tracing::warn!(target: "codepilot.retry", "editor fix proposed but no editor bridge configured");
                }
            },
            SolutionKind::PackageManager | SolutionKind::Shell => {
                for line in command_lines(solution) {
                    self.executor.run_shell(line).await?;
                }
            }
        }
        Ok(kind)
    }
}

/// Non-empty, non-comment lines with markdown fences removed.
fn command_lines(solution: &str) -> impl Iterator<Item = &str> {
    solution
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("```") && !l.starts_with('#'))
        .map(|l| l.strip_prefix("$ ").unwrap_or(l))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_solutions() {
        assert_eq!(classify("$$$ FOLDER_CREATE src %%%"), SolutionKind::FileOperations);
        assert_eq!(classify("npm install react@18"), SolutionKind::PackageManager);
        assert_eq!(classify("python -m pip install flask"), SolutionKind::PackageManager);
        assert_eq!(
            classify("vscode.window.showInformationMessage('x')"),
            SolutionKind::EditorApi
        );
        assert_eq!(classify("node --version"), SolutionKind::Shell);
    }

    #[test]
    fn command_lines_skip_fences_and_comments() {
        let lines: Vec<&str> = command_lines("```bash\n# fix\n$ npm install\n\nnpm test\n```").collect();
        assert_eq!(lines, vec!["npm install", "npm test"]);
    }
}
