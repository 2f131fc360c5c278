use serde::{Deserialize, Serialize};

/// A single command requested by a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    pub command: String,

    /// Working directory relative to the configured root; defaults to the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    #[serde(default)]
    pub is_background: bool,

    #[serde(default)]
    pub description: String,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
            is_background: false,
            description: String::new(),
        }
    }

    pub fn label(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.command
        } else {
            &self.description
        }
    }
}

/// One patch directive inside a FILE_MODIFY block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PatchEdit {
    /// Exact substring replacement of `old` by `new`.
    Replace { id: String, old: String, new: String },
    /// Insert `code` after the first line containing `anchor`.
    InsertAfter { anchor: String, code: String },
    /// Insert `code` before the first line containing `anchor`.
    InsertBefore { anchor: String, code: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    CreateFolder,
    CreateFile,
    ModifyFile,
    ExecCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FileOperation {
    CreateFolder { path: String },
    CreateFile { path: String, content: String },
    ModifyFile { path: String, edits: Vec<PatchEdit> },
    ExecCommand { commands: Vec<CommandSpec> },
}

impl FileOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::CreateFolder { .. } => OperationKind::CreateFolder,
            Self::CreateFile { .. } => OperationKind::CreateFile,
            Self::ModifyFile { .. } => OperationKind::ModifyFile,
            Self::ExecCommand { .. } => OperationKind::ExecCommand,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Self::CreateFolder { path }
            | Self::CreateFile { path, .. }
            | Self::ModifyFile { path, .. } => Some(path),
            Self::ExecCommand { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::CreateFolder { path } => format!("Create folder {path}"),
            Self::CreateFile { path, .. } => format!("Create file {path}"),
            Self::ModifyFile { path, edits } => {
                format!("Modify file {path} ({} edits)", edits.len())
            }
            Self::ExecCommand { commands } => format!("Run {} command(s)", commands.len()),
        }
    }
}

/// A fenced `&&& CODE_BLOCK_START` block. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Block opened but never closed with its `%%%`-terminated end marker.
    Unterminated,
    /// REPLACE_BLOCK / NEW_BLOCK identifiers disagree or NEW_BLOCK is missing.
    MismatchedBlockId,
    /// INSERT_AFTER / INSERT_BEFORE header without a `line:"..."` anchor.
    MalformedHeader,
    InvalidCommandJson,
    EmptyPath,
    EmptyCommand,
    /// FILE_MODIFY block contained no usable edit.
    NoEdits,
}

/// Diagnostic for a directive the parser skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub kind: WarningKind,
    /// 1-indexed line of the directive header.
    pub line: usize,
    pub message: String,
}

impl ParseWarning {
    pub fn new(kind: WarningKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    /// Whether the skipped directive would otherwise have produced an operation.
    pub fn is_dropped_operation(&self) -> bool {
        matches!(
            self.kind,
            WarningKind::Unterminated
                | WarningKind::MismatchedBlockId
                | WarningKind::MalformedHeader
                | WarningKind::InvalidCommandJson
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutput {
    pub operations: Vec<FileOperation>,
    pub code_blocks: Vec<CodeBlock>,
    pub warnings: Vec<ParseWarning>,
}

impl ParseOutput {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
