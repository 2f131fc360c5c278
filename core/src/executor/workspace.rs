use std::path::{Component, Path, PathBuf};

use crate::error::ExecutorError;

/// Root directory that every file operation and command cwd is confined to.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative path from a directive against the root.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, ExecutorError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExecutorError::InvalidPath("empty path".to_string()));
        }
        if trimmed.contains('\0') {
            return Err(ExecutorError::InvalidPath(format!("NUL byte in {trimmed:?}")));
        }
        let rel = Path::new(trimmed);
        if rel.is_absolute() || rel.has_root() {
            return Err(ExecutorError::InvalidPath(format!(
                "absolute path not allowed: {trimmed}"
            )));
        }
        let normalized = normalize(rel)
            .ok_or_else(|| ExecutorError::PathTraversal(trimmed.to_string()))?;
        Ok(self.root.join(normalized))
    }

    /// Resolves a command working directory. Absolute paths are accepted only inside the root.
    pub fn resolve_dir(&self, cwd: Option<&str>) -> Result<PathBuf, ExecutorError> {
        match cwd.map(str::trim) {
            None | Some("") | Some(".") => Ok(self.root.clone()),
            Some(dir) => {
                let p = Path::new(dir);
                if p.is_absolute() {
                    let root = normalize_abs(&self.root);
                    if normalize_abs(p).starts_with(&root) {
                        Ok(p.to_path_buf())
                    } else {
                        Err(ExecutorError::PathTraversal(dir.to_string()))
                    }
                } else {
                    self.resolve(dir)
                }
            }
        }
    }

    pub async fn create_dir_all(&self, raw: &str) -> Result<PathBuf, ExecutorError> {
        let path = self.resolve(raw)?;
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| ExecutorError::io(path.display().to_string(), e))?;
        Ok(path)
    }

    /// Writes (overwrites) a file, creating parent directories first.
    pub async fn write_file(&self, raw: &str, content: &str) -> Result<PathBuf, ExecutorError> {
        let path = self.resolve(raw)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExecutorError::io(parent.display().to_string(), e))?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ExecutorError::io(path.display().to_string(), e))?;
        Ok(path)
    }

    pub async fn read_file(&self, raw: &str) -> Result<String, ExecutorError> {
        let path = self.resolve(raw)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ExecutorError::FileNotFound(path.display().to_string()))
            }
            Err(e) => Err(ExecutorError::io(path.display().to_string(), e)),
        }
    }
}

/// Lexically normalises a relative path; `None` when `..` escapes it.
fn normalize(rel: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for comp in rel.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

fn normalize_abs(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in p.components() {
        match comp {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}
