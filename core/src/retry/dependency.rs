//! Missing-dependency detection and installation.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::executor::CommandExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Npm,
    Python,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MissingDependency {
    pub name: String,
    pub ecosystem: Ecosystem,
}

impl MissingDependency {
    fn npm(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ecosystem: Ecosystem::Npm,
        }
    }
}

struct Patterns {
    cannot_find_module: Regex,
    cannot_resolve: Regex,
    python_import: Regex,
    npm_missing: Regex,
    node_modules: Regex,
    valid_npm: Regex,
    valid_python: Regex,
}

fn patterns() -> &'static Patterns {
    static P: OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| Patterns {
        cannot_find_module: Regex::new(r#"Cannot find module ['"]([^'"]+)['"]"#)
            .expect("valid regex"),
        cannot_resolve: Regex::new(
            r#"(?:Can't resolve|Cannot find package|Module not found: Error: Can't resolve) ['"]([^'"]+)['"]"#,
        )
        .expect("valid regex"),
        python_import: Regex::new(
            r#"(?:ModuleNotFoundError|ImportError): No module named ['"]?([A-Za-z0-9_.\-]+)['"]?"#,
        )
        .expect("valid regex"),
        npm_missing: Regex::new(r"npm ERR! missing:\s*(\S+)").expect("valid regex"),
        node_modules: Regex::new(r"node_modules[/\\]((?:@[^/\\\s'\x22]+[/\\])?[^/\\\s'\x22]+)")
            .expect("valid regex"),
        valid_npm: Regex::new(r"^(?:@[a-z0-9][a-z0-9._\-]*/)?[a-z0-9][a-z0-9._\-]*$")
            .expect("valid regex"),
        valid_python: Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").expect("valid regex"),
    })
}

/// Reduces a module specifier to its package name
/// (`lodash/fp` → `lodash`, `@scope/pkg/sub` → `@scope/pkg`).
fn npm_package_name(spec: &str) -> Option<String> {
    let spec = spec.trim();
    if spec.starts_with('.') || spec.starts_with('/') || spec.starts_with("node:") {
        return None;
    }
    let mut parts = spec.split('/');
    let name = if spec.starts_with('@') {
        let scope = parts.next()?;
        let pkg = parts.next()?;
        format!("{scope}/{pkg}")
    } else {
        parts.next()?.to_string()
    };
    patterns().valid_npm.is_match(&name).then_some(name)
}

/// Strips a trailing `@version` from `name@1.2.3` / `@scope/name@^1`.
fn strip_version(spec: &str) -> &str {
    let search_from = usize::from(spec.starts_with('@'));
    match spec[search_from..].find('@') {
        Some(i) => &spec[..search_from + i],
        None => spec,
    }
}

/// Looks for a missing package in an error message.
///
/// Patterns are tried in order: module-not-found, resolve errors, Python
/// import errors, `npm ERR! missing`, then the last nested `node_modules` path.
pub fn extract_dependency(message: &str) -> Option<MissingDependency> {
    let p = patterns();

    if let Some(name) = p
        .cannot_find_module
        .captures(message)
        .and_then(|c| npm_package_name(&c[1]))
    {
        return Some(MissingDependency::npm(&name));
    }
    if let Some(name) = p
        .cannot_resolve
        .captures(message)
        .and_then(|c| npm_package_name(&c[1]))
    {
        return Some(MissingDependency::npm(&name));
    }
    if let Some(c) = p.python_import.captures(message) {
        let top = c[1].split('.').next().unwrap_or_default();
        if p.valid_python.is_match(top) {
            return Some(MissingDependency {
                name: top.to_string(),
                ecosystem: Ecosystem::Python,
            });
        }
    }
    if let Some(name) = p
        .npm_missing
        .captures(message)
        .and_then(|c| npm_package_name(strip_version(&c[1])))
    {
        return Some(MissingDependency::npm(&name));
    }
    p.node_modules
        .captures_iter(message)
        .last()
        .and_then(|c| npm_package_name(&c[1].replace('\\', "/")))
        .map(|name| MissingDependency::npm(&name))
}

/// Searches an `npm ls --all --json` tree for a pinned version of `name`.
///
/// Heuristic: the first version found in a depth-first walk wins.
pub fn find_pinned_version(tree: &Value, name: &str) -> Option<String> {
    let deps = tree.get("dependencies")?.as_object()?;
    if let Some(v) = deps
        .get(name)
        .and_then(|d| d.get("version"))
        .and_then(Value::as_str)
    {
        return Some(v.to_string());
    }
    deps.values().find_map(|child| find_pinned_version(child, name))
}

/// Installs missing packages.
#[async_trait]
pub trait DependencyInstaller: Send + Sync {
    /// Version already pinned somewhere in the dependency tree, if any.
    async fn pinned_version(&self, dep: &MissingDependency) -> Option<String>;

    async fn install(&self, dep: &MissingDependency, version: Option<&str>) -> anyhow::Result<()>;
}

/// Installs through the package manager via the command executor.
pub struct ShellDependencyInstaller {
    executor: CommandExecutor,
}

impl ShellDependencyInstaller {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl DependencyInstaller for ShellDependencyInstaller {
    async fn pinned_version(&self, dep: &MissingDependency) -> Option<String> {
        if dep.ecosystem != Ecosystem::Npm {
            return None;
        }
        let cmd = format!("npm ls {} --all --json", dep.name);
        // npm ls 在依赖缺失时退出码非零，但仍输出 JSON
        let out = match self.executor.capture(&cmd, None).await {
            Ok(out) => out,
            Err(e) => {
                tracing::debug!(target: "codepilot.retry", error = %e, "npm ls unavailable");
                return None;
            }
        };
        let tree: Value = serde_json::from_str(out.stdout.trim()).ok()?;
        find_pinned_version(&tree, &dep.name)
    }

    async fn install(&self, dep: &MissingDependency, version: Option<&str>) -> anyhow::Result<()> {
        let target = match version {
            Some(v) => format!("{}@{}", dep.name, v),
            None => dep.name.clone(),
        };
        let cmd = match dep.ecosystem {
            Ecosystem::Npm => format!("npm install {target}"),
            Ecosystem::Python => format!("python -m pip install {}", dep.name),
        };
        self.executor.run_shell(&cmd).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn npm(name: &str) -> Option<MissingDependency> {
        Some(MissingDependency::npm(name))
    }

    #[test]
    fn extracts_known_patterns() {
        assert_eq!(extract_dependency("Error: Cannot find module 'lodash'"), npm("lodash"));
        assert_eq!(extract_dependency("npm ERR! missing: left-pad"), npm("left-pad"));
        assert_eq!(
            extract_dependency("npm ERR! missing: left-pad@1.3.0, required by app@1.0.0"),
            npm("left-pad")
        );
        assert_eq!(
            extract_dependency("Module not found: Error: Can't resolve '@mui/material/Button' in '/src'"),
            npm("@mui/material")
        );
        assert_eq!(
            extract_dependency("ModuleNotFoundError: No module named 'requests.adapters'"),
            Some(MissingDependency {
                name: "requests".into(),
                ecosystem: Ecosystem::Python
            })
        );
        assert_eq!(
            extract_dependency("at /app/node_modules/react-scripts/node_modules/babel-loader/lib/index.js"),
            npm("babel-loader")
        );
    }

    #[test]
    fn ignores_relative_modules_and_noise() {
        assert_eq!(extract_dependency("Cannot find module './App'"), None);
        assert_eq!(extract_dependency("TypeError: x is not a function"), None);
    }

    #[test]
    fn finds_pinned_version_in_nested_tree() {
        let tree = json!({
            "name": "app",
            "dependencies": {
                "react-scripts": {
                    "version": "5.0.1",
                    "dependencies": {"lodash": {"version": "4.17.21"}}
                }
            }
        });
        assert_eq!(find_pinned_version(&tree, "lodash").as_deref(), Some("4.17.21"));
        assert_eq!(find_pinned_version(&tree, "left-pad"), None);
    }
}
