use regex::Regex;
use std::sync::OnceLock;

fn python_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(python[0-9.]*|py)(\.exe)?$").expect("valid python regex"))
}

/// Whether the command's program is a Python interpreter.
pub fn is_python_command(command: &str) -> bool {
    command
        .split_whitespace()
        .next()
        .map(|p| python_regex().is_match(p))
        .unwrap_or(false)
}

const KINDS: [(&str, &str); 5] = [
    ("SyntaxError", "SyntaxError"),
    ("IndentationError", "IndentationError"),
    ("ModuleNotFoundError", "ImportError"),
    ("ImportError", "ImportError"),
    ("FileNotFoundError", "FileNotFoundError"),
];

/// Prefixes well-known Python failures with `Python <Kind>: <line>`.
///
/// Returns `None` when stderr carries none of the recognised error types.
pub fn normalize_python_error(stderr: &str) -> Option<String> {
    for line in stderr.lines().rev() {
        let line = line.trim();
        for (needle, kind) in KINDS {
            if line.starts_with(needle) {
                return Some(format!("Python {kind}: {line}"));
            }
        }
    }
    None
}
