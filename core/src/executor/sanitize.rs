//! Best-effort command sanitisation.
//!
//! This is a denylist, not a security boundary. Commands are run through a
//! shell, so the checks below only stop the most common ways a model response
//! chains or redirects commands.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ExecutorError;

const FORBIDDEN: [(&str, &str); 9] = [
    (";", "command chaining with ';'"),
    ("|", "pipe or '||'"),
    ("&", "background or '&&'"),
    ("`", "backtick substitution"),
    ("$(", "command substitution"),
    ("${", "parameter expansion"),
    (">", "output redirection"),
    ("<", "input redirection"),
    ("\n", "multi-line command"),
];

fn html_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[a-zA-Z/!]").expect("valid html regex"))
}

fn numeric_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").expect("valid numeric regex"))
}

/// Returns the cleaned command or a `Sanitization` error.
///
/// `allow_list`, when non-empty, restricts the first word of the command.
pub fn sanitize_command(raw: &str, allow_list: &[String]) -> Result<String, ExecutorError> {
    let reject = |reason: &str| ExecutorError::Sanitization {
        command: raw.to_string(),
        reason: reason.to_string(),
    };

    let cmd = raw.trim().trim_matches('`').trim();
    if cmd.is_empty() {
        return Err(reject("empty command"));
    }
    if html_regex().is_match(cmd) {
        return Err(reject("HTML-like content"));
    }
    if let Some((_, reason)) = FORBIDDEN.iter().find(|(pat, _)| cmd.contains(pat)) {
        return Err(reject(*reason));
    }
    if numeric_regex().is_match(cmd) {
        return Err(reject("bare number looks like a process id"));
    }

    if !allow_list.is_empty() {
        let program = cmd.split_whitespace().next().unwrap_or_default();
        if !allow_list.iter().any(|a| a == program) {
            return Err(reject(&format!("'{program}' is not in the allow list")));
        }
    }

    Ok(cmd.to_string())
}
