//! Marker Protocol Parser
//!
//! Line-oriented parser for the `$$$` / `###` / `&&&` marker language models use to
//! describe file and command operations.
//!
//! # Format
//!
//! ```text
//! &&& CODE_BLOCK_START rust
//! fn main() {}
//! &&& CODE_BLOCK_END
//! $$$ FOLDER_CREATE src/app %%%
//! $$$ FILE_CREATE src/app/main.rs
//! fn main() {}
//! $$$ FILE_END %%%
//! $$$ FILE_MODIFY src/lib.rs
//! ### REPLACE_BLOCK_START 1
//! old
//! ### REPLACE_BLOCK_END
//! ### NEW_BLOCK_START 1
//! new
//! ### NEW_BLOCK_END
//! ### INSERT_AFTER line:"use std::fmt;"
//! use std::io;
//! ### INSERT_END
//! $$$ FILE_END %%%
//! $$$ COMMAND_EXEC
//! {"command": "cargo build", "description": "Build"}
//! $$$ COMMAND_END %%%
//! ```
//!
//! Each grammar is applied over the whole response, in a fixed order: command
//! blocks, folder creation, file creation, file modification. A directive whose
//! end marker lacks `%%%`, or which is interrupted by another directive, is
//! dropped and reported as a [`ParseWarning`].

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::protocol::parser::ResponseProtocolParser;
use crate::protocol::types::{
    CodeBlock, CommandSpec, FileOperation, ParseOutput, ParseWarning, PatchEdit, WarningKind,
};
use crate::util::text::strip_code_fences;

const DIRECTIVE_PREFIX: &str = "$$$ ";
const TERMINATOR: &str = "%%%";

const COMMAND_EXEC: &str = "COMMAND_EXEC";
const COMMAND_END: &str = "COMMAND_END";
const FOLDER_CREATE: &str = "FOLDER_CREATE";
const FILE_CREATE: &str = "FILE_CREATE";
const FILE_MODIFY: &str = "FILE_MODIFY";
const FILE_END: &str = "FILE_END";

const HEADERS: [&str; 4] = [COMMAND_EXEC, FOLDER_CREATE, FILE_CREATE, FILE_MODIFY];

const CODE_BLOCK_START: &str = "&&& CODE_BLOCK_START";
const CODE_BLOCK_END: &str = "&&& CODE_BLOCK_END";

const REPLACE_BLOCK_START: &str = "### REPLACE_BLOCK_START";
const REPLACE_BLOCK_END: &str = "### REPLACE_BLOCK_END";
const NEW_BLOCK_START: &str = "### NEW_BLOCK_START";
const NEW_BLOCK_END: &str = "### NEW_BLOCK_END";
const INSERT_AFTER: &str = "### INSERT_AFTER";
const INSERT_BEFORE: &str = "### INSERT_BEFORE";
const INSERT_END: &str = "### INSERT_END";

/// Standard marker protocol parser
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerProtocolParser;

impl ResponseProtocolParser for MarkerProtocolParser {
    fn name(&self) -> &str {
        "marker"
    }

    fn parse(&self, input: &str) -> ParseOutput {
        parse_response(input)
    }

    fn format_identifier(&self) -> &str {
        DIRECTIVE_PREFIX
    }
}

/// Parses a model response into operations, code blocks and warnings.
pub fn parse_response(input: &str) -> ParseOutput {
    let lines: Vec<&str> = input.lines().collect();
    let mut out = ParseOutput::default();

    scan_code_blocks(&lines, &mut out);
    scan_commands(&lines, &mut out);
    scan_folders(&lines, &mut out);
    scan_file_creates(&lines, &mut out);
    scan_file_modifies(&lines, &mut out);

    for w in &out.warnings {
        tracing::warn!(
            target: "codepilot.protocol",
            line = w.line,
            kind = ?w.kind,
            "skipped directive: {}",
            w.message
        );
    }
    tracing::debug!(
        target: "codepilot.protocol",
        operations = out.operations.len(),
        code_blocks = out.code_blocks.len(),
        warnings = out.warnings.len(),
        "response parsed"
    );

    out
}

// ============================================================================
// Block scanning helpers
// ============================================================================

/// Returns the text after `$$$ KEYWORD` when `line` is that directive.
fn directive_rest<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.trim().strip_prefix(DIRECTIVE_PREFIX)?.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

fn is_directive_header(line: &str) -> bool {
    HEADERS.iter().any(|kw| directive_rest(line, kw).is_some())
}

enum Block<'a> {
    Closed { body: &'a [&'a str], next: usize },
    Unterminated { resume: usize, reason: &'static str },
}

/// Collects body lines starting at `start` until `$$$ <end_keyword> %%%`.
fn collect_block<'a>(lines: &'a [&'a str], start: usize, end_keyword: &str) -> Block<'a> {
    let mut i = start;
    while i < lines.len() {
        if let Some(rest) = directive_rest(lines[i], end_keyword) {
            if rest == TERMINATOR {
                return Block::Closed {
                    body: &lines[start..i],
                    next: i + 1,
                };
            }
            return Block::Unterminated {
                resume: i + 1,
                reason: "end marker is missing %%%",
            };
        }
        if is_directive_header(lines[i]) {
            return Block::Unterminated {
                resume: i,
                reason: "interrupted by another directive",
            };
        }
        i += 1;
    }
    Block::Unterminated {
        resume: lines.len(),
        reason: "reached end of response",
    }
}

fn clean_path(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '`' || c == '"')
        .trim()
        .to_string()
}

// ============================================================================
// Grammar passes
// ============================================================================

fn scan_code_blocks(lines: &[&str], out: &mut ParseOutput) {
    let mut i = 0;
    while i < lines.len() {
        let Some(language) = lines[i].trim().strip_prefix(CODE_BLOCK_START) else {
            i += 1;
            continue;
        };
        let end = (i + 1..lines.len()).find(|&k| lines[k].trim() == CODE_BLOCK_END);
        match end {
            Some(end) => {
                out.code_blocks.push(CodeBlock {
                    language: language.trim().to_string(),
                    code: lines[i + 1..end].join("\n"),
                });
                i = end + 1;
            }
            None => {
                out.warnings.push(ParseWarning::new(
                    WarningKind::Unterminated,
                    i + 1,
                    "CODE_BLOCK_START without CODE_BLOCK_END",
                ));
                i += 1;
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CommandPayload {
    Many(Vec<CommandSpec>),
    One(CommandSpec),
}

fn scan_commands(lines: &[&str], out: &mut ParseOutput) {
    let mut i = 0;
    while i < lines.len() {
        match directive_rest(lines[i], COMMAND_EXEC) {
            Some(rest) if rest.is_empty() => {}
            _ => {
                i += 1;
                continue;
            }
        }
        let header_line = i + 1;
        match collect_block(lines, i + 1, COMMAND_END) {
            Block::Closed { body, next } => {
                if let Some(commands) = parse_command_body(body, header_line, &mut out.warnings) {
                    out.operations.push(FileOperation::ExecCommand { commands });
                }
                i = next;
            }
            Block::Unterminated { resume, reason } => {
                out.warnings.push(ParseWarning::new(
                    WarningKind::Unterminated,
                    header_line,
                    format!("COMMAND_EXEC dropped: {reason}"),
                ));
                i = resume.max(i + 1);
            }
        }
    }
}

fn parse_command_body(
    body: &[&str],
    header_line: usize,
    warnings: &mut Vec<ParseWarning>,
) -> Option<Vec<CommandSpec>> {
    let joined = body.join("\n");
    let json = strip_code_fences(&joined);
    let payload = match serde_json::from_str::<CommandPayload>(json) {
        Ok(p) => p,
        Err(e) => {
            warnings.push(ParseWarning::new(
                WarningKind::InvalidCommandJson,
                header_line,
                format!("COMMAND_EXEC body is not a CommandSpec or CommandSpec[]: {e}"),
            ));
            return None;
        }
    };
    let specs = match payload {
        CommandPayload::Many(v) => v,
        CommandPayload::One(s) => vec![s],
    };

    let mut commands = Vec::with_capacity(specs.len());
    for spec in specs {
        if spec.command.trim().is_empty() {
            warnings.push(ParseWarning::new(
                WarningKind::EmptyCommand,
                header_line,
                "COMMAND_EXEC entry has an empty command",
            ));
            continue;
        }
        commands.push(spec);
    }
    if commands.is_empty() {
        None
    } else {
        Some(commands)
    }
}

fn scan_folders(lines: &[&str], out: &mut ParseOutput) {
    for (i, line) in lines.iter().enumerate() {
        let Some(rest) = directive_rest(line, FOLDER_CREATE) else {
            continue;
        };
        let Some(path) = rest.strip_suffix(TERMINATOR) else {
            out.warnings.push(ParseWarning::new(
                WarningKind::Unterminated,
                i + 1,
                "FOLDER_CREATE dropped: missing %%%",
            ));
            continue;
        };
        let path = clean_path(path);
        if path.is_empty() {
            out.warnings.push(ParseWarning::new(
                WarningKind::EmptyPath,
                i + 1,
                "FOLDER_CREATE without a path",
            ));
            continue;
        }
        out.operations.push(FileOperation::CreateFolder { path });
    }
}

fn scan_file_creates(lines: &[&str], out: &mut ParseOutput) {
    let mut i = 0;
    while i < lines.len() {
        let Some(rest) = directive_rest(lines[i], FILE_CREATE) else {
            i += 1;
            continue;
        };
        let header_line = i + 1;
        let path = clean_path(rest);
        match collect_block(lines, i + 1, FILE_END) {
            Block::Closed { body, next } => {
                if path.is_empty() {
                    out.warnings.push(ParseWarning::new(
                        WarningKind::EmptyPath,
                        header_line,
                        "FILE_CREATE without a path",
                    ));
                } else {
                    out.operations.push(FileOperation::CreateFile {
                        path,
                        content: body.join("\n"),
                    });
                }
                i = next;
            }
            Block::Unterminated { resume, reason } => {
                out.warnings.push(ParseWarning::new(
                    WarningKind::Unterminated,
                    header_line,
                    format!("FILE_CREATE {path} dropped: {reason}"),
                ));
                i = resume.max(i + 1);
            }
        }
    }
}

fn scan_file_modifies(lines: &[&str], out: &mut ParseOutput) {
    let mut i = 0;
    while i < lines.len() {
        let Some(rest) = directive_rest(lines[i], FILE_MODIFY) else {
            i += 1;
            continue;
        };
        let header_line = i + 1;
        let path = clean_path(rest);
        match collect_block(lines, i + 1, FILE_END) {
            Block::Closed { body, next } => {
                i = next;
                if path.is_empty() {
                    out.warnings.push(ParseWarning::new(
                        WarningKind::EmptyPath,
                        header_line,
                        "FILE_MODIFY without a path",
                    ));
                    continue;
                }
                let edits = parse_edits(body, header_line + 1, &mut out.warnings);
                if edits.is_empty() {
                    out.warnings.push(ParseWarning::new(
                        WarningKind::NoEdits,
                        header_line,
                        format!("FILE_MODIFY {path} contains no usable edit"),
                    ));
                    continue;
                }
                out.operations.push(FileOperation::ModifyFile { path, edits });
            }
            Block::Unterminated { resume, reason } => {
                out.warnings.push(ParseWarning::new(
                    WarningKind::Unterminated,
                    header_line,
                    format!("FILE_MODIFY {path} dropped: {reason}"),
                ));
                i = resume.max(i + 1);
            }
        }
    }
}

// ============================================================================
// FILE_MODIFY sub-passes
// ============================================================================

/// Runs the three edit sub-passes in order: replace, insert-after, insert-before.
///
/// `first_line` is the 1-indexed response line of `body[0]`.
fn parse_edits(
    body: &[&str],
    first_line: usize,
    warnings: &mut Vec<ParseWarning>,
) -> Vec<PatchEdit> {
    let mut edits = Vec::new();
    scan_replacements(body, first_line, &mut edits, warnings);
    scan_inserts(body, first_line, InsertKind::After, &mut edits, warnings);
    scan_inserts(body, first_line, InsertKind::Before, &mut edits, warnings);
    edits
}

fn find_marker(body: &[&str], from: usize, marker: &str) -> Option<usize> {
    (from..body.len()).find(|&k| body[k].trim() == marker)
}

fn scan_replacements(
    body: &[&str],
    first_line: usize,
    edits: &mut Vec<PatchEdit>,
    warnings: &mut Vec<ParseWarning>,
) {
    let mut i = 0;
    while i < body.len() {
        let Some(id) = body[i].trim().strip_prefix(REPLACE_BLOCK_START) else {
            i += 1;
            continue;
        };
        let id = id.trim().to_string();
        let line = first_line + i;

        let Some(old_end) = find_marker(body, i + 1, REPLACE_BLOCK_END) else {
            warnings.push(ParseWarning::new(
                WarningKind::Unterminated,
                line,
                format!("REPLACE_BLOCK_START {id} without REPLACE_BLOCK_END"),
            ));
            return;
        };
        let old = body[i + 1..old_end].join("\n");

        let mut j = old_end + 1;
        while j < body.len() && body[j].trim().is_empty() {
            j += 1;
        }
        let new_id = body
            .get(j)
            .and_then(|l| l.trim().strip_prefix(NEW_BLOCK_START))
            .map(str::trim);

        match new_id {
            Some(new_id) if new_id == id => {
                let Some(new_end) = find_marker(body, j + 1, NEW_BLOCK_END) else {
                    warnings.push(ParseWarning::new(
                        WarningKind::Unterminated,
                        first_line + j,
                        format!("NEW_BLOCK_START {id} without NEW_BLOCK_END"),
                    ));
                    return;
                };
                edits.push(PatchEdit::Replace {
                    id,
                    old,
                    new: body[j + 1..new_end].join("\n"),
                });
                i = new_end + 1;
            }
            Some(new_id) => {
                warnings.push(ParseWarning::new(
                    WarningKind::MismatchedBlockId,
                    line,
                    format!("REPLACE_BLOCK {id} is followed by NEW_BLOCK {new_id}"),
                ));
                i = j + 1;
            }
            None => {
                warnings.push(ParseWarning::new(
                    WarningKind::MismatchedBlockId,
                    line,
                    format!("REPLACE_BLOCK {id} has no NEW_BLOCK"),
                ));
                i = old_end + 1;
            }
        }
    }
}

#[derive(Clone, Copy)]
enum InsertKind {
    After,
    Before,
}

impl InsertKind {
    fn marker(self) -> &'static str {
        match self {
            Self::After => INSERT_AFTER,
            Self::Before => INSERT_BEFORE,
        }
    }
}

fn insert_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^line:"(.*)"$"#).expect("valid insert header regex"))
}

fn scan_inserts(
    body: &[&str],
    first_line: usize,
    kind: InsertKind,
    edits: &mut Vec<PatchEdit>,
    warnings: &mut Vec<ParseWarning>,
) {
    let marker = kind.marker();
    let mut i = 0;
    while i < body.len() {
        let Some(rest) = body[i].trim().strip_prefix(marker) else {
            i += 1;
            continue;
        };
        let line = first_line + i;

        let Some(anchor) = insert_header_regex()
            .captures(rest.trim())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        else {
            warnings.push(ParseWarning::new(
                WarningKind::MalformedHeader,
                line,
                format!(r#"{marker} header must be followed by line:"<text>""#),
            ));
            i += 1;
            continue;
        };

        let Some(end) = find_marker(body, i + 1, INSERT_END) else {
            warnings.push(ParseWarning::new(
                WarningKind::Unterminated,
                line,
                format!("{marker} without INSERT_END"),
            ));
            return;
        };
        let code = body[i + 1..end].join("\n");
        edits.push(match kind {
            InsertKind::After => PatchEdit::InsertAfter { anchor, code },
            InsertKind::Before => PatchEdit::InsertBefore { anchor, code },
        });
        i = end + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::OperationKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn folder_create_yields_one_operation() {
        let out = parse_response("Sure, creating the app.\n$$$ FOLDER_CREATE my-app %%%\n");
        assert_eq!(
            out.operations,
            vec![FileOperation::CreateFolder {
                path: "my-app".to_string()
            }]
        );
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn file_create_preserves_multiline_content() {
        let input = "$$$ FILE_CREATE src/main.rs\nfn main() {\n    println!(\"hi\");\n}\n$$$ FILE_END %%%";
        let out = parse_response(input);
        assert_eq!(
            out.operations,
            vec![FileOperation::CreateFile {
                path: "src/main.rs".to_string(),
                content: "fn main() {\n    println!(\"hi\");\n}".to_string(),
            }]
        );
    }

    #[test]
    fn grammars_apply_globally_in_fixed_order() {
        let input = r#"
$$$ FOLDER_CREATE a %%%
$$$ FILE_CREATE a/one.txt
1
$$$ FILE_END %%%
$$$ FOLDER_CREATE b %%%
$$$ COMMAND_EXEC
{"command": "npm install"}
$$$ COMMAND_END %%%
$$$ FILE_CREATE b/two.txt
2
$$$ FILE_END %%%
"#;
        let out = parse_response(input);
        let kinds: Vec<OperationKind> = out.operations.iter().map(|o| o.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::ExecCommand,
                OperationKind::CreateFolder,
                OperationKind::CreateFolder,
                OperationKind::CreateFile,
                OperationKind::CreateFile,
            ]
        );
        assert_eq!(out.operations[1].path(), Some("a"));
        assert_eq!(out.operations[2].path(), Some("b"));
        assert_eq!(out.operations[4].path(), Some("b/two.txt"));
    }

    #[test]
    fn parsing_is_idempotent() {
        let input = "$$$ FOLDER_CREATE x %%%\n$$$ FILE_CREATE x/a\nA\n$$$ FILE_END %%%\n";
        assert_eq!(parse_response(input), parse_response(input));
    }

    #[test]
    fn unterminated_file_create_does_not_swallow_next_block() {
        let input = "$$$ FILE_CREATE broken.txt\npartial\n$$$ FILE_CREATE ok.txt\nfine\n$$$ FILE_END %%%\n";
        let out = parse_response(input);
        assert_eq!(out.operations.len(), 1);
        assert_eq!(out.operations[0].path(), Some("ok.txt"));
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, WarningKind::Unterminated);
        assert_eq!(out.warnings[0].line, 1);
    }

    #[test]
    fn missing_terminator_drops_directive() {
        let out = parse_response("$$$ FOLDER_CREATE nope\n$$$ FILE_CREATE a.txt\nx\n$$$ FILE_END\n");
        assert!(out.operations.is_empty());
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings.iter().all(|w| w.kind == WarningKind::Unterminated));
    }

    #[test]
    fn block_cut_off_at_end_of_response_is_skipped() {
        let out = parse_response("$$$ COMMAND_EXEC\n{\"command\": \"ls\"}\n");
        assert!(out.operations.is_empty());
        assert_eq!(out.warnings[0].kind, WarningKind::Unterminated);
    }

    #[test]
    fn command_exec_accepts_single_and_array() {
        let input = r#"$$$ COMMAND_EXEC
{"command": "npm install", "description": "Install deps"}
$$$ COMMAND_END %%%
$$$ COMMAND_EXEC
[{"command": "npm run dev", "isBackground": true, "cwd": "web"}, {"command": "  "}]
$$$ COMMAND_END %%%"#;
        let out = parse_response(input);
        assert_eq!(out.operations.len(), 2);
        let FileOperation::ExecCommand { commands } = &out.operations[0] else {
            panic!("expected command op");
        };
        assert_eq!(commands[0].command, "npm install");
        assert_eq!(commands[0].description, "Install deps");
        assert!(!commands[0].is_background);

        let FileOperation::ExecCommand { commands } = &out.operations[1] else {
            panic!("expected command op");
        };
        assert_eq!(commands.len(), 1);
        assert!(commands[0].is_background);
        assert_eq!(commands[0].cwd.as_deref(), Some("web"));
        assert_eq!(out.warnings[0].kind, WarningKind::EmptyCommand);
    }

    #[test]
    fn invalid_command_json_is_reported() {
        let out = parse_response("$$$ COMMAND_EXEC\nnpm install\n$$$ COMMAND_END %%%");
        assert!(out.operations.is_empty());
        assert_eq!(out.warnings[0].kind, WarningKind::InvalidCommandJson);
    }

    #[test]
    fn file_modify_collects_edits_in_sub_pass_order() {
        let input = r#"$$$ FILE_MODIFY src/app.js
### INSERT_BEFORE line:"export default App;"
// footer
### INSERT_END
### INSERT_AFTER line:"import React from 'react';"
import './App.css';
### INSERT_END
### REPLACE_BLOCK_START title
<h1>Old</h1>
### REPLACE_BLOCK_END
### NEW_BLOCK_START title
<h1>New</h1>
### NEW_BLOCK_END
$$$ FILE_END %%%"#;
        let out = parse_response(input);
        assert_eq!(out.operations.len(), 1);
        let FileOperation::ModifyFile { path, edits } = &out.operations[0] else {
            panic!("expected modify op");
        };
        assert_eq!(path, "src/app.js");
        assert_eq!(
            edits,
            &vec![
                PatchEdit::Replace {
                    id: "title".to_string(),
                    old: "<h1>Old</h1>".to_string(),
                    new: "<h1>New</h1>".to_string(),
                },
                PatchEdit::InsertAfter {
                    anchor: "import React from 'react';".to_string(),
                    code: "import './App.css';".to_string(),
                },
                PatchEdit::InsertBefore {
                    anchor: "export default App;".to_string(),
                    code: "// footer".to_string(),
                },
            ]
        );
    }

    #[test]
    fn mismatched_replace_ids_are_skipped() {
        let input = r#"$$$ FILE_MODIFY a.txt
### REPLACE_BLOCK_START one
x
### REPLACE_BLOCK_END
### NEW_BLOCK_START two
y
### NEW_BLOCK_END
### INSERT_AFTER line:"x"
z
### INSERT_END
$$$ FILE_END %%%"#;
        let out = parse_response(input);
        let FileOperation::ModifyFile { edits, .. } = &out.operations[0] else {
            panic!("expected modify op");
        };
        assert_eq!(edits.len(), 1);
        assert!(matches!(edits[0], PatchEdit::InsertAfter { .. }));
        assert_eq!(out.warnings[0].kind, WarningKind::MismatchedBlockId);
        assert_eq!(out.warnings[0].line, 2);
    }

    #[test]
    fn modify_without_edits_is_dropped() {
        let out = parse_response("$$$ FILE_MODIFY a.txt\njust prose\n$$$ FILE_END %%%");
        assert!(out.operations.is_empty());
        assert_eq!(out.warnings[0].kind, WarningKind::NoEdits);
    }

    #[test]
    fn code_blocks_are_informational() {
        let out = parse_response("&&& CODE_BLOCK_START python\nprint('hi')\n&&& CODE_BLOCK_END");
        assert!(out.operations.is_empty());
        assert_eq!(
            out.code_blocks,
            vec![CodeBlock {
                language: "python".to_string(),
                code: "print('hi')".to_string(),
            }]
        );
    }

    #[test]
    fn similar_keywords_are_not_directives() {
        let out = parse_response("$$$ FOLDER_CREATED x %%%\n$$$ FILE_CREATEX y\n$$$ FILE_END %%%");
        assert!(out.operations.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn garbage_never_panics() {
        for input in [
            "",
            "$$$",
            "$$$ FILE_MODIFY",
            "$$$ FILE_MODIFY x\n### REPLACE_BLOCK_START",
            "### INSERT_AFTER line:\"\n$$$ FILE_END %%%",
            "&&& CODE_BLOCK_START",
            "%%%\n$$$ COMMAND_END %%%",
        ] {
            let _ = parse_response(input);
        }
    }

    #[test]
    fn validate_format_flags_dropped_blocks() {
        let parser = MarkerProtocolParser;
        assert_eq!(parser.name(), "marker");
        assert!(parser.validate_format("$$$ FOLDER_CREATE a %%%").is_valid);
        assert!(!parser.validate_format("no markers here").is_valid);
        assert!(!parser.validate_format("$$$ FOLDER_CREATE a").is_valid);
    }
}
