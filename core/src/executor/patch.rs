use crate::protocol::PatchEdit;

/// Result of applying a FILE_MODIFY edit list to in-memory content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub content: String,
    pub applied: usize,
    /// Human readable reasons for edits that had no effect.
    pub skipped: Vec<String>,
}

/// Applies edits in order on the accumulated content.
///
/// Replace is an exact, first-occurrence substring replacement. Inserts target
/// the first line containing the anchor literal.
pub fn apply_edits(content: &str, edits: &[PatchEdit]) -> PatchOutcome {
    let mut current = content.to_string();
    let mut applied = 0;
    let mut skipped = Vec::new();

    for edit in edits {
        match edit {
            PatchEdit::Replace { id, old, new } => {
                if !old.is_empty() && current.contains(old.as_str()) {
                    current = current.replacen(old.as_str(), new, 1);
                    applied += 1;
                } else {
                    skipped.push(format!("REPLACE_BLOCK {id}: old text not found"));
                }
            }
            PatchEdit::InsertAfter { anchor, code } => {
                match insert_at_anchor(&current, anchor, code, true) {
                    Some(next) => {
                        current = next;
                        applied += 1;
                    }
                    None => skipped.push(format!("INSERT_AFTER: no line contains {anchor:?}")),
                }
            }
            PatchEdit::InsertBefore { anchor, code } => {
                match insert_at_anchor(&current, anchor, code, false) {
                    Some(next) => {
                        current = next;
                        applied += 1;
                    }
                    None => skipped.push(format!("INSERT_BEFORE: no line contains {anchor:?}")),
                }
            }
        }
    }

    PatchOutcome {
        content: current,
        applied,
        skipped,
    }
}

fn insert_at_anchor(content: &str, anchor: &str, code: &str, after: bool) -> Option<String> {
    if anchor.is_empty() {
        return None;
    }
    let mut lines: Vec<&str> = content.split('\n').collect();
    let idx = lines.iter().position(|l| l.contains(anchor))?;
    let at = if after { idx + 1 } else { idx };
    lines.insert(at, code);
    Some(lines.join("\n"))
}
