/// Strips a single leading ```lang fence line and a trailing ``` fence.
///
/// Text without fences is returned trimmed.
pub fn strip_code_fences(input: &str) -> &str {
    let mut s = input.trim();
    if s.starts_with("```") {
        s = match s.find('\n') {
            Some(nl) => &s[nl + 1..],
            None => s.trim_start_matches('`'),
        };
    }
    let trimmed_end = s.trim_end();
    if let Some(body) = trimmed_end.strip_suffix("```") {
        s = body;
    }
    s.trim()
}

/// Cuts `s` to at most `max` bytes on a char boundary, appending an ellipsis.
pub fn preview(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let end = s
        .char_indices()
        .take_while(|(i, _)| *i < max)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let mut out = s[..end].to_string();
    out.push('…');
    out
}
