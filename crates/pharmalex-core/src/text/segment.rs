//! Depth-aware scanning over parenthesized product names.
//!
//! Compound chemical names nest parentheses inside a component's own
//! parentheses, so splitting and segment extraction track nesting depth
//! instead of matching brackets with a pattern.

use super::unify::LIST_SEPARATOR;

fn is_token_separator(ch: char) -> bool {
    matches!(ch, ',' | '/' | 'ᆞ' | 'ㆍ') || ch == LIST_SEPARATOR
}

fn flush(buf: &mut String, out: &mut Vec<String>) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    buf.clear();
}

/// Contents of every top-level parenthesis group, nested groups kept verbatim.
///
/// Text outside parentheses is ignored. A closer with no matching opener
/// leaves the depth at zero and an opener that is never closed discards its
/// partial buffer, so every returned segment is balanced.
pub fn outer_segments(s: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut depth = 0usize;

    for ch in s.chars() {
        match ch {
            '(' => {
                if depth > 0 {
                    buf.push(ch);
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    continue;
                }
                depth -= 1;
                if depth == 0 {
                    flush(&mut buf, &mut segments);
                } else {
                    buf.push(ch);
                }
            }
            _ if depth > 0 => buf.push(ch),
            _ => {}
        }
    }

    segments
}

/// Splits on `,`, `/` and `·` only where the nesting depth is zero.
///
/// Empty candidates are dropped; the text after the last separator is always
/// emitted. Orphan closers are dropped so candidates never carry a stray `)`.
pub fn split_outside_parens(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut depth = 0usize;

    for ch in s.chars() {
        match ch {
            '(' => {
                depth += 1;
                buf.push(ch);
            }
            ')' => {
                if depth > 0 {
                    depth -= 1;
                    buf.push(ch);
                }
            }
            c if depth == 0 && is_token_separator(c) => flush(&mut buf, &mut parts),
            c => buf.push(c),
        }
    }
    flush(&mut buf, &mut parts);

    parts
}

/// Drops closers with no opener and closes openers left dangling, then
/// collapses whitespace. Used on serialized synonym surfaces.
pub fn repair_parens(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;

    for ch in s.chars() {
        match ch {
            '(' => {
                depth += 1;
                out.push(ch);
            }
            ')' => {
                if depth > 0 {
                    depth -= 1;
                    out.push(ch);
                }
            }
            c => out.push(c),
        }
    }
    for _ in 0..depth {
        out.push(')');
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Open and close counts are equal and no prefix closes more than it opened.
pub fn is_balanced(s: &str) -> bool {
    let mut depth = 0i64;
    for ch in s.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
