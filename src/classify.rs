//! Line classification.
//!
//! Stateless predicates over one raw line. The interpreter asks them in a
//! fixed priority order (key line, blank, comment, alias, block, nested
//! block) and never consumes input while asking.

use crate::escape::find_unescaped;
use crate::syntax::{
    ALIAS_CLOSE, ALIAS_OPEN, BLOCK_CLOSE, BLOCK_OPEN, COMMENT_MARKER, INDENT, INDENT_WIDTH,
    KEY_SEPARATOR,
};

#[must_use]
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// A comment may be indented; the marker is the first non-whitespace character.
#[must_use]
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with(COMMENT_MARKER)
}

#[must_use]
pub fn is_key_line(line: &str) -> bool {
    match line.chars().next() {
        Some(first) if !first.is_whitespace() => {
            !is_comment(line) && find_unescaped(line, KEY_SEPARATOR).is_some()
        }
        _ => false,
    }
}

#[must_use]
pub fn is_key_alias_line(line: &str) -> bool {
    line.starts_with(ALIAS_OPEN) && line.trim_end().ends_with(ALIAS_CLOSE)
}

#[must_use]
pub fn is_block_line(line: &str) -> bool {
    let trimmed = line.trim_end();
    !is_key_line(line)
        && trimmed.len() >= BLOCK_OPEN.len() + BLOCK_CLOSE.len()
        && trimmed.starts_with(BLOCK_OPEN)
        && trimmed.ends_with(BLOCK_CLOSE)
}

/// A block header indented by exactly one unit.
#[must_use]
pub fn is_nested_block_line(line: &str) -> bool {
    has_depth(line, 1) && line.len() > INDENT_WIDTH && is_block_line(&line[INDENT_WIDTH..])
}

/// Returns `true` when `line` starts with `depth` indent units.
#[must_use]
pub fn has_depth(line: &str, depth: usize) -> bool {
    let mut rest = line;
    for _ in 0..depth {
        match rest.strip_prefix(INDENT) {
            Some(stripped) => rest = stripped,
            None => return false,
        }
    }
    true
}

/// Prefixes every line with one indent unit, empty lines included.
///
/// Used for value bodies, where an empty line is content.
#[must_use]
pub fn indent_all(lines: &[String]) -> Vec<String> {
    lines.iter().map(|line| format!("{INDENT}{line}")).collect()
}

/// Prefixes every line that is not blank with one indent unit.
///
/// Used for block bodies, where blank lines separate entries and keep their
/// source text.
#[must_use]
pub fn indent_block(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| {
            if is_blank(&line) {
                line
            } else {
                format!("{INDENT}{line}")
            }
        })
        .collect()
}
