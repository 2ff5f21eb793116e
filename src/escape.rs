//! Context-sensitive escaping.
//!
//! Each textual context of the format has an [`EscapeLevel`]. A character is
//! escaped at a level when it is registered at [`EscapeLevel::Low`] or
//! [`EscapeLevel::Middle`] and that level is not above the requested one, or
//! when it is registered at exactly the requested level. Control characters
//! use mnemonic letters (`\n`, `\r`, `\t`, `\f`); every other escaped
//! character is written as a backslash followed by the character itself.
//!
//! [`unescape`] is the exact inverse of [`escape`] at every level:
//!
//! ```rust
//! use bearml::escape::{escape, unescape, EscapeLevel};
//!
//! let raw = "path\\to: \"file\"\n";
//! let escaped = escape(raw, EscapeLevel::Key);
//! assert_eq!(escaped, "path\\\\to\\: \"file\"\\n");
//! assert_eq!(unescape(&escaped), raw);
//! ```

/// Escalation levels, ordered from the least to the most restrictive context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EscapeLevel {
    /// Control characters only
    Low,
    /// Control characters and the escape character
    Middle,
    High,
    /// Unquoted scalar in collapsed notation
    CollapsedBasic,
    /// Scalar inside a quoted collapsed token
    Quoted,
    /// Block header name
    BlockKey,
    /// Key name at the start of a key line
    Key,
}

pub const ESCAPE_CHAR: char = '\\';

/// Registered characters with the level they belong to.
const REGISTRY: &[(char, EscapeLevel)] = &[
    ('\n', EscapeLevel::Low),
    ('\r', EscapeLevel::Low),
    ('\t', EscapeLevel::Low),
    ('\u{c}', EscapeLevel::Low),
    ('\\', EscapeLevel::Middle),
    ('"', EscapeLevel::Quoted),
    (':', EscapeLevel::BlockKey),
    (':', EscapeLevel::Key),
    ('#', EscapeLevel::Key),
];

fn escaped_at(registered: EscapeLevel, level: EscapeLevel) -> bool {
    if registered <= EscapeLevel::Middle {
        registered <= level
    } else {
        registered == level
    }
}

/// Returns `true` when `ch` must be escaped at `level`.
#[must_use]
pub fn needs_escape(ch: char, level: EscapeLevel) -> bool {
    REGISTRY
        .iter()
        .any(|&(c, registered)| c == ch && escaped_at(registered, level))
}

/// Returns `true` when any character of `text` must be escaped at `level`.
#[must_use]
pub fn contains_escapable(text: &str, level: EscapeLevel) -> bool {
    text.chars().any(|ch| needs_escape(ch, level))
}

fn mnemonic(ch: char) -> Option<char> {
    match ch {
        '\n' => Some('n'),
        '\r' => Some('r'),
        '\t' => Some('t'),
        '\u{c}' => Some('f'),
        _ => None,
    }
}

fn from_mnemonic(ch: char) -> char {
    match ch {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'f' => '\u{c}',
        other => other,
    }
}

/// Escapes every character of `text` that is registered for `level`.
///
/// The escape character itself is escaped at every level, so that
/// [`unescape`] can invert the result.
#[must_use]
pub fn escape(text: &str, level: EscapeLevel) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == ESCAPE_CHAR || needs_escape(ch, level) {
            out.push(ESCAPE_CHAR);
            out.push(mnemonic(ch).unwrap_or(ch));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Reverses [`escape`] for any level.
///
/// A backslash always consumes the character after it. A trailing lone
/// backslash is kept as is.
#[must_use]
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != ESCAPE_CHAR {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next) => out.push(from_mnemonic(next)),
            None => out.push(ESCAPE_CHAR),
        }
    }
    out
}

/// Byte index of the first `target` in `text` that is not preceded by an
/// unescaped backslash.
#[must_use]
pub fn find_unescaped(text: &str, target: char) -> Option<usize> {
    let mut chars = text.char_indices();
    while let Some((idx, ch)) = chars.next() {
        if ch == ESCAPE_CHAR {
            chars.next();
        } else if ch == target {
            return Some(idx);
        }
    }
    None
}
