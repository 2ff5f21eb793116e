//! Error types for BearML parsing, document editing and value conversion.
//!
//! ## Error Categories
//!
//! - **Format errors**: malformed document text, reported with the line, the
//!   character offset and a windowed excerpt of the offending line
//! - **Lookup errors**: a key, alias or block path that does not exist
//! - **Uniqueness errors**: adding or renaming into a name that is taken
//! - **Conversion errors**: an [`Element`](crate::Element) that does not fit
//!   the requested Rust type
//! - **I/O errors**: failures of the backing line source or sink
//!
//! The interpreter never builds an [`Error`] directly. It returns a
//! [`ParseError`] carrying offsets relative to the slice it was given, and
//! every caller shifts those offsets into its own coordinates before passing
//! the failure on. Only the entry points turn the final [`ParseError`] into
//! [`Error::InvalidFormat`].
//!
//! ## Examples
//!
//! ```rust
//! use bearml::{Document, Error};
//!
//! let err = Document::parse("a: 1\n  stray").unwrap_err();
//! match err {
//!     Error::InvalidFormat { line, column, .. } => {
//!         assert_eq!(line, 1);
//!         assert_eq!(column, 0);
//!     }
//!     other => panic!("unexpected error: {other}"),
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by this crate.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while reading or writing lines
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed document text
    #[error("Invalid format.\n{excerpt}")]
    InvalidFormat {
        line: usize,
        column: usize,
        message: String,
        excerpt: String,
    },

    /// No key or alias with this name in the addressed block
    #[error("Cannot find key or key alias '{0}'.")]
    KeyNotFound(String),

    /// No block at this path
    #[error("Cannot find block '{0}'.")]
    BlockNotFound(String),

    /// A key with this name already exists in the addressed block
    #[error("Key name '{0}' is not unique.")]
    DuplicateKey(String),

    /// A block with this name already exists next to the addressed block
    #[error("Block name '{0}' is not unique.")]
    DuplicateBlock(String),

    /// A key or block name that is empty or whitespace
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// An alias that does not match `^@?[a-zA-Z_][a-zA-Z_0-9]*$`
    #[error("Invalid key alias '{0}'.")]
    InvalidAlias(String),

    /// A block path that cannot address the requested item
    #[error("Invalid block path: {0}")]
    InvalidPath(String),

    /// Element kind or literal does not fit the requested type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Unsupported type for conversion
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A struct field with no matching dictionary key
    #[error("Field '{0}' not found.")]
    FieldNotFound(String),

    /// Dictionary keys and struct fields differ in number
    #[error("Fields and keys are inconsistent: expected {expected}, found {found}")]
    FieldCountMismatch { expected: usize, found: usize },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Renders a [`ParseError`] against the lines it refers to.
    ///
    /// `lines` are the lines the error offsets are relative to; a line index
    /// past the end renders an empty excerpt.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bearml::{Error, ParseError};
    ///
    /// let lines = vec!["[1, 2".to_string()];
    /// let err = Error::invalid_format(ParseError::new(0, 0, "Bracket not closed."), &lines);
    /// assert!(err.to_string().contains("Line 1  Character num 1:"));
    /// ```
    #[must_use]
    pub fn invalid_format(err: ParseError, lines: &[String]) -> Self {
        let source = lines.get(err.line).map(String::as_str).unwrap_or("");
        let excerpt = err.visualize(source);
        Error::InvalidFormat {
            line: err.line,
            column: err.column,
            message: err.message,
            excerpt,
        }
    }

    /// Creates a type mismatch error when conversion fails due to incompatible types.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bearml::Error;
    ///
    /// let err = Error::type_mismatch("integer", "list");
    /// assert!(err.to_string().contains("expected integer"));
    /// ```
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn key_not_found(key: &str) -> Self {
        Error::KeyNotFound(key.to_string())
    }

    pub fn block_not_found(name: &str) -> Self {
        Error::BlockNotFound(name.to_string())
    }

    pub fn invalid_name(msg: &str) -> Self {
        Error::InvalidName(msg.to_string())
    }

    /// Creates an unsupported type error for types that cannot become an element.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bearml::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for line source and sink failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A format failure located relative to the lines being interpreted.
///
/// `line` and `column` are 0-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Characters shown before the caret once the column is past the window.
const EXCERPT_BEFORE: usize = 12;
/// Columns that fit before the window starts to scroll.
const EXCERPT_WINDOW: usize = 15;
/// Characters shown after the caret before eliding the rest.
const EXCERPT_AFTER: usize = 17;

impl ParseError {
    #[must_use]
    pub fn new(line: usize, column: usize, message: &str) -> Self {
        ParseError {
            line,
            column,
            message: message.to_string(),
        }
    }

    /// Shifts the location by the prefix a caller consumed before delegating.
    #[must_use]
    pub fn offset(self, lines: usize, columns: usize) -> Self {
        ParseError {
            line: self.line + lines,
            column: self.column + columns,
            message: self.message,
        }
    }

    /// Formats the header, the excerpt of `source` around the column, a caret
    /// under the failing character, and the message.
    #[must_use]
    pub fn visualize(&self, source: &str) -> String {
        let chars: Vec<char> = source.chars().collect();
        let mut out = format!(
            "Line {}  Character num {}:\n",
            self.line + 1,
            self.column + 1
        );

        let caret = if self.column <= EXCERPT_WINDOW {
            let end = (self.column + 1).min(chars.len());
            out.extend(&chars[..end]);
            self.column
        } else {
            let start = (self.column - EXCERPT_BEFORE).min(chars.len());
            let end = (self.column + 1).min(chars.len());
            out.push_str("...");
            out.extend(&chars[start..end]);
            EXCERPT_WINDOW
        };

        if chars.len() > self.column + 1 {
            let rest = &chars[self.column + 1..];
            if rest.len() < EXCERPT_AFTER + 3 {
                out.extend(rest);
            } else {
                out.extend(&rest[..EXCERPT_AFTER]);
                out.push_str("...");
            }
        }

        out.push('\n');
        out.push_str(&" ".repeat(caret));
        out.push_str("^ ");
        out.push_str(&self.message);
        out
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, character {}: {}",
            self.line + 1,
            self.column + 1,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_accumulates() {
        let err = ParseError::new(1, 3, "Unknown character.")
            .offset(2, 0)
            .offset(0, 4);
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 7);
    }

    #[test]
    fn test_visualize_short_line() {
        let err = ParseError::new(0, 0, "Bracket not closed.");
        let text = err.visualize("[1, 2");
        assert_eq!(text, "Line 1  Character num 1:\n[1, 2\n^ Bracket not closed.");
    }

    #[test]
    fn test_visualize_scrolls_long_line() {
        let source = "abcdefghijklmnopqrstuvwxyz0123456789abcdefghij";
        let err = ParseError::new(4, 20, "Unknown character.");
        let text = err.visualize(source);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Line 5  Character num 21:");
        assert!(lines[1].starts_with("...ijklmnopqrstu"));
        assert!(lines[1].ends_with("..."));
        assert_eq!(lines[2], format!("{}^ Unknown character.", " ".repeat(15)));
    }

    #[test]
    fn test_visualize_column_past_end() {
        let err = ParseError::new(0, 9, "Missing value.");
        let text = err.visualize("{a:");
        assert!(text.contains("{a:\n"));
        assert!(text.ends_with("^ Missing value."));
    }

    #[test]
    fn test_invalid_format_uses_source_line() {
        let lines = vec!["ok: 1".to_string(), "  bad".to_string()];
        let err = Error::invalid_format(ParseError::new(1, 0, "Invalid line."), &lines);
        match err {
            Error::InvalidFormat {
                line,
                column,
                message,
                excerpt,
            } => {
                assert_eq!((line, column), (1, 0));
                assert_eq!(message, "Invalid line.");
                assert!(excerpt.contains("  bad"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
