//! BearML Format Reference
//!
//! This module documents the BearML notation as implemented by this library
//! and defines the tokens the interpreter and the writer share.
//!
//! # Overview
//!
//! A BearML document is a sequence of key-value pairs followed by named
//! blocks. Blocks nest; their bodies are indented one unit (two spaces)
//! deeper than their headers. Every value has two notations: a *collapsed*
//! one that fits on the key line, and an *expanded* one spread over
//! indented lines below it.
//!
//! # Core Syntax
//!
//! ## Key-value pairs
//!
//! ```text
//! name: Alice
//! port: 8080
//! ```
//!
//! **Rules**:
//! - The first unescaped `:` separates the key from its value.
//! - The key line must not start with whitespace.
//! - Key names are trimmed; `:` and `#` inside a name are escaped (`a\:b`).
//! - Names are unique within one block.
//!
//! ## Comments and aliases
//!
//! Comment lines start with `#`. Comment lines directly above a key (or
//! block header) belong to it. A key may carry alternate lookup names in an
//! alias line placed right above the key line:
//!
//! ```text
//! # listening port
//! [p|@listen]
//! port: 8080
//! ```
//!
//! Alias names match `^@?[a-zA-Z_][a-zA-Z_0-9]*$`.
//!
//! ## Blocks
//!
//! ```text
//! title: demo
//!
//! >> server <<
//!   host: localhost
//!
//!   >> tls <<
//!     enabled: true
//! ```
//!
//! A block header is `>> name <<`. Its body is every following line that is
//! blank or indented by at least one unit. Nested block headers are only
//! legal inside another block.
//!
//! ## Values
//!
//! | Kind | Collapsed | Expanded |
//! |------|-----------|----------|
//! | Scalar | `key: text` | `key: @` + indented lines + end marker |
//! | List | `key:` + indented `["a", "b"]` | `key:` + indented `- a` lines |
//! | Dictionary | `key:` + indented `{"k": "v"}` | `key: $` + indented `k: v` lines |
//! | Empty | `null` inside brackets | `key:` with nothing below |
//!
//! Collapsed scalars escape control characters and backslashes. Inside a
//! collapsed list or dictionary every scalar is quoted and `"` is escaped.
//!
//! ```text
//! ports:
//!   ["80", "443"]
//! motd: @
//!   Welcome!
//!     (indented line kept verbatim)
//! |
//! limits: $
//!   cpu: 2
//!   memory:
//!     - 512
//!     - 1024
//! ```
//!
//! # Notation selection
//!
//! The writer picks the notation per element through
//! [`FormatPolicy`](crate::FormatPolicy). Some values force a notation:
//! blank scalars, scalars with surrounding whitespace and scalars equal to a
//! marker are always expanded; empty composites and dictionaries with blank
//! or padded keys are always collapsed.

pub const KEY_SEPARATOR: char = ':';
pub const COMMENT_MARKER: char = '#';

pub const BLOCK_OPEN: &str = ">>";
pub const BLOCK_CLOSE: &str = "<<";

pub const ALIAS_OPEN: char = '[';
pub const ALIAS_CLOSE: char = ']';
pub const ALIAS_SPLIT: char = '|';

pub const LITERAL_MARKER: &str = "@";
pub const LITERAL_END: &str = "|";
pub const EXPANDED_LIST_NODE: char = '-';
pub const EXPANDED_DICT_MARKER: &str = "$";

pub const LIST_OPEN: char = '[';
pub const LIST_CLOSE: char = ']';
pub const DICT_OPEN: char = '{';
pub const DICT_CLOSE: char = '}';
pub const QUOTE: char = '"';
pub const SPLIT: char = ',';
pub const NULL_TOKEN: &str = "null";

pub const INDENT: &str = "  ";
/// Width of [`INDENT`] in characters.
pub const INDENT_WIDTH: usize = INDENT.len();
