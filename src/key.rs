//! Keys and block keys.
//!
//! A [`Key`] names one entry of a block and carries optional aliases and an
//! optional comment. A [`BlockKey`] names a nested block and carries an
//! optional comment. Both compare and hash by name only, so metadata can
//! change without disturbing map lookups:
//!
//! ```rust
//! use bearml::Key;
//!
//! let plain = Key::new("port").unwrap();
//! let annotated = Key::new("port")
//!     .unwrap()
//!     .with_comment(Some("listening port".to_string()))
//!     .with_aliases(vec!["p".to_string()])
//!     .unwrap();
//! assert_eq!(plain, annotated);
//! assert_eq!(annotated.to_lines(), vec!["#listening port", "[p]", "port"]);
//! ```

use crate::error::{Error, Result};
use crate::escape::{escape, EscapeLevel};
use crate::syntax::{ALIAS_CLOSE, ALIAS_OPEN, ALIAS_SPLIT, BLOCK_CLOSE, BLOCK_OPEN, COMMENT_MARKER};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

static ALIAS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@?[a-zA-Z_][a-zA-Z_0-9]*$").unwrap());

/// Returns whether `alias` is a legal alias name.
#[must_use]
pub fn is_valid_alias(alias: &str) -> bool {
    ALIAS_PATTERN.is_match(alias)
}

fn checked_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_name("name cannot be empty or white space"));
    }
    Ok(trimmed.to_string())
}

fn comment_lines(comment: Option<&str>) -> impl Iterator<Item = String> + '_ {
    comment
        .into_iter()
        .flat_map(|text| text.split('\n'))
        .map(|line| format!("{COMMENT_MARKER}{line}"))
}

/// The name of an entry, with its aliases and comment.
#[derive(Clone, Debug)]
pub struct Key {
    name: String,
    aliases: Vec<String>,
    comment: Option<String>,
}

impl Key {
    /// Creates a key. The name is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the name is empty or white space.
    pub fn new(name: &str) -> Result<Self> {
        Ok(Key {
            name: checked_name(name)?,
            aliases: Vec::new(),
            comment: None,
        })
    }

    /// Replaces the aliases.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlias`] for the first alias that does not match
    /// `^@?[a-zA-Z_][a-zA-Z_0-9]*$`.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Result<Self> {
        for alias in &aliases {
            if !is_valid_alias(alias) {
                return Err(Error::InvalidAlias(alias.clone()));
            }
        }
        self.aliases = aliases;
        Ok(self)
    }

    #[must_use]
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// Same metadata under another name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the name is empty or white space.
    pub fn renamed(&self, name: &str) -> Result<Self> {
        Ok(Key {
            name: checked_name(name)?,
            aliases: self.aliases.clone(),
            comment: self.comment.clone(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns `true` if `name` is this key's name or one of its aliases.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }

    /// Lines of the key part of a key line: comments, the alias line and the
    /// escaped name (without the separator).
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = comment_lines(self.comment()).collect();
        if !self.aliases.is_empty() {
            lines.push(format!(
                "{ALIAS_OPEN}{}{ALIAS_CLOSE}",
                self.aliases.join(&ALIAS_SPLIT.to_string())
            ));
        }
        lines.push(escape(&self.name, EscapeLevel::Key));
        lines
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.name
    }
}

/// The name of a nested block, with its comment.
#[derive(Clone, Debug)]
pub struct BlockKey {
    name: String,
    comment: Option<String>,
}

impl BlockKey {
    /// Creates a block key. The name is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the name is empty or white space.
    pub fn new(name: &str) -> Result<Self> {
        Ok(BlockKey {
            name: checked_name(name)?,
            comment: None,
        })
    }

    #[must_use]
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// Same comment under another name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the name is empty or white space.
    pub fn renamed(&self, name: &str) -> Result<Self> {
        Ok(BlockKey {
            name: checked_name(name)?,
            comment: self.comment.clone(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Comment lines followed by the block header.
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = comment_lines(self.comment()).collect();
        lines.push(format!(
            "{BLOCK_OPEN} {} {BLOCK_CLOSE}",
            escape(&self.name, EscapeLevel::BlockKey)
        ));
        lines
    }
}

impl PartialEq for BlockKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for BlockKey {}

impl Hash for BlockKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Borrow<str> for BlockKey {
    fn borrow(&self) -> &str {
        &self.name
    }
}
