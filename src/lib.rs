//! # bearml
//!
//! A round-trip parser, document model and writer for BearML, a small
//! indentation-based markup for configuration files.
//!
//! ## What is BearML?
//!
//! A BearML document is a sequence of `key: value` lines and named blocks.
//! Values are scalars, lists or dictionaries, written either collapsed on one
//! line (`["a", "b"]`, `{"k": "v"}`) or expanded over several indented lines.
//! Keys can carry `#` comments and an alias line (`[short|other]`).
//!
//! ```text
//! # where to listen
//! [p]
//! port: 8080
//!
//! >> limits <<
//!   hosts:
//!     - alpha
//!     - beta
//!   motd: @
//!     first line
//!     second line
//!   |
//! ```
//!
//! ## Key Features
//!
//! - **Round-trip editing**: untouched lines are written back byte for byte;
//!   only what changed is regenerated
//! - **Serde compatible**: read and write any `Serialize`/`Deserialize` type
//!   as a value
//! - **Precise errors**: malformed text reports its line, character offset
//!   and a caret excerpt
//! - **No unsafe code**
//!
//! ## Quick Start
//!
//! ```rust
//! use bearml::Document;
//!
//! let mut doc = Document::parse("a: 1\n\n>> b <<\n  c: 2\n").unwrap();
//! assert_eq!(doc.get_value::<i32>(&["b"], "c").unwrap(), 2);
//!
//! doc.add_key_value(&["b"], "d", &[1, 2]).unwrap();
//! assert_eq!(
//!     doc.to_string(),
//!     "a: 1\n\n>> b <<\n  c: 2\n\n  d:\n    - 1\n    - 2\n"
//! );
//! ```
//!
//! ### Values without a document
//!
//! ```rust
//! use bearml::{from_str, to_string};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Point { x: i32, y: i32 }
//!
//! let text = to_string(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(text, "$\n  x: 1\n  y: 2");
//! assert_eq!(from_str::<Point>(&text).unwrap(), Point { x: 1, y: 2 });
//! ```

mod block;
pub mod classify;
mod collapsed;
mod de;
mod document;
mod element;
mod error;
pub mod escape;
mod interpret;
mod key;
mod macros;
mod map;
mod options;
mod ser;
mod store;
pub mod syntax;
mod writer;

pub use block::{Block, LineCache, TaggedLine};
pub use de::{from_element, ElementDeserializer};
pub use document::Document;
pub use element::{Element, ParseMode};
pub use error::{Error, ParseError, Result};
pub use key::{is_valid_alias, BlockKey, Key};
pub use map::ElementMap;
pub use options::{FormatPolicy, PrintMode, DEFAULT_MAX_ELEMENTS};
pub use ser::{to_element, ElementSerializer};
pub use store::{split_lines, FileStore, LineSink, LineSource, MemoryStore};

use crate::classify::is_blank;
use crate::interpret::{interpret_value, LineView};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

/// Serialize any `T: Serialize` to the text of a value.
///
/// The first line is what would follow `key:`; the others are indented one
/// unit, as below a key at the root.
///
/// # Examples
///
/// ```rust
/// use bearml::to_string;
///
/// assert_eq!(to_string(&42).unwrap(), "42");
/// assert_eq!(to_string(&vec!["a", "b"]).unwrap(), "\n  - a\n  - b");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented as an element.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_policy(value, &FormatPolicy::default())
}

/// Serialize any `T: Serialize` with a custom [`FormatPolicy`].
///
/// # Examples
///
/// ```rust
/// use bearml::{to_string_with_policy, FormatPolicy};
///
/// let text = to_string_with_policy(&vec![1, 2], &FormatPolicy::compact()).unwrap();
/// assert_eq!(text, "\n  [\"1\", \"2\"]");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented as an element.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_policy<T>(value: &T, policy: &FormatPolicy) -> Result<String>
where
    T: ?Sized + Serialize,
{
    Ok(element_to_string(&to_element(value)?, policy))
}

/// The text of an element as the value of a key.
#[must_use]
pub fn element_to_string(element: &Element, policy: &FormatPolicy) -> String {
    element.value_lines(policy).join("\n")
}

/// The element in its preferred notation on its own, without a key.
///
/// # Examples
///
/// ```rust
/// use bearml::{element, visualize, FormatPolicy};
///
/// let policy = FormatPolicy::compact();
/// assert_eq!(visualize(&element!(["x", null]), &policy), "[\"x\", null]");
/// ```
#[must_use]
pub fn visualize(element: &Element, policy: &FormatPolicy) -> String {
    element.to_preferred_lines(policy).join("\n")
}

/// Parse the text of a value, as produced by [`to_string`].
///
/// Empty text is [`Element::Empty`].
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] if the text is not a value, or if
/// non-blank lines follow the value.
pub fn parse_element(text: &str) -> Result<Element> {
    let lines = split_lines(text);
    let Some((first, rest)) = lines.split_first() else {
        return Ok(Element::Empty);
    };
    let (element, used) = interpret_value(first, LineView::new(rest))
        .map_err(|err| Error::invalid_format(err, &lines))?;
    trace!(lines = lines.len(), used, "parsed standalone value");

    if let Some(stray) = (used + 1..lines.len()).find(|&i| !is_blank(&lines[i])) {
        let err = ParseError::new(stray, 0, "Invalid line.");
        return Err(Error::invalid_format(err, &lines));
    }
    Ok(element)
}

/// Deserialize an instance of type `T` from the text of a value.
///
/// # Examples
///
/// ```rust
/// use bearml::from_str;
///
/// let hosts: Vec<String> = from_str("\n  - alpha\n  - beta").unwrap();
/// assert_eq!(hosts, ["alpha", "beta"]);
///
/// let ports: Vec<u16> = from_str("\n  [\"80\", \"443\"]").unwrap();
/// assert_eq!(ports, [80, 443]);
/// ```
///
/// # Errors
///
/// Returns an error if the text is not a value or the value does not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let element = parse_element(s)?;
    from_element(&element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
        note: Option<String>,
    }

    fn user() -> User {
        User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["admin".to_string(), "user".to_string()],
            note: None,
        }
    }

    #[test]
    fn test_serialize_deserialize_point() {
        let point = Point { x: 1, y: 2 };
        let text = to_string(&point).unwrap();
        let point_back: Point = from_str(&text).unwrap();
        assert_eq!(point, point_back);
    }

    #[test]
    fn test_serialize_deserialize_user() {
        let text = to_string(&user()).unwrap();
        let user_back: User = from_str(&text).unwrap();
        assert_eq!(user(), user_back);
    }

    #[test]
    fn test_compact_policy_round_trip() {
        let text = to_string_with_policy(&user(), &FormatPolicy::compact()).unwrap();
        assert_eq!(text.lines().count(), 2);
        let user_back: User = from_str(&text).unwrap();
        assert_eq!(user(), user_back);
    }

    #[test]
    fn test_multi_line_scalar() {
        let text = to_string("one\ntwo").unwrap();
        assert_eq!(text, "@\n  one\n  two\n|");
        assert_eq!(from_str::<String>(&text).unwrap(), "one\ntwo");
    }

    #[test]
    fn test_arrays_and_maps() {
        let numbers = vec![1, 2, 3, 4, 5];
        let text = to_string(&numbers).unwrap();
        let numbers_back: Vec<i32> = from_str(&text).unwrap();
        assert_eq!(numbers, numbers_back);

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), vec![1]);
        map.insert("b".to_string(), vec![]);
        let text = to_string(&map).unwrap();
        let map_back: BTreeMap<String, Vec<i32>> = from_str(&text).unwrap();
        assert_eq!(map, map_back);
    }

    #[test]
    fn test_empty_text_is_empty_element() {
        assert_eq!(parse_element("").unwrap(), Element::Empty);
        assert_eq!(from_str::<Option<i32>>("").unwrap(), None);
    }

    #[test]
    fn test_trailing_content_is_rejected() {
        let err = parse_element("1\n\nstray").unwrap_err();
        match err {
            Error::InvalidFormat { line, column, .. } => {
                assert_eq!((line, column), (2, 0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collapsed_error_position() {
        let err = parse_element("\n  [1, 2").unwrap_err();
        match err {
            Error::InvalidFormat { line, column, .. } => {
                assert_eq!((line, column), (1, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
