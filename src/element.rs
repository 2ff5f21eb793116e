//! Element model for BearML values.
//!
//! This module provides [`Element`], the closed set of value shapes a key can
//! hold, and [`ParseMode`], the two notations every element can be written
//! in.
//!
//! ## Core Types
//!
//! - [`Element::Scalar`]: one literal string, possibly spanning several lines
//! - [`Element::List`]: an ordered, heterogeneous sequence
//! - [`Element::Dictionary`]: an ordered map from scalar keys to elements
//! - [`Element::Empty`]: explicit absence, distinct from an empty string
//!
//! ## Notation
//!
//! [`Element::preferred_mode`] decides between collapsed and expanded
//! notation from the element's content and a [`FormatPolicy`].
//! [`Element::to_lines`] renders either notation:
//!
//! ```rust
//! use bearml::{element, FormatPolicy, ParseMode};
//!
//! let policy = FormatPolicy::default();
//! let list = element!(["x", null, ["y"]]);
//!
//! assert_eq!(
//!     list.to_lines(ParseMode::Collapse, &policy),
//!     vec!["[\"x\", null, [\"y\"]]"]
//! );
//! assert_eq!(
//!     list.to_lines(ParseMode::Expand, &policy),
//!     vec!["- x", "-", "-", "  - y"]
//! );
//! ```

use crate::escape::{contains_escapable, escape, EscapeLevel};
use crate::options::{FormatPolicy, PrintMode};
use crate::syntax::{
    DICT_CLOSE, DICT_OPEN, EXPANDED_DICT_MARKER, EXPANDED_LIST_NODE, KEY_SEPARATOR, LIST_CLOSE,
    LIST_OPEN, LITERAL_END, LITERAL_MARKER, NULL_TOKEN, QUOTE, SPLIT,
};
use crate::{classify, ElementMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The two textual notations of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    /// Single-line, bracket-delimited
    Collapse,
    /// Multi-line, indentation-based
    Expand,
}

/// A parsed BearML value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Element {
    #[default]
    Empty,
    Scalar(String),
    List(Vec<Element>),
    Dictionary(ElementMap),
}

impl Element {
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Element::Empty)
    }

    #[inline]
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Element::Scalar(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Element::List(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_dictionary(&self) -> bool {
        matches!(self, Element::Dictionary(_))
    }

    /// If the element is a scalar, returns its payload.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bearml::Element;
    ///
    /// assert_eq!(Element::from("hello").as_str(), Some("hello"));
    /// assert_eq!(Element::Empty.as_str(), None);
    /// ```
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Element::Scalar(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&Vec<Element>> {
        match self {
            Element::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_dictionary(&self) -> Option<&ElementMap> {
        match self {
            Element::Dictionary(map) => Some(map),
            _ => None,
        }
    }

    /// Name of the element kind, used in conversion errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Element::Empty => "empty",
            Element::Scalar(_) => "scalar",
            Element::List(_) => "list",
            Element::Dictionary(_) => "dictionary",
        }
    }

    /// Returns the notation this element should be written in.
    ///
    /// Content that only survives one notation decides on its own; otherwise
    /// the policy does.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bearml::{element, Element, FormatPolicy, ParseMode};
    ///
    /// let policy = FormatPolicy::compact();
    /// assert_eq!(Element::from(" padded").preferred_mode(&policy), ParseMode::Expand);
    /// let blank_key = element!({"": "x"});
    /// assert_eq!(blank_key.preferred_mode(&FormatPolicy::expanded()), ParseMode::Collapse);
    /// ```
    #[must_use]
    pub fn preferred_mode(&self, policy: &FormatPolicy) -> ParseMode {
        match self {
            Element::Empty => ParseMode::Expand,
            Element::Scalar(s) => {
                if !survives_collapse(s) {
                    return ParseMode::Expand;
                }
                match policy.print_mode {
                    PrintMode::Auto if contains_escapable(s, EscapeLevel::CollapsedBasic) => {
                        ParseMode::Expand
                    }
                    PrintMode::Auto | PrintMode::Compact => ParseMode::Collapse,
                    PrintMode::Expand => ParseMode::Expand,
                }
            }
            Element::List(items) => {
                if items.is_empty() {
                    return ParseMode::Collapse;
                }
                composite_mode(items.len(), policy)
            }
            Element::Dictionary(map) => {
                if map.is_empty() || map.keys().any(|key| !survives_collapse(key)) {
                    return ParseMode::Collapse;
                }
                composite_mode(map.len(), policy)
            }
        }
    }

    /// Renders the element in the given notation.
    ///
    /// Collapsed notation always yields exactly one line. Expanded notation
    /// yields the lines that go below (or after) the owning key, without the
    /// key's own indentation. An expanded scalar is its payload split on line
    /// breaks, without escaping.
    #[must_use]
    pub fn to_lines(&self, mode: ParseMode, policy: &FormatPolicy) -> Vec<String> {
        match mode {
            ParseMode::Collapse => vec![self.collapsed()],
            ParseMode::Expand => match self {
                Element::Empty => vec![String::new()],
                Element::Scalar(s) => s.split('\n').map(str::to_string).collect(),
                Element::List(items) => items
                    .iter()
                    .flat_map(|item| weld(EXPANDED_LIST_NODE.to_string(), item.value_lines(policy)))
                    .collect(),
                Element::Dictionary(map) => map
                    .iter()
                    .flat_map(|(key, value)| {
                        let head = format!("{}{KEY_SEPARATOR}", escape(key, EscapeLevel::Key));
                        weld(head, value.value_lines(policy))
                    })
                    .collect(),
            },
        }
    }

    /// Renders the element in its preferred notation.
    #[must_use]
    pub fn to_preferred_lines(&self, policy: &FormatPolicy) -> Vec<String> {
        self.to_lines(self.preferred_mode(policy), policy)
    }

    /// Lines of the element as the value of a key.
    ///
    /// The first line is the text that follows the key separator (empty when
    /// nothing follows it); the remaining lines are already indented one unit
    /// relative to the key.
    #[must_use]
    pub fn value_lines(&self, policy: &FormatPolicy) -> Vec<String> {
        let mode = self.preferred_mode(policy);
        match (self, mode) {
            (Element::Empty, _) => vec![String::new()],
            (Element::Scalar(_), ParseMode::Collapse) => vec![self.collapsed()],
            (Element::Scalar(_), ParseMode::Expand) => {
                let mut lines = vec![LITERAL_MARKER.to_string()];
                lines.extend(classify::indent_all(&self.to_lines(mode, policy)));
                lines.push(LITERAL_END.to_string());
                lines
            }
            (Element::Dictionary(_), ParseMode::Expand) => {
                let mut lines = vec![EXPANDED_DICT_MARKER.to_string()];
                lines.extend(classify::indent_all(&self.to_lines(mode, policy)));
                lines
            }
            (Element::List(_) | Element::Dictionary(_), _) => {
                let mut lines = vec![String::new()];
                lines.extend(classify::indent_all(&self.to_lines(mode, policy)));
                lines
            }
        }
    }

    fn collapsed(&self) -> String {
        match self {
            Element::Empty => NULL_TOKEN.to_string(),
            Element::Scalar(s) => escape(s, EscapeLevel::CollapsedBasic),
            Element::List(items) => {
                let parts: Vec<String> = items.iter().map(Element::collapsed_item).collect();
                format!("{LIST_OPEN}{}{LIST_CLOSE}", parts.join(&format!("{SPLIT} ")))
            }
            Element::Dictionary(map) => {
                let parts: Vec<String> = map
                    .iter()
                    .map(|(key, value)| {
                        format!("{}{KEY_SEPARATOR} {}", quoted(key), value.collapsed_item())
                    })
                    .collect();
                format!("{DICT_OPEN}{}{DICT_CLOSE}", parts.join(&format!("{SPLIT} ")))
            }
        }
    }

    /// Collapsed notation of an element nested in a collapsed composite.
    fn collapsed_item(&self) -> String {
        match self {
            Element::Scalar(s) => quoted(s),
            other => other.collapsed(),
        }
    }
}

fn quoted(text: &str) -> String {
    format!("{QUOTE}{}{QUOTE}", escape(text, EscapeLevel::Quoted))
}

/// Whether the text keeps its exact value when written unquoted on a line
/// that gets trimmed, and does not read as a marker.
fn survives_collapse(text: &str) -> bool {
    !(text.trim().is_empty()
        || text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
        || text == LITERAL_MARKER
        || text == EXPANDED_DICT_MARKER)
}

fn composite_mode(count: usize, policy: &FormatPolicy) -> ParseMode {
    match policy.print_mode {
        PrintMode::Auto if count > policy.max_elements => ParseMode::Collapse,
        PrintMode::Auto | PrintMode::Expand => ParseMode::Expand,
        PrintMode::Compact => ParseMode::Collapse,
    }
}

/// Joins a head (`-` or `key:`) with value lines produced by
/// [`Element::value_lines`].
pub(crate) fn weld(head: String, mut value: Vec<String>) -> Vec<String> {
    if value.is_empty() {
        return vec![head];
    }
    let first = value.remove(0);
    let mut lines = Vec::with_capacity(value.len() + 1);
    if first.is_empty() {
        lines.push(head);
    } else {
        lines.push(format!("{head} {first}"));
    }
    lines.extend(value);
    lines
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = FormatPolicy::default();
        write!(f, "{}", self.to_preferred_lines(&policy).join("\n"))
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::Scalar(value)
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::Scalar(value.to_string())
    }
}

impl From<Vec<Element>> for Element {
    fn from(value: Vec<Element>) -> Self {
        Element::List(value)
    }
}

impl From<ElementMap> for Element {
    fn from(value: ElementMap) -> Self {
        Element::Dictionary(value)
    }
}

impl<T: Into<Element>> From<Option<T>> for Element {
    fn from(value: Option<T>) -> Self {
        value.map_or(Element::Empty, Into::into)
    }
}

impl Serialize for Element {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Element::Empty => serializer.serialize_unit(),
            Element::Scalar(s) => serializer.serialize_str(s),
            Element::List(items) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Element::Dictionary(map) => {
                use serde::ser::SerializeMap;
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ElementVisitor;

        impl<'de> Visitor<'de> for ElementVisitor {
            type Value = Element;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any BearML value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Element::Scalar(value.to_string()))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Element::Scalar(value.to_string()))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(Element::Scalar(value.to_string()))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Element::Scalar(value.to_string()))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Element::Scalar(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Element::Scalar(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Element::Empty)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Element::Empty)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Element::List(items))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut entries = ElementMap::new();
                while let Some((key, value)) = map.next_entry::<String, Element>()? {
                    entries.insert(key, value);
                }
                Ok(Element::Dictionary(entries))
            }
        }

        deserializer.deserialize_any(ElementVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(s: &str) -> Element {
        Element::from(s)
    }

    #[test]
    fn test_scalar_forced_expand() {
        let policy = FormatPolicy::compact();
        for text in ["", "   ", " a", "a ", "\ta", "@", "$"] {
            assert_eq!(scalar(text).preferred_mode(&policy), ParseMode::Expand, "{text:?}");
        }
    }

    #[test]
    fn test_scalar_auto_mode() {
        let policy = FormatPolicy::default();
        assert_eq!(scalar("plain").preferred_mode(&policy), ParseMode::Collapse);
        assert_eq!(scalar("a\nb").preferred_mode(&policy), ParseMode::Expand);
        assert_eq!(scalar("a\\b").preferred_mode(&policy), ParseMode::Expand);
        assert_eq!(scalar("a: #b").preferred_mode(&policy), ParseMode::Collapse);
    }

    #[test]
    fn test_composite_threshold() {
        let list = Element::List(vec![scalar("x"), scalar("y"), scalar("z")]);
        let policy = FormatPolicy::default().with_max_elements(2);
        assert_eq!(list.preferred_mode(&policy), ParseMode::Collapse);
        let policy = FormatPolicy::default().with_max_elements(3);
        assert_eq!(list.preferred_mode(&policy), ParseMode::Expand);
    }

    #[test]
    fn test_empty_composites_collapse() {
        let policy = FormatPolicy::expanded();
        assert_eq!(Element::List(vec![]).preferred_mode(&policy), ParseMode::Collapse);
        assert_eq!(
            Element::Dictionary(ElementMap::new()).preferred_mode(&policy),
            ParseMode::Collapse
        );
    }

    #[test]
    fn test_dictionary_padded_key_collapses() {
        let policy = FormatPolicy::expanded();
        for key in ["", " k", "k "] {
            let mut map = ElementMap::new();
            map.insert(key.to_string(), scalar("v"));
            assert_eq!(
                Element::Dictionary(map).preferred_mode(&policy),
                ParseMode::Collapse,
                "{key:?}"
            );
        }
    }

    #[test]
    fn test_collapsed_rendering() {
        let mut map = ElementMap::new();
        map.insert("k\"q".to_string(), scalar("v"));
        map.insert("n".to_string(), Element::Empty);
        let list = Element::List(vec![scalar("a\"b"), Element::Dictionary(map)]);
        assert_eq!(
            list.to_lines(ParseMode::Collapse, &FormatPolicy::default()),
            vec!["[\"a\\\"b\", {\"k\\\"q\": \"v\", \"n\": null}]"]
        );
    }

    #[test]
    fn test_value_lines_per_kind() {
        let policy = FormatPolicy::default();
        assert_eq!(scalar("x").value_lines(&policy), vec!["x"]);
        assert_eq!(Element::Empty.value_lines(&policy), vec![""]);
        assert_eq!(
            scalar("a\n\nb").value_lines(&policy),
            vec!["@", "  a", "  ", "  b", "|"]
        );

        let mut map = ElementMap::new();
        map.insert("k".to_string(), scalar("v"));
        assert_eq!(
            Element::Dictionary(map.clone()).value_lines(&policy),
            vec!["$", "  k: v"]
        );
        assert_eq!(
            Element::Dictionary(map).value_lines(&FormatPolicy::compact()),
            vec!["", "  {\"k\": \"v\"}"]
        );
        assert_eq!(
            Element::List(vec![scalar("v")]).value_lines(&policy),
            vec!["", "  - v"]
        );
    }

    #[test]
    fn test_expanded_nesting() {
        let mut inner = ElementMap::new();
        inner.insert("a:b".to_string(), Element::List(vec![scalar("1")]));
        let list = Element::List(vec![Element::Dictionary(inner), scalar("@")]);
        assert_eq!(
            list.to_lines(ParseMode::Expand, &FormatPolicy::default()),
            vec!["- $", "  a\\:b:", "    - 1", "- @", "  @", "|"]
        );
    }

    #[test]
    fn test_weld() {
        assert_eq!(weld("-".to_string(), vec!["x".to_string()]), vec!["- x"]);
        assert_eq!(
            weld("k:".to_string(), vec![String::new(), "  - y".to_string()]),
            vec!["k:", "  - y"]
        );
    }
}
