//! Ordered map type for dictionary elements.
//!
//! [`ElementMap`] wraps [`IndexMap`] so dictionary entries keep the order in
//! which they were written or inserted. Both notations of a dictionary list
//! entries in that order, so a document rewritten from its model keeps the
//! entry order of its source.
//!
//! ## Examples
//!
//! ```rust
//! use bearml::{Element, ElementMap};
//!
//! let mut map = ElementMap::new();
//! map.insert("name".to_string(), Element::from("Alice"));
//! map.insert("role".to_string(), Element::from("admin"));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::Element;
use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered map of scalar keys to elements.
///
/// # Examples
///
/// ```rust
/// use bearml::{Element, ElementMap};
///
/// let mut map = ElementMap::new();
/// map.insert("first".to_string(), Element::from("1"));
/// map.insert("second".to_string(), Element::from("2"));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementMap(IndexMap<String, Element>);

impl ElementMap {
    #[must_use]
    pub fn new() -> Self {
        ElementMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ElementMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned and
    /// the entry keeps its position.
    pub fn insert(&mut self, key: String, value: Element) -> Option<Element> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Element> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Element> {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Element> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Element> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, Element> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Element> {
        self.0.iter()
    }
}

impl From<HashMap<String, Element>> for ElementMap {
    fn from(map: HashMap<String, Element>) -> Self {
        ElementMap(map.into_iter().collect())
    }
}

impl IntoIterator for ElementMap {
    type Item = (String, Element);
    type IntoIter = indexmap::map::IntoIter<String, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ElementMap {
    type Item = (&'a String, &'a Element);
    type IntoIter = indexmap::map::Iter<'a, String, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Element)> for ElementMap {
    fn from_iter<T: IntoIterator<Item = (String, Element)>>(iter: T) -> Self {
        ElementMap(IndexMap::from_iter(iter))
    }
}
