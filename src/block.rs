//! Block model and its tagged-line cache.
//!
//! A [`Block`] owns its key-value pairs, its nested blocks, and a list of
//! [`TaggedLine`]s. The tagged lines record, per logical unit of the source
//! text (blank line, comment, key-value pair, nested block), the literal lines
//! it came from. The writer replays those lines for units that did not
//! change and regenerates the others.
//!
//! Every mutation here keeps the cache honest: metadata and value changes
//! mark only the affected half of one tag as [`LineCache::Stale`];
//! structural changes (insert, remove, clear) set the block's clear-parse
//! flag so the whole block is regenerated. Blocks hold no parent pointers;
//! invalidating the cached rendering of a nested block in its ancestors is
//! driven from the root with an explicit path ([`Block::invalidate_path`]).
//!
//! All lines stored in a block's tags are relative to that block: the
//! indentation of the block itself is stripped, while the body of a nested
//! block keeps the one indent unit it has below its header. Whitespace-only
//! lines are the exception: they keep their source text as is.

use crate::error::{Error, Result};
use crate::key::{BlockKey, Key};
use crate::Element;
use indexmap::IndexMap;
use tracing::trace;

/// Cached source lines of one half of a tagged unit.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum LineCache {
    /// Lines exactly as they appeared in the source
    Cached(Vec<String>),
    /// Must be regenerated from the model
    #[default]
    Stale,
}

impl LineCache {
    #[must_use]
    pub fn lines(&self) -> Option<&[String]> {
        match self {
            LineCache::Cached(lines) => Some(lines),
            LineCache::Stale => None,
        }
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, LineCache::Stale)
    }
}

/// One logical unit of a block's source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaggedLine {
    Blank(String),
    Comment(String),
    KeyValue {
        /// Name of the key in [`Block::key_values`]
        name: String,
        key_lines: LineCache,
        value_lines: LineCache,
    },
    Block {
        /// Name of the block in [`Block::blocks`]
        name: String,
        key_lines: LineCache,
        value_lines: LineCache,
    },
}

impl TaggedLine {
    /// A key-value tag with nothing cached.
    #[must_use]
    pub fn fresh_key_value(name: &str) -> Self {
        TaggedLine::KeyValue {
            name: name.to_string(),
            key_lines: LineCache::Stale,
            value_lines: LineCache::Stale,
        }
    }

    /// A block tag with nothing cached.
    #[must_use]
    pub fn fresh_block(name: &str) -> Self {
        TaggedLine::Block {
            name: name.to_string(),
            key_lines: LineCache::Stale,
            value_lines: LineCache::Stale,
        }
    }

    /// The same tag with its key half marked stale.
    #[must_use]
    pub fn with_stale_key(self) -> Self {
        match self {
            TaggedLine::KeyValue {
                name, value_lines, ..
            } => TaggedLine::KeyValue {
                name,
                key_lines: LineCache::Stale,
                value_lines,
            },
            TaggedLine::Block {
                name, value_lines, ..
            } => TaggedLine::Block {
                name,
                key_lines: LineCache::Stale,
                value_lines,
            },
            other => other,
        }
    }

    /// The same tag with its value half marked stale.
    #[must_use]
    pub fn with_stale_value(self) -> Self {
        match self {
            TaggedLine::KeyValue {
                name, key_lines, ..
            } => TaggedLine::KeyValue {
                name,
                key_lines,
                value_lines: LineCache::Stale,
            },
            TaggedLine::Block {
                name, key_lines, ..
            } => TaggedLine::Block {
                name,
                key_lines,
                value_lines: LineCache::Stale,
            },
            other => other,
        }
    }

    /// The same tag pointing at a renamed entry.
    #[must_use]
    fn renamed(self, new_name: &str) -> Self {
        match self {
            TaggedLine::KeyValue {
                key_lines,
                value_lines,
                ..
            } => TaggedLine::KeyValue {
                name: new_name.to_string(),
                key_lines,
                value_lines,
            },
            TaggedLine::Block {
                key_lines,
                value_lines,
                ..
            } => TaggedLine::Block {
                name: new_name.to_string(),
                key_lines,
                value_lines,
            },
            other => other,
        }
    }

    fn is_key_value(&self, key: &str) -> bool {
        matches!(self, TaggedLine::KeyValue { name, .. } if name == key)
    }

    fn is_block(&self, block: &str) -> bool {
        matches!(self, TaggedLine::Block { name, .. } if name == block)
    }
}

/// A document root or nested block.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub(crate) key_values: IndexMap<Key, Element>,
    pub(crate) blocks: IndexMap<BlockKey, Block>,
    pub(crate) tagged_lines: Vec<TaggedLine>,
    pub(crate) clear_parse: bool,
}

impl Block {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn key_values(&self) -> &IndexMap<Key, Element> {
        &self.key_values
    }

    #[must_use]
    pub fn blocks(&self) -> &IndexMap<BlockKey, Block> {
        &self.blocks
    }

    #[must_use]
    pub fn tagged_lines(&self) -> &[TaggedLine] {
        &self.tagged_lines
    }

    /// Whether the next write regenerates this block from the model.
    #[must_use]
    pub fn is_clear_parse(&self) -> bool {
        self.clear_parse
    }

    /// Forces (or stops forcing) full regeneration of this block.
    pub fn set_clear_parse(&mut self, clear: bool) {
        self.clear_parse = clear;
    }

    /// Looks up an entry by key name or alias.
    #[must_use]
    pub fn find_key(&self, name_or_alias: &str) -> Option<(&Key, &Element)> {
        self.key_values
            .get_key_value(name_or_alias)
            .or_else(|| {
                self.key_values
                    .iter()
                    .find(|(key, _)| key.answers_to(name_or_alias))
            })
    }

    /// Like [`Block::find_key`], failing with [`Error::KeyNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if neither a name nor an alias matches.
    pub fn resolve_key(&self, name_or_alias: &str) -> Result<&Key> {
        self.find_key(name_or_alias)
            .map(|(key, _)| key)
            .ok_or_else(|| Error::key_not_found(name_or_alias))
    }

    #[must_use]
    pub fn get(&self, name_or_alias: &str) -> Option<&Element> {
        self.find_key(name_or_alias).map(|(_, element)| element)
    }

    #[must_use]
    pub fn get_block(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    /// Follows `path` from this block; the empty path is this block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] naming the first missing segment.
    pub fn block_at(&self, path: &[&str]) -> Result<&Block> {
        path.iter().try_fold(self, |block, name| {
            block.blocks.get(*name).ok_or_else(|| Error::block_not_found(name))
        })
    }

    /// Mutable variant of [`Block::block_at`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] naming the first missing segment.
    pub fn block_at_mut(&mut self, path: &[&str]) -> Result<&mut Block> {
        let mut block = self;
        for name in path {
            block = block
                .blocks
                .get_mut(*name)
                .ok_or_else(|| Error::block_not_found(name))?;
        }
        Ok(block)
    }

    /// Appends a key-value pair. Sets the clear-parse flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if the name is taken; nothing changes.
    pub fn insert(&mut self, key: Key, element: Element) -> Result<()> {
        if self.key_values.contains_key(key.name()) {
            return Err(Error::DuplicateKey(key.name().to_string()));
        }
        self.tagged_lines.push(TaggedLine::fresh_key_value(key.name()));
        self.key_values.insert(key, element);
        self.clear_parse = true;
        Ok(())
    }

    /// Appends a nested block. Sets the clear-parse flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBlock`] if the name is taken; nothing changes.
    pub fn insert_block(&mut self, key: BlockKey, block: Block) -> Result<()> {
        if self.blocks.contains_key(key.name()) {
            return Err(Error::DuplicateBlock(key.name().to_string()));
        }
        self.tagged_lines.push(TaggedLine::fresh_block(key.name()));
        self.blocks.insert(key, block);
        self.clear_parse = true;
        Ok(())
    }

    /// Replaces the value of an existing key; only its value lines go stale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if `name` is not a key name.
    pub fn set_value(&mut self, name: &str, element: Element) -> Result<()> {
        let slot = self
            .key_values
            .get_mut(name)
            .ok_or_else(|| Error::key_not_found(name))?;
        *slot = element;
        self.update_tag(|tag| tag.is_key_value(name), TaggedLine::with_stale_value);
        Ok(())
    }

    /// Swaps the metadata (and possibly the name) of an existing key,
    /// keeping its position. Only its key lines go stale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if `name` is not a key name and
    /// [`Error::DuplicateKey`] if the new name belongs to another key.
    pub fn replace_key(&mut self, name: &str, key: Key) -> Result<()> {
        let index = self
            .key_values
            .get_index_of(name)
            .ok_or_else(|| Error::key_not_found(name))?;
        if key.name() != name && self.key_values.contains_key(key.name()) {
            return Err(Error::DuplicateKey(key.name().to_string()));
        }
        let new_name = key.name().to_string();
        if let Some((_, element)) = self.key_values.shift_remove_index(index) {
            self.key_values.shift_insert(index, key, element);
        }
        self.update_tag(
            |tag| tag.is_key_value(name),
            |tag| tag.renamed(&new_name).with_stale_key(),
        );
        Ok(())
    }

    /// Swaps the metadata (and possibly the name) of a nested block, keeping
    /// its position. Only its header lines go stale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] if `name` is not a nested block and
    /// [`Error::DuplicateBlock`] if the new name belongs to another block.
    pub fn replace_block_key(&mut self, name: &str, key: BlockKey) -> Result<()> {
        let index = self
            .blocks
            .get_index_of(name)
            .ok_or_else(|| Error::block_not_found(name))?;
        if key.name() != name && self.blocks.contains_key(key.name()) {
            return Err(Error::DuplicateBlock(key.name().to_string()));
        }
        let new_name = key.name().to_string();
        if let Some((_, block)) = self.blocks.shift_remove_index(index) {
            self.blocks.shift_insert(index, key, block);
        }
        self.update_tag(
            |tag| tag.is_block(name),
            |tag| tag.renamed(&new_name).with_stale_key(),
        );
        Ok(())
    }

    /// Removes a key-value pair. Sets the clear-parse flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if `name` is not a key name.
    pub fn remove(&mut self, name: &str) -> Result<Element> {
        let element = self
            .key_values
            .shift_remove(name)
            .ok_or_else(|| Error::key_not_found(name))?;
        self.tagged_lines.retain(|tag| !tag.is_key_value(name));
        self.clear_parse = true;
        Ok(element)
    }

    /// Removes a nested block. Sets the clear-parse flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] if `name` is not a nested block.
    pub fn remove_block(&mut self, name: &str) -> Result<Block> {
        let block = self
            .blocks
            .shift_remove(name)
            .ok_or_else(|| Error::block_not_found(name))?;
        self.tagged_lines.retain(|tag| !tag.is_block(name));
        self.clear_parse = true;
        Ok(block)
    }

    /// Drops every entry, nested block and cached line. Sets the clear-parse
    /// flag.
    pub fn clear(&mut self) {
        self.key_values.clear();
        self.blocks.clear();
        self.tagged_lines.clear();
        self.clear_parse = true;
    }

    /// Marks the cached body of every block along `path` stale in its parent,
    /// starting with this block's child `path[0]`.
    ///
    /// Ancestors cache the rendered body of their nested blocks, so a change
    /// inside `path` makes each of those renderings outdated.
    pub fn invalidate_path(&mut self, path: &[&str]) {
        let Some((first, rest)) = path.split_first() else {
            return;
        };
        trace!(block = *first, "invalidating cached block body");
        self.update_tag(|tag| tag.is_block(first), TaggedLine::with_stale_value);
        if let Some(child) = self.blocks.get_mut(*first) {
            child.invalidate_path(rest);
        }
    }

    fn update_tag<P, F>(&mut self, matches: P, update: F)
    where
        P: Fn(&TaggedLine) -> bool,
        F: FnOnce(TaggedLine) -> TaggedLine,
    {
        if let Some(index) = self.tagged_lines.iter().position(matches) {
            let tag = self.tagged_lines.remove(index);
            self.tagged_lines.insert(index, update(tag));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(lines: &[&str]) -> LineCache {
        LineCache::Cached(lines.iter().map(|l| l.to_string()).collect())
    }

    fn parsed_block() -> Block {
        let mut block = Block::new();
        block.key_values.insert(
            Key::new("a").unwrap().with_aliases(vec!["x".into()]).unwrap(),
            Element::from("1"),
        );
        block.key_values.insert(Key::new("b").unwrap(), Element::from("2"));
        block.tagged_lines = vec![
            TaggedLine::KeyValue {
                name: "a".into(),
                key_lines: cached(&["[x]", "a"]),
                value_lines: cached(&[" 1"]),
            },
            TaggedLine::Blank(String::new()),
            TaggedLine::KeyValue {
                name: "b".into(),
                key_lines: cached(&["b"]),
                value_lines: cached(&[" 2"]),
            },
        ];
        block
    }

    #[test]
    fn test_find_by_alias() {
        let block = parsed_block();
        assert_eq!(block.get("x"), Some(&Element::from("1")));
        assert_eq!(block.resolve_key("x").unwrap().name(), "a");
        assert!(matches!(block.resolve_key("y"), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_set_value_invalidates_value_only() {
        let mut block = parsed_block();
        block.set_value("a", Element::from("9")).unwrap();
        assert_eq!(
            block.tagged_lines[0],
            TaggedLine::KeyValue {
                name: "a".into(),
                key_lines: cached(&["[x]", "a"]),
                value_lines: LineCache::Stale,
            }
        );
        assert!(!block.clear_parse);
    }

    #[test]
    fn test_rename_keeps_position_and_value_cache() {
        let mut block = parsed_block();
        let renamed = block.resolve_key("a").unwrap().renamed("z").unwrap();
        block.replace_key("a", renamed).unwrap();
        let names: Vec<&str> = block.key_values.keys().map(Key::name).collect();
        assert_eq!(names, ["z", "b"]);
        assert_eq!(
            block.tagged_lines[0],
            TaggedLine::KeyValue {
                name: "z".into(),
                key_lines: LineCache::Stale,
                value_lines: cached(&[" 1"]),
            }
        );
        assert_eq!(block.resolve_key("x").unwrap().name(), "z");
    }

    #[test]
    fn test_rename_to_taken_name_changes_nothing() {
        let mut block = parsed_block();
        let before = block.tagged_lines.clone();
        let err = block.replace_key("a", Key::new("b").unwrap()).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(name) if name == "b"));
        assert_eq!(block.tagged_lines, before);
        assert!(block.key_values.contains_key("a"));
    }

    #[test]
    fn test_structural_changes_set_clear_parse() {
        let mut block = parsed_block();
        assert!(block.insert(Key::new("a").unwrap(), Element::Empty).is_err());
        assert!(!block.clear_parse);

        block.remove("b").unwrap();
        assert!(block.clear_parse);
        assert_eq!(block.tagged_lines.len(), 2);
    }

    #[test]
    fn test_invalidate_path_walks_down() {
        let mut inner = Block::new();
        inner.tagged_lines.push(TaggedLine::Block {
            name: "c".into(),
            key_lines: cached(&[">> c <<"]),
            value_lines: cached(&["  k: 1"]),
        });
        inner
            .blocks
            .insert(BlockKey::new("c").unwrap(), Block::new());

        let mut root = Block::new();
        root.tagged_lines.push(TaggedLine::Block {
            name: "b".into(),
            key_lines: cached(&[">> b <<"]),
            value_lines: cached(&["  >> c <<", "    k: 1"]),
        });
        root.blocks.insert(BlockKey::new("b").unwrap(), inner);

        root.invalidate_path(&["b", "c"]);

        assert_eq!(
            root.tagged_lines[0],
            TaggedLine::Block {
                name: "b".into(),
                key_lines: cached(&[">> b <<"]),
                value_lines: LineCache::Stale,
            }
        );
        let inner = root.get_block("b").unwrap();
        assert_eq!(
            inner.tagged_lines[0],
            TaggedLine::Block {
                name: "c".into(),
                key_lines: cached(&[">> c <<"]),
                value_lines: LineCache::Stale,
            }
        );
    }

    #[test]
    fn test_block_at_reports_missing_segment() {
        let mut root = Block::new();
        root.insert_block(BlockKey::new("a").unwrap(), Block::new())
            .unwrap();
        assert!(root.block_at(&["a"]).is_ok());
        assert!(matches!(
            root.block_at(&["a", "b"]),
            Err(Error::BlockNotFound(name)) if name == "b"
        ));
    }

    #[test]
    fn test_tag_transitions_are_pure() {
        let tag = TaggedLine::KeyValue {
            name: "k".into(),
            key_lines: cached(&["k"]),
            value_lines: cached(&[" v"]),
        };
        assert_eq!(
            tag.clone().with_stale_key().with_stale_value(),
            TaggedLine::fresh_key_value("k")
        );
        assert_eq!(
            TaggedLine::Comment("#x".into()).with_stale_value(),
            TaggedLine::Comment("#x".into())
        );
    }
}
