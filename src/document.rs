//! The document facade.
//!
//! A [`Document`] owns the root [`Block`] of a parsed text, the
//! [`FormatPolicy`] used for regenerated lines, and optionally the
//! [`LineSink`] it saves to. Blocks are addressed by paths of block names
//! from the root (`&[]` is the root itself); keys resolve by name or alias.
//!
//! Every mutation validates its input before touching the model, so a
//! failed call leaves the document unchanged. A successful mutation marks
//! exactly the cached lines it affects as stale, along with the cached
//! rendering of each enclosing block, and saves the document when it is
//! backed by a sink and saving is not delayed.
//!
//! ```rust
//! use bearml::Document;
//!
//! let text = "\
//! ## service name
//! name: demo
//!
//! >> server <<
//!   [p]
//!   port: 8080
//! ";
//! let mut doc = Document::parse(text).unwrap();
//! assert_eq!(doc.get_value::<u16>(&["server"], "p").unwrap(), 8080);
//!
//! doc.change_value(&["server"], "port", &9090).unwrap();
//! assert_eq!(
//!     doc.to_string(),
//!     "# service name\nname: demo\n\n>> server <<\n  [p]\n  port: 9090\n"
//! );
//! ```

use crate::block::Block;
use crate::error::{Error, Result};
use crate::interpret::interpret_document;
use crate::key::{BlockKey, Key};
use crate::options::FormatPolicy;
use crate::store::{split_lines, FileStore, LineSink, LineSource};
use crate::writer::write_block;
use crate::{from_element, to_element, Element};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A parsed BearML document.
pub struct Document {
    root: Block,
    policy: FormatPolicy,
    sink: Option<Box<dyn LineSink>>,
    delayed_save: bool,
    auto_format: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("policy", &self.policy)
            .field("has_sink", &self.sink.is_some())
            .field("delayed_save", &self.delayed_save)
            .field("auto_format", &self.auto_format)
            .finish()
    }
}

impl Document {
    /// An empty document without a backing store.
    #[must_use]
    pub fn new() -> Self {
        Document {
            root: Block::new(),
            policy: FormatPolicy::default(),
            sink: None,
            delayed_save: false,
            auto_format: false,
        }
    }

    /// Parses a document from text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] when the text is not valid BearML.
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_lines(split_lines(text))
    }

    /// Parses a document from lines without terminators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] when the lines are not valid BearML.
    pub fn from_lines(lines: Vec<String>) -> Result<Self> {
        let root = interpret_document(&lines).map_err(|err| Error::invalid_format(err, &lines))?;
        Ok(Document {
            root,
            ..Self::new()
        })
    }

    /// Reads and parses a document from `store` and saves back to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the store cannot be read and
    /// [`Error::InvalidFormat`] when its content is not valid BearML.
    pub fn open<S>(mut store: S) -> Result<Self>
    where
        S: LineSource + LineSink + 'static,
    {
        let lines = store.read_lines()?;
        let mut doc = Self::from_lines(lines)?;
        doc.sink = Some(Box::new(store));
        Ok(doc)
    }

    /// Opens the file at `path`, creating it when it does not exist.
    ///
    /// # Errors
    ///
    /// See [`Document::open`].
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        debug!(path = %path.as_ref().display(), "opening document");
        Self::open(FileStore::new(path))
    }

    #[must_use]
    pub fn root(&self) -> &Block {
        &self.root
    }

    #[must_use]
    pub fn policy(&self) -> &FormatPolicy {
        &self.policy
    }

    /// Replaces the policy used for regenerated lines. Cached lines keep
    /// their notation until they are regenerated.
    pub fn set_policy(&mut self, policy: FormatPolicy) {
        self.policy = policy;
    }

    /// While delayed, mutations do not save; call [`Document::save`].
    pub fn set_delayed_save(&mut self, delayed: bool) {
        self.delayed_save = delayed;
    }

    /// When set, every rendering regenerates the whole document.
    pub fn set_auto_format(&mut self, auto_format: bool) {
        self.auto_format = auto_format;
    }

    // Reads

    /// The element stored under `key` (name or alias) in the block at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] or [`Error::KeyNotFound`].
    pub fn get_element(&self, path: &[&str], key: &str) -> Result<&Element> {
        self.root
            .block_at(path)?
            .get(key)
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// The value under `key` converted to `T`.
    ///
    /// # Errors
    ///
    /// Lookup errors as for [`Document::get_element`], and conversion errors
    /// from [`from_element`].
    pub fn get_value<T: DeserializeOwned>(&self, path: &[&str], key: &str) -> Result<T> {
        from_element(self.get_element(path, key)?)
    }

    /// Like [`Document::get_value`], returning `None` on any failure.
    #[must_use]
    pub fn try_get_value<T: DeserializeOwned>(&self, path: &[&str], key: &str) -> Option<T> {
        self.get_value(path, key).ok()
    }

    /// Key names of the block at `path`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] when the path does not exist.
    pub fn keys(&self, path: &[&str]) -> Result<Vec<&str>> {
        Ok(self
            .root
            .block_at(path)?
            .key_values()
            .keys()
            .map(Key::name)
            .collect())
    }

    /// Names of the blocks nested directly in the block at `path`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] when the path does not exist.
    pub fn block_names(&self, path: &[&str]) -> Result<Vec<&str>> {
        Ok(self
            .root
            .block_at(path)?
            .blocks()
            .keys()
            .map(BlockKey::name)
            .collect())
    }

    #[must_use]
    pub fn contains_key(&self, path: &[&str], key: &str) -> bool {
        self.root
            .block_at(path)
            .map_or(false, |block| block.find_key(key).is_some())
    }

    #[must_use]
    pub fn contains_block(&self, path: &[&str]) -> bool {
        self.root.block_at(path).is_ok()
    }

    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] or [`Error::KeyNotFound`].
    pub fn get_comment(&self, path: &[&str], key: &str) -> Result<Option<&str>> {
        Ok(self.root.block_at(path)?.resolve_key(key)?.comment())
    }

    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] or [`Error::KeyNotFound`].
    pub fn get_key_aliases(&self, path: &[&str], key: &str) -> Result<&[String]> {
        Ok(self.root.block_at(path)?.resolve_key(key)?.aliases())
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for the root and
    /// [`Error::BlockNotFound`] when the path does not exist.
    pub fn get_block_comment(&self, path: &[&str]) -> Result<Option<&str>> {
        let (name, parent) = split_block_path(path)?;
        let (key, _) = self
            .root
            .block_at(parent)?
            .blocks()
            .get_key_value(name)
            .ok_or_else(|| Error::block_not_found(name))?;
        Ok(key.comment())
    }

    /// The document as lines, replaying cached lines where possible.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        write_block(&self.root, &self.policy, self.auto_format)
    }

    // Metadata writes

    /// Replaces the value of `key` with any `Serialize` value.
    ///
    /// # Errors
    ///
    /// Conversion errors from [`to_element`], lookup errors, and save errors.
    pub fn change_value<T: ?Sized + Serialize>(
        &mut self,
        path: &[&str],
        key: &str,
        value: &T,
    ) -> Result<()> {
        let element = to_element(value)?;
        self.change_element(path, key, element)
    }

    /// Replaces the value of `key` with `element`.
    ///
    /// # Errors
    ///
    /// Lookup errors and save errors.
    pub fn change_element(&mut self, path: &[&str], key: &str, element: Element) -> Result<()> {
        let block = self.root.block_at_mut(path)?;
        let name = block.resolve_key(key)?.name().to_string();
        block.set_value(&name, element)?;
        debug!(?path, key = name.as_str(), "changed value");
        self.after_change(path)
    }

    /// # Errors
    ///
    /// Lookup errors and save errors.
    pub fn change_comment(&mut self, path: &[&str], key: &str, comment: &str) -> Result<()> {
        let comment = comment.to_string();
        self.update_key(path, key, |current| {
            Ok(current.clone().with_comment(Some(comment)))
        })
    }

    /// # Errors
    ///
    /// Lookup errors and save errors.
    pub fn remove_comment(&mut self, path: &[&str], key: &str) -> Result<()> {
        self.update_key(path, key, |current| Ok(current.clone().with_comment(None)))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidAlias`] for a malformed alias, lookup errors
    /// and save errors.
    pub fn change_key_aliases(&mut self, path: &[&str], key: &str, aliases: &[&str]) -> Result<()> {
        let aliases: Vec<String> = aliases.iter().map(|alias| alias.trim().to_string()).collect();
        self.update_key(path, key, |current| current.clone().with_aliases(aliases))
    }

    /// # Errors
    ///
    /// Lookup errors and save errors.
    pub fn remove_key_aliases(&mut self, path: &[&str], key: &str) -> Result<()> {
        self.update_key(path, key, |current| current.clone().with_aliases(Vec::new()))
    }

    /// Renames a key in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] for a blank name,
    /// [`Error::DuplicateKey`] when the name is taken, lookup errors and
    /// save errors.
    pub fn change_key_name(&mut self, path: &[&str], key: &str, new_name: &str) -> Result<()> {
        self.update_key(path, key, |current| current.renamed(new_name))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for the root, lookup errors and save
    /// errors.
    pub fn change_block_comment(&mut self, path: &[&str], comment: &str) -> Result<()> {
        let comment = comment.to_string();
        self.update_block_key(path, |current| {
            Ok(current.clone().with_comment(Some(comment)))
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for the root, lookup errors and save
    /// errors.
    pub fn remove_block_comment(&mut self, path: &[&str]) -> Result<()> {
        self.update_block_key(path, |current| Ok(current.clone().with_comment(None)))
    }

    /// Renames a block in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for the root, [`Error::InvalidName`]
    /// for a blank name, [`Error::DuplicateBlock`] when a sibling has the
    /// name, lookup errors and save errors.
    pub fn change_block_name(&mut self, path: &[&str], new_name: &str) -> Result<()> {
        self.update_block_key(path, |current| current.renamed(new_name))
    }

    // Structural writes

    /// Appends `key: value` to the block at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] when the name is taken, conversion
    /// and lookup errors, and save errors.
    pub fn add_key_value<T: ?Sized + Serialize>(
        &mut self,
        path: &[&str],
        key: &str,
        value: &T,
    ) -> Result<()> {
        let element = to_element(value)?;
        self.add_element(path, Key::new(key)?, element)
    }

    /// Appends a key carrying its own aliases and comment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] when the name is taken, lookup
    /// errors and save errors.
    pub fn add_element(&mut self, path: &[&str], key: Key, element: Element) -> Result<()> {
        debug!(?path, key = key.name(), "adding key");
        self.root.block_at_mut(path)?.insert(key, element)?;
        self.after_change(path)
    }

    /// Appends an empty block named `name` inside the block at `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`], [`Error::DuplicateBlock`], lookup
    /// errors and save errors.
    pub fn add_empty_block(&mut self, parent: &[&str], name: &str) -> Result<()> {
        let key = BlockKey::new(name)?;
        debug!(path = ?parent, block = key.name(), "adding block");
        self.root
            .block_at_mut(parent)?
            .insert_block(key, Block::new())?;
        self.after_change(parent)
    }

    /// Removes `key` and returns its value.
    ///
    /// # Errors
    ///
    /// Lookup errors and save errors.
    pub fn remove_key(&mut self, path: &[&str], key: &str) -> Result<Element> {
        let block = self.root.block_at_mut(path)?;
        let name = block.resolve_key(key)?.name().to_string();
        let element = block.remove(&name)?;
        debug!(?path, key = name.as_str(), "removed key");
        self.after_change(path)?;
        Ok(element)
    }

    /// Removes the block at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for the root, lookup errors and save
    /// errors.
    pub fn remove_block(&mut self, path: &[&str]) -> Result<()> {
        let (name, parent) = split_block_path(path)?;
        self.root.block_at_mut(parent)?.remove_block(name)?;
        debug!(?path, "removed block");
        self.after_change(parent)
    }

    /// Removes every key and nested block of the block at `path`.
    ///
    /// # Errors
    ///
    /// Lookup errors and save errors.
    pub fn clear_block(&mut self, path: &[&str]) -> Result<()> {
        self.root.block_at_mut(path)?.clear();
        debug!(?path, "cleared block");
        self.after_change(path)
    }

    // Persistence

    /// Writes the document to its backing store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the document has no store or the store
    /// fails.
    pub fn save(&mut self) -> Result<()> {
        let lines = self.lines();
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| Error::io("document has no backing store"))?;
        sink.write_lines(&lines)?;
        debug!(lines = lines.len(), "saved document");
        Ok(())
    }

    /// Writes the document to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the sink fails.
    pub fn save_to(&self, sink: &mut dyn LineSink) -> Result<()> {
        sink.write_lines(&self.lines())
    }

    /// Regenerates the whole document from the model from now on.
    ///
    /// # Errors
    ///
    /// Save errors.
    pub fn format(&mut self) -> Result<()> {
        self.root.set_clear_parse(true);
        debug!("formatting document");
        self.auto_save()
    }

    fn update_key<F>(&mut self, path: &[&str], key: &str, update: F) -> Result<()>
    where
        F: FnOnce(&Key) -> Result<Key>,
    {
        let block = self.root.block_at_mut(path)?;
        let current = block.resolve_key(key)?;
        let name = current.name().to_string();
        let replacement = update(current)?;
        block.replace_key(&name, replacement)?;
        debug!(?path, key = name.as_str(), "changed key");
        self.after_change(path)
    }

    fn update_block_key<F>(&mut self, path: &[&str], update: F) -> Result<()>
    where
        F: FnOnce(&BlockKey) -> Result<BlockKey>,
    {
        let (name, parent_path) = split_block_path(path)?;
        let parent = self.root.block_at_mut(parent_path)?;
        let (current, _) = parent
            .blocks()
            .get_key_value(name)
            .ok_or_else(|| Error::block_not_found(name))?;
        let replacement = update(current)?;
        parent.replace_block_key(name, replacement)?;
        debug!(?path, "changed block key");
        self.after_change(parent_path)
    }

    /// Resets the cached rendering of every block along `path` and saves.
    fn after_change(&mut self, path: &[&str]) -> Result<()> {
        self.root.invalidate_path(path);
        self.auto_save()
    }

    fn auto_save(&mut self) -> Result<()> {
        if self.delayed_save || self.sink.is_none() {
            return Ok(());
        }
        self.save()
    }
}

/// Splits a block path into the block's name and its parent's path.
fn split_block_path<'p, 'a>(path: &'p [&'a str]) -> Result<(&'a str, &'p [&'a str])> {
    path.split_last()
        .map(|(name, parent)| (*name, parent))
        .ok_or_else(|| Error::InvalidPath("the root block has no name".to_string()))
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const SOURCE: &str = "\
# top
name: demo

>> a <<
  x: 1

  >> b <<
    # deep
    y: 2
    z: 3
";

    #[test]
    fn test_unchanged_document_is_verbatim() {
        let doc = Document::parse(SOURCE).unwrap();
        assert_eq!(doc.to_string(), SOURCE);
    }

    #[test]
    fn test_failed_write_changes_nothing() {
        let mut doc = Document::parse(SOURCE).unwrap();
        assert!(matches!(
            doc.change_key_name(&["a", "b"], "y", "z"),
            Err(Error::DuplicateKey(_))
        ));
        assert!(matches!(
            doc.add_empty_block(&["a"], "b"),
            Err(Error::DuplicateBlock(_))
        ));
        assert!(matches!(
            doc.change_key_aliases(&[], "name", &["ok", "not ok"]),
            Err(Error::InvalidAlias(_))
        ));
        assert_eq!(doc.to_string(), SOURCE);
    }

    #[test]
    fn test_root_has_no_block_metadata() {
        let mut doc = Document::parse(SOURCE).unwrap();
        assert!(matches!(doc.get_block_comment(&[]), Err(Error::InvalidPath(_))));
        assert!(matches!(doc.remove_block(&[]), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_save_without_store() {
        let mut doc = Document::new();
        assert!(matches!(doc.save(), Err(Error::Io(_))));
        doc.add_key_value(&[], "k", "v").unwrap();
        let mut store = MemoryStore::new();
        doc.save_to(&mut store).unwrap();
        assert_eq!(store.lines(), ["k: v"]);
    }

    #[test]
    fn test_delayed_save() {
        let store = MemoryStore::from_text(SOURCE);
        let mut doc = Document::open(store.clone()).unwrap();
        doc.set_delayed_save(true);
        doc.change_value(&[], "name", "other").unwrap();
        assert_eq!(store.text(), SOURCE);
        doc.save().unwrap();
        assert!(store.text().starts_with("# top\nname: other\n"));
    }
}
