//! Line sources and sinks.
//!
//! A [`Document`](crate::Document) reads its text once from a
//! [`LineSource`] and writes it back through a [`LineSink`]. Lines never
//! carry their terminator.
//!
//! ```rust
//! use bearml::{Document, MemoryStore};
//!
//! let store = MemoryStore::from_text("name: demo\n");
//! let mut doc = Document::open(store.clone()).unwrap();
//! doc.change_value(&[], "name", "renamed").unwrap();
//! assert_eq!(store.text(), "name: renamed\n");
//! ```

use crate::error::Result;
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

pub trait LineSource {
    /// Reads every line of the source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) when the source cannot be read.
    fn read_lines(&mut self) -> Result<Vec<String>>;
}

pub trait LineSink {
    /// Replaces the sink's content with `lines`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) when the sink cannot be written.
    fn write_lines(&mut self, lines: &[String]) -> Result<()>;
}

/// Splits text on `\n`. A final terminator does not start another line and
/// `\r` stays part of its line.
#[must_use]
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n').map(str::to_string).collect()
}

/// A file on disk, created empty on first read when missing.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for FileStore {
    fn read_lines(&mut self) -> Result<Vec<String>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "creating missing file");
            File::create(&self.path)?;
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(split_lines(&text))
    }
}

impl LineSink for FileStore {
    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        for line in lines {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        debug!(path = %self.path.display(), lines = lines.len(), "wrote file");
        Ok(())
    }
}

/// An in-memory buffer. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_text(text: &str) -> Self {
        MemoryStore {
            lines: Rc::new(RefCell::new(split_lines(text))),
        }
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// The buffer as text, one `\n` after every line.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines
            .borrow()
            .iter()
            .map(|line| format!("{line}\n"))
            .collect()
    }
}

impl LineSource for MemoryStore {
    fn read_lines(&mut self) -> Result<Vec<String>> {
        Ok(self.lines())
    }
}

impl LineSink for MemoryStore {
    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        *self.lines.borrow_mut() = lines.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines() {
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("a\nb\n"), ["a", "b"]);
        assert_eq!(split_lines("a\r\n\n"), ["a\r", ""]);
        assert_eq!(split_lines("\n"), [""]);
    }

    #[test]
    fn test_memory_store_shares_buffer() {
        let store = MemoryStore::from_text("a: 1");
        let mut sink = store.clone();
        sink.write_lines(&["b: 2".to_string()]).unwrap();
        assert_eq!(store.lines(), ["b: 2"]);
        assert_eq!(store.text(), "b: 2\n");
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("conf.bml"));
        assert!(store.read_lines().unwrap().is_empty());
        assert!(store.path().exists());

        store
            .write_lines(&["x: 1".to_string(), String::new()])
            .unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "x: 1\n\n");
        assert_eq!(store.read_lines().unwrap(), ["x: 1", ""]);
    }
}
