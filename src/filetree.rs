//! In-memory directory trees
//!
//! The codec and the emitters build and consume [`FileTree`] values; only
//! [`FileTree::read_from`] and [`FileTree::write_to`] touch the real
//! filesystem. This keeps every format decision testable without disk I/O.
//! Writes are per-file, not per-tree: a failed write can leave a partially
//! written tree behind, and callers wanting whole-tree atomicity must write
//! to a temporary location and rename.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// One entry in a directory: a byte blob or a nested directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNode {
    File(Vec<u8>),
    Directory(FileTree),
}

/// An ordered (name-sorted) directory of named nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    entries: BTreeMap<String, FileNode>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file entry.
    pub fn insert_file(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), FileNode::File(bytes.into()));
    }

    /// Add or replace a text file entry.
    pub fn insert_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.insert_file(name, text.into().into_bytes());
    }

    /// Add or replace a subdirectory.
    pub fn insert_dir(&mut self, name: impl Into<String>, tree: FileTree) {
        self.entries.insert(name.into(), FileNode::Directory(tree));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Bytes of a file entry, if present.
    pub fn file(&self, name: &str) -> Option<&[u8]> {
        match self.entries.get(name) {
            Some(FileNode::File(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// UTF-8 text of a file entry, if present (lossy).
    pub fn text(&self, name: &str) -> Option<String> {
        self.file(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// A subdirectory entry, if present.
    pub fn dir(&self, name: &str) -> Option<&FileTree> {
        match self.entries.get(name) {
            Some(FileNode::Directory(tree)) => Some(tree),
            _ => None,
        }
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FileNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a directory from disk into a tree.
    pub fn read_from(path: &Path) -> Result<Self> {
        let mut tree = Self::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_path = entry.path();
            if entry_path.is_dir() {
                tree.insert_dir(name, Self::read_from(&entry_path)?);
            } else {
                tree.insert_file(name, fs::read(&entry_path)?);
            }
        }
        Ok(tree)
    }

    /// Materialize the tree under `path`, creating directories as needed and
    /// replacing existing files.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        for (name, node) in &self.entries {
            let entry_path = path.join(name);
            match node {
                FileNode::File(bytes) => fs::write(&entry_path, bytes)?,
                FileNode::Directory(tree) => tree.write_to(&entry_path)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_tree() -> FileTree {
        let mut inner = FileTree::new();
        inner.insert_text("States", "Red\nGreen\n");
        let mut tree = FileTree::new();
        tree.insert_text("Machines", "Traffic.machine\n");
        tree.insert_dir("Traffic.machine", inner);
        tree
    }

    #[test]
    fn lookup_by_kind() {
        let tree = sample_tree();
        assert!(tree.contains("Machines"));
        assert_eq!(tree.text("Machines").unwrap(), "Traffic.machine\n");
        assert!(tree.file("Traffic.machine").is_none());
        assert!(tree.dir("Traffic.machine").is_some());
        assert!(tree.dir("Machines").is_none());
    }

    #[test]
    fn entries_iterate_in_name_order() {
        let mut tree = FileTree::new();
        tree.insert_text("b", "2");
        tree.insert_text("a", "1");
        let names: Vec<&str> = tree.entries().map(|(name, _)| name).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn disk_roundtrip() {
        let tree = sample_tree();
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        tree.write_to(&root).unwrap();

        let read = FileTree::read_from(&root).unwrap();
        assert_eq!(tree, read);
    }

    #[test]
    fn write_replaces_existing_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");

        let mut first = FileTree::new();
        first.insert_text("Language", "objc++");
        first.write_to(&root).unwrap();

        let mut second = FileTree::new();
        second.insert_text("Language", "c");
        second.write_to(&root).unwrap();

        assert_eq!(std::fs::read_to_string(root.join("Language")).unwrap(), "c");
    }
}
