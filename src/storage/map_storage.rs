//! This module provides a storage backend that keeps everything in memory.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::core::{Result, Storage, StorageOp, utils};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Directory,
    File(Vec<u8>),
}

/// A storage backend that keeps directories and file contents in a map, without touching the
/// host filesystem.
///
/// ### Invariants
///
/// 1. **Path normalization**: All keys in `nodes` are inner relative normalized paths.
/// 2. **Parent consistency**: For any node at `a/b`, there is a `Directory` node at `a`.
///
/// ### Fault injection
///
/// `fail_on()` makes a chosen operation fail for a chosen path, so that callers can exercise
/// their partial-failure handling. The injected failure leaves the storage unchanged.
///
/// ### Example
///
/// ```
/// use vfs_catalog::{MapStorage, Storage, StorageOp};
///
/// let mut storage = MapStorage::new();
/// storage.create_dir("docs").unwrap();
/// storage.create_file("docs/note.txt").unwrap();
///
/// storage.fail_on(StorageOp::RemoveFile, "docs/note.txt");
/// assert!(storage.remove_file("docs/note.txt").is_err());
/// assert!(storage.exists("docs/note.txt"));
/// ```
#[derive(Debug, Default)]
pub struct MapStorage {
    nodes: BTreeMap<PathBuf, Node>,
    faults: BTreeSet<(StorageOp, PathBuf)>,
}

impl MapStorage {
    /// Creates an empty MapStorage instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `op` on `path` fail until `clear_faults()` is called.
    pub fn fail_on<P: AsRef<Path>>(&mut self, op: StorageOp, path: P) {
        self.faults.insert((op, utils::normalize(path)));
    }

    /// Removes all injected failures.
    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Returns the number of files and directories held.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check(&self, op: StorageOp, path: &Path) -> Result<()> {
        if self.faults.contains(&(op, path.to_path_buf())) {
            return Err(anyhow!("injected {} failure: {}", op, path.display()));
        }
        Ok(())
    }

    fn ensure_parent(&self, path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => match self.nodes.get(parent) {
                Some(Node::Directory) => Ok(()),
                Some(Node::File(_)) => Err(anyhow!("{} is not a directory", parent.display())),
                None => Err(anyhow!("{} does not exist", parent.display())),
            },
            _ => Ok(()),
        }
    }

    fn file_mut(&mut self, path: &Path) -> Result<&mut Vec<u8>> {
        match self.nodes.get_mut(path) {
            Some(Node::File(content)) => Ok(content),
            Some(Node::Directory) => Err(anyhow!("{} is a directory", path.display())),
            None => Err(anyhow!("{} does not exist", path.display())),
        }
    }

    fn file(&self, path: &Path) -> Result<&[u8]> {
        match self.nodes.get(path) {
            Some(Node::File(content)) => Ok(content),
            Some(Node::Directory) => Err(anyhow!("{} is a directory", path.display())),
            None => Err(anyhow!("{} does not exist", path.display())),
        }
    }
}

impl Storage for MapStorage {
    fn create_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = utils::ensure_inner(path)?;
        self.check(StorageOp::CreateFile, &path)?;
        if self.nodes.contains_key(&path) {
            return Err(anyhow!("path already exists: {}", path.display()));
        }
        self.ensure_parent(&path)?;
        self.nodes.insert(path, Node::File(Vec::new()));
        Ok(())
    }

    /// Replaces the entire content of a file, creating it if necessary.
    fn write<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()> {
        let path = utils::ensure_inner(path)?;
        self.check(StorageOp::Write, &path)?;
        if self.nodes.contains_key(&path) {
            *self.file_mut(&path)? = content.to_vec();
        } else {
            self.ensure_parent(&path)?;
            self.nodes.insert(path, Node::File(content.to_vec()));
        }
        Ok(())
    }

    fn open<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Read + '_>> {
        let path = utils::ensure_inner(path)?;
        self.check(StorageOp::Read, &path)?;
        Ok(Box::new(Cursor::new(self.file(&path)?)))
    }

    fn copy<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        let from = utils::ensure_inner(from)?;
        let to = utils::ensure_inner(to)?;
        self.check(StorageOp::Copy, &from)?;
        self.check(StorageOp::Copy, &to)?;
        if self.nodes.contains_key(&to) {
            return Err(anyhow!("path already exists: {}", to.display()));
        }
        let content = self.file(&from)?.to_vec();
        self.write(&to, &content)
    }

    fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = utils::ensure_inner(path)?;
        self.check(StorageOp::RemoveFile, &path)?;
        self.file(&path)?;
        self.nodes.remove(&path);
        Ok(())
    }

    /// Renames a file or directory together with everything below it.
    /// The target must not exist.
    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        let from = utils::ensure_inner(from)?;
        let to = utils::ensure_inner(to)?;
        self.check(StorageOp::Rename, &from)?;
        if !self.nodes.contains_key(&from) {
            return Err(anyhow!("{} does not exist", from.display()));
        }
        if self.nodes.contains_key(&to) {
            return Err(anyhow!("path already exists: {}", to.display()));
        }
        self.ensure_parent(&to)?;

        let moved: Vec<PathBuf> = self
            .nodes
            .keys()
            .filter(|&p| p.starts_with(&from))
            .cloned()
            .collect();
        for old in moved {
            if let (Some(node), Ok(rest)) = (self.nodes.remove(&old), old.strip_prefix(&from)) {
                self.nodes.insert(to.join(rest), node);
            }
        }
        Ok(())
    }

    fn create_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = utils::ensure_inner(path)?;
        self.check(StorageOp::CreateDir, &path)?;
        if self.nodes.contains_key(&path) {
            return Err(anyhow!("path already exists: {}", path.display()));
        }
        self.ensure_parent(&path)?;
        self.nodes.insert(path, Node::Directory);
        Ok(())
    }

    fn remove_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = utils::ensure_inner(path)?;
        self.check(StorageOp::RemoveDir, &path)?;
        match self.nodes.get(&path) {
            Some(Node::Directory) => {}
            Some(Node::File(_)) => return Err(anyhow!("{} is not a directory", path.display())),
            None => return Err(anyhow!("{} does not exist", path.display())),
        }
        let has_children = self
            .nodes
            .keys()
            .any(|p| p != &path && p.starts_with(&path));
        if has_children {
            return Err(anyhow!("directory not empty: {}", path.display()));
        }
        self.nodes.remove(&path);
        Ok(())
    }

    fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        utils::ensure_inner(path)
            .map(|p| self.nodes.contains_key(&p))
            .unwrap_or(false)
    }
}
