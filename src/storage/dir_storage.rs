//! This module provides a storage backend that maps to a real directory on the host system.
//!
//! ### Key Features:
//! - **Isolated root**: All operations are confined to a designated root directory (self.root).
//!   Absolute paths and `..` components are rejected.
//! - **State tracking**: Remembers every artifact it created (self.created), so they can be
//!   removed later without touching anything that existed before.
//! - **Auto‑cleanup**: Optionally removes created artifacts on Drop (when is_auto_clean = true).

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::{debug, warn};

use crate::core::{Result, Storage, utils};

/// A storage backend that keeps directories and files under a root directory on the host.
///
/// ### Usage notes:
/// - `DirStorage` does not follow symlinks; `remove_file()` removes the link, not the target.
/// - Permissions are not automatically adjusted; ensure `root` is writable.
/// - Not thread‑safe in current version (wrap in `Mutex` if needed).
///
/// ### Example:
/// ```
/// use vfs_catalog::{DirStorage, Storage};
///
/// let root = std::env::temp_dir().join("dir_storage_doc");
///
/// let mut storage = DirStorage::new(&root).unwrap();
/// storage.set_auto_clean(true);
/// storage.create_dir("docs").unwrap();
/// storage.create_file("docs/note.txt").unwrap();
/// storage.write("docs/note.txt", b"Hello").unwrap();
/// assert_eq!(storage.read("docs/note.txt").unwrap(), b"Hello");
/// ```
pub struct DirStorage {
    root: PathBuf,                      // host-related absolute normalized path
    created: BTreeSet<PathBuf>,         // inner relative normalized paths
    created_root_parents: Vec<PathBuf>, // host-related absolute normalized paths
    is_auto_clean: bool,
}

impl DirStorage {
    /// Creates a new DirStorage instance with the root directory at `root`.
    /// Checks permissions to create and write into `root`.
    /// * `root` is an absolute host path. If it does not exist, it will be created.
    ///
    /// If `root` is not absolute or is not a directory, error returns.
    /// By default, the `is_auto_clean` flag is set to `false`: the files outlive the storage.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();

        if root.as_os_str().is_empty() {
            return Err(anyhow!("invalid root path: empty"));
        }
        if root.is_relative() {
            return Err(anyhow!("the root path must be absolute"));
        }
        if root.exists() && !root.is_dir() {
            return Err(anyhow!("{:?} is not a directory", root));
        }

        let root = utils::normalize(root);

        let mut created_root_parents = Vec::new();
        if !std::fs::exists(&root)? {
            created_root_parents.extend(Self::mkdir_all(&root)?);
        }

        if !Self::check_permissions(&root) {
            return Err(anyhow!("Access denied: {:?}", root));
        }

        debug!(root = %root.display(), "dir storage opened");

        Ok(Self {
            root,
            created: BTreeSet::new(),
            created_root_parents,
            is_auto_clean: false,
        })
    }

    /// Changes auto-clean flag.
    /// If auto-clean flag is true all artifacts created through this storage
    /// will be removed on drop.
    pub fn set_auto_clean(&mut self, clean: bool) {
        self.is_auto_clean = clean;
    }

    /// Returns root path related to the host file system.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Returns the host path matching the inner `path`.
    pub fn to_host<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let inner = utils::ensure_inner(path)?;
        Ok(self.root.join(inner))
    }

    /// Removes every artifact created through this storage, deepest first.
    /// Returns `false` if some of them could not be removed.
    pub fn cleanup(&mut self) -> bool {
        let mut is_ok = true;
        let created: Vec<_> = self.created.iter().rev().cloned().collect();
        for inner in created {
            let host = self.root.join(&inner);
            if !host.exists() {
                self.created.remove(&inner);
                continue;
            }
            match utils::rm_on_host(&host) {
                Ok(()) => {
                    self.created.remove(&inner);
                }
                Err(e) => {
                    is_ok = false;
                    warn!(path = %host.display(), error = %e, "unable to remove");
                }
            }
        }
        is_ok
    }

    /// Make directories recursively.
    /// * `path` is an absolute host path.
    /// Returns vector of created directories.
    fn mkdir_all<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
        let host_path = path.as_ref().to_path_buf();

        // Looking for the first existing parent
        let mut existed_part = host_path.clone();
        while let Some(parent) = existed_part.parent() {
            let parent_buf = parent.to_path_buf();
            if std::fs::exists(parent)? {
                existed_part = parent_buf;
                break;
            }
            existed_part = parent_buf;
        }

        let need_to_create: Vec<_> = host_path
            .strip_prefix(&existed_part)?
            .components()
            .collect();

        let mut created = Vec::new();
        let mut built = PathBuf::from(&existed_part);
        for component in need_to_create {
            built.push(component);
            if !std::fs::exists(&built)? {
                std::fs::create_dir(&built)?;
                created.push(built.clone());
            }
        }

        Ok(created)
    }

    fn check_permissions<P: AsRef<Path>>(path: P) -> bool {
        let filename = path.as_ref().join(".access");
        if std::fs::write(&filename, b"check").is_err() {
            return false;
        }
        std::fs::remove_file(filename).is_ok()
    }

    fn track(&mut self, host: &Path) {
        if let Ok(inner) = host.strip_prefix(&self.root) {
            self.created.insert(inner.to_path_buf());
        }
    }
}

impl Storage for DirStorage {
    fn create_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let host = self.to_host(&path)?;
        if std::fs::exists(&host)? {
            return Err(anyhow!("path already exists: {}", path.as_ref().display()));
        }
        OpenOptions::new().write(true).create_new(true).open(&host)?;
        self.track(&host);
        Ok(())
    }

    /// Writes bytes to a file, replacing its entire contents.
    /// The file is created if it does not exist yet.
    fn write<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()> {
        let host = self.to_host(&path)?;
        if host.is_dir() {
            return Err(anyhow!("{} is a directory", path.as_ref().display()));
        }
        let is_new = !std::fs::exists(&host)?;
        std::fs::write(&host, content)?;
        if is_new {
            self.track(&host);
        }
        Ok(())
    }

    fn open<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Read + '_>> {
        let host = self.to_host(&path)?;
        if !host.is_file() {
            return Err(anyhow!("{} is not a file", path.as_ref().display()));
        }
        Ok(Box::new(std::fs::File::open(&host)?))
    }

    fn copy<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        let host_from = self.to_host(&from)?;
        let host_to = self.to_host(&to)?;
        if !host_from.is_file() {
            return Err(anyhow!("{} is not a file", from.as_ref().display()));
        }
        if std::fs::exists(&host_to)? {
            return Err(anyhow!("path already exists: {}", to.as_ref().display()));
        }
        std::fs::copy(&host_from, &host_to)?;
        self.track(&host_to);
        Ok(())
    }

    fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let inner = utils::ensure_inner(&path)?;
        let host = self.root.join(&inner);
        if !host.is_file() {
            return Err(anyhow!("{} does not exist", path.as_ref().display()));
        }
        std::fs::remove_file(&host)?;
        self.created.remove(&inner);
        Ok(())
    }

    /// Renames a file or directory. The target must not exist.
    /// Tracked artifacts below `from` are re-tracked under `to`.
    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        let inner_from = utils::ensure_inner(&from)?;
        let inner_to = utils::ensure_inner(&to)?;
        let host_from = self.root.join(&inner_from);
        let host_to = self.root.join(&inner_to);

        if !std::fs::exists(&host_from)? {
            return Err(anyhow!("{} does not exist", from.as_ref().display()));
        }
        if std::fs::exists(&host_to)? {
            return Err(anyhow!("path already exists: {}", to.as_ref().display()));
        }
        std::fs::rename(&host_from, &host_to)?;

        let moved: Vec<PathBuf> = self
            .created
            .iter()
            .filter(|&p| p.starts_with(&inner_from))
            .cloned()
            .collect();
        for old in moved {
            self.created.remove(&old);
            if let Ok(rest) = old.strip_prefix(&inner_from) {
                self.created.insert(inner_to.join(rest));
            }
        }
        Ok(())
    }

    fn create_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let host = self.to_host(&path)?;
        if std::fs::exists(&host)? {
            return Err(anyhow!("path already exists: {}", path.as_ref().display()));
        }
        std::fs::create_dir(&host)?;
        self.track(&host);
        Ok(())
    }

    fn remove_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let inner = utils::ensure_inner(&path)?;
        let host = self.root.join(&inner);
        if !host.is_dir() {
            return Err(anyhow!("{} is not a directory", path.as_ref().display()));
        }
        std::fs::remove_dir(&host)?;
        self.created.remove(&inner);
        Ok(())
    }

    fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.to_host(path).map(|host| host.exists()).unwrap_or(false)
    }
}

impl Drop for DirStorage {
    fn drop(&mut self) {
        if !self.is_auto_clean {
            return;
        }

        self.cleanup();

        let errors: Vec<_> = self
            .created_root_parents
            .iter()
            .rev()
            .filter_map(|p| utils::rm_on_host(p).err())
            .collect();
        if !errors.is_empty() {
            warn!(?errors, "failed to remove root parents");
        }

        self.created_root_parents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    mod creations {
        use super::*;

        #[test]
        fn test_new_absolute_path_existing() {
            let temp_dir = setup_test_env();
            let root = temp_dir.path().to_path_buf();

            let storage = DirStorage::new(&root).unwrap();

            assert_eq!(storage.root, root);
            assert!(storage.created.is_empty());
            assert!(storage.created_root_parents.is_empty());
            assert!(!storage.is_auto_clean);
        }

        #[test]
        fn test_new_nested_nonexistent_path() {
            let temp_dir = setup_test_env();
            let nested = temp_dir.path().join("a/b/c");

            let storage = DirStorage::new(&nested).unwrap();

            assert_eq!(storage.root(), nested);
            assert_eq!(storage.created_root_parents.len(), 3); // a, a/b, a/b/c
            assert!(nested.exists());
        }

        #[test]
        fn test_new_root_is_file() {
            let temp_dir = setup_test_env();
            let file_path = temp_dir.path().join("file.txt");
            std::fs::write(&file_path, "content").unwrap();

            assert!(DirStorage::new(&file_path).is_err());
        }

        #[test]
        fn test_new_relative_or_empty_path() {
            assert!(DirStorage::new("").is_err());
            assert!(DirStorage::new("relative/root").is_err());
        }
    }

    mod paths {
        use super::*;

        #[test]
        fn test_to_host_joins_root() -> Result<()> {
            let temp_dir = setup_test_env();
            let storage = DirStorage::new(temp_dir.path())?;

            assert_eq!(storage.to_host("docs/a.txt")?, temp_dir.path().join("docs/a.txt"));
            Ok(())
        }

        #[test]
        fn test_escaping_paths_are_rejected() -> Result<()> {
            let temp_dir = setup_test_env();
            let mut storage = DirStorage::new(temp_dir.path().join("root"))?;

            assert!(storage.create_dir("../outside").is_err());
            assert!(storage.create_file("/etc/owned").is_err());
            assert!(!temp_dir.path().join("outside").exists());
            Ok(())
        }
    }

    mod files {
        use super::*;

        #[test]
        fn test_create_write_read() -> Result<()> {
            let temp_dir = setup_test_env();
            let mut storage = DirStorage::new(temp_dir.path())?;

            storage.create_dir("docs")?;
            storage.create_file("docs/a.txt")?;
            assert_eq!(storage.read("docs/a.txt")?, b"");

            storage.write("docs/a.txt", b"first")?;
            storage.write("docs/a.txt", b"second")?;
            assert_eq!(storage.read("docs/a.txt")?, b"second");
            assert_eq!(std::fs::read(temp_dir.path().join("docs/a.txt"))?, b"second");
            Ok(())
        }

        #[test]
        fn test_create_file_twice_fails() -> Result<()> {
            let temp_dir = setup_test_env();
            let mut storage = DirStorage::new(temp_dir.path())?;

            storage.create_dir("docs")?;
            storage.create_file("docs/a.txt")?;
            let result = storage.create_file("docs/a.txt");
            assert!(result.unwrap_err().to_string().contains("already exists"));
            Ok(())
        }

        #[test]
        fn test_create_file_without_parent_fails() -> Result<()> {
            let temp_dir = setup_test_env();
            let mut storage = DirStorage::new(temp_dir.path())?;

            assert!(storage.create_file("missing/a.txt").is_err());
            Ok(())
        }

        #[test]
        fn test_read_missing_file_fails() -> Result<()> {
            let temp_dir = setup_test_env();
            let storage = DirStorage::new(temp_dir.path())?;

            assert!(storage.read("docs/none.txt").is_err());
            Ok(())
        }

        #[test]
        fn test_copy_and_remove() -> Result<()> {
            let temp_dir = setup_test_env();
            let mut storage = DirStorage::new(temp_dir.path())?;

            storage.create_dir("a")?;
            storage.create_dir("b")?;
            storage.create_file("a/x.txt")?;
            storage.write("a/x.txt", b"payload")?;
            storage.copy("a/x.txt", "b/x.txt")?;

            storage.remove_file("a/x.txt")?;
            assert!(!storage.exists("a/x.txt"));
            assert_eq!(storage.read("b/x.txt")?, b"payload");
            assert!(storage.remove_file("a/x.txt").is_err());
            Ok(())
        }

        #[test]
        fn test_copy_refuses_existing_target() -> Result<()> {
            let temp_dir = setup_test_env();
            std::fs::create_dir(temp_dir.path().join("b"))?;
            std::fs::write(temp_dir.path().join("b/x.txt"), b"precious")?;
            let mut storage = DirStorage::new(temp_dir.path())?;
            storage.set_auto_clean(true);

            storage.create_dir("a")?;
            storage.write("a/x.txt", b"payload")?;
            let result = storage.copy("a/x.txt", "b/x.txt");
            assert!(result.unwrap_err().to_string().contains("already exists"));

            drop(storage);
            assert_eq!(std::fs::read(temp_dir.path().join("b/x.txt"))?, b"precious");
            Ok(())
        }

        #[test]
        fn test_rename_file_refuses_existing_target() -> Result<()> {
            let temp_dir = setup_test_env();
            let mut storage = DirStorage::new(temp_dir.path())?;

            storage.create_dir("d")?;
            storage.create_file("d/one")?;
            storage.create_file("d/two")?;
            assert!(storage.rename("d/one", "d/two").is_err());

            storage.rename("d/one", "d/three")?;
            assert!(!storage.exists("d/one"));
            assert!(storage.exists("d/three"));
            Ok(())
        }
    }

    mod dirs {
        use super::*;

        #[test]
        fn test_create_dir_twice_fails() -> Result<()> {
            let temp_dir = setup_test_env();
            let mut storage = DirStorage::new(temp_dir.path())?;

            storage.create_dir("docs")?;
            assert!(storage.create_dir("docs").is_err());
            Ok(())
        }

        #[test]
        fn test_remove_non_empty_dir_fails() -> Result<()> {
            let temp_dir = setup_test_env();
            let mut storage = DirStorage::new(temp_dir.path())?;

            storage.create_dir("docs")?;
            storage.create_file("docs/a.txt")?;
            assert!(storage.remove_dir("docs").is_err());

            storage.remove_file("docs/a.txt")?;
            storage.remove_dir("docs")?;
            assert!(!storage.exists("docs"));
            Ok(())
        }

        #[test]
        fn test_rename_dir_retracks_children() -> Result<()> {
            let temp_dir = setup_test_env();
            let mut storage = DirStorage::new(temp_dir.path())?;

            storage.create_dir("old")?;
            storage.create_file("old/a.txt")?;
            storage.rename("old", "new")?;

            assert!(storage.created.contains(Path::new("new")));
            assert!(storage.created.contains(Path::new("new/a.txt")));
            assert!(!storage.created.contains(Path::new("old/a.txt")));
            Ok(())
        }
    }

    mod drop {
        use super::*;

        #[test]
        fn test_drop_removes_created_artifacts() -> Result<()> {
            let temp_dir = setup_test_env();
            let root = temp_dir.path().join("to_remove");

            let mut storage = DirStorage::new(&root)?;
            storage.set_auto_clean(true);
            storage.create_dir("docs")?;
            storage.create_file("docs/a.txt")?;
            assert!(root.join("docs/a.txt").exists());

            drop(storage);

            assert!(!root.exists());
            Ok(())
        }

        #[test]
        fn test_drop_keeps_foreign_artifacts() -> Result<()> {
            let temp_dir = setup_test_env();
            let foreign = temp_dir.path().join("foreign.txt");
            std::fs::write(&foreign, b"keep me")?;

            let mut storage = DirStorage::new(temp_dir.path())?;
            storage.set_auto_clean(true);
            storage.create_dir("docs")?;
            drop(storage);

            assert!(foreign.exists());
            assert!(!temp_dir.path().join("docs").exists());
            Ok(())
        }

        #[test]
        fn test_drop_keeps_artifacts_by_default() -> Result<()> {
            let temp_dir = setup_test_env();
            let root = temp_dir.path().join("keep");

            let mut storage = DirStorage::new(&root)?;
            storage.create_dir("docs")?;
            storage.write("docs/a.txt", b"kept")?;
            drop(storage);

            assert_eq!(std::fs::read(root.join("docs/a.txt"))?, b"kept");
            Ok(())
        }

        #[test]
        fn test_drop_with_is_auto_clean_switched_off() -> Result<()> {
            let temp_dir = setup_test_env();
            let root = temp_dir.path().join("keep");

            let mut storage = DirStorage::new(&root)?;
            storage.set_auto_clean(true);
            storage.set_auto_clean(false);
            storage.create_dir("docs")?;
            drop(storage);

            assert!(root.join("docs").exists());
            Ok(())
        }
    }

    fn setup_test_env() -> TempDir {
        TempDir::new("dir_storage_test").unwrap()
    }
}
