//! The catalog: a flat registry of directories and their files, mirrored onto a [`Storage`].
//!
//! ### Consistency rules
//!
//! - Storage is called first and the in-memory change is committed only when it succeeds.
//!   A failed call leaves the catalog unchanged.
//! - Two operations commit first and report the storage failure afterwards:
//!   `remove_file` (the entry is gone either way) and the final directory removal of
//!   `remove_directory` (the record is already evicted).
//! - `remove_directory` stops at the first file it cannot remove. Files removed before that
//!   point stay removed; nothing is rolled back.
//! - Validation (names, capacity, collisions) happens before any storage call.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::catalog::chunks::FileChunks;
use crate::catalog::config::CatalogConfig;
use crate::catalog::directory::{Directory, FileNames};
use crate::catalog::entry::Entry;
use crate::catalog::error::CatalogError;
use crate::core::{Storage, StorageOp};

/// In-memory registry of directories and the files they contain, kept in sync with a storage
/// backend.
///
/// Directories are kept in creation order, which is also the order of `directories()` and
/// `find_file()`. Files are kept in insertion order within their directory.
///
/// Not thread‑safe: every operation takes the catalog as a whole. Wrap it in a `Mutex` to share
/// it between callers.
///
/// ### Example
///
/// ```
/// use vfs_catalog::{Catalog, MapStorage};
///
/// let mut catalog = Catalog::new(MapStorage::new());
/// catalog.make_directory("docs").unwrap();
/// catalog.create_file("docs", "a.txt").unwrap();
/// catalog.write_content("docs", "a.txt", "hello").unwrap();
///
/// let content = catalog.read_file("docs", "a.txt").unwrap().read_to_end().unwrap();
/// assert_eq!(content, b"hello");
/// assert_eq!(catalog.find_file("a.txt"), ["docs"]);
/// ```
pub struct Catalog<S: Storage> {
    storage: S,
    config: CatalogConfig,
    directories: Vec<Directory>,
    current: Option<String>,
}

impl<S: Storage> Catalog<S> {
    /// Creates an empty catalog on top of `storage` with the default limits.
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, CatalogConfig::default())
    }

    pub fn with_config(storage: S, config: CatalogConfig) -> Self {
        Self {
            storage,
            config,
            directories: Vec::new(),
            current: None,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Releases the storage, dropping the catalog.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Returns directory names in creation order.
    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.directories.iter().map(Directory::name)
    }

    pub fn directory(&self, name: &str) -> Result<&Directory, CatalogError> {
        self.dir_index(name).map(|i| &self.directories[i])
    }

    /// Returns the number of files over all directories.
    pub fn total_files(&self) -> usize {
        self.directories.iter().map(Directory::len).sum()
    }

    /// Returns the directory last selected by `change_directory()`, if it still exists.
    pub fn current_directory(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Creates an empty directory, on storage first.
    pub fn make_directory(&mut self, name: &str) -> Result<(), CatalogError> {
        self.validate_name(name)?;
        if self.directories.len() >= self.config.max_directories {
            return Err(CatalogError::CapacityExceeded {
                what: "catalog".to_string(),
                limit: self.config.max_directories,
            });
        }
        if self.dir_index(name).is_ok() {
            return Err(CatalogError::NameCollision(name.to_string()));
        }

        self.storage
            .create_dir(name)
            .map_err(|e| self.storage_failure(StorageOp::CreateDir, name, e))?;
        self.directories
            .push(Directory::new(name, self.config.max_entries));

        info!(dir = name, "directory created");
        Ok(())
    }

    /// Removes every file of the directory in stored order, then the directory itself.
    ///
    /// If a file cannot be removed from storage, the operation stops there: the files removed
    /// so far stay removed and the directory keeps the rest. If only the final removal of the
    /// directory from storage fails, the directory is already gone from the catalog.
    #[instrument(skip(self), level = "debug")]
    pub fn remove_directory(&mut self, name: &str) -> Result<(), CatalogError> {
        let idx = self.dir_index(name)?;

        let dir = &mut self.directories[idx];
        while let Some(file) = dir.entries().first().map(|e| e.name().to_string()) {
            let path = file_path(name, &file);
            if let Err(e) = self.storage.remove_file(&path) {
                warn!(
                    dir = name,
                    file = file.as_str(),
                    left = dir.len(),
                    "directory removal stopped"
                );
                return Err(CatalogError::storage(StorageOp::RemoveFile, path, e));
            }
            dir.remove(&file);
            debug!(dir = name, file = file.as_str(), "file removed");
        }

        self.directories.remove(idx);
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }

        self.storage
            .remove_dir(name)
            .map_err(|e| self.storage_failure(StorageOp::RemoveDir, name, e))?;

        info!(dir = name, "directory removed");
        Ok(())
    }

    /// Renames a directory, on storage first.
    pub fn rename_directory(&mut self, old_name: &str, new_name: &str) -> Result<(), CatalogError> {
        let idx = self.dir_index(old_name)?;
        self.validate_name(new_name)?;
        if self.dir_index(new_name).is_ok() {
            return Err(CatalogError::NameCollision(new_name.to_string()));
        }

        self.storage
            .rename(old_name, new_name)
            .map_err(|e| self.storage_failure(StorageOp::Rename, old_name, e))?;
        self.directories[idx].set_name(new_name);
        if self.current.as_deref() == Some(old_name) {
            self.current = Some(new_name.to_string());
        }

        info!(from = old_name, to = new_name, "directory renamed");
        Ok(())
    }

    /// Lists file names of the directory in insertion order.
    pub fn list_files(&self, name: &str) -> Result<FileNames<'_>, CatalogError> {
        self.directory(name).map(Directory::names)
    }

    /// Moves the advisory cursor to an existing directory. Storage is not involved.
    pub fn change_directory(&mut self, name: &str) -> Result<(), CatalogError> {
        self.dir_index(name)?;
        self.current = Some(name.to_string());
        debug!(dir = name, "current directory changed");
        Ok(())
    }

    /// Creates an empty file, on storage first.
    pub fn create_file(&mut self, dir: &str, file: &str) -> Result<(), CatalogError> {
        let idx = self.dir_index(dir)?;
        self.validate_name(file)?;
        self.directories[idx].check_insert(file)?;

        let path = file_path(dir, file);
        self.storage
            .create_file(&path)
            .map_err(|e| self.storage_failure(StorageOp::CreateFile, &path, e))?;
        self.directories[idx].insert(Entry::new(file))?;

        info!(dir, file, "file created");
        Ok(())
    }

    /// Replaces the content of a file. The cached size is updated only if storage accepted
    /// the write.
    pub fn write_content<C: AsRef<[u8]>>(
        &mut self,
        dir: &str,
        file: &str,
        content: C,
    ) -> Result<(), CatalogError> {
        let content = content.as_ref();
        let idx = self.dir_index(dir)?;
        if !self.directories[idx].contains(file) {
            return Err(file_not_found(dir, file));
        }
        if content.len() > self.config.max_content_len {
            return Err(CatalogError::ContentTooLarge {
                len: content.len(),
                limit: self.config.max_content_len,
            });
        }

        let path = file_path(dir, file);
        self.storage
            .write(&path, content)
            .map_err(|e| self.storage_failure(StorageOp::Write, &path, e))?;
        if let Some(entry) = self.directories[idx].get_mut(file) {
            entry.set_size(content.len());
        }

        info!(dir, file, size = content.len(), "content written");
        Ok(())
    }

    /// Opens a file for reading. The content comes from storage, never from the catalog.
    pub fn read_file(&self, dir: &str, file: &str) -> Result<FileChunks<'_>, CatalogError> {
        if !self.directory(dir)?.contains(file) {
            return Err(file_not_found(dir, file));
        }

        let path = file_path(dir, file);
        let reader = self
            .storage
            .open(&path)
            .map_err(|e| self.storage_failure(StorageOp::Read, &path, e))?;
        Ok(FileChunks::new(reader, path, self.config.read_chunk_size))
    }

    /// Copies a file into another directory under the same name.
    ///
    /// The destination gets its own entry; later changes to either side do not affect the
    /// other.
    #[instrument(skip(self), level = "debug")]
    pub fn copy_file(&mut self, src_dir: &str, dest_dir: &str, file: &str) -> Result<(), CatalogError> {
        let src_idx = self.dir_index(src_dir)?;
        let copy = match self.directories[src_idx].get(file) {
            Some(source) => Entry::copy_of(source),
            None => return Err(file_not_found(src_dir, file)),
        };
        let dest_idx = self.dir_index(dest_dir)?;
        self.directories[dest_idx].check_insert(file)?;

        let src_path = file_path(src_dir, file);
        let dest_path = file_path(dest_dir, file);
        self.storage
            .copy(&src_path, &dest_path)
            .map_err(|e| self.storage_failure(StorageOp::Copy, &src_path, e))?;
        self.directories[dest_idx].insert(copy)?;

        info!(file, from = src_dir, to = dest_dir, "file copied");
        Ok(())
    }

    /// Renames a file within its directory, on storage first.
    pub fn rename_file(&mut self, dir: &str, old_name: &str, new_name: &str) -> Result<(), CatalogError> {
        let idx = self.dir_index(dir)?;
        if !self.directories[idx].contains(old_name) {
            return Err(file_not_found(dir, old_name));
        }
        self.validate_name(new_name)?;
        if self.directories[idx].contains(new_name) {
            return Err(CatalogError::NameCollision(format!("{}/{}", dir, new_name)));
        }

        let old_path = file_path(dir, old_name);
        self.storage
            .rename(&old_path, file_path(dir, new_name))
            .map_err(|e| self.storage_failure(StorageOp::Rename, &old_path, e))?;
        if let Some(entry) = self.directories[idx].get_mut(old_name) {
            entry.set_name(new_name);
        }

        info!(dir, from = old_name, to = new_name, "file renamed");
        Ok(())
    }

    /// Removes a file from the catalog, then from storage.
    ///
    /// The entry is gone from the catalog even if the storage removal fails.
    pub fn remove_file(&mut self, dir: &str, file: &str) -> Result<(), CatalogError> {
        let idx = self.dir_index(dir)?;
        if self.directories[idx].remove(file).is_none() {
            return Err(file_not_found(dir, file));
        }

        let path = file_path(dir, file);
        self.storage
            .remove_file(&path)
            .map_err(|e| self.storage_failure(StorageOp::RemoveFile, &path, e))?;

        info!(dir, file, "file removed");
        Ok(())
    }

    /// Returns, in catalog order, the names of directories holding a file named `file`.
    pub fn find_file<'a>(&'a self, file: &str) -> Vec<&'a str> {
        self.directories
            .iter()
            .filter(|d| d.contains(file))
            .map(Directory::name)
            .collect()
    }

    fn dir_index(&self, name: &str) -> Result<usize, CatalogError> {
        self.directories
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| CatalogError::DirectoryNotFound(name.to_string()))
    }

    fn validate_name(&self, name: &str) -> Result<(), CatalogError> {
        let reason = if name.is_empty() {
            "empty"
        } else if name.len() > self.config.max_name_len {
            "too long"
        } else if name == "." || name == ".." {
            "reserved"
        } else if name.contains(['/', '\\']) {
            "contains a path separator"
        } else if name.contains('\0') {
            "contains NUL"
        } else {
            return Ok(());
        };
        Err(CatalogError::InvalidName {
            name: name.to_string(),
            reason,
        })
    }

    fn storage_failure<P: AsRef<Path>>(&self, op: StorageOp, path: P, source: anyhow::Error) -> CatalogError {
        let path = path.as_ref();
        warn!(%op, path = %path.display(), error = %source, "storage call failed");
        CatalogError::storage(op, path, source)
    }
}

fn file_path(dir: &str, file: &str) -> PathBuf {
    Path::new(dir).join(file)
}

fn file_not_found(dir: &str, file: &str) -> CatalogError {
    CatalogError::FileNotFound {
        dir: dir.to_string(),
        file: file.to_string(),
    }
}
