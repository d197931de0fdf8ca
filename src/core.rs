use std::fmt;
use std::io::Read;
use std::path::Path;

use anyhow::anyhow;

/// Durable storage capability the catalog mirrors its state onto.
///
/// Every path is relative to the storage root and has the flat form `dir` or `dir/file`.
/// Implementations report failures through `anyhow::Error` with a message naming the path.
pub trait Storage {
    /// Creates an empty file. Fails if `path` already exists or its parent is missing.
    fn create_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()>;

    /// Replaces the entire content of the file at `path`.
    fn write<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()>;

    /// Opens the file at `path` for sequential reading.
    fn open<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Read + '_>>;

    /// Reads the entire content of the file at `path`.
    fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        self.open(path)?.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Copies the file at `from` to `to`. Fails if `to` already exists.
    fn copy<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        if self.exists(&to) {
            return Err(anyhow!("path already exists: {}", to.as_ref().display()));
        }
        let content = self.read(from)?;
        self.write(to, &content)
    }

    /// Removes the file at `path`.
    fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()>;

    /// Renames a file or directory.
    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()>;

    /// Creates a directory. Fails if `path` already exists.
    fn create_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<()>;

    /// Removes an empty directory.
    fn remove_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<()>;

    /// Returns true, if `path` exists in the storage.
    fn exists<P: AsRef<Path>>(&self, path: P) -> bool;
}

/// Names a storage call, used to tag storage failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StorageOp {
    CreateFile,
    Write,
    Read,
    Copy,
    RemoveFile,
    Rename,
    CreateDir,
    RemoveDir,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageOp::CreateFile => "create file",
            StorageOp::Write => "write",
            StorageOp::Read => "read",
            StorageOp::Copy => "copy",
            StorageOp::RemoveFile => "remove file",
            StorageOp::Rename => "rename",
            StorageOp::CreateDir => "create directory",
            StorageOp::RemoveDir => "remove directory",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, anyhow::Error>;

pub(crate) mod utils {
    use std::path::{Component, Path, PathBuf};

    use anyhow::anyhow;

    /// Resolves `.` and `..` components lexically and drops trailing separators.
    pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
        let mut result = PathBuf::new();
        for component in path.as_ref().components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    result.pop();
                }
                _ => result.push(component),
            }
        }
        result
    }

    /// Checks that `path` is relative and stays below the storage root.
    pub fn ensure_inner<P: AsRef<Path>>(path: P) -> anyhow::Result<PathBuf> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(anyhow!("invalid path: empty"));
        }
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(anyhow!("invalid path: {} leaves the storage root", path.display()));
        }
        let normalized = normalize(path);
        if normalized.as_os_str().is_empty() {
            return Err(anyhow!("invalid path: {} refers to the root", path.display()));
        }
        Ok(normalized)
    }

    /// Removes a file or an empty directory on the host.
    pub fn rm_on_host<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if path.is_dir() {
            std::fs::remove_dir(path)?;
        } else {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_normalize_path() {
            assert_eq!(normalize("a/b/c/"), PathBuf::from("a/b/c"));
            assert_eq!(normalize("a/./b"), PathBuf::from("a/b"));
            assert_eq!(normalize("a/../b"), PathBuf::from("b"));
            assert_eq!(normalize("/a/b/../c"), PathBuf::from("/a/c"));
            assert_eq!(normalize(""), PathBuf::from(""));
        }

        #[test]
        fn test_ensure_inner_accepts_flat_paths() {
            assert_eq!(ensure_inner("docs").unwrap(), PathBuf::from("docs"));
            assert_eq!(ensure_inner("docs/a.txt").unwrap(), PathBuf::from("docs/a.txt"));
            assert_eq!(ensure_inner("./docs/").unwrap(), PathBuf::from("docs"));
        }

        #[test]
        fn test_ensure_inner_rejects_escapes() {
            assert!(ensure_inner("").is_err());
            assert!(ensure_inner(".").is_err());
            assert!(ensure_inner("/etc/passwd").is_err());
            assert!(ensure_inner("../outside").is_err());
            assert!(ensure_inner("docs/../../outside").is_err());
        }
    }
}
