use std::path::PathBuf;

use thiserror::Error;

use crate::core::StorageOp;

/// Errors returned by [`Catalog`](crate::Catalog) operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("directory '{0}' not found")]
    DirectoryNotFound(String),

    #[error("file '{file}' not found in directory '{dir}'")]
    FileNotFound { dir: String, file: String },

    /// A bounded collection is at its limit.
    #[error("{what} is full (limit {limit})")]
    CapacityExceeded { what: String, limit: usize },

    #[error("'{0}' already exists")]
    NameCollision(String),

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("content of {len} bytes exceeds the limit of {limit} bytes")]
    ContentTooLarge { len: usize, limit: usize },

    /// The storage call failed. The catalog state after this error is documented per operation.
    #[error("failed to {op} '{}'", .path.display())]
    Storage {
        op: StorageOp,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Coarse classification of a [`CatalogError`], for callers that only react to the kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    CapacityExceeded,
    NameCollision,
    InvalidInput,
    DurableStorage,
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::DirectoryNotFound(_) | CatalogError::FileNotFound { .. } => {
                ErrorKind::NotFound
            }
            CatalogError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            CatalogError::NameCollision(_) => ErrorKind::NameCollision,
            CatalogError::InvalidName { .. } | CatalogError::ContentTooLarge { .. } => {
                ErrorKind::InvalidInput
            }
            CatalogError::Storage { .. } => ErrorKind::DurableStorage,
        }
    }

    pub(crate) fn storage<P: Into<PathBuf>>(op: StorageOp, path: P, source: anyhow::Error) -> Self {
        CatalogError::Storage {
            op,
            path: path.into(),
            source,
        }
    }
}
