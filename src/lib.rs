//! A flat catalog of directories and files, kept in agreement with a durable storage backend.
//!
//! ### Overview
//!
//! `vfs-catalog` keeps an in-memory registry of directories, each holding an ordered, bounded
//! list of file entries, and mirrors every change onto a storage backend through the
//! `Storage` trait. Two backends are provided: `DirStorage`, which maps to a real directory
//! on the host, and `MapStorage`, which keeps everything in memory.
//!
//! **Key ideas**:
//! - **Storage first**: an operation changes the catalog only after storage agreed, except for
//!   the removals documented on `Catalog`.
//! - **Flat model**: one level of directories, each holding files. Names never contain path
//!   separators.
//! - **Bounded**: the number of directories and of entries per directory are limited by
//!   `CatalogConfig`, and hitting a limit is an error, not an overflow.
//! - **Results, not output**: every operation returns a value or a `CatalogError`; rendering
//!   them is up to the caller.

mod catalog;
mod core;
mod storage;

pub use catalog::{
    Catalog, CatalogConfig, CatalogError, Directory, Entry, EntryType, ErrorKind, FileChunks,
    FileNames,
};
pub use crate::core::{Result, Storage, StorageOp};
pub use storage::{DirStorage, MapStorage};
