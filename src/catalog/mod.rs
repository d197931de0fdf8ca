mod chunks;
mod config;
mod directory;
mod engine;
mod entry;
mod error;

pub use chunks::FileChunks;
pub use config::CatalogConfig;
pub use directory::{Directory, FileNames};
pub use engine::Catalog;
pub use entry::{Entry, EntryType};
pub use error::{CatalogError, ErrorKind};
