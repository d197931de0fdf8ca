mod dir_storage;
mod map_storage;

pub use dir_storage::DirStorage;
pub use map_storage::MapStorage;
