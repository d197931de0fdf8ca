/// Limits applied by a [`Catalog`](crate::Catalog).
///
/// ```
/// use vfs_catalog::CatalogConfig;
///
/// let config = CatalogConfig::default().with_max_directories(4).with_max_entries(8);
/// assert_eq!(config.max_directories, 4);
/// assert_eq!(config.max_name_len, 49);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Maximum number of directories in the catalog.
    pub max_directories: usize,
    /// Maximum number of entries in one directory.
    pub max_entries: usize,
    /// Maximum length of a directory or file name, in bytes.
    pub max_name_len: usize,
    /// Maximum length of the content accepted by a single write, in bytes.
    pub max_content_len: usize,
    /// Size of the chunks yielded when reading a file back. Zero is treated as one.
    pub read_chunk_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_directories: 100,
            max_entries: 100,
            max_name_len: 49,
            max_content_len: 999,
            read_chunk_size: 1000,
        }
    }
}

impl CatalogConfig {
    pub fn with_max_directories(mut self, limit: usize) -> Self {
        self.max_directories = limit;
        self
    }

    pub fn with_max_entries(mut self, limit: usize) -> Self {
        self.max_entries = limit;
        self
    }

    pub fn with_max_name_len(mut self, limit: usize) -> Self {
        self.max_name_len = limit;
        self
    }

    pub fn with_max_content_len(mut self, limit: usize) -> Self {
        self.max_content_len = limit;
        self
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }
}
