#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EntryType {
    File,
    Directory,
}

/// Metadata of one file held by a [`Directory`](crate::Directory).
///
/// `size` is the length of the last content written through the catalog. It is a cache only;
/// the bytes themselves live in storage. An `Entry` is owned by exactly one directory and is
/// deliberately not `Clone`: a copy gets its own record through [`Entry::copy_of`].
#[derive(Debug, PartialEq)]
pub struct Entry {
    name: String,
    size: usize,
    entry_type: EntryType,
}

impl Entry {
    pub fn new<S: Into<String>>(name: S) -> Entry {
        Entry {
            name: name.into(),
            size: 0,
            entry_type: EntryType::File,
        }
    }

    /// Builds an independent record with the same name and cached size as `source`.
    pub fn copy_of(source: &Entry) -> Entry {
        Entry {
            name: source.name.clone(),
            size: source.size,
            entry_type: source.entry_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub(crate) fn set_size(&mut self, size: usize) {
        self.size = size;
    }
}
