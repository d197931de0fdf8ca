use std::iter::FusedIterator;
use std::slice;

use crate::catalog::entry::Entry;
use crate::catalog::error::CatalogError;

/// A named, bounded, insertion-ordered collection of entries.
#[derive(Debug)]
pub struct Directory {
    name: String,
    entries: Vec<Entry>,
    capacity: usize,
}

impl Directory {
    pub(crate) fn new<S: Into<String>>(name: S, capacity: usize) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the entry names in insertion order.
    pub fn names(&self) -> FileNames<'_> {
        FileNames {
            inner: self.entries.iter(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.name() == name)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name() == name)
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Checks that `name` could be inserted right now.
    pub(crate) fn check_insert(&self, name: &str) -> Result<(), CatalogError> {
        if self.is_full() {
            return Err(CatalogError::CapacityExceeded {
                what: format!("directory '{}'", self.name),
                limit: self.capacity,
            });
        }
        if self.contains(name) {
            return Err(CatalogError::NameCollision(format!("{}/{}", self.name, name)));
        }
        Ok(())
    }

    /// Appends `entry`, keeping names unique and the count within capacity.
    pub(crate) fn insert(&mut self, entry: Entry) -> Result<(), CatalogError> {
        self.check_insert(entry.name())?;
        self.entries.push(entry);
        Ok(())
    }

    /// Removes the entry named `name`, preserving the order of the others.
    pub(crate) fn remove(&mut self, name: &str) -> Option<Entry> {
        self.position(name).map(|i| self.entries.remove(i))
    }
}

/// Entry names of one directory in insertion order.
///
/// Cloning restarts the listing from the current position; the directory cannot change while
/// the listing is alive.
#[derive(Clone)]
pub struct FileNames<'a> {
    inner: slice::Iter<'a, Entry>,
}

impl<'a> Iterator for FileNames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Entry::name)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for FileNames<'_> {}

impl FusedIterator for FileNames<'_> {}
