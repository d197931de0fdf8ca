use std::io::Read;
use std::path::PathBuf;

use crate::catalog::error::CatalogError;
use crate::core::StorageOp;

/// File content read lazily from storage, in chunks of a fixed size.
///
/// Every chunk but the last is exactly `chunk_size` bytes long; an empty file yields nothing.
/// After an error the sequence ends. To read the file again, ask the catalog for a new sequence.
pub struct FileChunks<'a> {
    reader: Box<dyn Read + 'a>,
    path: PathBuf,
    chunk_size: usize,
    done: bool,
}

impl<'a> FileChunks<'a> {
    pub(crate) fn new(reader: Box<dyn Read + 'a>, path: PathBuf, chunk_size: usize) -> Self {
        Self {
            reader,
            path,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }

    /// Concatenates the remaining chunks.
    pub fn read_to_end(self) -> Result<Vec<u8>, CatalogError> {
        let mut content = Vec::new();
        for chunk in self {
            content.extend_from_slice(&chunk?);
        }
        Ok(content)
    }
}

impl Iterator for FileChunks<'_> {
    type Item = Result<Vec<u8>, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = Vec::with_capacity(self.chunk_size);
        match (&mut self.reader)
            .take(self.chunk_size as u64)
            .read_to_end(&mut buf)
        {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(n) => {
                if n < self.chunk_size {
                    self.done = true;
                }
                Some(Ok(buf))
            }
            Err(e) => {
                self.done = true;
                Some(Err(CatalogError::storage(
                    StorageOp::Read,
                    self.path.clone(),
                    e.into(),
                )))
            }
        }
    }
}
