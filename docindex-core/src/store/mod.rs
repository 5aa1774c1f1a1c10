//! Fixed-record append-only document store.
//!
//! Not internally synchronized: all operations assume a single caller at
//! a time. The server enforces this by funneling every store access
//! through a single owning task.

mod document;

pub use document::{Document, MAX_AUTHORS_LEN, MAX_PATH_LEN, MAX_TITLE_LEN, RECORD_SIZE};

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{DocIndexError, Result};

/// An open document index file.
///
/// ```no_run
/// use docindex_core::store::{Document, DocumentStore};
///
/// let mut store = DocumentStore::open("index.bin").unwrap();
/// let key = store.add(Document {
///     key: 0,
///     title: "T".into(),
///     authors: "A".into(),
///     path: "f.txt".into(),
///     year: 2020,
/// }).unwrap();
/// assert_eq!(key, 0);
/// ```
pub struct DocumentStore {
    file: File,
}

impl DocumentStore {
    /// Opens (creating if missing) the index file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(DocumentStore { file })
    }

    fn offset(key: i32) -> Result<u64> {
        if key < 0 {
            return Err(DocIndexError::NotFound);
        }
        Ok(key as u64 * RECORD_SIZE as u64)
    }

    fn file_len(&mut self) -> Result<u64> {
        Ok(self.file.seek(SeekFrom::End(0))?)
    }

    /// Appends `doc`, assigning it the next dense key. Returns the
    /// assigned key. `doc.key` is overwritten before the write.
    pub fn add(&mut self, mut doc: Document) -> Result<i32> {
        let end = self.file_len()?;
        let key = (end / RECORD_SIZE as u64) as i32;
        doc.key = key;

        let bytes = doc.encode();
        let written = self.file.write(&bytes)?;
        if written != RECORD_SIZE {
            return Err(DocIndexError::StorageError(
                "short write while adding document".into(),
            ));
        }
        Ok(key)
    }

    /// Reads the document at `key`. Tombstoned rows, and keys past the
    /// end of the file, both surface as `NotFound`.
    pub fn get(&mut self, key: i32) -> Result<Document> {
        let offset = Self::offset(key)?;
        let end = self.file_len()?;
        if offset + RECORD_SIZE as u64 > end {
            return Err(DocIndexError::NotFound);
        }

        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = [0u8; RECORD_SIZE];
        self.file.read_exact(&mut buf)?;

        let doc = Document::decode(&buf);
        if doc.key != key {
            return Err(DocIndexError::NotFound);
        }
        Ok(doc)
    }

    /// Overwrites the row at `key` with a tombstone. Returns `NotFound`
    /// if the row is out of range or already tombstoned.
    pub fn delete(&mut self, key: i32) -> Result<()> {
        // Reuses `get`'s range/liveness check (it returns the live row,
        // which we don't need, but its error path is identical).
        self.get(key)?;

        let offset = Self::offset(key)?;
        self.file.seek(SeekFrom::Start(offset))?;
        let bytes = Document::tombstone().encode();
        let written = self.file.write(&bytes)?;
        if written != RECORD_SIZE {
            return Err(DocIndexError::StorageError(
                "short write while deleting document".into(),
            ));
        }
        Ok(())
    }

    /// Total slot count, including tombstoned rows.
    pub fn total(&mut self) -> Result<usize> {
        Ok((self.file_len()? / RECORD_SIZE as u64) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn doc(title: &str) -> Document {
        Document {
            key: -1,
            title: title.into(),
            authors: "A".into(),
            path: "f.txt".into(),
            year: 2020,
        }
    }

    #[test]
    fn successive_adds_assign_dense_keys() {
        let tmp = NamedTempFile::new().unwrap();
        let mut store = DocumentStore::open(tmp.path()).unwrap();
        assert_eq!(store.add(doc("a")).unwrap(), 0);
        assert_eq!(store.add(doc("b")).unwrap(), 1);
        assert_eq!(store.add(doc("c")).unwrap(), 2);
        assert_eq!(store.total().unwrap(), 3);
    }

    #[test]
    fn delete_tombstones_without_shifting_other_keys() {
        let tmp = NamedTempFile::new().unwrap();
        let mut store = DocumentStore::open(tmp.path()).unwrap();
        store.add(doc("a")).unwrap();
        let k1 = store.add(doc("b")).unwrap();
        store.add(doc("c")).unwrap();

        store.delete(k1).unwrap();

        assert!(matches!(store.get(k1), Err(DocIndexError::NotFound)));
        assert_eq!(store.get(0).unwrap().title, "a");
        assert_eq!(store.get(2).unwrap().title, "c");
        assert_eq!(store.total().unwrap(), 3);
    }

    #[test]
    fn get_out_of_range_is_not_found() {
        let tmp = NamedTempFile::new().unwrap();
        let mut store = DocumentStore::open(tmp.path()).unwrap();
        store.add(doc("a")).unwrap();
        assert!(matches!(store.get(999), Err(DocIndexError::NotFound)));
    }

    #[test]
    fn delete_of_already_deleted_is_not_found() {
        let tmp = NamedTempFile::new().unwrap();
        let mut store = DocumentStore::open(tmp.path()).unwrap();
        let k = store.add(doc("a")).unwrap();
        store.delete(k).unwrap();
        assert!(matches!(store.delete(k), Err(DocIndexError::NotFound)));
    }
}
