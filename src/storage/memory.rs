//! In-memory storage backend.

use crate::core::error::{StorageError, StorageResult};
use crate::core::traits::{ByteStream, StorageBackend};
use crate::core::types::ObjectId;

use std::collections::{HashMap, HashSet};
use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
struct MemoryObject {
    id: ObjectId,
    data: Arc<Vec<u8>>,
    is_directory: bool,
    owner: Option<String>,
    fail_reads_after: Option<usize>,
}

/// An in-memory storage backend.
///
/// Counts stream opens, stream closes and deletions, and can be told to
/// refuse opens or deletes, go offline, or break streams mid-read. Object
/// ids are assigned sequentially starting at 1.
///
/// # Examples
///
/// ```rust
/// use scanwarden::storage::MemoryStorage;
///
/// let storage = MemoryStorage::new()
///     .with_file("alice/files/notes.txt", b"hello".to_vec(), Some("alice"))
///     .with_directory("alice/files", Some("alice"));
/// assert!(storage.contains("alice/files/notes.txt"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, MemoryObject>>,
    next_id: AtomicU64,
    offline: RwLock<Option<String>>,
    refused_opens: RwLock<HashSet<String>>,
    refused_deletes: RwLock<HashSet<String>>,
    opens: AtomicUsize,
    closes: Arc<AtomicUsize>,
    deletes: AtomicUsize,
}

impl MemoryStorage {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file and returns self for chaining.
    pub fn with_file(self, path: impl Into<String>, data: Vec<u8>, owner: Option<&str>) -> Self {
        self.add_file(path, data, owner);
        self
    }

    /// Adds a directory and returns self for chaining.
    pub fn with_directory(self, path: impl Into<String>, owner: Option<&str>) -> Self {
        self.insert(path.into(), Vec::new(), true, owner);
        self
    }

    /// Adds or replaces a file.
    pub fn add_file(&self, path: impl Into<String>, data: Vec<u8>, owner: Option<&str>) -> ObjectId {
        self.insert(path.into(), data, false, owner)
    }

    /// Removes an object without going through [`StorageBackend::delete`].
    pub fn remove(&self, path: &str) -> bool {
        write(&self.objects).remove(path).is_some()
    }

    /// Returns whether an object exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        read(&self.objects).contains_key(path)
    }

    /// Makes every operation fail with `Unavailable`.
    pub fn set_offline(&self, reason: impl Into<String>) {
        *write(&self.offline) = Some(reason.into());
    }

    /// Brings the backend back online.
    pub fn set_online(&self) {
        *write(&self.offline) = None;
    }

    /// Refuses to open streams for `path`.
    pub fn refuse_open(&self, path: impl Into<String>) {
        write(&self.refused_opens).insert(path.into());
    }

    /// Refuses to delete `path`.
    pub fn refuse_delete(&self, path: impl Into<String>) {
        write(&self.refused_deletes).insert(path.into());
    }

    /// Breaks streams of `path` once `bytes` bytes have been read.
    pub fn fail_reads_after(&self, path: &str, bytes: usize) {
        if let Some(object) = write(&self.objects).get_mut(path) {
            object.fail_reads_after = Some(bytes);
        }
    }

    /// Returns how many streams were opened.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Returns how many streams were closed.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Returns how many objects were deleted through the backend.
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn insert(&self, path: String, data: Vec<u8>, is_directory: bool, owner: Option<&str>) -> ObjectId {
        let id = ObjectId::from(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let object = MemoryObject {
            id: id.clone(),
            data: Arc::new(data),
            is_directory,
            owner: owner.map(str::to_string),
            fail_reads_after: None,
        };
        write(&self.objects).insert(path, object);
        id
    }

    fn check_online(&self) -> StorageResult<()> {
        match read(&self.offline).as_ref() {
            Some(reason) => Err(StorageError::unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn object(&self, path: &str) -> StorageResult<MemoryObject> {
        self.check_online()?;
        read(&self.objects)
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_string(),
            })
    }
}

impl StorageBackend for MemoryStorage {
    fn exists(&self, path: &str) -> StorageResult<bool> {
        self.check_online()?;
        Ok(self.contains(path))
    }

    fn is_directory(&self, path: &str) -> StorageResult<bool> {
        Ok(self.object(path)?.is_directory)
    }

    fn size(&self, path: &str) -> StorageResult<u64> {
        Ok(self.object(path)?.data.len() as u64)
    }

    fn open_read(&self, path: &str) -> StorageResult<ByteStream> {
        let object = self.object(path)?;
        if read(&self.refused_opens).contains(path) {
            return Err(StorageError::PermissionDenied {
                path: path.to_string(),
            });
        }
        if object.is_directory {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory", path),
            )));
        }

        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryStream {
            data: object.data,
            position: 0,
            fail_after: object.fail_reads_after,
            closes: Arc::clone(&self.closes),
        }))
    }

    fn delete(&self, path: &str) -> StorageResult<()> {
        self.check_online()?;
        if read(&self.refused_deletes).contains(path) {
            return Err(StorageError::PermissionDenied {
                path: path.to_string(),
            });
        }
        if write(&self.objects).remove(path).is_none() {
            return Err(StorageError::NotFound {
                path: path.to_string(),
            });
        }
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn owner_of(&self, path: &str) -> StorageResult<Option<String>> {
        Ok(self.object(path)?.owner)
    }

    fn resolve_id(&self, path: &str) -> StorageResult<ObjectId> {
        Ok(self.object(path)?.id)
    }
}

/// A read stream over an in-memory object; counts its own close on drop.
struct MemoryStream {
    data: Arc<Vec<u8>>,
    position: usize,
    fail_after: Option<usize>,
    closes: Arc<AtomicUsize>,
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut end = self.data.len();
        if let Some(limit) = self.fail_after {
            if self.position >= limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream was closed"));
            }
            end = end.min(limit);
        }

        let remaining = &self.data[self.position..end];
        let to_copy = buf.len().min(remaining.len());
        buf[..to_copy].copy_from_slice(&remaining[..to_copy]);
        self.position += to_copy;
        Ok(to_copy)
    }
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let storage = MemoryStorage::new();
        let a = storage.add_file("a", vec![1], None);
        let b = storage.add_file("b", vec![2], None);
        assert_eq!(a.as_str(), "1");
        assert_eq!(b.as_str(), "2");
        assert_eq!(storage.resolve_id("b").unwrap(), b);
    }

    #[test]
    fn test_stream_counts_close_on_drop() {
        let storage = MemoryStorage::new().with_file("f", b"abc".to_vec(), None);
        let mut stream = storage.open_read("f").unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
        assert_eq!(storage.close_count(), 0);
        drop(stream);
        assert_eq!(storage.open_count(), 1);
        assert_eq!(storage.close_count(), 1);
    }

    #[test]
    fn test_delete_paths() {
        let storage = MemoryStorage::new()
            .with_file("keep", vec![1], None)
            .with_file("gone", vec![1], None);
        storage.refuse_delete("keep");

        assert!(matches!(
            storage.delete("keep"),
            Err(StorageError::PermissionDenied { .. })
        ));
        storage.delete("gone").unwrap();
        assert!(matches!(storage.delete("gone"), Err(StorageError::NotFound { .. })));
        assert_eq!(storage.delete_count(), 1);
    }

    #[test]
    fn test_offline() {
        let storage = MemoryStorage::new().with_file("f", vec![1], None);
        storage.set_offline("maintenance");
        assert!(matches!(storage.exists("f"), Err(StorageError::Unavailable { .. })));
        storage.set_online();
        assert!(storage.exists("f").unwrap());
    }
}
