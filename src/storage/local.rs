//! Local filesystem storage backend.

use crate::core::error::{StorageError, StorageResult};
use crate::core::traits::{ByteStream, StorageBackend};
use crate::core::types::ObjectId;

use std::fs;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

/// Objects stored below a root directory.
///
/// Paths are relative to the root and use `/` separators. The first path
/// segment names the owning user:
///
/// ```text
/// root/
/// ├── alice/
/// │   └── files/report.pdf      # path "alice/files/report.pdf", owner "alice"
/// └── bob/
///     └── files/archive.zip
/// ```
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Creates a backend rooted at `root`.
    ///
    /// The directory must already exist.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StorageError::unavailable(format!(
                "storage root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a backend path onto the filesystem, refusing escapes from the root.
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        if !self.root.is_dir() {
            return Err(StorageError::unavailable(format!(
                "storage root {} is gone",
                self.root.display()
            )));
        }

        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::PermissionDenied {
                path: path.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    fn metadata(&self, path: &str) -> StorageResult<fs::Metadata> {
        let full = self.resolve(path)?;
        fs::metadata(&full).map_err(|e| StorageError::from_io(path, e))
    }
}

impl StorageBackend for LocalStorage {
    fn exists(&self, path: &str) -> StorageResult<bool> {
        let full = self.resolve(path)?;
        full.try_exists().map_err(|e| StorageError::from_io(path, e))
    }

    fn is_directory(&self, path: &str) -> StorageResult<bool> {
        Ok(self.metadata(path)?.is_dir())
    }

    fn size(&self, path: &str) -> StorageResult<u64> {
        Ok(self.metadata(path)?.len())
    }

    fn open_read(&self, path: &str) -> StorageResult<ByteStream> {
        let full = self.resolve(path)?;
        let file = fs::File::open(&full).map_err(|e| StorageError::from_io(path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn delete(&self, path: &str) -> StorageResult<()> {
        let full = self.resolve(path)?;
        fs::remove_file(&full).map_err(|e| StorageError::from_io(path, e))
    }

    fn owner_of(&self, path: &str) -> StorageResult<Option<String>> {
        self.resolve(path)?;
        let mut segments = path.trim_start_matches('/').split('/');
        let owner = segments.next().filter(|s| !s.is_empty());
        Ok(match segments.next() {
            Some(_) => owner.map(str::to_string),
            None => None,
        })
    }

    #[cfg(unix)]
    fn resolve_id(&self, path: &str) -> StorageResult<ObjectId> {
        use std::os::unix::fs::MetadataExt;

        let metadata = self.metadata(path)?;
        Ok(ObjectId::new(format!("{}-{}", metadata.dev(), metadata.ino())))
    }

    #[cfg(not(unix))]
    fn resolve_id(&self, path: &str) -> StorageResult<ObjectId> {
        self.metadata(path)?;
        Ok(ObjectId::new(path.trim_start_matches('/')))
    }
}
