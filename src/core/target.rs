//! The scan target: one stored object considered for scanning.

use crate::core::error::ScanError;
use crate::core::traits::{ArcStorage, StorageBackend};
use crate::core::types::ObjectId;

/// A candidate object for scanning.
///
/// Construction probes the backend once. Existence is not re-checked
/// afterwards; an object that vanishes later surfaces as an open fault when
/// its stream is read.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    id: ObjectId,
    path: String,
    size_valid: bool,
    is_directory: bool,
    storage: ArcStorage,
}

impl ScanTarget {
    /// Creates a target for the object at `path`.
    ///
    /// When `id` is `None` it is resolved from the backend.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the backend reports the object absent.
    /// - `Backend` if the backend cannot be queried.
    pub fn new(
        storage: ArcStorage,
        path: impl Into<String>,
        id: Option<ObjectId>,
    ) -> Result<Self, ScanError> {
        let path = path.into();

        let exists = storage
            .exists(&path)
            .map_err(|e| ScanError::from_probe(&path, e))?;
        if !exists {
            return Err(ScanError::NotFound { path });
        }

        let is_directory = storage
            .is_directory(&path)
            .map_err(|e| ScanError::from_probe(&path, e))?;
        let size = storage
            .size(&path)
            .map_err(|e| ScanError::from_probe(&path, e))?;
        let id = match id {
            Some(id) => id,
            None => storage
                .resolve_id(&path)
                .map_err(|e| ScanError::from_probe(&path, e))?,
        };

        Ok(Self {
            id,
            path,
            size_valid: size > 0,
            is_directory,
            storage,
        })
    }

    /// Returns the object id.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Returns the backend-relative path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the final path segment.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.path)
    }

    /// Returns whether the object had a non-zero length at construction.
    pub fn size_valid(&self) -> bool {
        self.size_valid
    }

    /// Returns whether the object is a directory.
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Returns `true` if the object should be scanned at all.
    pub fn is_valid(&self) -> bool {
        !self.is_directory && self.size_valid
    }

    /// Resolves the owner from the backend.
    ///
    /// Not cached; a backend failure yields `None`.
    pub fn owner(&self) -> Option<String> {
        match self.storage.owner_of(&self.path) {
            Ok(owner) => owner,
            Err(e) => {
                tracing::debug!(
                    object_id = %self.id,
                    path = %self.path,
                    error = %e,
                    "Could not resolve object owner"
                );
                None
            }
        }
    }

    /// Returns the backend this target lives in.
    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn storage() -> Arc<MemoryStorage> {
        Arc::new(
            MemoryStorage::new()
                .with_file("alice/files/report.pdf", b"%PDF-1.7".to_vec(), Some("alice"))
                .with_file("alice/files/empty.txt", Vec::new(), Some("alice"))
                .with_directory("alice/files/photos", Some("alice")),
        )
    }

    #[test]
    fn test_valid_target() {
        let target = ScanTarget::new(storage(), "alice/files/report.pdf", None).unwrap();
        assert!(target.is_valid());
        assert_eq!(target.file_name(), "report.pdf");
        assert_eq!(target.owner().as_deref(), Some("alice"));
    }

    #[test]
    fn test_supplied_id_is_kept() {
        let target =
            ScanTarget::new(storage(), "alice/files/report.pdf", Some(ObjectId::from(99u64)))
                .unwrap();
        assert_eq!(target.id().as_str(), "99");
    }

    #[test]
    fn test_resolved_id() {
        let storage = storage();
        let expected = storage.resolve_id("alice/files/report.pdf").unwrap();
        let target = ScanTarget::new(storage, "alice/files/report.pdf", None).unwrap();
        assert_eq!(target.id(), &expected);
    }

    #[test]
    fn test_empty_and_directory_are_invalid() {
        let empty = ScanTarget::new(storage(), "alice/files/empty.txt", None).unwrap();
        assert!(!empty.size_valid());
        assert!(!empty.is_valid());

        let dir = ScanTarget::new(storage(), "alice/files/photos", None).unwrap();
        assert!(dir.is_directory());
        assert!(!dir.is_valid());
    }

    #[test]
    fn test_missing_object() {
        let err = ScanTarget::new(storage(), "alice/files/nope", None).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_unusable_backend() {
        let storage = storage();
        storage.set_offline("backend offline");
        let err = ScanTarget::new(storage, "alice/files/report.pdf", None).unwrap_err();
        assert!(matches!(err, ScanError::Backend { .. }));
    }
}
