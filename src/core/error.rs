//! Error types for the scanwarden library.
//!
//! Scan-level faults live in [`ScanError`]; the collaborator seams have their
//! own enums ([`StorageError`] for storage backends, [`RecordError`] for scan
//! record stores) that are mapped into `ScanError` where the core surfaces
//! them. The library never panics; all errors are returned as `Result` values.

use thiserror::Error;

/// The main error type for scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The target does not exist in the storage backend.
    #[error("object not found: {path}")]
    NotFound {
        /// Backend-relative path that was not found.
        path: String,
    },

    /// The storage backend is unusable.
    #[error("storage backend unavailable for '{path}': {reason}")]
    Backend {
        /// Path being probed when the backend failed.
        path: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The backend refused to open a read stream for the target.
    #[error("cannot open '{path}' for reading: {reason}")]
    Open {
        /// Path of the target.
        path: String,
        /// Reason reported by the backend.
        reason: String,
    },

    /// Reading from an already opened stream failed.
    #[error("read from '{path}' failed: {source}")]
    Read {
        /// Path of the target.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The scanning engine failed mid-session.
    #[error("engine '{engine}' failed: {reason}")]
    Engine {
        /// Name of the engine.
        engine: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Removing an infected object failed.
    #[error("failed to delete '{path}': {reason}")]
    Delete {
        /// Path of the object.
        path: String,
        /// Reason reported by the backend.
        reason: String,
    },

    /// The scan record store rejected a write.
    #[error("scan record persistence failed: {0}")]
    Persistence(#[from] RecordError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl ScanError {
    /// Returns `true` if this error ends processing of the current target.
    ///
    /// `Delete` and `Persistence` faults are logged by the verdict processor
    /// and never end a scan.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Delete { .. } | Self::Persistence(_))
    }

    /// Returns the object path if this error is associated with one.
    pub fn object_path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path }
            | Self::Backend { path, .. }
            | Self::Open { path, .. }
            | Self::Read { path, .. }
            | Self::Delete { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Maps a storage failure during target construction.
    ///
    /// A missing object becomes `NotFound`, anything else means the backend
    /// itself cannot be used.
    pub fn from_probe(path: impl Into<String>, err: StorageError) -> Self {
        let path = path.into();
        match err {
            StorageError::NotFound { .. } => Self::NotFound { path },
            other => Self::Backend {
                path,
                reason: other.to_string(),
            },
        }
    }

    /// Creates an `Open` error.
    pub fn open(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `Engine` error.
    pub fn engine(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Engine {
            engine: engine.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Delete` error.
    pub fn delete(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Delete {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Error type for storage backend operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object does not exist.
    #[error("no such object: {path}")]
    NotFound {
        /// Path that was not found.
        path: String,
    },

    /// Access to the object was denied.
    #[error("permission denied: {path}")]
    PermissionDenied {
        /// Path that was denied.
        path: String,
    },

    /// The backend cannot serve requests at all.
    #[error("storage unavailable: {reason}")]
    Unavailable {
        /// Reason for unavailability.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Classifies an I/O error raised while touching `path`.
    pub fn from_io(path: impl Into<String>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path: path.into() },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: path.into() },
            _ => Self::Io(err),
        }
    }

    /// Creates an `Unavailable` error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Error type for scan record store operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// No record exists for the object.
    #[error("no scan record for object {object_id}")]
    NotFound {
        /// The object id that was looked up.
        object_id: String,
    },

    /// A record for the object already exists.
    #[error("scan record for object {object_id} already exists")]
    Duplicate {
        /// The conflicting object id.
        object_id: String,
    },

    /// A stored record exists but cannot be decoded.
    #[error("corrupt scan record for object {object_id}: {reason}")]
    Corrupt {
        /// The object id whose record is unreadable.
        object_id: String,
        /// Decoder message.
        reason: String,
    },

    /// The store failed to write.
    #[error("failed to write scan record: {reason}")]
    WriteFailed {
        /// Reason for the failure.
        reason: String,
    },

    /// The store cannot serve requests.
    #[error("record store unavailable: {reason}")]
    Unavailable {
        /// Reason for unavailability.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecordError {
    /// Returns `true` if this is a lookup miss rather than a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if a record exists but is unreadable.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// A specialized `Result` type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// A specialized `Result` type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A specialized `Result` type for record store operations.
pub type RecordResult<T> = Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_mapping() {
        let missing = ScanError::from_probe(
            "files/a.txt",
            StorageError::NotFound {
                path: "files/a.txt".into(),
            },
        );
        assert!(matches!(missing, ScanError::NotFound { .. }));

        let broken = ScanError::from_probe("files/a.txt", StorageError::unavailable("mount lost"));
        assert!(matches!(broken, ScanError::Backend { .. }));
        assert!(broken.to_string().contains("mount lost"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ScanError::open("a", "gone").is_fatal());
        assert!(!ScanError::delete("a", "busy").is_fatal());
        assert!(!ScanError::Persistence(RecordError::WriteFailed {
            reason: "disk full".into()
        })
        .is_fatal());
    }

    #[test]
    fn test_object_path() {
        assert_eq!(ScanError::open("files/x", "denied").object_path(), Some("files/x"));
        assert_eq!(ScanError::engine("clamav", "reset").object_path(), None);
    }

    #[test]
    fn test_storage_error_from_io() {
        let err = StorageError::from_io(
            "p",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, StorageError::PermissionDenied { .. }));

        let err = StorageError::from_io("p", std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert!(matches!(err, StorageError::Io(_)));
    }
}
