//! Filesystem-based scan record store.

use crate::core::error::{RecordError, RecordResult};
use crate::core::ObjectId;
use crate::records::record::ScanRecord;
use crate::records::traits::ScanRecordStore;

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Stores one JSON document per object id.
///
/// # Directory Structure
///
/// ```text
/// records/
/// ├── 17.json
/// └── 2049-1180.json
/// ```
///
/// Records are written to a temporary file and hard-linked into place, so a
/// reader never sees a half-written document. Linking fails if the target
/// exists, so the directory acts as a unique index: a second insert for the
/// same object fails with `Duplicate`.
#[derive(Debug)]
pub struct FilesystemRecordStore {
    base_path: PathBuf,
}

impl FilesystemRecordStore {
    /// Opens a store at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> RecordResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| RecordError::Unavailable {
            reason: format!("failed to create record directory: {}", e),
        })?;
        Ok(Self { base_path })
    }

    /// Returns the directory holding the records.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn record_path(&self, object_id: &ObjectId) -> PathBuf {
        self.base_path.join(format!("{}.json", file_stem(object_id)))
    }

    fn temp_path(&self, object_id: &ObjectId) -> PathBuf {
        self.base_path.join(format!(
            ".{}.{}.tmp",
            file_stem(object_id),
            uuid::Uuid::new_v4().simple()
        ))
    }

    fn write_temp(&self, path: &Path, content: &[u8]) -> RecordResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(content)
            .and_then(|_| file.sync_all())
            .map_err(|e| RecordError::WriteFailed {
                reason: format!("failed to write record: {}", e),
            })
    }
}

/// Escapes an object id into a safe file name.
fn file_stem(object_id: &ObjectId) -> String {
    object_id
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_string()
            } else {
                format!("%{:02X}", c as u32)
            }
        })
        .collect()
}

impl ScanRecordStore for FilesystemRecordStore {
    fn find_by_object_id(&self, object_id: &ObjectId) -> RecordResult<ScanRecord> {
        let content = match fs::read_to_string(self.record_path(object_id)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RecordError::NotFound {
                    object_id: object_id.to_string(),
                })
            }
            Err(e) => return Err(RecordError::Io(e)),
        };

        serde_json::from_str(&content).map_err(|e| RecordError::Corrupt {
            object_id: object_id.to_string(),
            reason: e.to_string(),
        })
    }

    fn delete(&self, record: &ScanRecord) -> RecordResult<()> {
        self.purge(&record.object_id)
    }

    fn purge(&self, object_id: &ObjectId) -> RecordResult<()> {
        match fs::remove_file(self.record_path(object_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RecordError::NotFound {
                object_id: object_id.to_string(),
            }),
            Err(e) => Err(RecordError::Io(e)),
        }
    }

    fn insert(&self, record: ScanRecord) -> RecordResult<()> {
        let content = serde_json::to_string_pretty(&record).map_err(|e| {
            RecordError::WriteFailed {
                reason: format!("failed to serialize record: {}", e),
            }
        })?;

        let temp = self.temp_path(&record.object_id);
        let linked = self
            .write_temp(&temp, content.as_bytes())
            .and_then(|_| match fs::hard_link(&temp, self.record_path(&record.object_id)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(RecordError::Duplicate {
                    object_id: record.object_id.to_string(),
                }),
                Err(e) => Err(RecordError::Io(e)),
            });

        if let Err(e) = fs::remove_file(&temp) {
            if e.kind() != ErrorKind::NotFound {
                tracing::debug!(path = %temp.display(), error = %e, "Could not remove temp record");
            }
        }
        linked?;

        tracing::debug!(object_id = %record.object_id, "Scan record written");
        Ok(())
    }
}
