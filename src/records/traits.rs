//! Scan record store trait definition.

use crate::core::error::{RecordError, RecordResult};
use crate::core::ObjectId;
use crate::records::record::ScanRecord;

use std::fmt::Debug;
use std::sync::Arc;

/// Trait for scan record storage.
///
/// Stores must tolerate concurrent writes for different object ids; each
/// individual write is atomic. Nothing prevents two records for the same id
/// at this level, which is why writers go through [`upsert`](Self::upsert).
pub trait ScanRecordStore: Send + Sync + Debug {
    /// Looks up the record for `object_id`.
    ///
    /// A miss is reported as [`RecordError::NotFound`].
    fn find_by_object_id(&self, object_id: &ObjectId) -> RecordResult<ScanRecord>;

    /// Removes a record.
    fn delete(&self, record: &ScanRecord) -> RecordResult<()>;

    /// Stores a new record.
    fn insert(&self, record: ScanRecord) -> RecordResult<()>;

    /// Removes whatever is stored for `object_id`, readable or not.
    fn purge(&self, object_id: &ObjectId) -> RecordResult<()>;

    /// Returns how many records exist for `object_id`.
    fn count_for(&self, object_id: &ObjectId) -> RecordResult<usize> {
        match self.find_by_object_id(object_id) {
            Ok(_) => Ok(1),
            Err(e) if e.is_not_found() => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Replaces any record for the object with `record`.
    ///
    /// Delete-then-insert; a missing prior record is not an error and an
    /// unreadable one is purged.
    fn upsert(&self, record: ScanRecord) -> RecordResult<()> {
        match self.find_by_object_id(&record.object_id) {
            Ok(previous) => self.delete(&previous)?,
            Err(RecordError::NotFound { .. }) => {}
            Err(e) if e.is_corrupt() => {
                tracing::warn!(
                    object_id = %record.object_id,
                    error = %e,
                    "Replacing corrupt scan record"
                );
                match self.purge(&record.object_id) {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
        self.insert(record)
    }
}

/// An arc-wrapped record store for shared ownership.
pub type ArcRecordStore = Arc<dyn ScanRecordStore>;
