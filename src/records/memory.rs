//! In-memory scan record store.

use crate::core::error::{RecordError, RecordResult};
use crate::core::ObjectId;
use crate::records::record::ScanRecord;
use crate::records::traits::ScanRecordStore;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// A scan record table held in memory.
///
/// Behaves like a table without a unique constraint: inserting twice for the
/// same object keeps both rows. Every call is counted so tests can assert
/// that the store was, or was not, touched.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    rows: RwLock<Vec<ScanRecord>>,
    write_failure: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record and returns self for chaining.
    pub fn with_record(self, record: ScanRecord) -> Self {
        if let Ok(mut rows) = self.rows.write() {
            rows.push(record);
        }
        self
    }

    /// Makes every write fail with `reason`.
    pub fn fail_writes(&self, reason: impl Into<String>) {
        if let Ok(mut failure) = self.write_failure.write() {
            *failure = Some(reason.into());
        }
    }

    /// Returns a snapshot of all records.
    pub fn records(&self) -> Vec<ScanRecord> {
        self.rows.read().map(|rows| rows.clone()).unwrap_or_default()
    }

    /// Returns the total number of records.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many trait calls the store has served.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> RecordResult<()> {
        let failure = self.write_failure.read().map_err(|_| RecordError::Unavailable {
            reason: "lock poisoned".into(),
        })?;
        match failure.as_ref() {
            Some(reason) => Err(RecordError::WriteFailed {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl ScanRecordStore for MemoryRecordStore {
    fn find_by_object_id(&self, object_id: &ObjectId) -> RecordResult<ScanRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.read().map_err(|_| RecordError::Unavailable {
            reason: "lock poisoned".into(),
        })?;
        rows.iter()
            .find(|r| &r.object_id == object_id)
            .cloned()
            .ok_or_else(|| RecordError::NotFound {
                object_id: object_id.to_string(),
            })
    }

    fn delete(&self, record: &ScanRecord) -> RecordResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        let mut rows = self.rows.write().map_err(|_| RecordError::Unavailable {
            reason: "lock poisoned".into(),
        })?;
        let before = rows.len();
        rows.retain(|r| r != record);
        if rows.len() == before {
            return Err(RecordError::NotFound {
                object_id: record.object_id.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&self, record: ScanRecord) -> RecordResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        let mut rows = self.rows.write().map_err(|_| RecordError::Unavailable {
            reason: "lock poisoned".into(),
        })?;
        rows.push(record);
        Ok(())
    }

    fn purge(&self, object_id: &ObjectId) -> RecordResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        let mut rows = self.rows.write().map_err(|_| RecordError::Unavailable {
            reason: "lock poisoned".into(),
        })?;
        let before = rows.len();
        rows.retain(|r| &r.object_id != object_id);
        if rows.len() == before {
            return Err(RecordError::NotFound {
                object_id: object_id.to_string(),
            });
        }
        Ok(())
    }

    fn count_for(&self, object_id: &ObjectId) -> RecordResult<usize> {
        let rows = self.rows.read().map_err(|_| RecordError::Unavailable {
            reason: "lock poisoned".into(),
        })?;
        Ok(rows.iter().filter(|r| &r.object_id == object_id).count())
    }
}
