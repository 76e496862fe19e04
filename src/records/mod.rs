//! Persistence of "last checked clean" scan records.
//!
//! This module provides a trait-based abstraction over the record store the
//! verdict processor writes to after a clean background scan, plus an
//! in-memory and a JSON-file implementation.

mod filesystem;
mod memory;
mod record;
mod traits;

pub use filesystem::FilesystemRecordStore;
pub use memory::MemoryRecordStore;
pub use record::ScanRecord;
pub use traits::{ArcRecordStore, ScanRecordStore};
