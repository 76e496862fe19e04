//! # Scanwarden
//!
//! Chunked malware scanning of stored files, with verdict-driven delete,
//! notify and record policies.
//!
//! ## Overview
//!
//! Scanwarden takes one stored object at a time through a fixed lifecycle:
//!
//! - Check that the object is worth scanning (non-empty, not a directory)
//! - Stream its bytes to a scanning engine in fixed-size chunks
//! - Stop as soon as the engine decides, or signal end of input
//! - Act on the verdict according to the invocation context
//!
//! An infected upload is removed and the request is aborted with a
//! user-facing message. An infected object found by a background sweep is
//! audited and optionally removed. Clean objects found in the background get
//! a last-checked record.
//!
//! ## Quick Start
//!
//! ```rust
//! use scanwarden::backends::{MockEngine, EICAR};
//! use scanwarden::records::MemoryRecordStore;
//! use scanwarden::storage::MemoryStorage;
//! use scanwarden::{ScanContext, ScanCoordinator};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), scanwarden::ScanError> {
//! let storage = Arc::new(
//!     MemoryStorage::new().with_file("alice/files/eicar.com", EICAR.to_vec(), Some("alice")),
//! );
//!
//! let coordinator = ScanCoordinator::builder()
//!     .with_storage(storage)
//!     .with_engine(Arc::new(MockEngine::new().with_signature(EICAR, "Eicar-Test-Signature")))
//!     .with_records(Arc::new(MemoryRecordStore::new()))
//!     .build()?;
//!
//! let report = coordinator.scan_path("alice/files/eicar.com", None, &ScanContext::foreground())?;
//! if let Some(abort) = report.abort_payload() {
//!     println!("{}", abort.message());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes tokio runtime support
//! - `tokio-runtime` - The background sweep, on tokio's blocking pool
//! - `clamav` - ClamAV backend support
//!
//! ## Architecture
//!
//! - **Core**: Targets, chunked reading, collaborator traits and errors
//! - **Backends**: Scanning engine implementations
//! - **Policy**: Verdict processing and the abort outcome
//! - **Manager**: The per-object coordinator and the background sweep
//! - **Storage**, **Records**, **Notify**, **Audit**: Collaborator implementations

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod core;
pub mod manager;
pub mod notify;
pub mod policy;
pub mod records;
pub mod storage;

// Re-export commonly used types at the crate root
pub use crate::core::{
    ChunkReader, InfectedAction, ObjectId, ScanContext, ScanEngine, ScanError, ScanTarget,
    ScannerConfig, StorageBackend, Verdict,
};

pub use crate::manager::{ScanCoordinator, ScanCoordinatorBuilder, ScanReport};
#[cfg(feature = "tokio-runtime")]
pub use crate::manager::{BackgroundSweep, SweepSummary};
pub use crate::policy::{AbortPayload, ProcessOutcome, VerdictProcessor};
pub use crate::records::{ScanRecord, ScanRecordStore};

/// Prelude module for convenient imports.
///
/// ```rust
/// use scanwarden::prelude::*;
/// ```
pub mod prelude {
    pub use crate::audit::{AuditEvent, AuditSink};
    pub use crate::core::{
        ChunkReader, EndOfInput, InfectedAction, NotificationSink, ObjectId, ScanContext,
        ScanEngine, ScanError, ScanSession, ScanTarget, ScannerConfig, SessionStatus,
        StorageBackend, TrashHook, Verdict,
    };
    #[cfg(feature = "tokio-runtime")]
    pub use crate::manager::{BackgroundSweep, SweepSummary};
    pub use crate::manager::{ScanCoordinator, ScanReport};
    pub use crate::policy::{AbortPayload, ProcessOutcome, VerdictProcessor};
    pub use crate::records::{ScanRecord, ScanRecordStore};
}
