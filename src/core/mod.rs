//! Core types and traits for the scanwarden library.
//!
//! This module provides the building blocks of a single scan:
//!
//! - [`types`] - Object ids, verdicts and the scan context
//! - [`traits`] - Collaborator traits (storage, engine, mail, trash)
//! - [`error`] - Structured error types
//! - [`config`] - Scanner configuration
//! - [`target`] - The scan target
//! - [`reader`] - Chunked stream reading

pub mod config;
pub mod error;
pub mod reader;
pub mod target;
pub mod traits;
pub mod types;

// Re-export commonly used types at the core level
pub use config::{InfectedAction, ScannerConfig, DEFAULT_CHUNK_SIZE};
pub use error::{RecordError, ScanError, StorageError};
pub use reader::ChunkReader;
pub use target::ScanTarget;
pub use traits::{
    ArcEngine, ArcStorage, ByteStream, EndOfInput, NotificationSink, ScanEngine, ScanSession,
    SessionStatus, StorageBackend, TrashHook,
};
pub use types::{ObjectId, ScanContext, Verdict};
