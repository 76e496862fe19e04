//! Collaborator traits for the scanwarden core.
//!
//! The core talks to storage, the scanning engine, mail delivery and the
//! trash subsystem only through the traits in this module. All of them are
//! synchronous: a single scan blocks its thread, parallelism comes from
//! running independent scans on a worker pool.

use crate::core::error::{ScanError, StorageResult};
use crate::core::types::{ObjectId, Verdict};

use std::fmt::Debug;
use std::io::Read;
use std::sync::Arc;

/// A readable byte stream handed out by a storage backend.
///
/// Dropping the box closes the stream.
pub type ByteStream = Box<dyn Read + Send>;

/// Access to the stored objects being scanned.
///
/// Paths are backend-relative strings. Implementations report a missing
/// object as [`StorageError::NotFound`](crate::core::StorageError::NotFound)
/// and a backend that cannot serve at all as
/// [`StorageError::Unavailable`](crate::core::StorageError::Unavailable).
pub trait StorageBackend: Send + Sync + Debug {
    /// Returns whether an object exists at `path`.
    fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Returns whether `path` is a directory.
    fn is_directory(&self, path: &str) -> StorageResult<bool>;

    /// Returns the byte length of the object.
    fn size(&self, path: &str) -> StorageResult<u64>;

    /// Opens a sequential read stream over the object.
    fn open_read(&self, path: &str) -> StorageResult<ByteStream>;

    /// Removes the object.
    fn delete(&self, path: &str) -> StorageResult<()>;

    /// Returns the owning user of the object, if the backend tracks one.
    fn owner_of(&self, path: &str) -> StorageResult<Option<String>>;

    /// Returns the stable identifier of the object.
    fn resolve_id(&self, path: &str) -> StorageResult<ObjectId>;
}

/// Result of feeding one chunk to a scan session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// The engine wants more input.
    NeedMoreData,
    /// The engine reached a verdict; no more input is needed.
    Verdict(Verdict),
}

/// What the engine reports once the input is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOfInput {
    /// The engine reached a verdict.
    Verdict(Verdict),
    /// The engine confirms it consumed every byte but has no verdict.
    Consumed,
    /// The engine could not consume the whole input.
    Incomplete {
        /// Why the scan is incomplete.
        reason: String,
    },
}

/// One streaming scan over one object.
pub trait ScanSession: Send {
    /// Hands the next chunk of the object to the engine.
    fn feed(&mut self, chunk: &[u8]) -> Result<SessionStatus, ScanError>;

    /// Signals end of input and collects the engine's final answer.
    fn finish(&mut self) -> Result<EndOfInput, ScanError>;
}

/// A malware scanning engine.
///
/// Engines are shared across threads; each scan gets its own session.
pub trait ScanEngine: Send + Sync + Debug {
    /// Returns the name of this engine, e.g. "clamav".
    fn name(&self) -> &str;

    /// Starts a new streaming session.
    fn start_session(&self) -> Result<Box<dyn ScanSession>, ScanError>;
}

/// Delivery of infection notices to administrators.
pub trait NotificationSink: Send + Sync + Debug {
    /// Sends a notification mail about the infected object at `path`.
    ///
    /// Fire-and-forget: implementations log their own failures.
    fn send_mail(&self, path: &str);
}

/// Hooks into a trash/recycle subsystem.
///
/// Removing an infected object must purge it outright; the hooks let the
/// trash subsystem stand aside for the duration of the removal.
pub trait TrashHook: Send + Sync + Debug {
    /// Called right before the object is removed.
    fn pre_delete(&self);

    /// Called right after the removal, whether or not it succeeded.
    fn post_delete(&self);
}

/// An arc-wrapped storage backend for shared ownership.
pub type ArcStorage = Arc<dyn StorageBackend>;

/// An arc-wrapped scan engine for shared ownership.
pub type ArcEngine = Arc<dyn ScanEngine>;
