//! Storage backend implementations.
//!
//! - [`MemoryStorage`] - an instrumented in-memory backend for tests
//! - [`LocalStorage`] - objects stored under a directory on the local filesystem
//! - [`RecordingTrashHook`] - a trash hook that records bypass calls

mod local;
mod memory;
mod trash;

pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use trash::RecordingTrashHook;
