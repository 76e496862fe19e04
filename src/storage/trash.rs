//! Trash subsystem hooks.

use crate::core::TrashHook;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Trash hook that tracks whether the trash is currently bypassed.
///
/// A real trash integration disables its own interception between
/// `pre_delete` and `post_delete`; this one just records the calls.
#[derive(Debug, Default)]
pub struct RecordingTrashHook {
    bypassed: AtomicBool,
    pre_calls: AtomicUsize,
    post_calls: AtomicUsize,
}

impl RecordingTrashHook {
    /// Creates a new hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` between `pre_delete` and `post_delete`.
    pub fn is_bypassed(&self) -> bool {
        self.bypassed.load(Ordering::SeqCst)
    }

    /// Returns how many times `pre_delete` ran.
    pub fn pre_calls(&self) -> usize {
        self.pre_calls.load(Ordering::SeqCst)
    }

    /// Returns how many times `post_delete` ran.
    pub fn post_calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }
}

impl TrashHook for RecordingTrashHook {
    fn pre_delete(&self) {
        self.pre_calls.fetch_add(1, Ordering::SeqCst);
        self.bypassed.store(true, Ordering::SeqCst);
        tracing::debug!("Trash bypassed for purge");
    }

    fn post_delete(&self) {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        self.bypassed.store(false, Ordering::SeqCst);
        tracing::debug!("Trash restored after purge");
    }
}
