//! Audit sinks.

use crate::audit::events::AuditEvent;

use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

/// Destination for audit events.
///
/// Publishing is fire-and-forget; sinks handle their own failures.
pub trait AuditSink: Send + Sync + Debug {
    /// Publishes an event.
    fn publish(&self, event: AuditEvent);
}

/// An arc-wrapped audit sink for shared ownership.
pub type ArcAuditSink = Arc<dyn AuditSink>;

/// Writes audit events to `tracing` under the `scanwarden::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    /// Creates a new sink.
    pub fn new() -> Self {
        Self
    }
}

impl AuditSink for TracingAuditSink {
    fn publish(&self, event: AuditEvent) {
        tracing::warn!(
            target: "scanwarden::audit",
            event_type = "activity",
            event_id = %event.id,
            category = %event.category,
            object_id = %event.object_id,
            path = %event.subject.path,
            details = %event.subject.details,
            message = %event.message,
            affected_user = ?event.affected_user,
            priority = ?event.priority,
            "Audit event published"
        );
    }
}

/// Keeps every published event in memory.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the published events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many events were published.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for RecordingAuditSink {
    fn publish(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
