//! Audit event types and emission functions.

use crate::core::{ObjectId, ScanContext, ScanTarget};
use crate::manager::ScanReport;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of the event published when an engine reports an infection.
pub const CATEGORY_VIRUS_DETECTED: &str = "virus detected";

/// Event message used when the infected object was removed.
pub const MESSAGE_FILE_DELETED: &str = "file deleted";

/// Priority of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditPriority {
    /// Informational.
    Low,
    /// Worth a look.
    Medium,
    /// Needs attention.
    High,
}

/// What an audit event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSubject {
    /// Backend-relative path of the object.
    pub path: String,
    /// Engine details, e.g. the signature name.
    pub details: String,
}

/// An activity entry for the affected user's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub id: String,

    /// When the event was created.
    pub timestamp: DateTime<Utc>,

    /// Event category, e.g. [`CATEGORY_VIRUS_DETECTED`].
    pub category: String,

    /// The object concerned.
    pub object_id: ObjectId,

    /// Path and engine details.
    pub subject: AuditSubject,

    /// Outcome message; empty when nothing was done to the object.
    pub message: String,

    /// Owner of the object at the time of the event.
    pub affected_user: Option<String>,

    /// Event priority.
    pub priority: AuditPriority,
}

impl AuditEvent {
    /// Builds the "virus detected" event for `target`.
    ///
    /// `owner` must be looked up before the object is removed; a deleted
    /// object no longer has one in the backend.
    pub fn virus_detected(
        target: &ScanTarget,
        owner: Option<String>,
        details: impl Into<String>,
        deleted: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            category: CATEGORY_VIRUS_DETECTED.to_string(),
            object_id: target.id().clone(),
            subject: AuditSubject {
                path: target.path().to_string(),
                details: details.into(),
            },
            message: if deleted {
                MESSAGE_FILE_DELETED.to_string()
            } else {
                String::new()
            },
            affected_user: owner,
            priority: AuditPriority::High,
        }
    }
}

/// Emits a trace event for a scan starting.
pub fn emit_scan_started(target: &ScanTarget, engine: &str, context: &ScanContext) {
    tracing::info!(
        target: "scanwarden::audit",
        event_type = "scan_started",
        object_id = %target.id(),
        owner = ?target.owner(),
        path = %target.path(),
        engine = %engine,
        background = context.background,
        request_id = ?context.request_id,
        user_id = ?context.user_id,
        "Scan started"
    );
}

/// Emits a trace event for a completed scan.
pub fn emit_scan_completed(report: &ScanReport, context: &ScanContext) {
    let verdict = match &report.verdict {
        Some(v) if v.is_clean() => "clean",
        Some(v) if v.is_infected() => "infected",
        Some(_) => "unchecked",
        None => "skipped",
    };

    tracing::info!(
        target: "scanwarden::audit",
        event_type = "scan_completed",
        object_id = %report.object_id,
        owner = ?report.owner,
        path = %report.path,
        verdict = %verdict,
        details = report.verdict.as_ref().map(|v| v.details()).unwrap_or(""),
        aborted = report.outcome.is_abort(),
        bytes_scanned = report.bytes_scanned,
        chunks = report.chunks,
        duration_ms = report.duration.as_millis() as u64,
        background = context.background,
        request_id = ?context.request_id,
        "Scan completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn target() -> (Arc<MemoryStorage>, ScanTarget) {
        let storage = Arc::new(MemoryStorage::new().with_file(
            "carol/files/invoice.exe",
            b"MZ".to_vec(),
            Some("carol"),
        ));
        let target = ScanTarget::new(storage.clone(), "carol/files/invoice.exe", None).unwrap();
        (storage, target)
    }

    #[test]
    fn test_virus_detected_event() {
        let (_storage, target) = target();
        let event = AuditEvent::virus_detected(&target, target.owner(), "Win.Trojan.Agent", true);

        assert_eq!(event.category, CATEGORY_VIRUS_DETECTED);
        assert_eq!(event.message, MESSAGE_FILE_DELETED);
        assert_eq!(event.subject.path, "carol/files/invoice.exe");
        assert_eq!(event.subject.details, "Win.Trojan.Agent");
        assert_eq!(event.affected_user.as_deref(), Some("carol"));
        assert_eq!(event.priority, AuditPriority::High);
    }

    #[test]
    fn test_message_empty_when_kept() {
        let (_storage, target) = target();
        let event = AuditEvent::virus_detected(&target, target.owner(), "Eicar", false);
        assert!(event.message.is_empty());
    }

    #[test]
    fn test_owner_is_fresh_and_survives_removal() {
        let (storage, target) = target();
        storage.add_file("carol/files/invoice.exe", b"MZ".to_vec(), Some("dave"));
        let owner = target.owner();
        storage.remove("carol/files/invoice.exe");

        let event = AuditEvent::virus_detected(&target, owner, "Eicar", true);
        assert_eq!(event.affected_user.as_deref(), Some("dave"));
    }
}
