//! Audit events for infected objects and scan lifecycle tracing.
//!
//! Infection events go through an injected [`AuditSink`]; scan start and
//! completion are emitted as structured `tracing` events under the
//! `scanwarden::audit` target so any subscriber (JSON file, OpenTelemetry,
//! ...) can capture them.

mod events;
mod sink;

pub use events::{
    emit_scan_completed, emit_scan_started, AuditEvent, AuditPriority, AuditSubject,
    CATEGORY_VIRUS_DETECTED, MESSAGE_FILE_DELETED,
};
pub use sink::{ArcAuditSink, AuditSink, RecordingAuditSink, TracingAuditSink};
