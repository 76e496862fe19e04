//! Verdict processor implementation.

use crate::audit::{ArcAuditSink, AuditEvent};
use crate::core::{InfectedAction, ScanContext, ScanError, ScanTarget, TrashHook, Verdict};
use crate::notify::ArcNotifier;
use crate::policy::action::{AbortPayload, ProcessOutcome};
use crate::records::{ArcRecordStore, ScanRecord};

use std::sync::Arc;

/// Applies the verdict policy to a scanned object.
///
/// | Verdict   | foreground                                   | background                                    |
/// |-----------|----------------------------------------------|-----------------------------------------------|
/// | Infected  | delete, mail, audit, log, abort the request  | delete if configured, audit, log, continue    |
/// | Unchecked | log a warning                                | log a warning                                 |
/// | Clean     | nothing                                      | upsert the scan record, faults are swallowed  |
///
/// Nothing in here panics or returns an error: removal and persistence
/// faults are logged and the scan still counts as processed.
#[derive(Debug, Clone)]
pub struct VerdictProcessor {
    audit: ArcAuditSink,
    notifier: ArcNotifier,
    records: ArcRecordStore,
    trash: Option<Arc<dyn TrashHook>>,
    infected_action: InfectedAction,
}

impl VerdictProcessor {
    /// Creates a processor with no trash hook.
    pub fn new(
        audit: ArcAuditSink,
        notifier: ArcNotifier,
        records: ArcRecordStore,
        infected_action: InfectedAction,
    ) -> Self {
        Self {
            audit,
            notifier,
            records,
            trash: None,
            infected_action,
        }
    }

    /// Sets the trash hook used around removals.
    pub fn with_trash_hook(mut self, hook: Option<Arc<dyn TrashHook>>) -> Self {
        self.trash = hook;
        self
    }

    /// Returns the configured background infected action.
    pub fn infected_action(&self) -> InfectedAction {
        self.infected_action
    }

    /// Processes `verdict` for `target`.
    pub fn process(
        &self,
        target: &ScanTarget,
        verdict: &Verdict,
        context: &ScanContext,
    ) -> ProcessOutcome {
        match verdict {
            Verdict::Infected { details } => self.process_infected(target, details, context),
            Verdict::Unchecked { details } => {
                self.process_unchecked(target, details);
                ProcessOutcome::Continue
            }
            Verdict::Clean => {
                if context.background {
                    self.process_clean(target);
                }
                ProcessOutcome::Continue
            }
        }
    }

    fn process_infected(
        &self,
        target: &ScanTarget,
        details: &str,
        context: &ScanContext,
    ) -> ProcessOutcome {
        let owner = target.owner();

        if context.background {
            let deleted = match self.infected_action {
                InfectedAction::Delete => {
                    let deleted = self.delete_object(target, owner.as_deref()).is_ok();
                    if deleted {
                        tracing::error!(
                            object_id = %target.id(),
                            owner = ?owner,
                            path = %target.path(),
                            details = %details,
                            "Infected file deleted"
                        );
                    } else {
                        tracing::error!(
                            object_id = %target.id(),
                            owner = ?owner,
                            path = %target.path(),
                            details = %details,
                            "Infected file kept after failed deletion"
                        );
                    }
                    deleted
                }
                InfectedAction::Keep => {
                    tracing::error!(
                        object_id = %target.id(),
                        owner = ?owner,
                        path = %target.path(),
                        details = %details,
                        "File is infected"
                    );
                    false
                }
            };
            self.audit
                .publish(AuditEvent::virus_detected(target, owner, details, deleted));
            return ProcessOutcome::Continue;
        }

        tracing::error!(
            object_id = %target.id(),
            owner = ?owner,
            path = %target.path(),
            details = %details,
            request_id = ?context.request_id,
            "Virus(es) found, rejecting upload"
        );
        // The removal result is logged inside; the request aborts either way.
        let _ = self.delete_object(target, owner.as_deref());
        self.notifier.send_mail(target.path());
        self.audit
            .publish(AuditEvent::virus_detected(target, owner, details, true));

        ProcessOutcome::Abort(AbortPayload::virus_detected(
            target.path(),
            target.file_name(),
            details,
        ))
    }

    fn process_unchecked(&self, target: &ScanTarget, details: &str) {
        tracing::warn!(
            object_id = %target.id(),
            owner = ?target.owner(),
            path = %target.path(),
            details = %details,
            "File could not be scanned"
        );
    }

    fn process_clean(&self, target: &ScanTarget) {
        let record = ScanRecord::new(target.id().clone());
        let checked_at = record.checked_at;

        match self.records.upsert(record) {
            Ok(()) => tracing::debug!(
                object_id = %target.id(),
                owner = ?target.owner(),
                path = %target.path(),
                checked_at = %checked_at,
                "Recorded clean scan"
            ),
            Err(e) => {
                let err = ScanError::Persistence(e);
                tracing::error!(
                    object_id = %target.id(),
                    owner = ?target.owner(),
                    path = %target.path(),
                    error = %err,
                    "Failed to record clean scan"
                );
            }
        }
    }

    /// Purges the object, bypassing the trash if a hook is present.
    fn delete_object(&self, target: &ScanTarget, owner: Option<&str>) -> Result<(), ScanError> {
        if let Some(trash) = &self.trash {
            trash.pre_delete();
        }

        let result = target
            .storage()
            .delete(target.path())
            .map_err(|e| ScanError::delete(target.path(), e.to_string()));

        if let Some(trash) = &self.trash {
            trash.post_delete();
        }

        if let Err(ref e) = result {
            tracing::error!(
                object_id = %target.id(),
                owner = ?owner,
                path = %target.path(),
                error = %e,
                "Failed to delete infected file"
            );
        }
        result
    }
}
