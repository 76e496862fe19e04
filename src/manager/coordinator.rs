//! The scan coordinator implementation.

use crate::audit::{emit_scan_completed, emit_scan_started, ArcAuditSink, TracingAuditSink};
use crate::core::{
    ArcEngine, ArcStorage, ChunkReader, EndOfInput, ObjectId, ScanContext, ScanError,
    ScanTarget, ScannerConfig, SessionStatus, TrashHook, Verdict,
};
use crate::manager::report::ScanReport;
use crate::notify::{ArcNotifier, TracingNotifier};
use crate::policy::VerdictProcessor;
use crate::records::ArcRecordStore;

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Builder for creating a `ScanCoordinator`.
///
/// Storage, engine and record store are required. Audit and mail default to
/// the tracing-backed sinks.
#[derive(Default)]
pub struct ScanCoordinatorBuilder {
    storage: Option<ArcStorage>,
    engine: Option<ArcEngine>,
    audit: Option<ArcAuditSink>,
    notifier: Option<ArcNotifier>,
    records: Option<ArcRecordStore>,
    trash: Option<Arc<dyn TrashHook>>,
    config: ScannerConfig,
}

impl ScanCoordinatorBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the storage backend.
    pub fn with_storage(mut self, storage: ArcStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the scanning engine.
    pub fn with_engine(mut self, engine: ArcEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the audit sink.
    pub fn with_audit(mut self, audit: ArcAuditSink) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Sets the notification sink.
    pub fn with_notifier(mut self, notifier: ArcNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the scan record store.
    pub fn with_records(mut self, records: ArcRecordStore) -> Self {
        self.records = Some(records);
        self
    }

    /// Sets the trash hook.
    pub fn with_trash_hook(mut self, hook: Arc<dyn TrashHook>) -> Self {
        self.trash = Some(hook);
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the coordinator.
    pub fn build(self) -> Result<ScanCoordinator, ScanError> {
        self.config.validate()?;

        let storage = self
            .storage
            .ok_or_else(|| ScanError::configuration("A storage backend is required"))?;
        let engine = self
            .engine
            .ok_or_else(|| ScanError::configuration("A scanning engine is required"))?;
        let records = self
            .records
            .ok_or_else(|| ScanError::configuration("A scan record store is required"))?;
        let audit = self
            .audit
            .unwrap_or_else(|| Arc::new(TracingAuditSink::new()));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier::new()));

        let processor =
            VerdictProcessor::new(audit, notifier, records, self.config.infected_action)
                .with_trash_hook(self.trash);

        Ok(ScanCoordinator {
            storage,
            engine,
            processor,
            config: self.config,
        })
    }
}

/// Drives a single object through the scan lifecycle.
///
/// A scan reads the object chunk by chunk, feeds an engine session until it
/// decides or the input ends, then hands the verdict to the
/// [`VerdictProcessor`]. The coordinator holds no per-scan state and can be
/// shared across threads.
#[derive(Debug)]
pub struct ScanCoordinator {
    storage: ArcStorage,
    engine: ArcEngine,
    processor: VerdictProcessor,
    config: ScannerConfig,
}

impl ScanCoordinator {
    /// Creates a new builder.
    pub fn builder() -> ScanCoordinatorBuilder {
        ScanCoordinatorBuilder::new()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Returns the engine name.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Builds a target for `path` in the configured backend and scans it.
    ///
    /// # Errors
    ///
    /// Probe faults (`NotFound`, `Backend`) plus everything [`scan`](Self::scan)
    /// returns.
    pub fn scan_path(
        &self,
        path: &str,
        id: Option<ObjectId>,
        context: &ScanContext,
    ) -> Result<ScanReport, ScanError> {
        let target = ScanTarget::new(Arc::clone(&self.storage), path, id)?;
        self.scan(&target, context)
    }

    /// Scans `target` and processes the verdict.
    ///
    /// Targets that are empty or directories are skipped: no engine session
    /// is started and the report carries no verdict.
    ///
    /// # Errors
    ///
    /// `Open`, `Read` and `Engine` faults abort the scan before any verdict
    /// is processed.
    pub fn scan(&self, target: &ScanTarget, context: &ScanContext) -> Result<ScanReport, ScanError> {
        let started = Instant::now();
        let mut report = ScanReport::new(target, self.engine.name(), Utc::now());

        if !target.is_valid() {
            tracing::debug!(
                object_id = %target.id(),
                owner = ?target.owner(),
                path = %target.path(),
                is_directory = target.is_directory(),
                "Skipping object that is not scannable"
            );
            report.duration = started.elapsed();
            return Ok(report);
        }

        emit_scan_started(target, self.engine.name(), context);

        // The reader must be dropped before processing so the stream is
        // closed when an infected object gets removed.
        let verdict = {
            let mut reader = ChunkReader::new(target, self.config.chunk_size);
            let verdict = self.run_session(&mut reader);
            report.bytes_scanned = reader.bytes_read();
            report.chunks = reader.chunks_read();
            verdict
        };

        let verdict = match verdict {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(
                    object_id = %target.id(),
                    owner = ?target.owner(),
                    path = %target.path(),
                    engine = %self.engine.name(),
                    error = %e,
                    "Scan failed"
                );
                return Err(e);
            }
        };

        report.outcome = self.processor.process(target, &verdict, context);
        report.verdict = Some(verdict);
        report.duration = started.elapsed();

        emit_scan_completed(&report, context);
        Ok(report)
    }

    fn run_session(&self, reader: &mut ChunkReader<'_>) -> Result<Verdict, ScanError> {
        let mut session = self.engine.start_session()?;

        while let Some(chunk) = reader.next_chunk()? {
            if let SessionStatus::Verdict(verdict) = session.feed(&chunk)? {
                return Ok(verdict);
            }
        }

        Ok(match session.finish()? {
            EndOfInput::Verdict(verdict) => verdict,
            EndOfInput::Consumed if self.config.clean_when_consumed => Verdict::Clean,
            EndOfInput::Consumed => {
                Verdict::unchecked("Engine consumed the input without a verdict")
            }
            EndOfInput::Incomplete { reason } => Verdict::unchecked(reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{RecordingAuditSink, MESSAGE_FILE_DELETED};
    use crate::backends::{MockEngine, EICAR};
    use crate::core::InfectedAction;
    use crate::notify::RecordingNotifier;
    use crate::records::{MemoryRecordStore, ScanRecordStore};
    use crate::storage::{MemoryStorage, RecordingTrashHook};

    const PATH: &str = "dave/files/download.zip";

    struct Fixture {
        storage: Arc<MemoryStorage>,
        engine: Arc<MockEngine>,
        audit: Arc<RecordingAuditSink>,
        notifier: Arc<RecordingNotifier>,
        records: Arc<MemoryRecordStore>,
        trash: Arc<RecordingTrashHook>,
    }

    impl Fixture {
        fn new(engine: MockEngine, data: Vec<u8>) -> Self {
            Self {
                storage: Arc::new(MemoryStorage::new().with_file(PATH, data, Some("dave"))),
                engine: Arc::new(engine),
                audit: Arc::new(RecordingAuditSink::new()),
                notifier: Arc::new(RecordingNotifier::new()),
                records: Arc::new(MemoryRecordStore::new()),
                trash: Arc::new(RecordingTrashHook::new()),
            }
        }

        fn coordinator(&self, config: ScannerConfig) -> ScanCoordinator {
            ScanCoordinator::builder()
                .with_storage(self.storage.clone())
                .with_engine(self.engine.clone())
                .with_audit(self.audit.clone())
                .with_notifier(self.notifier.clone())
                .with_records(self.records.clone())
                .with_trash_hook(self.trash.clone())
                .with_config(config)
                .build()
                .unwrap()
        }
    }

    fn infected_payload() -> Vec<u8> {
        let mut data = vec![b'.'; 100];
        data.extend_from_slice(EICAR);
        data.extend_from_slice(&[b'.'; 100]);
        data
    }

    #[test]
    fn test_clean_background_scan_records() {
        let fx = Fixture::new(MockEngine::new(), vec![1u8; 100]);
        let coordinator = fx.coordinator(ScannerConfig::new().with_chunk_size(32));

        let report = coordinator
            .scan_path(PATH, None, &ScanContext::background())
            .unwrap();

        assert!(report.is_clean());
        assert!(!report.outcome.is_abort());
        assert_eq!(report.bytes_scanned, 100);
        assert_eq!(report.chunks, 4);
        assert_eq!(report.engine, "mock");
        assert_eq!(fx.records.count_for(&report.object_id).unwrap(), 1);
        assert_eq!(fx.engine.finish_count(), 1);
        assert_eq!(fx.storage.close_count(), 1);
    }

    #[test]
    fn test_clean_foreground_scan_does_not_record() {
        let fx = Fixture::new(MockEngine::new(), vec![1u8; 10]);
        let report = fx
            .coordinator(ScannerConfig::new())
            .scan_path(PATH, None, &ScanContext::foreground())
            .unwrap();

        assert!(report.is_clean());
        assert!(fx.records.is_empty());
    }

    #[test]
    fn test_early_verdict_stops_reading() {
        let engine = MockEngine::new().with_signature(EICAR, "Eicar-Test-Signature");
        let mut data = infected_payload();
        data.extend_from_slice(&vec![0u8; 10_000]);
        let fx = Fixture::new(engine, data);

        let report = fx
            .coordinator(ScannerConfig::new().with_chunk_size(64))
            .scan_path(PATH, None, &ScanContext::background())
            .unwrap();

        assert!(report.is_infected());
        assert!(report.bytes_scanned < 1000);
        assert_eq!(fx.engine.finish_count(), 0);
        assert_eq!(fx.storage.open_count(), 1);
        assert_eq!(fx.storage.close_count(), 1);
    }

    #[test]
    fn test_infected_upload_aborts_and_removes() {
        let engine = MockEngine::new().with_signature(EICAR, "Eicar-Test-Signature");
        let fx = Fixture::new(engine, infected_payload());

        let report = fx
            .coordinator(ScannerConfig::new())
            .scan_path(PATH, None, &ScanContext::foreground())
            .unwrap();

        let payload = report.abort_payload().unwrap();
        assert_eq!(
            payload.message(),
            "Virus detected! Can't upload the file download.zip"
        );
        assert!(!fx.storage.contains(PATH));
        assert_eq!(fx.notifier.sent(), vec![PATH.to_string()]);
        let events = fx.audit.events();
        assert_eq!(events[0].message, MESSAGE_FILE_DELETED);
        assert_eq!(events[0].affected_user.as_deref(), Some("dave"));
        assert_eq!(report.owner.as_deref(), Some("dave"));
        assert_eq!(fx.trash.pre_calls(), 1);
        assert_eq!(fx.trash.post_calls(), 1);
    }

    #[test]
    fn test_infected_background_keeps_by_default() {
        let fx = Fixture::new(MockEngine::new_infected("Win.Trojan.Agent"), vec![9u8; 50]);

        let report = fx
            .coordinator(ScannerConfig::new())
            .scan_path(PATH, None, &ScanContext::background())
            .unwrap();

        assert!(report.is_infected());
        assert!(!report.outcome.is_abort());
        assert!(fx.storage.contains(PATH));
        assert_eq!(fx.audit.len(), 1);
        assert_eq!(fx.notifier.count(), 0);
        assert!(fx.records.is_empty());
    }

    #[test]
    fn test_infected_background_delete() {
        let fx = Fixture::new(MockEngine::new_infected("Win.Trojan.Agent"), vec![9u8; 50]);
        let config = ScannerConfig::new().with_infected_action(InfectedAction::Delete);

        fx.coordinator(config)
            .scan_path(PATH, None, &ScanContext::background())
            .unwrap();

        assert!(!fx.storage.contains(PATH));
        assert_eq!(fx.storage.delete_count(), 1);
    }

    #[test]
    fn test_consumed_without_verdict() {
        let fx = Fixture::new(
            MockEngine::new().with_finish(EndOfInput::Consumed),
            vec![3u8; 20],
        );

        let report = fx
            .coordinator(ScannerConfig::new())
            .scan_path(PATH, None, &ScanContext::background())
            .unwrap();
        assert!(report.is_unchecked());
        assert!(fx.records.is_empty());

        let report = fx
            .coordinator(ScannerConfig::new().with_clean_when_consumed(true))
            .scan_path(PATH, None, &ScanContext::background())
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(fx.records.len(), 1);
    }

    #[test]
    fn test_incomplete_is_unchecked() {
        let fx = Fixture::new(
            MockEngine::new().with_finish(EndOfInput::Incomplete {
                reason: "stream limit reached".to_string(),
            }),
            vec![3u8; 20],
        );

        let report = fx
            .coordinator(ScannerConfig::new())
            .scan_path(PATH, None, &ScanContext::foreground())
            .unwrap();
        assert_eq!(
            report.verdict,
            Some(Verdict::unchecked("stream limit reached"))
        );
        assert!(!report.outcome.is_abort());
    }

    #[test]
    fn test_invalid_targets_are_skipped() {
        let fx = Fixture::new(MockEngine::new(), Vec::new());
        fx.storage.add_file("dave/files/empty.txt", Vec::new(), Some("dave"));
        let storage = Arc::new(MemoryStorage::new().with_directory("dave/files", Some("dave")));
        let coordinator = fx.coordinator(ScannerConfig::new());

        let report = coordinator
            .scan_path("dave/files/empty.txt", None, &ScanContext::background())
            .unwrap();
        assert!(report.is_skipped());

        let dir = ScanTarget::new(storage, "dave/files", None).unwrap();
        let report = coordinator.scan(&dir, &ScanContext::background()).unwrap();
        assert!(report.is_skipped());

        assert_eq!(fx.engine.session_count(), 0);
        assert_eq!(fx.storage.open_count(), 0);
        assert!(fx.records.is_empty());
    }

    #[test]
    fn test_faults_propagate_without_processing() {
        let fx = Fixture::new(MockEngine::new().with_start_failure("daemon down"), vec![1u8; 8]);
        let err = fx
            .coordinator(ScannerConfig::new())
            .scan_path(PATH, None, &ScanContext::background())
            .unwrap_err();
        assert!(matches!(err, ScanError::Engine { .. }));
        assert_eq!(fx.storage.open_count(), 0);

        let fx = Fixture::new(MockEngine::new(), vec![1u8; 64]);
        fx.storage.fail_reads_after(PATH, 16);
        let err = fx
            .coordinator(ScannerConfig::new().with_chunk_size(16))
            .scan_path(PATH, None, &ScanContext::background())
            .unwrap_err();
        assert!(matches!(err, ScanError::Read { .. }));
        assert!(fx.records.is_empty());
        assert_eq!(fx.storage.close_count(), 1);

        let fx = Fixture::new(MockEngine::new(), vec![1u8; 8]);
        let err = fx
            .coordinator(ScannerConfig::new())
            .scan_path("dave/files/missing", None, &ScanContext::background())
            .unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_object_log_lines_carry_owner() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let engine = MockEngine::new().with_signature(EICAR, "Eicar-Test-Signature");
        let fx = Fixture::new(engine, infected_payload());
        fx.storage.add_file("dave/files/clean.txt", vec![1u8; 40], Some("dave"));
        fx.storage.add_file("dave/files/empty.txt", Vec::new(), Some("dave"));

        tracing::subscriber::with_default(subscriber, || {
            let coordinator = fx.coordinator(ScannerConfig::new().with_chunk_size(16));
            for path in ["dave/files/clean.txt", "dave/files/empty.txt", PATH] {
                coordinator
                    .scan_path(path, None, &ScanContext::background())
                    .unwrap();
            }
            coordinator
                .scan_path(PATH, None, &ScanContext::foreground())
                .unwrap();
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let object_lines: Vec<&str> = output
            .lines()
            .filter(|line| line.contains("object_id="))
            .collect();
        assert!(object_lines.len() >= 8);
        for line in object_lines {
            assert!(line.contains("owner=Some(\"dave\")"), "missing owner: {}", line);
        }
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let err = ScanCoordinator::builder()
            .with_engine(Arc::new(MockEngine::new()))
            .with_records(Arc::new(MemoryRecordStore::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ScanError::Configuration { .. }));

        let fx = Fixture::new(MockEngine::new(), vec![1u8]);
        let err = ScanCoordinator::builder()
            .with_storage(fx.storage.clone())
            .with_engine(fx.engine.clone())
            .with_records(fx.records.clone())
            .with_config(ScannerConfig::new().with_chunk_size(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ScanError::Configuration { .. }));
    }
}
