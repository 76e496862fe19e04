//! Background sweep over many stored objects.

use crate::core::{ScanContext, ScanError};
use crate::manager::coordinator::ScanCoordinator;
use crate::manager::report::ScanReport;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Default number of objects scanned at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Counters for one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Identifier attached to every scan of the sweep as its request id.
    pub sweep_id: String,
    /// Objects that reached a verdict.
    pub scanned: usize,
    /// Objects found clean.
    pub clean: usize,
    /// Objects found infected.
    pub infected: usize,
    /// Objects the engine could not decide on.
    pub unchecked: usize,
    /// Empty objects and directories.
    pub skipped: usize,
    /// Objects whose scan faulted.
    pub failed: usize,
    /// Paths of the faulted objects.
    pub failed_paths: Vec<String>,
}

impl SweepSummary {
    fn record(&mut self, report: &ScanReport) {
        if report.is_skipped() {
            self.skipped += 1;
            return;
        }
        self.scanned += 1;
        if report.is_clean() {
            self.clean += 1;
        } else if report.is_infected() {
            self.infected += 1;
        } else {
            self.unchecked += 1;
        }
    }

    fn record_failure(&mut self, path: Option<String>) {
        self.failed += 1;
        if let Some(path) = path {
            self.failed_paths.push(path);
        }
    }

    /// Returns the number of objects visited.
    pub fn total(&self) -> usize {
        self.scanned + self.skipped + self.failed
    }
}

/// Scans a batch of objects in background context.
///
/// Scans are blocking and run on tokio's blocking pool, bounded by a
/// semaphore. A fault on one object is logged and counted; the sweep moves
/// on to the next object.
#[derive(Debug, Clone)]
pub struct BackgroundSweep {
    coordinator: Arc<ScanCoordinator>,
    max_concurrent: usize,
}

impl BackgroundSweep {
    /// Creates a sweep driven by `coordinator`.
    pub fn new(coordinator: Arc<ScanCoordinator>) -> Self {
        Self {
            coordinator,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Sets how many objects are scanned at once (at least one).
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Returns the concurrency limit.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Scans every path and returns the counters.
    pub async fn run<I, S>(&self, paths: I) -> SweepSummary
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sweep_id = Uuid::new_v4().to_string();
        let context = ScanContext::background().with_request_id(sweep_id.clone());
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks: JoinSet<(String, Result<ScanReport, ScanError>)> = JoinSet::new();

        tracing::info!(
            sweep_id = %sweep_id,
            max_concurrent = self.max_concurrent,
            "Background sweep starting"
        );

        for path in paths {
            let path = path.into();
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let coordinator = Arc::clone(&self.coordinator);
            let context = context.clone();

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = coordinator.scan_path(&path, None, &context);
                (path, result)
            });
        }

        let mut summary = SweepSummary {
            sweep_id,
            ..SweepSummary::default()
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(report))) => summary.record(&report),
                Ok((path, Err(e))) => {
                    tracing::warn!(
                        sweep_id = %summary.sweep_id,
                        path = %path,
                        error = %e,
                        "Background scan failed"
                    );
                    summary.record_failure(Some(path));
                }
                Err(e) => {
                    tracing::warn!(
                        sweep_id = %summary.sweep_id,
                        error = %e,
                        "Background scan task panicked"
                    );
                    summary.record_failure(None);
                }
            }
        }

        tracing::info!(
            sweep_id = %summary.sweep_id,
            scanned = summary.scanned,
            clean = summary.clean,
            infected = summary.infected,
            unchecked = summary.unchecked,
            skipped = summary.skipped,
            failed = summary.failed,
            "Background sweep completed"
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RecordingAuditSink;
    use crate::backends::{MockEngine, EICAR};
    use crate::core::{EndOfInput, InfectedAction, ScannerConfig};
    use crate::records::MemoryRecordStore;
    use crate::storage::MemoryStorage;

    fn sweep(
        storage: Arc<MemoryStorage>,
        engine: MockEngine,
        records: Arc<MemoryRecordStore>,
        config: ScannerConfig,
    ) -> BackgroundSweep {
        let coordinator = ScanCoordinator::builder()
            .with_storage(storage)
            .with_engine(Arc::new(engine))
            .with_audit(Arc::new(RecordingAuditSink::new()))
            .with_records(records)
            .with_config(config)
            .build()
            .unwrap();
        BackgroundSweep::new(Arc::new(coordinator)).with_max_concurrent(2)
    }

    #[tokio::test]
    async fn test_sweep_counts_every_outcome() {
        let storage = Arc::new(
            MemoryStorage::new()
                .with_file("u/files/a.txt", b"plain text".to_vec(), Some("u"))
                .with_file("u/files/b.txt", b"more text".to_vec(), Some("u"))
                .with_file("u/files/eicar.com", EICAR.to_vec(), Some("u"))
                .with_file("u/files/empty", Vec::new(), Some("u"))
                .with_directory("u/files/photos", Some("u")),
        );
        let records = Arc::new(MemoryRecordStore::new());
        let engine = MockEngine::new().with_signature(EICAR, "Eicar-Test-Signature");
        let config = ScannerConfig::new().with_infected_action(InfectedAction::Delete);

        let summary = sweep(storage.clone(), engine, records.clone(), config)
            .run([
                "u/files/a.txt",
                "u/files/b.txt",
                "u/files/eicar.com",
                "u/files/empty",
                "u/files/photos",
                "u/files/gone",
            ])
            .await;

        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.clean, 2);
        assert_eq!(summary.infected, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failed_paths, vec!["u/files/gone".to_string()]);
        assert_eq!(summary.total(), 6);
        assert!(!summary.sweep_id.is_empty());

        assert_eq!(records.len(), 2);
        assert!(!storage.contains("u/files/eicar.com"));
    }

    #[tokio::test]
    async fn test_sweep_continues_after_faults() {
        let storage = Arc::new(
            MemoryStorage::new()
                .with_file("u/files/1", vec![1u8; 32], None)
                .with_file("u/files/2", vec![2u8; 32], None)
                .with_file("u/files/3", vec![3u8; 32], None),
        );
        storage.refuse_open("u/files/2");
        let records = Arc::new(MemoryRecordStore::new());
        let engine = MockEngine::new().with_finish(EndOfInput::Incomplete {
            reason: "engine busy".to_string(),
        });

        let summary = sweep(storage, engine, records.clone(), ScannerConfig::new())
            .run(vec!["u/files/1", "u/files/2", "u/files/3"])
            .await;

        assert_eq!(summary.unchecked, 2);
        assert_eq!(summary.failed, 1);
        assert!(records.is_empty());
    }

    #[test]
    fn test_concurrency_floor() {
        let storage = Arc::new(MemoryStorage::new());
        let records = Arc::new(MemoryRecordStore::new());
        let sweep = sweep(storage, MockEngine::new(), records, ScannerConfig::new())
            .with_max_concurrent(0);
        assert_eq!(sweep.max_concurrent(), 1);
    }
}
