//! Upload scan example demonstrating the foreground lifecycle.
//!
//! This example shows how to:
//! - Wire a coordinator over a local directory
//! - Scan freshly uploaded files in foreground context
//! - Turn an abort outcome into a user-facing message
//!
//! Run with: cargo run --example upload_scan

use scanwarden::audit::RecordingAuditSink;
use scanwarden::backends::{MockEngine, EICAR};
use scanwarden::notify::TracingNotifier;
use scanwarden::prelude::*;
use scanwarden::records::FilesystemRecordStore;
use scanwarden::storage::LocalStorage;

use std::fs;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Scanwarden Upload Scan Example ===\n");

    // A throwaway storage root with one user's files
    let root = tempfile::tempdir()?;
    fs::create_dir_all(root.path().join("alice/files"))?;
    fs::write(root.path().join("alice/files/notes.txt"), b"meeting at noon")?;
    fs::write(root.path().join("alice/files/eicar.com"), EICAR)?;

    let audit = Arc::new(RecordingAuditSink::new());
    let coordinator = ScanCoordinator::builder()
        .with_storage(Arc::new(LocalStorage::new(root.path())?))
        .with_engine(Arc::new(
            MockEngine::new().with_signature(EICAR, "Eicar-Test-Signature"),
        ))
        .with_audit(audit.clone())
        .with_notifier(Arc::new(TracingNotifier::new().with_recipient("admin@example.com")))
        .with_records(Arc::new(FilesystemRecordStore::new(root.path().join(".records"))?))
        .with_config(ScannerConfig::new().with_chunk_size(4096))
        .build()?;

    let context = ScanContext::foreground()
        .with_request_id("req-1")
        .with_user_id("alice");

    for path in ["alice/files/notes.txt", "alice/files/eicar.com"] {
        let report = coordinator.scan_path(path, None, &context)?;

        match report.abort_payload() {
            Some(abort) => {
                println!("{} -> upload rejected", path);
                println!("  {}", serde_json::to_string(abort)?);
            }
            None => println!("{} -> accepted ({:?})", path, report.verdict),
        }
    }

    println!(
        "\nInfected file still on disk: {}",
        root.path().join("alice/files/eicar.com").exists()
    );
    for event in audit.events() {
        println!("Audit: {}", serde_json::to_string_pretty(&event)?);
    }

    Ok(())
}
