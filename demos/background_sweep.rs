//! Background sweep example.
//!
//! This example shows how to:
//! - Run a coordinator over many objects with bounded concurrency
//! - Delete infected objects found in the background
//! - Read the sweep summary
//!
//! Run with: cargo run --example background_sweep

use scanwarden::backends::{MockEngine, EICAR};
use scanwarden::prelude::*;
use scanwarden::records::MemoryRecordStore;
use scanwarden::storage::MemoryStorage;

use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Scanwarden Background Sweep Example ===\n");

    let storage = Arc::new(MemoryStorage::new());
    let mut paths = Vec::new();
    for i in 0..20 {
        let path = format!("bob/files/report-{:02}.txt", i);
        storage.add_file(path.as_str(), format!("report number {}", i).into_bytes(), Some("bob"));
        paths.push(path);
    }
    storage.add_file("bob/files/dropper.exe", EICAR.to_vec(), Some("bob"));
    storage.add_file("bob/files/empty.log", Vec::new(), Some("bob"));
    paths.push("bob/files/dropper.exe".to_string());
    paths.push("bob/files/empty.log".to_string());
    paths.push("bob/files/already-gone.txt".to_string());

    let records = Arc::new(MemoryRecordStore::new());
    let coordinator = ScanCoordinator::builder()
        .with_storage(storage.clone())
        .with_engine(Arc::new(
            MockEngine::new().with_signature(EICAR, "Eicar-Test-Signature"),
        ))
        .with_records(records.clone())
        .with_config(ScannerConfig::new().with_infected_action(InfectedAction::Delete))
        .build()?;

    let summary = BackgroundSweep::new(Arc::new(coordinator))
        .with_max_concurrent(4)
        .run(paths)
        .await;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("Clean records written: {}", records.len());
    println!("Dropper removed: {}", !storage.contains("bob/files/dropper.exe"));

    Ok(())
}
