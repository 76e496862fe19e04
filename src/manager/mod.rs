//! Scan coordination.
//!
//! The [`ScanCoordinator`] drives one object through reading, engine
//! scanning and verdict processing. With the `tokio-runtime` feature the
//! [`BackgroundSweep`] runs the coordinator over many objects at once.

mod coordinator;
mod report;
#[cfg(feature = "tokio-runtime")]
mod sweep;

pub use coordinator::{ScanCoordinator, ScanCoordinatorBuilder};
pub use report::ScanReport;
#[cfg(feature = "tokio-runtime")]
pub use sweep::{BackgroundSweep, SweepSummary, DEFAULT_MAX_CONCURRENT};
