//! Scanning engine implementations.
//!
//! This module contains implementations of the `ScanEngine` trait.
//!
//! ## Available Backends
//!
//! - [`mock`] - A scriptable engine for testing
//! - [`clamav`] - ClamAV via the clamd socket protocol (requires `clamav` feature)
//!
//! ## Implementing a Custom Backend
//!
//! An engine hands out one session per scan. The session is fed the object
//! chunk by chunk and may decide early:
//!
//! ```rust,ignore
//! use scanwarden::core::{EndOfInput, ScanEngine, ScanError, ScanSession, SessionStatus};
//!
//! #[derive(Debug)]
//! pub struct MyEngine;
//!
//! struct MySession;
//!
//! impl ScanSession for MySession {
//!     fn feed(&mut self, chunk: &[u8]) -> Result<SessionStatus, ScanError> {
//!         Ok(SessionStatus::NeedMoreData)
//!     }
//!
//!     fn finish(&mut self) -> Result<EndOfInput, ScanError> {
//!         Ok(EndOfInput::Consumed)
//!     }
//! }
//!
//! impl ScanEngine for MyEngine {
//!     fn name(&self) -> &str {
//!         "my-engine"
//!     }
//!
//!     fn start_session(&self) -> Result<Box<dyn ScanSession>, ScanError> {
//!         Ok(Box::new(MySession))
//!     }
//! }
//! ```

pub mod mock;

#[cfg(feature = "clamav")]
pub mod clamav;

// Re-exports
pub use mock::{MockEngine, EICAR};

#[cfg(feature = "clamav")]
pub use clamav::{ClamAvConfig, ClamAvEngine};
