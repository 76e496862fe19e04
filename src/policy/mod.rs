//! Verdict policy: what happens to an object once the engine has spoken.
//!
//! The [`VerdictProcessor`] dispatches on the verdict and on whether the
//! scan runs in the foreground (interactive request) or in the background
//! (scheduled sweep), and reports back a [`ProcessOutcome`].

mod action;
mod processor;

pub use action::{AbortMessage, AbortPayload, ProcessOutcome};
pub use processor::VerdictProcessor;
