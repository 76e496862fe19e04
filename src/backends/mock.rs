//! Mock engine for testing.
//!
//! This module provides a scriptable engine that simulates the ways a real
//! engine can answer a streaming scan, without requiring a daemon.

use crate::core::{EndOfInput, ScanEngine, ScanError, ScanSession, SessionStatus, Verdict};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The EICAR anti-malware test string.
pub const EICAR: &[u8] =
    b"X5O!P%@AP[4\\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

/// A mock engine for testing purposes.
///
/// By default every session consumes all input and finishes with a clean
/// verdict. Sessions can be scripted to detect a byte signature, decide
/// early after a number of bytes, finish without a verdict, or fail.
///
/// # Examples
///
/// ```rust
/// use scanwarden::backends::{MockEngine, EICAR};
/// use scanwarden::core::{EndOfInput, Verdict};
///
/// // Reports any stream containing the EICAR string as infected
/// let engine = MockEngine::new().with_signature(EICAR, "Eicar-Test-Signature");
///
/// // Swallows everything and never decides
/// let engine = MockEngine::new().with_finish(EndOfInput::Consumed);
///
/// // Decides after the first kilobyte
/// let engine = MockEngine::new().with_verdict_after(1024, Verdict::infected("Big.File"));
/// ```
#[derive(Debug)]
pub struct MockEngine {
    name: String,
    signature: Option<(Vec<u8>, String)>,
    verdict_after: Option<(u64, Verdict)>,
    finish: EndOfInput,
    fail_start: Option<String>,
    fail_feed_after: Option<u64>,
    sessions: AtomicU64,
    bytes_fed: Arc<AtomicU64>,
    finishes: Arc<AtomicU64>,
}

impl MockEngine {
    /// Creates a mock engine that reports everything clean.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            signature: None,
            verdict_after: None,
            finish: EndOfInput::Verdict(Verdict::Clean),
            fail_start: None,
            fail_feed_after: None,
            sessions: AtomicU64::new(0),
            bytes_fed: Arc::new(AtomicU64::new(0)),
            finishes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates a mock engine that reports everything as infected once the
    /// input ends.
    pub fn new_infected(details: impl Into<String>) -> Self {
        Self::new().with_finish(EndOfInput::Verdict(Verdict::infected(details)))
    }

    /// Sets the name of this engine.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reports `details` as soon as `pattern` has been seen in the stream.
    ///
    /// Matches spanning chunk boundaries are found too.
    pub fn with_signature(mut self, pattern: &[u8], details: impl Into<String>) -> Self {
        self.signature = Some((pattern.to_vec(), details.into()));
        self
    }

    /// Returns `verdict` from `feed` once at least `bytes` have been fed.
    pub fn with_verdict_after(mut self, bytes: u64, verdict: Verdict) -> Self {
        self.verdict_after = Some((bytes, verdict));
        self
    }

    /// Sets the answer given at end of input.
    pub fn with_finish(mut self, finish: EndOfInput) -> Self {
        self.finish = finish;
        self
    }

    /// Makes every `start_session` fail.
    pub fn with_start_failure(mut self, reason: impl Into<String>) -> Self {
        self.fail_start = Some(reason.into());
        self
    }

    /// Makes `feed` fail after `calls` successful calls.
    pub fn with_feed_failure_after(mut self, calls: u64) -> Self {
        self.fail_feed_after = Some(calls);
        self
    }

    /// Returns the number of sessions started.
    pub fn session_count(&self) -> u64 {
        self.sessions.load(Ordering::Relaxed)
    }

    /// Returns the number of bytes fed across all sessions.
    pub fn bytes_fed(&self) -> u64 {
        self.bytes_fed.load(Ordering::Relaxed)
    }

    /// Returns the number of sessions that reached `finish`.
    pub fn finish_count(&self) -> u64 {
        self.finishes.load(Ordering::Relaxed)
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanEngine for MockEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_session(&self) -> Result<Box<dyn ScanSession>, ScanError> {
        self.sessions.fetch_add(1, Ordering::Relaxed);

        if let Some(reason) = &self.fail_start {
            return Err(ScanError::engine(&self.name, reason.clone()));
        }

        Ok(Box::new(MockSession {
            engine: self.name.clone(),
            signature: self.signature.clone(),
            verdict_after: self.verdict_after.clone(),
            finish: self.finish.clone(),
            fail_feed_after: self.fail_feed_after,
            window: Vec::new(),
            fed: 0,
            feeds: 0,
            bytes_fed: Arc::clone(&self.bytes_fed),
            finishes: Arc::clone(&self.finishes),
        }))
    }
}

struct MockSession {
    engine: String,
    signature: Option<(Vec<u8>, String)>,
    verdict_after: Option<(u64, Verdict)>,
    finish: EndOfInput,
    fail_feed_after: Option<u64>,
    /// Tail of the previous chunk plus the current one.
    window: Vec<u8>,
    fed: u64,
    feeds: u64,
    bytes_fed: Arc<AtomicU64>,
    finishes: Arc<AtomicU64>,
}

impl MockSession {
    fn signature_hit(&mut self, chunk: &[u8]) -> Option<String> {
        let (pattern, details) = self.signature.as_ref()?;
        if pattern.is_empty() {
            return None;
        }

        self.window.extend_from_slice(chunk);
        let hit = self
            .window
            .windows(pattern.len())
            .any(|w| w == pattern.as_slice());
        let keep = pattern.len() - 1;
        if self.window.len() > keep {
            self.window.drain(..self.window.len() - keep);
        }

        hit.then(|| details.clone())
    }
}

impl ScanSession for MockSession {
    fn feed(&mut self, chunk: &[u8]) -> Result<SessionStatus, ScanError> {
        if let Some(limit) = self.fail_feed_after {
            if self.feeds >= limit {
                return Err(ScanError::engine(&self.engine, "connection reset by engine"));
            }
        }
        self.feeds += 1;
        self.fed += chunk.len() as u64;
        self.bytes_fed
            .fetch_add(chunk.len() as u64, Ordering::Relaxed);

        if let Some(details) = self.signature_hit(chunk) {
            return Ok(SessionStatus::Verdict(Verdict::infected(details)));
        }

        match &self.verdict_after {
            Some((bytes, verdict)) if self.fed >= *bytes => {
                Ok(SessionStatus::Verdict(verdict.clone()))
            }
            _ => Ok(SessionStatus::NeedMoreData),
        }
    }

    fn finish(&mut self) -> Result<EndOfInput, ScanError> {
        self.finishes.fetch_add(1, Ordering::Relaxed);
        Ok(self.finish.clone())
    }
}
