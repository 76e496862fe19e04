//! Scan report structure.

use crate::core::{ObjectId, ScanTarget, Verdict};
use crate::policy::{AbortPayload, ProcessOutcome};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The result of one coordinator run over one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Unique identifier for this report.
    pub id: String,

    /// The scanned object.
    pub object_id: ObjectId,

    /// Backend-relative path of the object.
    pub path: String,

    /// Owner of the object, resolved when the scan started.
    pub owner: Option<String>,

    /// Name of the engine used.
    pub engine: String,

    /// The verdict; `None` when the target was not scannable.
    pub verdict: Option<Verdict>,

    /// What the verdict processor asked the caller to do.
    pub outcome: ProcessOutcome,

    /// Bytes handed to the engine.
    pub bytes_scanned: u64,

    /// Chunks handed to the engine.
    pub chunks: u64,

    /// When the scan started.
    pub started_at: DateTime<Utc>,

    /// How long the scan took.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl ScanReport {
    pub(crate) fn new(target: &ScanTarget, engine: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            object_id: target.id().clone(),
            path: target.path().to_string(),
            owner: target.owner(),
            engine: engine.into(),
            verdict: None,
            outcome: ProcessOutcome::Continue,
            bytes_scanned: 0,
            chunks: 0,
            started_at,
            duration: Duration::ZERO,
        }
    }

    /// Returns `true` if the target was skipped as not scannable.
    pub fn is_skipped(&self) -> bool {
        self.verdict.is_none()
    }

    /// Returns `true` if the engine found the object clean.
    pub fn is_clean(&self) -> bool {
        self.verdict.as_ref().is_some_and(Verdict::is_clean)
    }

    /// Returns `true` if the engine found malware.
    pub fn is_infected(&self) -> bool {
        self.verdict.as_ref().is_some_and(Verdict::is_infected)
    }

    /// Returns `true` if the engine could not decide.
    pub fn is_unchecked(&self) -> bool {
        self.verdict.as_ref().is_some_and(Verdict::is_unchecked)
    }

    /// Returns the abort payload if the request must be abandoned.
    pub fn abort_payload(&self) -> Option<&AbortPayload> {
        self.outcome.abort_payload()
    }
}

/// Serde helper for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
