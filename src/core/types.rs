//! Core types used throughout the scanwarden library.
//!
//! This module defines object identifiers, scan verdicts and the context a
//! scan request runs in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    /// Creates an object id from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// The engine's classification of a scanned object.
///
/// - `Clean`: no threats detected
/// - `Infected`: the engine found malware, `details` names it
/// - `Unchecked`: the engine could not decide, `details` says why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    /// The object is clean.
    Clean,

    /// The object is infected.
    Infected {
        /// Engine message describing the detection.
        details: String,
    },

    /// The scan did not reach a conclusion.
    Unchecked {
        /// Engine message describing why.
        details: String,
    },
}

impl Verdict {
    /// Creates an `Infected` verdict.
    pub fn infected(details: impl Into<String>) -> Self {
        Self::Infected {
            details: details.into(),
        }
    }

    /// Creates an `Unchecked` verdict.
    pub fn unchecked(details: impl Into<String>) -> Self {
        Self::Unchecked {
            details: details.into(),
        }
    }

    /// Returns `true` for a clean verdict.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Returns `true` for an infected verdict.
    pub fn is_infected(&self) -> bool {
        matches!(self, Self::Infected { .. })
    }

    /// Returns `true` for an unchecked verdict.
    pub fn is_unchecked(&self) -> bool {
        matches!(self, Self::Unchecked { .. })
    }

    /// Returns the engine details, empty for `Clean`.
    pub fn details(&self) -> &str {
        match self {
            Self::Infected { details } | Self::Unchecked { details } => details,
            Self::Clean => "",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Infected { details } => write!(f, "infected ({})", details),
            Self::Unchecked { details } => write!(f, "unchecked ({})", details),
        }
    }
}

/// Context information for a scan request.
///
/// `background` selects the policy column the verdict processor applies;
/// the remaining fields only travel into log and audit output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanContext {
    /// Whether the scan runs as part of a non-interactive batch.
    pub background: bool,

    /// Request or correlation ID for tracing.
    pub request_id: Option<String>,

    /// User who initiated the scan, if any.
    pub user_id: Option<String>,
}

impl ScanContext {
    /// Context for an interactive request, e.g. an upload.
    pub fn foreground() -> Self {
        Self::default()
    }

    /// Context for a scheduled re-scan.
    pub fn background() -> Self {
        Self {
            background: true,
            ..Self::default()
        }
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets the user ID.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_is_methods() {
        assert!(Verdict::Clean.is_clean());
        assert!(Verdict::infected("Eicar-Test-Signature").is_infected());
        assert!(Verdict::unchecked("timeout").is_unchecked());
        assert_eq!(Verdict::Clean.details(), "");
        assert_eq!(Verdict::infected("Win.Trojan").details(), "Win.Trojan");
    }

    #[test]
    fn test_verdict_serde_shape() {
        let json = serde_json::to_value(Verdict::infected("Eicar")).unwrap();
        assert_eq!(json["status"], "infected");
        assert_eq!(json["details"], "Eicar");

        let back: Verdict = serde_json::from_str(r#"{"status":"clean"}"#).unwrap();
        assert_eq!(back, Verdict::Clean);
    }

    #[test]
    fn test_scan_context_builder() {
        let ctx = ScanContext::foreground()
            .with_request_id("req-7")
            .with_user_id("alice");
        assert!(!ctx.background);
        assert_eq!(ctx.request_id.as_deref(), Some("req-7"));
        assert!(ScanContext::background().background);
    }

    #[test]
    fn test_object_id_conversions() {
        assert_eq!(ObjectId::from(42u64).as_str(), "42");
        assert_eq!(ObjectId::from("abc").to_string(), "abc");
    }
}
