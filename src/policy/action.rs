//! Outcomes of verdict processing.

use serde::{Deserialize, Serialize};

/// What the calling request handler must do after a verdict was processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// Carry on with the request or batch.
    #[default]
    Continue,

    /// Abandon all remaining work for this request and answer with the payload.
    Abort(AbortPayload),
}

impl ProcessOutcome {
    /// Returns true if the request must be abandoned.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort(_))
    }

    /// Returns the abort payload, if any.
    pub fn abort_payload(&self) -> Option<&AbortPayload> {
        match self {
            Self::Abort(payload) => Some(payload),
            Self::Continue => None,
        }
    }
}

/// User-facing message wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortMessage {
    /// Message shown to the user.
    pub message: String,
}

/// Structured error returned to the user whose request was aborted.
///
/// Serialises as `{"data":{"message":"..."},"path":"...","details":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortPayload {
    /// The user-facing message.
    pub data: AbortMessage,

    /// Path of the rejected object.
    pub path: String,

    /// Engine details behind the rejection.
    pub details: String,
}

impl AbortPayload {
    /// Payload for an upload rejected because the engine found malware.
    pub fn virus_detected(path: impl Into<String>, file_name: &str, details: impl Into<String>) -> Self {
        Self {
            data: AbortMessage {
                message: format!("Virus detected! Can't upload the file {}", file_name),
            },
            path: path.into(),
            details: details.into(),
        }
    }

    /// Returns the user-facing message.
    pub fn message(&self) -> &str {
        &self.data.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_helpers() {
        assert_eq!(ProcessOutcome::default(), ProcessOutcome::Continue);
        assert!(!ProcessOutcome::Continue.is_abort());
        let outcome = ProcessOutcome::Abort(AbortPayload::virus_detected(
            "u/files/a.exe",
            "a.exe",
            "Eicar",
        ));
        assert!(outcome.is_abort());
        assert_eq!(
            outcome.abort_payload().map(|p| p.message()),
            Some("Virus detected! Can't upload the file a.exe")
        );
    }

    #[test]
    fn test_payload_json_shape() {
        let payload = AbortPayload::virus_detected("u/files/a.exe", "a.exe", "Eicar");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["data"]["message"], "Virus detected! Can't upload the file a.exe");
        assert_eq!(json["details"], "Eicar");
    }
}
