//! Scanner configuration.

use crate::core::error::ScanError;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of bytes handed to the engine per read.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// What a background scan does with an infected object.
///
/// Foreground scans always delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfectedAction {
    /// Remove the object.
    Delete,
    /// Leave the object in place and only log.
    #[default]
    Keep,
}

impl fmt::Display for InfectedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Keep => write!(f, "keep"),
        }
    }
}

impl std::str::FromStr for InfectedAction {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delete" => Ok(Self::Delete),
            "keep" => Ok(Self::Keep),
            other => Err(ScanError::configuration(format!(
                "unknown infected action '{}', expected 'delete' or 'keep'",
                other
            ))),
        }
    }
}

/// Configuration for scan coordinators.
///
/// # Examples
///
/// ```rust
/// use scanwarden::core::{InfectedAction, ScannerConfig};
///
/// let config = ScannerConfig::new()
///     .with_chunk_size(64 * 1024)
///     .with_infected_action(InfectedAction::Delete);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Bytes per read from the storage backend.
    pub chunk_size: usize,

    /// Background policy for infected objects.
    pub infected_action: InfectedAction,

    /// Treat "engine consumed every byte but gave no verdict" as clean.
    ///
    /// Off by default: such scans are reported as unchecked.
    pub clean_when_consumed: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            infected_action: InfectedAction::default(),
            clean_when_consumed: false,
        }
    }
}

impl ScannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ScanError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ScanError::configuration(format!("invalid scanner config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the coordinator cannot work with.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.chunk_size == 0 {
            return Err(ScanError::configuration("chunk_size must be greater than zero"));
        }
        Ok(())
    }

    /// Sets the chunk size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the background infected action.
    pub fn with_infected_action(mut self, action: InfectedAction) -> Self {
        self.infected_action = action;
        self
    }

    /// Sets whether a fully consumed scan without verdict counts as clean.
    pub fn with_clean_when_consumed(mut self, enabled: bool) -> Self {
        self.clean_when_consumed = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.infected_action, InfectedAction::Keep);
        assert!(!config.clean_when_consumed);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ScannerConfig::from_json(r#"{"infected_action":"delete"}"#).unwrap();
        assert_eq!(config.infected_action, InfectedAction::Delete);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_from_json_rejects_zero_chunk() {
        let err = ScannerConfig::from_json(r#"{"chunk_size":0}"#).unwrap_err();
        assert!(matches!(err, ScanError::Configuration { .. }));
    }

    #[test]
    fn test_from_json_rejects_unknown_action() {
        assert!(ScannerConfig::from_json(r#"{"infected_action":"quarantine"}"#).is_err());
    }

    #[test]
    fn test_infected_action_from_str() {
        assert_eq!("Delete".parse::<InfectedAction>().unwrap(), InfectedAction::Delete);
        assert_eq!(" keep ".parse::<InfectedAction>().unwrap(), InfectedAction::Keep);
        assert!("only_log".parse::<InfectedAction>().is_err());
    }
}
