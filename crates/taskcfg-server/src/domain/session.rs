//! Session view types shared by the editor controller and the browser protocol.

use std::fmt;

use serde::{Deserialize, Serialize};
use taskcfg_core::Configuration;

/// Where an editor session is in its load/save cycle.
///
/// ```text
/// Idle ──load()──► Loading ──► Idle
/// Idle ──save()──► Saving  ──► Idle
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Loading,
    Saving,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Loading => "loading",
            SessionPhase::Saving => "saving",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

/// A short user-facing message shown after load, save, or import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// Everything the browser needs to render the editor form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// The editable configuration.
    pub config: Configuration,
    pub phase: SessionPhase,
    /// The current transient status, if one has not cleared yet.
    pub status: Option<StatusMessage>,
    /// Pretty-printed document exactly as it would be saved.
    pub preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SessionPhase::Loading).unwrap(), "\"loading\"");
    }

    #[test]
    fn test_status_constructors_set_kind() {
        assert!(StatusMessage::error("boom").is_error());
        assert!(!StatusMessage::success("ok").is_error());
    }

    #[test]
    fn test_snapshot_serializes_status_kind_and_text() {
        let snapshot = SessionSnapshot {
            status: Some(StatusMessage::success("Configuration saved")),
            ..SessionSnapshot::default()
        };

        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["status"]["kind"], "success");
        assert_eq!(json["status"]["text"], "Configuration saved");
        assert_eq!(json["phase"], "idle");
    }
}
