//! JSON message types for the browser-facing WebSocket protocol.
//!
//! # Message flow
//!
//! ```text
//! Browser → Server:  JSON text frame  →  BrowserToServerMsg  →  EditorSession
//! Server  → Browser: SessionSnapshot  →  ServerToBrowserMsg  →  JSON text frame
//! ```
//!
//! Every message is a JSON object with a `"type"` field naming the variant;
//! the remaining fields sit in the same object:
//!
//! ```json
//! {"type":"UpdateTask","index":0,"field":"tag","value":"hot"}
//! ```
//!
//! The browser never receives partial updates.  Every state change is
//! answered with a full [`ServerToBrowserMsg::Snapshot`], which keeps the
//! browser a thin renderer.

use serde::{Deserialize, Serialize};
use taskcfg_core::{ConfigField, TaskField};

use super::session::SessionSnapshot;

// ── Browser → Server messages ─────────────────────────────────────────────────

/// Editing commands a browser can send.
///
/// ```json
/// {"type":"Load"}
/// {"type":"UpdateField","field":"name","value":"nightly"}
/// {"type":"RemoveTask","index":2}
/// {"type":"Import","text":"{\"name\":\"x\",\"description\":\"\",\"task\":[]}"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BrowserToServerMsg {
    /// Replace the in-memory configuration with the stored document.
    Load,

    /// Persist the in-memory configuration.
    Save,

    /// Append an empty task row.
    AddTask,

    /// Remove the task at `index`.  Out-of-range indices are ignored.
    RemoveTask { index: usize },

    /// Set the configuration's `name` or `description`.
    UpdateField { field: ConfigField, value: String },

    /// Set one field of the task at `index`.
    UpdateTask {
        index: usize,
        field: TaskField,
        value: String,
    },

    /// Replace the configuration with the contents of a user-chosen file.
    ///
    /// The browser reads the file and sends its text verbatim; parsing and
    /// validation happen server-side.
    Import { text: String },
}

// ── Server → Browser messages ─────────────────────────────────────────────────

/// Messages the server pushes to a browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerToBrowserMsg {
    /// The full editor state after any change.
    ///
    /// ```json
    /// {"type":"Snapshot","config":{...},"phase":"idle","status":null,"preview":"{...}"}
    /// ```
    Snapshot(SessionSnapshot),

    /// A command was refused because a load or save is already running.
    Rejected { reason: String },

    /// The browser sent a frame that could not be understood.
    ProtocolError { message: String },
}

/// Returns the variant name of a browser message, for logging.
pub fn browser_msg_type_name(msg: &BrowserToServerMsg) -> &'static str {
    match msg {
        BrowserToServerMsg::Load => "Load",
        BrowserToServerMsg::Save => "Save",
        BrowserToServerMsg::AddTask => "AddTask",
        BrowserToServerMsg::RemoveTask { .. } => "RemoveTask",
        BrowserToServerMsg::UpdateField { .. } => "UpdateField",
        BrowserToServerMsg::UpdateTask { .. } => "UpdateTask",
        BrowserToServerMsg::Import { .. } => "Import",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::{SessionPhase, StatusMessage};
    use taskcfg_core::Configuration;

    #[test]
    fn test_unit_variant_deserializes_from_type_only() {
        // Arrange
        let json = r#"{"type":"Save"}"#;

        // Act
        let msg: BrowserToServerMsg = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(msg, BrowserToServerMsg::Save);
    }

    #[test]
    fn test_update_task_deserializes_lowercase_field_name() {
        let json = r#"{"type":"UpdateTask","index":1,"field":"addons","value":"a.js"}"#;

        let msg: BrowserToServerMsg = serde_json::from_str(json).unwrap();

        assert_eq!(
            msg,
            BrowserToServerMsg::UpdateTask {
                index: 1,
                field: TaskField::Addons,
                value: "a.js".to_string(),
            }
        );
    }

    #[test]
    fn test_update_field_rejects_unknown_field_name() {
        let json = r#"{"type":"UpdateField","field":"owner","value":"x"}"#;

        let result: Result<BrowserToServerMsg, _> = serde_json::from_str(json);

        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_message_type_fails_to_parse() {
        let result: Result<BrowserToServerMsg, _> = serde_json::from_str(r#"{"type":"Delete"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_remove_task_rejects_negative_index() {
        let result: Result<BrowserToServerMsg, _> =
            serde_json::from_str(r#"{"type":"RemoveTask","index":-1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_flattens_session_fields_next_to_type() {
        // Arrange
        let msg = ServerToBrowserMsg::Snapshot(SessionSnapshot {
            config: Configuration::new("n", "d").with_task("a.js", "t"),
            phase: SessionPhase::Saving,
            status: Some(StatusMessage::error("Failed to save configuration: boom")),
            preview: "{}".to_string(),
        });

        // Act
        let json = serde_json::to_value(&msg).unwrap();

        // Assert
        assert_eq!(json["type"], "Snapshot");
        assert_eq!(json["phase"], "saving");
        assert_eq!(json["config"]["task"][0]["tag"], "t");
        assert_eq!(json["status"]["kind"], "error");
        assert_eq!(json["preview"], "{}");
    }

    #[test]
    fn test_rejected_serializes_reason() {
        let msg = ServerToBrowserMsg::Rejected {
            reason: "busy".to_string(),
        };

        let json = serde_json::to_string(&msg).unwrap();

        assert_eq!(json, r#"{"type":"Rejected","reason":"busy"}"#);
    }

    #[test]
    fn test_browser_msg_type_name_covers_payload_variants() {
        assert_eq!(
            browser_msg_type_name(&BrowserToServerMsg::Import {
                text: String::new()
            }),
            "Import"
        );
        assert_eq!(
            browser_msg_type_name(&BrowserToServerMsg::RemoveTask { index: 0 }),
            "RemoveTask"
        );
    }
}
