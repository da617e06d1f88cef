//! JSON codec for configuration documents.
//!
//! Stored shape:
//! ```text
//! { "name": <string>, "description": <string>, "task": [ <task>, ... ] }
//! ```
//!
//! Two task shapes exist in stored data:
//!
//! ```text
//! Field      { "addons": "http://a", "tag": "fetch" }
//! KeyFolded  { "addons": "http://a", "tag=fetch": true }
//! ```
//!
//! [`decode`] accepts both (and a mix of both within one document).  [`encode`]
//! emits exactly one of them, chosen by the caller through [`TagEncoding`].
//!
//! # Tag resolution order on decode
//!
//! 1. A string `tag` field, if present.
//! 2. Otherwise the first key (in document order) that starts with
//!    [`TAG_KEY_PREFIX`]; the remainder of the key is the tag.  The value
//!    under that key is ignored.
//! 3. Otherwise the empty string.
//!
//! Unknown keys are dropped, so decode → encode is not byte-for-byte
//! preserving for documents that carry extra fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::codec::schema::{validate_shape, FormatError};
use crate::domain::config::{Configuration, TaskEntry};

/// Prefix of the object key that carries a tag in the key-folded encoding.
pub const TAG_KEY_PREFIX: &str = "tag=";

/// How a task's tag is written by [`encode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagEncoding {
    /// `{"addons": .., "tag=<value>": true}`
    #[default]
    KeyFolded,
    /// `{"addons": .., "tag": <value>}`
    Field,
}

impl TagEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            TagEncoding::KeyFolded => "key_folded",
            TagEncoding::Field => "field",
        }
    }
}

impl fmt::Display for TagEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "key_folded" | "key-folded" => Ok(TagEncoding::KeyFolded),
            "field" => Ok(TagEncoding::Field),
            other => Err(format!(
                "unknown tag encoding '{other}' (expected 'key_folded' or 'field')"
            )),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// The document a store holds before anything has been written.
///
/// ```rust
/// assert_eq!(
///     taskcfg_core::default_blob().to_string(),
///     r#"{"name":"","description":"","task":[]}"#
/// );
/// ```
pub fn default_blob() -> Value {
    json!({"name": "", "description": "", "task": []})
}

/// Decodes a stored or imported JSON document into a [`Configuration`].
///
/// # Errors
///
/// Returns [`FormatError`] when `raw` does not pass [`validate_shape`].
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
///
/// let raw = json!({
///     "name": "n",
///     "description": "d",
///     "task": [{"addons": "http://a", "tag=fetch": true}]
/// });
/// let cfg = taskcfg_core::decode(&raw).unwrap();
/// assert_eq!(cfg.tasks[0].tag, "fetch");
/// ```
pub fn decode(raw: &Value) -> Result<Configuration, FormatError> {
    validate_shape(raw)?;

    let tasks = raw["task"]
        .as_array()
        .map(|entries| entries.iter().map(decode_task).collect())
        .unwrap_or_default();

    Ok(Configuration {
        name: string_at(raw, "name"),
        description: string_at(raw, "description"),
        tasks,
    })
}

/// Encodes a [`Configuration`] into its stored JSON shape.
///
/// Keys are emitted in the order `name`, `description`, `task`, and within a
/// task `addons` comes before the tag.
///
/// # Examples
///
/// ```rust
/// use taskcfg_core::{encode, Configuration, TagEncoding};
///
/// let cfg = Configuration::new("n", "d").with_task("http://a", "fetch");
/// let raw = encode(&cfg, TagEncoding::KeyFolded);
/// assert_eq!(raw["task"][0]["tag=fetch"], true);
/// ```
pub fn encode(cfg: &Configuration, encoding: TagEncoding) -> Value {
    let tasks: Vec<Value> = cfg
        .tasks
        .iter()
        .map(|task| encode_task(task, encoding))
        .collect();

    json!({
        "name": cfg.name,
        "description": cfg.description,
        "task": tasks,
    })
}

/// Formats a JSON value with two-space indentation, the layout used for
/// every document a store writes.
pub fn to_pretty_string(value: &Value) -> String {
    // `Value`'s alternate Display is the infallible pretty printer.
    format!("{value:#}")
}

// ── Task encoding ─────────────────────────────────────────────────────────────

fn encode_task(task: &TaskEntry, encoding: TagEncoding) -> Value {
    let mut entry = Map::new();
    entry.insert("addons".to_string(), Value::String(task.addons.clone()));
    match encoding {
        TagEncoding::KeyFolded => {
            entry.insert(format!("{TAG_KEY_PREFIX}{}", task.tag), Value::Bool(true));
        }
        TagEncoding::Field => {
            entry.insert("tag".to_string(), Value::String(task.tag.clone()));
        }
    }
    Value::Object(entry)
}

// ── Task decoding ─────────────────────────────────────────────────────────────

fn decode_task(entry: &Value) -> TaskEntry {
    let addons = entry
        .get("addons")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let tag = match entry.get("tag").and_then(Value::as_str) {
        Some(tag) => tag.to_string(),
        None => folded_tag(entry).unwrap_or_default(),
    };

    TaskEntry { addons, tag }
}

/// Finds the first `tag=<value>` key of a task object and returns `<value>`.
fn folded_tag(entry: &Value) -> Option<String> {
    let tag = entry
        .as_object()?
        .keys()
        .find_map(|key| key.strip_prefix(TAG_KEY_PREFIX))?;
    tracing::trace!(tag, "resolved tag from key-folded entry");
    Some(tag.to_string())
}

fn string_at(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
