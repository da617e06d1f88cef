//! Shape validation for stored and imported configuration documents.
//!
//! A document is accepted when:
//!
//! ```text
//! root         object
//! name         present, string
//! description  present, string
//! task         present, array of objects
//! task[i].addons   string when present
//! task[i].tag      string when present
//! ```
//!
//! Any other key (including `tag=<value>` keys, whatever their value) is
//! allowed and ignored here.  Presence is checked before types so a caller
//! gets the complete list of missing fields in a single error.

use serde_json::Value;
use thiserror::Error;

/// Top-level keys every configuration document must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "description", "task"];

/// Errors produced when JSON does not have the configuration shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The text is not valid JSON at all.
    #[error("invalid JSON: {0}")]
    Syntax(String),

    /// The document root is not a JSON object.
    #[error("expected a JSON object at the document root, found {found}")]
    NotAnObject { found: &'static str },

    /// One or more required top-level fields are absent.
    #[error("missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A field is present but holds the wrong kind of value.
    #[error("field `{field}` must be {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Returns the JSON type name used in error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parses user-supplied text into a JSON value.
///
/// # Errors
///
/// Returns [`FormatError::Syntax`] when the text is not valid JSON.
pub fn parse_document(text: &str) -> Result<Value, FormatError> {
    serde_json::from_str(text).map_err(|e| FormatError::Syntax(e.to_string()))
}

/// Checks that `raw` has the configuration shape described in the module docs.
///
/// # Errors
///
/// Returns the first [`FormatError`] found, except that all missing
/// top-level fields are reported together.
pub fn validate_shape(raw: &Value) -> Result<(), FormatError> {
    let Value::Object(root) = raw else {
        return Err(FormatError::NotAnObject {
            found: json_type_name(raw),
        });
    };

    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|key| !root.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(FormatError::MissingFields(missing));
    }

    expect_string("name", &root["name"])?;
    expect_string("description", &root["description"])?;

    let Value::Array(tasks) = &root["task"] else {
        return Err(wrong_type("task", "an array", &root["task"]));
    };

    for (index, task) in tasks.iter().enumerate() {
        let Value::Object(entry) = task else {
            return Err(wrong_type(format!("task[{index}]"), "an object", task));
        };
        for key in ["addons", "tag"] {
            if let Some(value) = entry.get(key) {
                expect_string(format!("task[{index}].{key}"), value)?;
            }
        }
    }

    Ok(())
}

fn expect_string(field: impl Into<String>, value: &Value) -> Result<(), FormatError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(wrong_type(field, "a string", value))
    }
}

fn wrong_type(field: impl Into<String>, expected: &'static str, value: &Value) -> FormatError {
    FormatError::WrongType {
        field: field.into(),
        expected,
        found: json_type_name(value),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
