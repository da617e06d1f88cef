//! # taskcfg-core
//!
//! Shared library for taskcfg containing the configuration model and the
//! JSON codec that maps it to and from its persisted shape.
//!
//! This crate is used by the editor server and by anything else that needs
//! to read or write stored configuration documents.  It has zero
//! dependencies on sockets, file systems, or HTTP clients.
//!
//! # Architecture overview
//!
//! A taskcfg document is a named configuration object: a `name`, a
//! `description`, and an ordered list of task entries, each holding an
//! `addons` link and a `tag` label.  On disk (or inside a gist) it looks like:
//!
//! ```json
//! {
//!   "name": "nightly",
//!   "description": "scripts for the nightly run",
//!   "task": [
//!     { "addons": "https://example.com/a.js", "tag=fetch": true }
//!   ]
//! }
//! ```
//!
//! - **`domain`** – The editable model ([`Configuration`], [`TaskEntry`]) and
//!   the field selectors the editor uses to address individual values.
//!
//! - **`codec`** – Conversion between the model and JSON, including the
//!   legacy encoding where a task's tag is folded into an object key of the
//!   form `tag=<value>`, plus the explicit shape validation used for imports.

pub mod codec;
pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `taskcfg_core::Configuration` instead of `taskcfg_core::domain::config::Configuration`.
pub use codec::json::{decode, default_blob, encode, to_pretty_string, TagEncoding, TAG_KEY_PREFIX};
pub use codec::schema::{parse_document, validate_shape, FormatError};
pub use domain::config::{Configuration, ConfigField, TaskEntry, TaskField};
