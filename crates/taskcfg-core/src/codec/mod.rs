//! Codec module: converts configurations to and from their stored JSON shape.
//!
//! - [`json`] – `encode` / `decode` and the two tag encodings.
//! - [`schema`] – the explicit shape check shared by `decode` and imports,
//!   plus [`schema::FormatError`].

pub mod json;
pub mod schema;

pub use json::{decode, default_blob, encode, to_pretty_string, TagEncoding, TAG_KEY_PREFIX};
pub use schema::{parse_document, validate_shape, FormatError};
