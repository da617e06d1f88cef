//! Domain entities for taskcfg.
//!
//! This module contains the editable configuration model with no
//! infrastructure dependencies.  The editor mutates these types in response
//! to user edits; the codec converts them to and from stored JSON.
//!
//! Code in outer layers (application, infrastructure) depends on the domain,
//! but the domain never depends on them.

/// The configuration object being edited.
///
/// See [`config::Configuration`] for the main type.
pub mod config;
