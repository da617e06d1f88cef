//! The storage seam: how an editor session reads and writes the raw document.
//!
//! Backends exchange untyped JSON ([`serde_json::Value`]); shape validation
//! and decoding are the caller's job.  This keeps a corrupt-but-valid-JSON
//! document distinguishable from an unreachable backend.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors a storage backend can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Required settings or credentials are missing.  Not transient.
    #[error("storage is not configured: {0}")]
    Misconfigured(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored bytes are not valid JSON.
    #[error("stored document at {location} is not valid JSON: {message}")]
    Corrupt { location: String, message: String },

    /// The backend answered but refused the request.
    #[error("remote storage rejected the request (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// The backend could not be reached.
    #[error("remote storage unreachable: {0}")]
    Transport(String),
}

impl StoreError {
    /// Returns `true` when retrying cannot help until the settings change.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, StoreError::Misconfigured(_))
    }
}

/// Whole-document persistence for a single configuration.
///
/// Implementations are shared between sessions behind an
/// `Arc<dyn ConfigStore>` and must tolerate concurrent calls.  Writes are a
/// full overwrite; concurrent writers resolve last-writer-wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetches the stored document.
    async fn read(&self) -> Result<Value, StoreError>;

    /// Replaces the stored document with `blob`.
    async fn write(&self, blob: &Value) -> Result<(), StoreError>;

    /// Human-readable description of the backend, for logs.
    fn describe(&self) -> String;
}
