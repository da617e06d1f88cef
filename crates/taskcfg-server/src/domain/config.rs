//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for runtime settings.  It is
//! assembled in `main.rs` from built-in defaults, the optional settings file,
//! and CLI flags / environment variables (in increasing precedence).
//!
//! Keeping it a plain struct (no environment reads in here) lets tests build
//! any configuration they need directly.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use taskcfg_core::TagEncoding;

/// Default WebSocket listener port.
pub const DEFAULT_PORT: u16 = 24810;

/// Default location of the local configuration document.
pub const DEFAULT_DATA_PATH: &str = "data/config.json";

/// GitHub REST API root used by the gist backend.
pub const DEFAULT_GIST_API_BASE: &str = "https://api.github.com";

/// Name of the file inside the gist that holds the document.
pub const DEFAULT_GIST_FILE: &str = "config.json";

/// How long a status message stays visible before it clears itself.
pub const DEFAULT_STATUS_CLEAR_AFTER: Duration = Duration::from_secs(3);

/// All runtime configuration for the editor server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the WebSocket server binds to.
    pub bind_addr: SocketAddr,
    /// Lifetime of a transient status message.
    pub status_clear_after: Duration,
    /// Where and how the configuration document is stored.
    pub storage: StorageSettings,
}

/// Storage backend selection plus the encoding used when writing.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Tag encoding emitted on save.  Both encodings are always accepted on load.
    pub encoding: TagEncoding,
}

/// The two interchangeable storage media.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    /// Formatted JSON at a fixed path on the local file system.
    LocalFile { path: PathBuf },
    /// One named file inside a GitHub gist.
    Gist(GistSettings),
}

impl StorageBackend {
    /// Short name used in logs and CLI values.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageBackend::LocalFile { .. } => "local",
            StorageBackend::Gist(_) => "gist",
        }
    }
}

/// Settings for the gist backend.
///
/// `gist_id` and `token` are supplied out-of-band (environment or CLI) and
/// may be absent; the backend reports a configuration error on first use
/// rather than refusing to start.
#[derive(Clone, PartialEq)]
pub struct GistSettings {
    pub api_base: String,
    pub file_name: String,
    pub gist_id: Option<String>,
    pub token: Option<String>,
}

impl GistSettings {
    /// Returns the names of the out-of-band secrets that are missing.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.token.as_deref().map_or(true, str::is_empty) {
            missing.push("GITHUB_TOKEN");
        }
        if self.gist_id.as_deref().map_or(true, str::is_empty) {
            missing.push("GIST_ID");
        }
        missing
    }
}

impl Default for GistSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GIST_API_BASE.to_string(),
            file_name: DEFAULT_GIST_FILE.to_string(),
            gist_id: None,
            token: None,
        }
    }
}

// The token must never reach a log line.
impl fmt::Debug for GistSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GistSettings")
            .field("api_base", &self.api_base)
            .field("file_name", &self.file_name)
            .field("gist_id", &self.gist_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::LocalFile {
                path: PathBuf::from(DEFAULT_DATA_PATH),
            },
            encoding: TagEncoding::default(),
        }
    }
}

impl Default for ServerConfig {
    /// | Field              | Default                  |
    /// |--------------------|--------------------------|
    /// | bind_addr          | `127.0.0.1:24810`        |
    /// | status_clear_after | 3 seconds                |
    /// | storage            | local `data/config.json` |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            status_clear_after: DEFAULT_STATUS_CLEAR_AFTER,
            storage: StorageSettings::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binds_loopback_on_default_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:24810");
    }

    #[test]
    fn test_default_status_clears_after_three_seconds() {
        assert_eq!(
            ServerConfig::default().status_clear_after,
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_default_storage_is_local_file_with_key_folded_encoding() {
        let storage = StorageSettings::default();
        assert_eq!(
            storage.backend,
            StorageBackend::LocalFile {
                path: PathBuf::from("data/config.json")
            }
        );
        assert_eq!(storage.encoding, TagEncoding::KeyFolded);
        assert_eq!(storage.backend.kind(), "local");
    }

    #[test]
    fn test_missing_credentials_lists_both_secrets() {
        let gist = GistSettings::default();
        assert_eq!(gist.missing_credentials(), vec!["GITHUB_TOKEN", "GIST_ID"]);
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let gist = GistSettings {
            token: Some(String::new()),
            gist_id: Some("abc".to_string()),
            ..GistSettings::default()
        };
        assert_eq!(gist.missing_credentials(), vec!["GITHUB_TOKEN"]);
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let gist = GistSettings {
            token: Some("ghp_supersecret".to_string()),
            ..GistSettings::default()
        };

        let printed = format!("{gist:?}");

        assert!(!printed.contains("ghp_supersecret"));
        assert!(printed.contains("<redacted>"));
    }
}
