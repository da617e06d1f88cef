//! Optional TOML settings file.
//!
//! Every key is optional; absent keys fall back to the built-in defaults.
//! A complete file looks like:
//!
//! ```toml
//! [server]
//! bind_address = "127.0.0.1"
//! port = 24810
//! status_clear_secs = 3
//!
//! [storage]
//! backend = "local"          # or "gist"
//! encoding = "key_folded"    # or "field"
//!
//! [storage.local]
//! path = "data/config.json"
//!
//! [storage.gist]
//! api_base = "https://api.github.com"
//! file_name = "config.json"
//! ```
//!
//! The gist id and access token are deliberately not settings-file keys.
//! They are passed to [`SettingsFile::into_server_config`] from the
//! environment.

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use taskcfg_core::TagEncoding;
use thiserror::Error;
use tracing::debug;

use crate::domain::config::{
    GistSettings, ServerConfig, StorageBackend, StorageSettings, DEFAULT_DATA_PATH,
    DEFAULT_GIST_API_BASE, DEFAULT_GIST_FILE, DEFAULT_PORT, DEFAULT_STATUS_CLEAR_AFTER,
};

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error reading settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddress {
        value: String,
        #[source]
        source: AddrParseError,
    },
}

/// Which storage backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Gist,
}

// ── File schema ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_status_clear_secs")]
    pub status_clear_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub encoding: TagEncoding,
    #[serde(default)]
    pub local: LocalSection,
    #[serde(default)]
    pub gist: GistSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSection {
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GistSection {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_gist_file")]
    pub file_name: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_status_clear_secs() -> u64 {
    DEFAULT_STATUS_CLEAR_AFTER.as_secs()
}
fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}
fn default_api_base() -> String {
    DEFAULT_GIST_API_BASE.to_string()
}
fn default_gist_file() -> String {
    DEFAULT_GIST_FILE.to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            status_clear_secs: default_status_clear_secs(),
        }
    }
}

impl Default for LocalSection {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

impl Default for GistSection {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            file_name: default_gist_file(),
        }
    }
}

// ── Loading and conversion ────────────────────────────────────────────────────

/// Loads the settings file at `path`.
///
/// Returns the defaults when `path` is `None` or the file does not exist.
///
/// # Errors
///
/// [`SettingsError::Io`] for other read failures, [`SettingsError::Parse`]
/// for malformed TOML.
pub fn load_settings(path: Option<&Path>) -> Result<SettingsFile, SettingsError> {
    let Some(path) = path else {
        return Ok(SettingsFile::default());
    };

    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file not found, using defaults");
            Ok(SettingsFile::default())
        }
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl SettingsFile {
    /// Builds the runtime configuration, adding the out-of-band gist secrets.
    ///
    /// # Errors
    ///
    /// [`SettingsError::InvalidBindAddress`] if `bind_address` is not an IP.
    pub fn into_server_config(
        self,
        gist_id: Option<String>,
        token: Option<String>,
    ) -> Result<ServerConfig, SettingsError> {
        let ip: IpAddr =
            self.server
                .bind_address
                .parse()
                .map_err(|source| SettingsError::InvalidBindAddress {
                    value: self.server.bind_address.clone(),
                    source,
                })?;

        let backend = match self.storage.backend {
            BackendKind::Local => StorageBackend::LocalFile {
                path: self.storage.local.path,
            },
            BackendKind::Gist => StorageBackend::Gist(GistSettings {
                api_base: self.storage.gist.api_base,
                file_name: self.storage.gist.file_name,
                gist_id,
                token,
            }),
        };

        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, self.server.port),
            status_clear_after: Duration::from_secs(self.server.status_clear_secs),
            storage: StorageSettings {
                backend,
                encoding: self.storage.encoding,
            },
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_default_settings_convert_to_default_server_config() {
        let cfg = SettingsFile::default().into_server_config(None, None).unwrap();
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let parsed: SettingsFile = toml::from_str("").unwrap();
        assert_eq!(parsed, SettingsFile::default());
    }

    #[test]
    fn test_partial_toml_keeps_unspecified_defaults() {
        // Arrange
        let text = r#"
            [server]
            port = 9000

            [storage]
            backend = "gist"
            encoding = "field"
        "#;

        // Act
        let parsed: SettingsFile = toml::from_str(text).unwrap();

        // Assert
        assert_eq!(parsed.server.port, 9000);
        assert_eq!(parsed.server.bind_address, "127.0.0.1");
        assert_eq!(parsed.storage.backend, BackendKind::Gist);
        assert_eq!(parsed.storage.encoding, TagEncoding::Field);
        assert_eq!(parsed.storage.gist.file_name, "config.json");
    }

    #[test]
    fn test_gist_backend_receives_out_of_band_secrets() {
        let mut settings = SettingsFile::default();
        settings.storage.backend = BackendKind::Gist;

        let cfg = settings
            .into_server_config(Some("abc".into()), Some("tok".into()))
            .unwrap();

        match cfg.storage.backend {
            StorageBackend::Gist(gist) => {
                assert_eq!(gist.gist_id.as_deref(), Some("abc"));
                assert_eq!(gist.token.as_deref(), Some("tok"));
                assert_eq!(gist.api_base, "https://api.github.com");
            }
            other => panic!("expected gist backend, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_bind_address_is_rejected() {
        let mut settings = SettingsFile::default();
        settings.server.bind_address = "localhost:80".to_string();

        let result = settings.into_server_config(None, None);

        assert!(matches!(
            result,
            Err(SettingsError::InvalidBindAddress { .. })
        ));
    }

    #[test]
    fn test_unknown_backend_fails_to_parse() {
        let result: Result<SettingsFile, _> = toml::from_str("[storage]\nbackend = \"s3\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_settings_without_path_returns_defaults() {
        assert_eq!(load_settings(None).unwrap(), SettingsFile::default());
    }

    #[test]
    fn test_load_settings_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join(format!("taskcfg-missing-{}.toml", Uuid::new_v4()));
        assert_eq!(load_settings(Some(&path)).unwrap(), SettingsFile::default());
    }

    #[test]
    fn test_load_settings_reads_file_from_disk() {
        // Arrange
        let path = std::env::temp_dir().join(format!("taskcfg-settings-{}.toml", Uuid::new_v4()));
        std::fs::write(&path, "[storage.local]\npath = \"/srv/taskcfg.json\"\n").unwrap();

        // Act
        let loaded = load_settings(Some(&path)).unwrap();

        // Assert
        assert_eq!(loaded.storage.local.path, PathBuf::from("/srv/taskcfg.json"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_settings_malformed_toml_is_parse_error() {
        let path = std::env::temp_dir().join(format!("taskcfg-bad-{}.toml", Uuid::new_v4()));
        std::fs::write(&path, "[server\nport = ").unwrap();

        let result = load_settings(Some(&path));

        assert!(matches!(result, Err(SettingsError::Parse(_))));
        let _ = std::fs::remove_file(path);
    }
}
