//! taskcfg editor server entry point.
//!
//! Serves the configuration editor to browsers over WebSocket and persists
//! the document to a local JSON file or a GitHub gist.
//!
//! # Usage
//!
//! ```text
//! taskcfg-server [OPTIONS]
//!
//! Options:
//!   --settings <PATH>           TOML settings file
//!   --bind <IP>                 Listener address [default: 127.0.0.1]
//!   --port <PORT>               Listener port [default: 24810]
//!   --backend <local|gist>      Storage backend [default: local]
//!   --data-path <PATH>          Local document path [default: data/config.json]
//!   --encoding <key_folded|field>  Tag encoding used when saving
//!   --status-clear-secs <SECS>  Status message lifetime [default: 3]
//! ```
//!
//! # Configuration precedence
//!
//! Built-in defaults, then the settings file, then environment variables,
//! then CLI flags.
//!
//! | Variable                    | Flag                  |
//! |-----------------------------|-----------------------|
//! | `TASKCFG_SETTINGS`          | `--settings`          |
//! | `TASKCFG_BIND`              | `--bind`              |
//! | `TASKCFG_PORT`              | `--port`              |
//! | `TASKCFG_BACKEND`           | `--backend`           |
//! | `TASKCFG_DATA_PATH`         | `--data-path`         |
//! | `TASKCFG_ENCODING`          | `--encoding`          |
//! | `TASKCFG_STATUS_CLEAR_SECS` | `--status-clear-secs` |
//! | `GIST_ID`                   | `--gist-id`           |
//! | `GITHUB_TOKEN`              | `--github-token`      |
//!
//! The gist id and token are never read from the settings file.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskcfg_core::TagEncoding;
use taskcfg_server::domain::ServerConfig;
use taskcfg_server::infrastructure::run_server;
use taskcfg_server::infrastructure::settings::{load_settings, BackendKind, SettingsFile};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Browser-based editor for taskcfg configuration documents.
#[derive(Debug, Parser)]
#[command(
    name = "taskcfg-server",
    about = "WebSocket editor service for taskcfg configuration documents",
    version
)]
struct Cli {
    /// Optional TOML settings file.  A missing file means built-in defaults.
    #[arg(long, env = "TASKCFG_SETTINGS")]
    settings: Option<PathBuf>,

    /// IP address to bind the WebSocket server to.
    #[arg(long, env = "TASKCFG_BIND")]
    bind: Option<String>,

    /// TCP port for the WebSocket server.
    #[arg(long, env = "TASKCFG_PORT")]
    port: Option<u16>,

    /// Where the configuration document is stored.
    #[arg(long, value_enum, env = "TASKCFG_BACKEND")]
    backend: Option<BackendKind>,

    /// Path of the document for the local backend.
    #[arg(long, env = "TASKCFG_DATA_PATH")]
    data_path: Option<PathBuf>,

    /// Tag encoding written on save (`key_folded` or `field`).
    #[arg(long, env = "TASKCFG_ENCODING")]
    encoding: Option<TagEncoding>,

    /// Seconds before a status message clears itself.
    #[arg(long, env = "TASKCFG_STATUS_CLEAR_SECS")]
    status_clear_secs: Option<u64>,

    /// Id of the gist holding the document.
    #[arg(long, env = "GIST_ID")]
    gist_id: Option<String>,

    /// GitHub access token with gist scope.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,
}

impl Cli {
    /// Overlays the flags that were given onto the settings file values.
    fn apply_overrides(&self, settings: &mut SettingsFile) {
        if let Some(bind) = &self.bind {
            settings.server.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(secs) = self.status_clear_secs {
            settings.server.status_clear_secs = secs;
        }
        if let Some(backend) = self.backend {
            settings.storage.backend = backend;
        }
        if let Some(encoding) = self.encoding {
            settings.storage.encoding = encoding;
        }
        if let Some(path) = &self.data_path {
            settings.storage.local.path = path.clone();
        }
    }

    /// Resolves the final [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed, or if
    /// the bind address is not an IP address.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let mut settings = match &self.settings {
            Some(path) => load_settings(Some(path))
                .with_context(|| format!("failed to load settings from {}", path.display()))?,
            None => SettingsFile::default(),
        };
        self.apply_overrides(&mut settings);

        settings
            .into_server_config(self.gist_id, self.github_token)
            .context("invalid server settings")
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;

    info!(
        "taskcfg editor starting: ws={}, backend={}, encoding={}",
        config.bind_addr,
        config.storage.backend.kind(),
        config.storage.encoding
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    // The accept loop polls this flag, so shutdown takes effect within one
    // poll interval.
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("taskcfg editor stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
