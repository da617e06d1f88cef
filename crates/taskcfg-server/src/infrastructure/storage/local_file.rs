//! Local file backend: one formatted JSON document at a fixed path.
//!
//! The directory and file are created lazily on first access.  A freshly
//! created file holds the empty document:
//!
//! ```json
//! {"name":"","description":"","task":[]}
//! ```
//!
//! Writes replace the file with two-space indented JSON.  Every write goes to
//! a sibling temp file that is then moved over the target, so a reader never
//! sees a truncated document.  The default document is published with a hard
//! link, which also never replaces a file that appeared in the meantime.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use taskcfg_core::{default_blob, to_pretty_string};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::config_store::{ConfigStore, StoreError};

/// [`ConfigStore`] backed by a file on the local file system.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    path: PathBuf,
    /// Orders this process's reads after completed writes.  Clones share it.
    access: Arc<RwLock<()>>,
}

impl LocalFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            access: Arc::new(RwLock::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(io_error(dir))?;
        }
        Ok(())
    }

    /// Creates the file with the empty document unless it already exists.
    async fn ensure_initialised(&self) -> Result<(), StoreError> {
        if tokio::fs::try_exists(&self.path)
            .await
            .map_err(io_error(&self.path))?
        {
            return Ok(());
        }
        self.ensure_parent_dir().await?;

        let tmp = self.write_temp(&default_blob().to_string()).await?;
        let linked = tokio::fs::hard_link(&tmp, &self.path).await;
        remove_temp(&tmp).await;
        match linked {
            Ok(()) => {
                info!(path = %self.path.display(), "created default configuration file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(io_error(&self.path)(e)),
        }
    }

    /// Writes `text` to a fresh file next to the target and returns its path.
    async fn write_temp(&self, text: &str) -> Result<PathBuf, StoreError> {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        let tmp = self
            .path
            .with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4()));

        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(text.as_bytes()).await?;
            file.sync_all().await
        }
        .await;
        match written {
            Ok(()) => Ok(tmp),
            Err(e) => {
                remove_temp(&tmp).await;
                Err(io_error(&tmp)(e))
            }
        }
    }
}

async fn remove_temp(tmp: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %tmp.display(), "failed to remove temp file: {e}");
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl ConfigStore for LocalFileStore {
    async fn read(&self) -> Result<Value, StoreError> {
        self.ensure_initialised().await?;

        let text = {
            let _guard = self.access.read().await;
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(io_error(&self.path))?
        };
        debug!(path = %self.path.display(), bytes = text.len(), "read configuration file");

        serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
            location: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn write(&self, blob: &Value) -> Result<(), StoreError> {
        self.ensure_parent_dir().await?;

        let text = to_pretty_string(blob);
        let _guard = self.access.write().await;
        let tmp = self.write_temp(&text).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            remove_temp(&tmp).await;
            return Err(io_error(&self.path)(e));
        }
        debug!(path = %self.path.display(), bytes = text.len(), "wrote configuration file");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("local file {}", self.path.display())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
