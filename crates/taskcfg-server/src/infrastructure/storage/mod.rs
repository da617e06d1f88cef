//! Storage infrastructure: the [`ConfigStore`] backends.
//!
//! - **`local_file`** – a JSON file on the local file system.
//! - **`gist`**       – one file inside a GitHub gist.
//!
//! [`build_store`] turns the configured [`StorageBackend`] into a shared
//! trait object; nothing else in the crate names a concrete backend.

pub mod gist;
pub mod local_file;

use std::sync::Arc;

use tracing::info;

use crate::application::config_store::{ConfigStore, StoreError};
use crate::domain::config::{StorageBackend, StorageSettings};

pub use gist::GistStore;
pub use local_file::LocalFileStore;

/// Creates the backend selected by `settings`.
///
/// # Errors
///
/// Returns [`StoreError::Transport`] if the gist HTTP client cannot be built.
/// Missing gist credentials are not an error here; they surface on first use.
pub fn build_store(settings: &StorageSettings) -> Result<Arc<dyn ConfigStore>, StoreError> {
    let store: Arc<dyn ConfigStore> = match &settings.backend {
        StorageBackend::LocalFile { path } => Arc::new(LocalFileStore::new(path.clone())),
        StorageBackend::Gist(gist) => Arc::new(GistStore::new(gist.clone())?),
    };
    info!(backend = settings.backend.kind(), store = %store.describe(), "storage ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::GistSettings;

    #[test]
    fn test_build_store_selects_local_file() {
        let store = build_store(&StorageSettings::default()).unwrap();
        assert_eq!(store.describe(), "local file data/config.json");
    }

    #[test]
    fn test_build_store_selects_gist_without_credentials() {
        let settings = StorageSettings {
            backend: StorageBackend::Gist(GistSettings::default()),
            ..StorageSettings::default()
        };

        let store = build_store(&settings).unwrap();

        assert_eq!(store.describe(), "gist <unset> (config.json)");
    }
}
