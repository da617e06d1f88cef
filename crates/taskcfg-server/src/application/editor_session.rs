//! EditorSession: drives an [`EditorState`] against a [`ConfigStore`].
//!
//! One session exists per browser connection.  The state sits behind a
//! `tokio::sync::Mutex` that is released before any store call, so edits
//! and snapshots stay responsive while a load or save is in flight.
//!
//! Every state change is published on a `watch` channel as a full
//! [`SessionSnapshot`]; the WebSocket layer forwards those to the browser.

use std::sync::Arc;
use std::time::Duration;

use taskcfg_core::{decode, encode, ConfigField, Configuration, TagEncoding, TaskField};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config_store::{ConfigStore, StoreError};
use super::editor_state::{EditorError, EditorState};
use crate::domain::config::{ServerConfig, DEFAULT_STATUS_CLEAR_AFTER};
use crate::domain::session::{SessionPhase, SessionSnapshot};

/// Per-session behaviour knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Encoding used for saving and for the preview.
    pub encoding: TagEncoding,
    /// Lifetime of a posted status message.
    pub status_clear_after: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            encoding: TagEncoding::default(),
            status_clear_after: DEFAULT_STATUS_CLEAR_AFTER,
        }
    }
}

impl From<&ServerConfig> for SessionOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            encoding: config.storage.encoding,
            status_clear_after: config.status_clear_after,
        }
    }
}

struct Shared {
    state: Mutex<EditorState>,
    updates: watch::Sender<SessionSnapshot>,
    encoding: TagEncoding,
}

impl Shared {
    fn publish(&self, state: &EditorState) {
        self.updates.send_replace(state.snapshot(self.encoding));
    }
}

/// Async controller for one editor.  Cheap to clone; clones share state.
#[derive(Clone)]
pub struct EditorSession {
    id: Uuid,
    store: Arc<dyn ConfigStore>,
    status_clear_after: Duration,
    shared: Arc<Shared>,
}

impl EditorSession {
    pub fn new(store: Arc<dyn ConfigStore>, options: SessionOptions) -> Self {
        let state = EditorState::new();
        let (updates, _) = watch::channel(state.snapshot(options.encoding));
        Self {
            id: Uuid::new_v4(),
            store,
            status_clear_after: options.status_clear_after,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                updates,
                encoding: options.encoding,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns a receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.updates.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.state.lock().await;
        state.snapshot(self.shared.encoding)
    }

    // ── Load / save ───────────────────────────────────────────────────────────

    /// Replaces the configuration with the stored document.
    ///
    /// The store call and its completion run in a spawned task, so the load
    /// finishes and the session returns to idle even if this future is
    /// dropped.
    ///
    /// # Errors
    ///
    /// - [`EditorError::Busy`] if a load or save is running; nothing changes.
    /// - [`EditorError::Store`] / [`EditorError::Format`] after the failure
    ///   has been posted as an error status.
    pub async fn load(&self) -> Result<(), EditorError> {
        self.enter(SessionPhase::Loading).await?;
        info!(session = %self.id, store = %self.store.describe(), "loading configuration");

        let worker = self.clone();
        let task = tokio::spawn(async move {
            let outcome = worker.fetch().await;
            if let Err(e) = &outcome {
                warn!(session = %worker.id, "load failed: {e}");
            }
            let mut state = worker.shared.state.lock().await;
            let result = state.finish_load(outcome);
            worker.settle(&state);
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                let mut state = self.shared.state.lock().await;
                let result = state.finish_load(Err(aborted("load", e)));
                self.settle(&state);
                result
            }
        }
    }

    /// Writes the current configuration to the store.
    ///
    /// The document is encoded when the save starts; edits made while the
    /// write is in flight are kept locally but not part of this save.  Like
    /// [`load`](Self::load), the write completes even if this future is
    /// dropped.
    pub async fn save(&self) -> Result<(), EditorError> {
        let blob = {
            let mut state = self.shared.state.lock().await;
            state.begin(SessionPhase::Saving)?;
            self.shared.publish(&state);
            encode(state.config(), self.shared.encoding)
        };
        info!(session = %self.id, store = %self.store.describe(), "saving configuration");

        let worker = self.clone();
        let task = tokio::spawn(async move {
            let outcome = worker.store.write(&blob).await.map_err(EditorError::from);
            if let Err(e) = &outcome {
                warn!(session = %worker.id, "save failed: {e}");
            }
            let mut state = worker.shared.state.lock().await;
            let result = state.finish_save(outcome);
            worker.settle(&state);
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                let mut state = self.shared.state.lock().await;
                let result = state.finish_save(Err(aborted("save", e)));
                self.settle(&state);
                result
            }
        }
    }

    // ── Edits ─────────────────────────────────────────────────────────────────

    pub async fn add_task(&self) {
        let mut state = self.shared.state.lock().await;
        state.add_task();
        self.shared.publish(&state);
    }

    /// Removes the task at `index`.  Returns `false` when out of range.
    pub async fn remove_task(&self, index: usize) -> bool {
        let mut state = self.shared.state.lock().await;
        let removed = state.remove_task(index);
        if removed {
            self.shared.publish(&state);
        } else {
            debug!(session = %self.id, index, "remove_task index out of range");
        }
        removed
    }

    pub async fn update_field(&self, field: ConfigField, value: String) {
        let mut state = self.shared.state.lock().await;
        state.update_field(field, value);
        self.shared.publish(&state);
    }

    pub async fn update_task(&self, index: usize, field: TaskField, value: String) -> bool {
        let mut state = self.shared.state.lock().await;
        let updated = state.update_task(index, field, value);
        if updated {
            self.shared.publish(&state);
        } else {
            debug!(session = %self.id, index, "update_task index out of range");
        }
        updated
    }

    /// Replaces the configuration with an imported document.  No store I/O.
    ///
    /// Refused with [`EditorError::Busy`] while a load or save is running;
    /// that publishes nothing.
    pub async fn import_from_file(&self, text: &str) -> Result<(), EditorError> {
        let mut state = self.shared.state.lock().await;
        let result = state.import_from_file(text);
        match &result {
            Err(EditorError::Busy(phase)) => {
                debug!(session = %self.id, "import refused while {phase}");
                return Err(EditorError::Busy(*phase));
            }
            Err(e) => warn!(session = %self.id, "import rejected: {e}"),
            Ok(()) => {}
        }
        self.settle(&state);
        result
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    async fn enter(&self, phase: SessionPhase) -> Result<(), EditorError> {
        let mut state = self.shared.state.lock().await;
        state.begin(phase)?;
        self.shared.publish(&state);
        Ok(())
    }

    async fn fetch(&self) -> Result<Configuration, EditorError> {
        let raw = self.store.read().await?;
        Ok(decode(&raw)?)
    }

    /// Publishes the state and arms the auto-clear for its current status.
    fn settle(&self, state: &EditorState) {
        self.shared.publish(state);

        let generation = state.status_generation();
        let shared = Arc::clone(&self.shared);
        let ttl = self.status_clear_after;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut state = shared.state.lock().await;
            if state.clear_status(generation) {
                shared.publish(&state);
            }
        });
    }
}

/// A store task that panicked or was cancelled still has to release the phase.
fn aborted(op: &str, err: JoinError) -> EditorError {
    error!("{op} task ended abnormally: {err}");
    StoreError::Transport(format!("{op} did not complete: {err}")).into()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
