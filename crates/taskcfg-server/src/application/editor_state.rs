//! EditorState: the synchronous core of an editor session.
//!
//! Holds the editable [`Configuration`], the load/save phase and the current
//! transient status.  It performs no I/O; [`super::editor_session`] drives it
//! around the store calls.
//!
//! # Phases
//!
//! ```text
//! Idle ──begin(Loading)──► Loading ──finish_load()──► Idle
//! Idle ──begin(Saving)───► Saving  ──finish_save()──► Idle
//! ```
//!
//! `begin` outside `Idle` fails with [`EditorError::Busy`] and changes
//! nothing.  Field edits are accepted in every phase; a completed load
//! replaces whatever was edited meanwhile.  An import replaces the whole
//! document, so it is refused with [`EditorError::Busy`] outside `Idle`.
//!
//! # Status generations
//!
//! Every posted status bumps a generation counter.  A clear request carries
//! the generation it was armed for and is ignored once a newer status exists.

use taskcfg_core::{
    decode, encode, parse_document, to_pretty_string, ConfigField, Configuration, FormatError,
    TagEncoding, TaskField,
};
use thiserror::Error;

use super::config_store::StoreError;
use crate::domain::session::{SessionPhase, SessionSnapshot, StatusMessage};

/// Errors returned by editor operations.
///
/// None of these are fatal; store and format failures have already been
/// turned into an error status by the time the caller sees them.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Format(#[from] FormatError),

    /// A load or save is already in flight.
    #[error("configuration is busy ({0})")]
    Busy(SessionPhase),
}

/// Editable configuration plus session bookkeeping.
#[derive(Debug, Default)]
pub struct EditorState {
    config: Configuration,
    phase: SessionPhase,
    status: Option<StatusMessage>,
    status_generation: u64,
}

impl EditorState {
    /// Creates an idle state holding an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Generation of the most recently posted status.
    pub fn status_generation(&self) -> u64 {
        self.status_generation
    }

    // ── Load / save lifecycle ─────────────────────────────────────────────────

    /// Enters `phase` (`Loading` or `Saving`).
    ///
    /// # Errors
    ///
    /// [`EditorError::Busy`] when another load or save has not finished.
    pub fn begin(&mut self, phase: SessionPhase) -> Result<(), EditorError> {
        if self.phase != SessionPhase::Idle {
            return Err(EditorError::Busy(self.phase));
        }
        self.phase = phase;
        Ok(())
    }

    /// Completes a load, replacing the configuration on success.
    ///
    /// Posts a status either way and returns to `Idle`.  The error, if any,
    /// is handed back to the caller.
    pub fn finish_load(
        &mut self,
        outcome: Result<Configuration, EditorError>,
    ) -> Result<(), EditorError> {
        self.phase = SessionPhase::Idle;
        match outcome {
            Ok(config) => {
                self.config = config;
                self.post_status(StatusMessage::success("Configuration loaded"));
                Ok(())
            }
            Err(err) => {
                self.post_status(StatusMessage::error(format!(
                    "Failed to load configuration: {err}"
                )));
                Err(err)
            }
        }
    }

    /// Completes a save.  Local edits are kept whatever the outcome.
    pub fn finish_save(&mut self, outcome: Result<(), EditorError>) -> Result<(), EditorError> {
        self.phase = SessionPhase::Idle;
        match outcome {
            Ok(()) => {
                self.post_status(StatusMessage::success("Configuration saved"));
                Ok(())
            }
            Err(err) => {
                self.post_status(StatusMessage::error(format!(
                    "Failed to save configuration: {err}"
                )));
                Err(err)
            }
        }
    }

    // ── Edits ─────────────────────────────────────────────────────────────────

    pub fn add_task(&mut self) {
        self.config.add_task();
    }

    pub fn remove_task(&mut self, index: usize) -> bool {
        self.config.remove_task(index)
    }

    pub fn update_field(&mut self, field: ConfigField, value: impl Into<String>) {
        self.config.update_field(field, value);
    }

    pub fn update_task(&mut self, index: usize, field: TaskField, value: impl Into<String>) -> bool {
        self.config.update_task(index, field, value)
    }

    /// Replaces the configuration with a document supplied as raw text.
    ///
    /// Nothing is replaced unless the whole document parses and validates.
    /// Does not touch the store.
    ///
    /// # Errors
    ///
    /// [`EditorError::Busy`] while a load or save is running, without posting
    /// a status; otherwise the parse or validation failure, after posting it.
    pub fn import_from_file(&mut self, text: &str) -> Result<(), EditorError> {
        if self.phase != SessionPhase::Idle {
            return Err(EditorError::Busy(self.phase));
        }
        match parse_document(text).and_then(|raw| decode(&raw)) {
            Ok(config) => {
                self.config = config;
                self.post_status(StatusMessage::success("Configuration imported"));
                Ok(())
            }
            Err(err) => {
                self.post_status(StatusMessage::error(format!("Import failed: {err}")));
                Err(err.into())
            }
        }
    }

    // ── Status ────────────────────────────────────────────────────────────────

    /// Replaces the current status and returns its generation.
    pub fn post_status(&mut self, status: StatusMessage) -> u64 {
        self.status_generation += 1;
        self.status = Some(status);
        self.status_generation
    }

    /// Clears the status if it is still the one posted as `generation`.
    ///
    /// Returns `true` when something was cleared.
    pub fn clear_status(&mut self, generation: u64) -> bool {
        if generation != self.status_generation || self.status.is_none() {
            return false;
        }
        self.status = None;
        true
    }

    /// Builds the browser view, including the document as it would be saved.
    pub fn snapshot(&self, encoding: TagEncoding) -> SessionSnapshot {
        SessionSnapshot {
            config: self.config.clone(),
            phase: self.phase,
            status: self.status.clone(),
            preview: to_pretty_string(&encode(&self.config, encoding)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
