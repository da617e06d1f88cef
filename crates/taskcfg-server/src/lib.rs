//! taskcfg-server library crate.
//!
//! This crate serves the taskcfg editor to a browser over WebSocket and
//! persists the edited configuration to a local JSON file or a GitHub gist.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (JSON over WebSocket)
//!         ↕
//! [taskcfg-server]
//!   ├── domain/           Pure types: protocol messages, session snapshot, ServerConfig
//!   ├── application/      ConfigStore trait, EditorState machine, EditorSession driver
//!   └── infrastructure/
//!         ├── storage/    LocalFileStore and GistStore (ConfigStore impls)
//!         ├── settings    TOML settings file
//!         └── ws_server   WebSocket accept loop (tokio-tungstenite)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `taskcfg-core`; it reaches storage
//!   only through the [`application::ConfigStore`] trait.
//! - `infrastructure` depends on all other layers plus `tokio`, `reqwest`
//!   and `tungstenite`.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: the editor controller and the storage seam.
pub mod application;

/// Infrastructure layer: storage backends, settings file, WebSocket server.
pub mod infrastructure;
