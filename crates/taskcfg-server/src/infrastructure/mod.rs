//! Infrastructure layer for taskcfg-server.
//!
//! Everything that touches the outside world lives here:
//!
//! - `storage`   – the local file and gist [`ConfigStore`] backends
//! - `settings`  – the optional TOML settings file
//! - `ws_server` – the browser-facing WebSocket server
//!
//! [`ConfigStore`]: crate::application::ConfigStore

pub mod settings;
pub mod storage;
pub mod ws_server;

pub use ws_server::{run_server, serve};
