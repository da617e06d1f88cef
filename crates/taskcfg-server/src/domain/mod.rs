//! Domain layer for taskcfg-server.
//!
//! Pure types with no dependencies on I/O, networking, or async runtimes.
//!
//! - Runtime configuration ([`ServerConfig`] and the storage selection)
//! - The browser-facing message types
//! - The session view sent to the browser ([`SessionSnapshot`])

pub mod config;
pub mod messages;
pub mod session;

pub use config::{GistSettings, ServerConfig, StorageBackend, StorageSettings};
pub use messages::{BrowserToServerMsg, ServerToBrowserMsg};
pub use session::{SessionPhase, SessionSnapshot, StatusKind, StatusMessage};
