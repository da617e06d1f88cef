//! Application layer for the editor service.
//!
//! - **`config_store`**   – The [`ConfigStore`] trait every storage backend
//!   implements, and [`StoreError`].
//! - **`editor_state`**   – [`EditorState`], the synchronous load/save state
//!   machine with edits and transient status messages.
//! - **`editor_session`** – [`EditorSession`], which runs an `EditorState`
//!   against a store and publishes snapshots.
//!
//! Nothing in here touches the file system or the network directly.

pub mod config_store;
pub mod editor_session;
pub mod editor_state;

pub use config_store::{ConfigStore, StoreError};
pub use editor_session::{EditorSession, SessionOptions};
pub use editor_state::{EditorError, EditorState};
