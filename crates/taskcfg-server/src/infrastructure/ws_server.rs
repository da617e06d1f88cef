//! WebSocket server: accept loop and per-browser editor sessions.
//!
//! Each accepted connection gets its own [`EditorSession`], all sharing one
//! [`ConfigStore`].  A session runs two halves:
//!
//! - **Reader** (the connection task itself): parses browser commands and
//!   applies them.  Loads and saves are spawned as separate tasks so edits
//!   stay responsive; those tasks finish even if the browser disconnects.
//! - **Writer** (spawned): forwards every published snapshot, plus direct
//!   replies such as `Rejected`, as JSON text frames.
//!
//! On connect the browser receives the current snapshot and an initial load
//! is started.
//!
//! Shutdown is driven by the shared `running` flag, checked between accept
//! attempts.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::application::{ConfigStore, EditorError, EditorSession, SessionOptions};
use crate::domain::config::ServerConfig;
use crate::domain::messages::{browser_msg_type_name, BrowserToServerMsg, ServerToBrowserMsg};
use crate::domain::session::SessionSnapshot;
use crate::infrastructure::storage::build_store;

/// How often the accept loop re-checks the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Capacity of the per-session queue of direct replies.
const REPLY_QUEUE_DEPTH: usize = 16;

type WsSink = SplitSink<WebSocketStream<TcpStream>, WsMessage>;

// ── Public API ────────────────────────────────────────────────────────────────

/// Builds the storage backend, binds `config.bind_addr` and serves editor
/// sessions until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the backend cannot be built or the listener cannot
/// be bound.
pub async fn run_server(config: ServerConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let store = build_store(&config.storage).context("failed to initialise storage backend")?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;
    info!("taskcfg editor listening on ws://{}", config.bind_addr);

    serve(listener, store, SessionOptions::from(&config), running).await
}

/// Accepts connections on an already-bound `listener`.
///
/// Split from [`run_server`] so callers can bind an ephemeral port first.
pub async fn serve(
    listener: TcpListener,
    store: Arc<dyn ConfigStore>,
    options: SessionOptions,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new browser connection from {peer_addr}");
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    handle_browser_session(stream, peer_addr, store, options).await;
                });
            }
            Ok(Err(e)) => {
                error!("accept error: {e}");
            }
            Err(_) => {
                // No connection this interval; re-check the flag.
            }
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_browser_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    store: Arc<dyn ConfigStore>,
    options: SessionOptions,
) {
    match run_session(raw_stream, peer_addr, store, options).await {
        Ok(()) => info!("session {peer_addr} closed normally"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    store: Arc<dyn ConfigStore>,
    options: SessionOptions,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let session = EditorSession::new(store, options);
    info!(session = %session.id(), "editor session opened for {peer_addr}");

    let (ws_tx, mut ws_rx) = ws_stream.split();
    let (reply_tx, reply_rx) = mpsc::channel::<ServerToBrowserMsg>(REPLY_QUEUE_DEPTH);

    let writer = tokio::spawn(forward_to_browser(
        ws_tx,
        session.subscribe(),
        reply_rx,
        peer_addr,
    ));

    spawn_store_op(&session, &reply_tx, StoreOp::Load);

    loop {
        let ws_msg = match ws_rx.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("session {peer_addr}: browser WebSocket closed");
                break;
            }
            Some(Err(e)) => {
                warn!("session {peer_addr}: browser WebSocket error: {e}");
                break;
            }
            None => {
                debug!("session {peer_addr}: browser stream ended");
                break;
            }
        };

        match ws_msg {
            WsMessage::Text(text) => match serde_json::from_str::<BrowserToServerMsg>(&text) {
                Ok(msg) => {
                    debug!("session {peer_addr}: {}", browser_msg_type_name(&msg));
                    dispatch(&session, &reply_tx, msg).await;
                }
                Err(e) => {
                    warn!("session {peer_addr}: invalid JSON from browser: {e}");
                    let reply = ServerToBrowserMsg::ProtocolError {
                        message: e.to_string(),
                    };
                    if reply_tx.send(reply).await.is_err() {
                        break;
                    }
                }
            },
            WsMessage::Binary(_) => {
                warn!("session {peer_addr}: unexpected binary WebSocket frame (ignored)");
            }
            WsMessage::Close(_) => {
                debug!("session {peer_addr}: WebSocket Close frame received");
                break;
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    }

    writer.abort();
    Ok(())
}

/// Applies one browser command to the session.
async fn dispatch(
    session: &EditorSession,
    replies: &mpsc::Sender<ServerToBrowserMsg>,
    msg: BrowserToServerMsg,
) {
    match msg {
        BrowserToServerMsg::Load => spawn_store_op(session, replies, StoreOp::Load),
        BrowserToServerMsg::Save => spawn_store_op(session, replies, StoreOp::Save),
        BrowserToServerMsg::AddTask => session.add_task().await,
        BrowserToServerMsg::RemoveTask { index } => {
            session.remove_task(index).await;
        }
        BrowserToServerMsg::UpdateField { field, value } => {
            session.update_field(field, value).await;
        }
        BrowserToServerMsg::UpdateTask {
            index,
            field,
            value,
        } => {
            session.update_task(index, field, value).await;
        }
        BrowserToServerMsg::Import { text } => {
            // Parse failures are already reported as an error status.
            if let Some(reply) = session
                .import_from_file(&text)
                .await
                .err()
                .and_then(|e| rejection(&e))
            {
                let _ = replies.send(reply).await;
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StoreOp {
    Load,
    Save,
}

/// Runs a load or save in its own task so it completes independently of the
/// connection.
fn spawn_store_op(
    session: &EditorSession,
    replies: &mpsc::Sender<ServerToBrowserMsg>,
    op: StoreOp,
) {
    let session = session.clone();
    let replies = replies.clone();
    tokio::spawn(async move {
        let result = match op {
            StoreOp::Load => session.load().await,
            StoreOp::Save => session.save().await,
        };
        if let Some(reply) = result.err().and_then(|e| rejection(&e)) {
            debug!(session = %session.id(), "{op:?} rejected");
            // The browser may already be gone.
            let _ = replies.send(reply).await;
        }
    });
}

/// Maps a refused operation to the reply the browser should see.
///
/// Store and format failures return `None`: the session already published
/// them as an error status.
fn rejection(err: &EditorError) -> Option<ServerToBrowserMsg> {
    match err {
        EditorError::Busy(_) => Some(ServerToBrowserMsg::Rejected {
            reason: err.to_string(),
        }),
        EditorError::Store(_) | EditorError::Format(_) => None,
    }
}

// ── Writer half ───────────────────────────────────────────────────────────────

async fn forward_to_browser(
    mut sink: WsSink,
    mut updates: watch::Receiver<SessionSnapshot>,
    mut replies: mpsc::Receiver<ServerToBrowserMsg>,
    peer_addr: SocketAddr,
) {
    let initial = ServerToBrowserMsg::Snapshot(updates.borrow_and_update().clone());
    if let Err(e) = send_json(&mut sink, &initial).await {
        debug!("session {peer_addr}: {e:#}");
        return;
    }

    loop {
        let msg = tokio::select! {
            changed = updates.changed() => match changed {
                Ok(()) => {
                    let snapshot = updates.borrow_and_update().clone();
                    ServerToBrowserMsg::Snapshot(snapshot)
                }
                Err(_) => break,
            },
            reply = replies.recv() => match reply {
                Some(reply) => reply,
                None => break,
            },
        };

        if let Err(e) = send_json(&mut sink, &msg).await {
            debug!("session {peer_addr}: {e:#} (browser disconnected)");
            break;
        }
    }

    let _ = sink.close().await;
}

async fn send_json(sink: &mut WsSink, msg: &ServerToBrowserMsg) -> anyhow::Result<()> {
    let text = serde_json::to_string(msg).context("failed to serialise server message")?;
    sink.send(WsMessage::Text(text))
        .await
        .context("WebSocket send failed")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
