//! Native WebSocket client for the packet capture backend
//!
//! Uses tokio-tungstenite on a background task. Answers the Engine.IO
//! handshake and heartbeats itself and forwards every data frame into a
//! bounded queue that the scene owner drains without blocking. Once the
//! server has announced its heartbeat timing, a silent connection is
//! dropped after `pingInterval + pingTimeout` and reconnected.

use crate::core::{control_frame, parse_handshake, ControlFrame};
use crate::ws_state::WsState;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Frames buffered between the socket and the scene owner
pub const QUEUE_CAPACITY: usize = 4096;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Engine.IO message + Socket.IO connect to the default namespace
const NAMESPACE_CONNECT: &str = "40";
/// Engine.IO pong
const PONG: &str = "3";

/// Native WebSocket client running on a background task
pub struct NativeWsClient {
    /// Receiver for incoming text frames
    rx: mpsc::Receiver<String>,
    /// Shared connection state
    pub state: Arc<Mutex<WsState>>,
    /// Frames dropped because the queue was full
    dropped: Arc<AtomicU64>,
    /// Dropping or firing this ends the session
    shutdown: Option<oneshot::Sender<()>>,
}

/// Everything a background session needs
struct Session {
    url: String,
    tx: mpsc::Sender<String>,
    state: Arc<Mutex<WsState>>,
    dropped: Arc<AtomicU64>,
    shutdown: oneshot::Receiver<()>,
}

#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// Owner released the channel
    Released,
    /// Connection lost or refused; `connected` tells if it was ever up
    Lost { connected: bool },
}

impl NativeWsClient {
    /// Connect from a non-async host (the viewer).
    ///
    /// Spawns a background thread with its own tokio runtime.
    pub fn connect(url: &str) -> Self {
        let (client, session) = Self::pair(url);
        let state = client.state.clone();

        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!(error = %e, "Failed to create tokio runtime");
                    *state.lock() = WsState::Error(e.to_string());
                    return;
                }
            };
            rt.block_on(session.run());
        });

        client
    }

    /// Connect from inside a tokio runtime (the CLI)
    pub fn spawn(url: &str) -> Self {
        let (client, session) = Self::pair(url);
        tokio::spawn(session.run());
        client
    }

    fn pair(url: &str) -> (Self, Session) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let state = Arc::new(Mutex::new(WsState::Connecting));
        let dropped = Arc::new(AtomicU64::new(0));

        let session = Session {
            url: url.to_string(),
            tx,
            state: state.clone(),
            dropped: dropped.clone(),
            shutdown: shutdown_rx,
        };
        let client = Self {
            rx,
            state,
            dropped,
            shutdown: Some(shutdown_tx),
        };
        (client, session)
    }

    /// Next queued frame, if any. Never blocks.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next frame. None once the session has ended.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub fn state(&self) -> WsState {
        self.state.lock().clone()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// End the session and stop delivery. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
            self.rx.close();
            info!("Ingestion channel released");
        }
    }
}

impl Drop for NativeWsClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Session {
    /// Connect, stream, reconnect with backoff until released
    async fn run(mut self) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            *self.state.lock() = WsState::Connecting;

            let end = tokio::select! {
                _ = &mut self.shutdown => SessionEnd::Released,
                end = stream(&self.url, &self.tx, &self.state, &self.dropped) => end,
            };

            match end {
                SessionEnd::Released => break,
                SessionEnd::Lost { connected } => {
                    if connected {
                        backoff = INITIAL_BACKOFF;
                    }
                }
            }

            warn!(retry_in = ?backoff, "WebSocket down, reconnecting");
            tokio::select! {
                _ = &mut self.shutdown => break,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }

        *self.state.lock() = WsState::Disconnected;
        info!(url = %self.url, "Ingestion session ended");
    }
}

/// One connection lifetime
async fn stream(
    url: &str,
    tx: &mpsc::Sender<String>,
    state: &Mutex<WsState>,
    dropped: &AtomicU64,
) -> SessionEnd {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::{connect_async, tungstenite::Message};

    info!(url, "Connecting to WebSocket");

    let ws_stream = match connect_async(url).await {
        Ok((stream, _)) => {
            info!("WebSocket connected");
            *state.lock() = WsState::Connected;
            stream
        }
        Err(e) => {
            error!(error = %e, "Failed to connect");
            *state.lock() = WsState::Error(e.to_string());
            return SessionEnd::Lost { connected: false };
        }
    };

    let (mut write, mut read) = ws_stream.split();
    // Armed by the open frame; any frame from the server restarts it
    let mut liveness: Option<Duration> = None;

    loop {
        let next = match liveness {
            Some(window) => match tokio::time::timeout(window, read.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(silent_for = ?window, "No heartbeat from server, dropping connection");
                    *state.lock() = WsState::Disconnected;
                    return SessionEnd::Lost { connected: true };
                }
            },
            None => read.next().await,
        };
        let Some(msg) = next else { break };

        match msg {
            Ok(Message::Text(text)) => {
                let reply = match control_frame(&text) {
                    Some(ControlFrame::Open) => {
                        liveness = parse_handshake(&text).map(|h| h.liveness_window());
                        debug!(liveness = ?liveness, "Engine.IO open, joining namespace");
                        Some(NAMESPACE_CONNECT)
                    }
                    Some(ControlFrame::Ping) => Some(PONG),
                    Some(ControlFrame::Close) => {
                        warn!("Session closed by server");
                        break;
                    }
                    None => {
                        if !forward(tx, text.to_string(), dropped) {
                            // Receiver dropped, the owner is gone
                            return SessionEnd::Released;
                        }
                        None
                    }
                };

                if let Some(reply) = reply {
                    if let Err(e) = write.send(Message::Text(reply.into())).await {
                        error!(error = %e, "Failed to answer handshake");
                        *state.lock() = WsState::Error(e.to_string());
                        return SessionEnd::Lost { connected: true };
                    }
                }
            }
            Ok(Message::Close(_)) => {
                warn!("WebSocket closed by server");
                break;
            }
            Err(e) => {
                error!(error = %e, "WebSocket error");
                *state.lock() = WsState::Error(e.to_string());
                return SessionEnd::Lost { connected: true };
            }
            _ => {}
        }
    }

    warn!("WebSocket stream ended");
    *state.lock() = WsState::Disconnected;
    SessionEnd::Lost { connected: true }
}

/// Queue a frame without waiting. Returns false once the receiver is gone.
fn forward(tx: &mpsc::Sender<String>, frame: String, dropped: &AtomicU64) -> bool {
    match tx.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            let total = dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if total % 1000 == 1 {
                warn!(dropped_total = total, "Ingestion queue full, dropping frames");
            }
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}
