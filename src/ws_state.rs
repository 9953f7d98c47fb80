//! Shared WebSocket connection state and endpoint resolution
//!
//! Used by both WASM and native WebSocket clients.

/// Env var overriding the ingestion endpoint
pub const URL_ENV: &str = "PACKETLENS_URL";

/// Default endpoint: the capture backend's Socket.IO server
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket";

const SOCKETIO_PATH: &str = "/socket.io/?EIO=4&transport=websocket";

/// WebSocket connection state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WsState {
    Connecting,
    Connected,
    Disconnected,
    Error(String),
}

impl WsState {
    pub fn is_connected(&self) -> bool {
        matches!(self, WsState::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            WsState::Connecting => "Connecting...",
            WsState::Connected => "Connected",
            WsState::Disconnected => "Disconnected",
            WsState::Error(_) => "Error",
        }
    }
}

/// Turn a user-supplied address into a WebSocket URL.
///
/// `http(s)://host:port` without a path becomes the Socket.IO websocket
/// endpoint on that host; `ws(s)://` URLs are used as given.
pub fn resolve_endpoint(raw: &str) -> String {
    let raw = raw.trim();
    let (scheme, rest) = if let Some(rest) = raw.strip_prefix("https://") {
        ("wss://", rest)
    } else if let Some(rest) = raw.strip_prefix("http://") {
        ("ws://", rest)
    } else {
        return raw.to_string();
    };

    let host = rest.trim_end_matches('/');
    if host.contains('/') {
        format!("{scheme}{host}")
    } else {
        format!("{scheme}{host}{SOCKETIO_PATH}")
    }
}

/// Endpoint from `PACKETLENS_URL`, or the default
#[cfg(not(target_arch = "wasm32"))]
pub fn endpoint_from_env() -> String {
    std::env::var(URL_ENV)
        .map(|url| resolve_endpoint(&url))
        .unwrap_or_else(|_| DEFAULT_WS_URL.to_string())
}
