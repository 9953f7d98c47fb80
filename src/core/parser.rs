//! Frame decoder for packet telemetry
//!
//! Accepts three framings of the same packet object:
//! - bare JSON: `{"src": .., "dst": .., "protocol": .., "size": ..}`
//! - envelope: `{"event": "packet_data", "data": {..}}`
//! - Socket.IO event frame: `42["packet_data", {..}]`
//!
//! Engine.IO control frames are classified separately for the transport.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use super::PacketMessage;

/// Socket.IO event name emitted by the capture backend
pub const PACKET_EVENT: &str = "packet_data";

/// Reasons a packet frame was rejected
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid packet JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("packet payload is not a JSON object")]
    NotAnObject,
    #[error("malformed Socket.IO event frame")]
    BadEventFrame,
}

/// Engine.IO control frames the transport must react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFrame {
    /// `0{"sid":..}` handshake, answer with a namespace connect
    Open,
    /// `1` server is closing the session
    Close,
    /// `2` heartbeat, answer with `3`
    Ping,
}

/// Classify an Engine.IO control frame. Returns None for data frames.
pub fn control_frame(frame: &str) -> Option<ControlFrame> {
    match frame.as_bytes() {
        [b'0', b'{', ..] => Some(ControlFrame::Open),
        [b'1'] => Some(ControlFrame::Close),
        [b'2'] | [b'2', b'p', ..] => Some(ControlFrame::Ping),
        _ => None,
    }
}

/// Heartbeat timing announced in the `0{..}` open frame, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub ping_interval: u64,
    pub ping_timeout: u64,
}

impl Handshake {
    /// Silence after which the server counts as gone
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// Read the heartbeat timing from an open frame. None for any other frame
/// or an open payload without both timings.
pub fn parse_handshake(frame: &str) -> Option<Handshake> {
    let payload = frame.trim().strip_prefix('0')?;
    match serde_json::from_str(payload) {
        Ok(handshake) => Some(handshake),
        Err(e) => {
            trace!(error = %e, "Open frame without heartbeat timing");
            None
        }
    }
}

/// Decode a text frame into a packet message.
///
/// Returns `Ok(None)` for frames that carry no packet (control frames,
/// connect acks, other event names) and `Err` for malformed packet events.
pub fn parse_packet(frame: &str) -> Result<Option<PacketMessage>, MessageError> {
    let frame = frame.trim();

    if frame.starts_with('{') {
        let mut json: Value = serde_json::from_str(frame)?;
        let event_name = json.get("event").and_then(Value::as_str).map(str::to_owned);
        return match event_name {
            Some(name) if name == PACKET_EVENT => decode_object(json["data"].take()).map(Some),
            Some(name) => {
                trace!(event = %name, "Ignoring non-packet envelope");
                Ok(None)
            }
            None => decode_object(json).map(Some),
        };
    }

    if let Some(rest) = frame.strip_prefix("42") {
        return parse_socketio_event(rest);
    }

    trace!(len = frame.len(), "Ignoring non-packet frame");
    Ok(None)
}

/// Parse the part of a `42...` frame after the packet type
fn parse_socketio_event(rest: &str) -> Result<Option<PacketMessage>, MessageError> {
    // Optional namespace: `/name,`
    let rest = if rest.starts_with('/') {
        let comma = rest.find(',').ok_or(MessageError::BadEventFrame)?;
        &rest[comma + 1..]
    } else {
        rest
    };
    // Optional ack id
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    let json: Value = serde_json::from_str(rest)?;
    let Value::Array(mut items) = json else {
        return Err(MessageError::BadEventFrame);
    };

    match items.first().and_then(Value::as_str) {
        Some(PACKET_EVENT) => {}
        Some(name) => {
            trace!(event = %name, "Ignoring Socket.IO event");
            return Ok(None);
        }
        None => return Err(MessageError::BadEventFrame),
    }

    if items.len() < 2 {
        return Err(MessageError::BadEventFrame);
    }
    decode_object(items.swap_remove(1)).map(Some)
}

fn decode_object(value: Value) -> Result<PacketMessage, MessageError> {
    if !value.is_object() {
        return Err(MessageError::NotAnObject);
    }
    Ok(serde_json::from_value(value)?)
}
