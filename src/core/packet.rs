//! Packet telemetry types
//!
//! - Protocol: transport category used for presentation
//! - PacketMessage: one decoded inbound message (no identity yet)
//! - TelemetryEvent: a buffered packet with its ingestion-time identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity assigned when a packet enters the buffer.
/// Monotonic per buffer, never reused.
pub type EventId = u64;

/// Transport protocol of an observed packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    Tcp,
    Udp,
    #[default]
    Other,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::Tcp, Protocol::Udp, Protocol::Other];

    /// Map a wire label to a protocol. Total: unknown labels are `Other`.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("TCP") {
            Protocol::Tcp
        } else if label.eq_ignore_ascii_case("UDP") {
            Protocol::Udp
        } else {
            Protocol::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Other => "OTHER",
        }
    }
}

impl From<String> for Protocol {
    fn from(label: String) -> Self {
        Protocol::from_label(&label)
    }
}

impl From<Protocol> for String {
    fn from(protocol: Protocol) -> Self {
        protocol.label().to_string()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A decoded packet message, as sent by the capture backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketMessage {
    #[serde(rename = "src", alias = "source")]
    pub source: String,
    #[serde(rename = "dst", alias = "destination")]
    pub destination: String,
    pub protocol: Protocol,
    /// Packet length in bytes
    pub size: u64,
}

impl PacketMessage {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        protocol: Protocol,
        size: u64,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            protocol,
            size,
        }
    }
}

/// A buffered packet observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryEvent {
    pub id: EventId,
    pub source: String,
    pub destination: String,
    pub protocol: Protocol,
    pub size: u64,
}

impl TelemetryEvent {
    pub fn from_message(id: EventId, msg: PacketMessage) -> Self {
        Self {
            id,
            source: msg.source,
            destination: msg.destination,
            protocol: msg.protocol,
            size: msg.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_from_label() {
        assert_eq!(Protocol::from_label("TCP"), Protocol::Tcp);
        assert_eq!(Protocol::from_label("udp"), Protocol::Udp);
        assert_eq!(Protocol::from_label("OTHER"), Protocol::Other);
        assert_eq!(Protocol::from_label("ICMP"), Protocol::Other);
        assert_eq!(Protocol::from_label(""), Protocol::Other);
    }

    #[test]
    fn test_message_accepts_short_and_long_field_names() {
        let short: PacketMessage = serde_json::from_str(
            r#"{"src": "10.0.0.1", "dst": "10.0.0.2", "protocol": "TCP", "size": 60}"#,
        )
        .unwrap();
        let long: PacketMessage = serde_json::from_str(
            r#"{"source": "10.0.0.1", "destination": "10.0.0.2", "protocol": "TCP", "size": 60}"#,
        )
        .unwrap();
        assert_eq!(short, long);
        assert_eq!(short.protocol, Protocol::Tcp);
    }

    #[test]
    fn test_message_unknown_protocol_is_other() {
        let msg: PacketMessage = serde_json::from_str(
            r#"{"src": "a", "dst": "b", "protocol": "SCTP", "size": 1}"#,
        )
        .unwrap();
        assert_eq!(msg.protocol, Protocol::Other);
    }

    #[test]
    fn test_message_serializes_wire_names() {
        let msg = PacketMessage::new("a", "b", Protocol::Udp, 42);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["src"], "a");
        assert_eq!(json["dst"], "b");
        assert_eq!(json["protocol"], "UDP");
        assert_eq!(json["size"], 42);
    }
}
