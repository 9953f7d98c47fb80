//! Platform-agnostic core - shared between the viewer, the WASM build and the CLI

pub mod buffer;
pub mod config;
pub mod frame;
pub mod packet;
pub mod palette;
pub mod parser;
pub mod particles;
pub mod scene;
pub mod synthetic;

pub use buffer::{PacketBuffer, Snapshot, DEFAULT_CAPACITY};
pub use config::{ConfigError, SceneConfig};
pub use frame::FrameReport;
pub use packet::{EventId, PacketMessage, Protocol, TelemetryEvent};
pub use palette::{protocol_color, ParticleStyle, Rgb, LEGEND};
pub use parser::{control_frame, parse_handshake, parse_packet, ControlFrame, Handshake, MessageError};
pub use particles::{ParticleEntity, ParticleField, ReconcileReport};
pub use scene::{Ingest, PacketScene, SceneStats};
pub use synthetic::SyntheticFeed;
