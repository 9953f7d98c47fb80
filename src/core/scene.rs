//! Packet scene - the hand-off point between ingestion and rendering
//!
//! Owns the bounded buffer, the particle arena and the config. The
//! ingestion side only calls `ingest`/`push`; the render side calls `tick`
//! once per frame. Both run on the same consumer, one call at a time, so a
//! reconciliation always sees the buffer between two completed appends.

use tracing::{debug, trace};

use super::frame::{self, FrameReport};
use super::parser::parse_packet;
use super::{
    ConfigError, EventId, PacketBuffer, PacketMessage, ParticleEntity, ParticleField,
    ReconcileReport, SceneConfig,
};

/// What happened to an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// Packet buffered under this id
    Appended(EventId),
    /// Not a packet frame (control frame, other event)
    Ignored,
    /// Malformed packet, discarded
    Rejected,
}

/// Running counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub received: u64,
    pub rejected: u64,
    pub ignored: u64,
    pub evicted: u64,
    pub spawned: u64,
    pub retired: u64,
    pub recycled: u64,
    pub frames: u64,
    pub live_particles: usize,
    pub buffered: usize,
}

pub struct PacketScene {
    config: SceneConfig,
    buffer: PacketBuffer,
    field: ParticleField,
    /// Buffer revision the field was last reconciled against
    reconciled_revision: Option<u64>,
    stats: SceneStats,
}

impl Default for PacketScene {
    fn default() -> Self {
        Self::with_field(SceneConfig::default(), ParticleField::new())
    }
}

impl PacketScene {
    /// Scene over a validated config
    pub fn new(config: SceneConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_field(config.validate()?, ParticleField::new()))
    }

    /// Scene with a deterministic spawner
    pub fn seeded(config: SceneConfig, seed: u64) -> Result<Self, ConfigError> {
        Ok(Self::with_field(config.validate()?, ParticleField::seeded(seed)))
    }

    fn with_field(config: SceneConfig, field: ParticleField) -> Self {
        Self {
            buffer: PacketBuffer::new(config.capacity),
            field,
            config,
            reconciled_revision: None,
            stats: SceneStats::default(),
        }
    }

    /// Decode a raw frame and buffer it if it carries a packet.
    /// Malformed frames are dropped without touching the buffer.
    pub fn ingest(&mut self, frame: &str) -> Ingest {
        match parse_packet(frame) {
            Ok(Some(msg)) => Ingest::Appended(self.push(msg)),
            Ok(None) => {
                self.stats.ignored += 1;
                Ingest::Ignored
            }
            Err(e) => {
                self.stats.rejected += 1;
                debug!(error = %e, len = frame.len(), "Discarding malformed packet");
                Ingest::Rejected
            }
        }
    }

    /// Buffer a decoded packet
    pub fn push(&mut self, msg: PacketMessage) -> EventId {
        trace!(src = %msg.source, dst = %msg.destination, protocol = %msg.protocol, size = msg.size, "Packet received");
        self.stats.received += 1;
        self.buffer.append(msg)
    }

    /// Sync particles with the buffer. Skipped when nothing was appended
    /// since the previous pass.
    pub fn reconcile(&mut self) -> ReconcileReport {
        let revision = self.buffer.revision();
        if self.reconciled_revision == Some(revision) {
            return ReconcileReport::default();
        }
        let report = self.field.reconcile(&self.buffer.snapshot(), &self.config);
        self.reconciled_revision = Some(revision);
        self.stats.spawned += report.spawned as u64;
        self.stats.retired += report.retired as u64;
        report
    }

    /// One rendered frame: reconcile if needed, then advance every particle
    pub fn tick(&mut self) -> FrameReport {
        self.reconcile();
        let report = frame::advance(&mut self.field, &self.config);
        self.stats.frames += 1;
        self.stats.recycled += report.recycled as u64;
        report
    }

    pub fn particles(&self) -> impl Iterator<Item = &ParticleEntity> {
        self.field.iter()
    }

    pub fn particle(&self, id: EventId) -> Option<&ParticleEntity> {
        self.field.get(id)
    }

    pub fn particle_count(&self) -> usize {
        self.field.len()
    }

    pub fn buffer(&self) -> &PacketBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn stats(&self) -> SceneStats {
        SceneStats {
            evicted: self.buffer.total_evicted(),
            live_particles: self.field.len(),
            buffered: self.buffer.len(),
            ..self.stats
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Protocol;

    fn frame(protocol: &str, size: u64) -> String {
        format!(r#"{{"src":"10.0.0.1","dst":"10.0.0.2","protocol":"{protocol}","size":{size}}}"#)
    }

    #[test]
    fn test_invalid_config_refused() {
        let inverted = SceneConfig {
            spawn_depth_far: -10.0,
            spawn_depth_near: -20.0,
            ..SceneConfig::default()
        };
        assert!(matches!(PacketScene::seeded(inverted, 1), Err(ConfigError::Invalid(_))));

        let stalled = SceneConfig { depth_step: 0.0, ..SceneConfig::default() };
        assert!(matches!(PacketScene::new(stalled), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_default_scene_ticks() {
        let mut scene = PacketScene::default();
        scene.push(PacketMessage::new("a", "b", Protocol::Udp, 1));
        assert_eq!(scene.tick().advanced, 1);
    }

    #[test]
    fn test_ingest_outcomes() {
        let mut scene = PacketScene::seeded(SceneConfig::default(), 1).expect("valid config");
        assert_eq!(scene.ingest(&frame("TCP", 60)), Ingest::Appended(0));
        assert_eq!(scene.ingest("40"), Ingest::Ignored);
        assert_eq!(scene.ingest(r#"{"src":"a","dst":"b","size":1}"#), Ingest::Rejected);

        let stats = scene.stats();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.buffered, 1);
    }

    #[test]
    fn test_malformed_leaves_scene_unchanged() {
        let mut scene = PacketScene::seeded(SceneConfig::default(), 2).expect("valid config");
        scene.ingest(&frame("UDP", 80));
        scene.tick();
        let before = (scene.buffer().len(), scene.particle_count(), scene.buffer().revision());

        scene.ingest(r#"{"src":"a","dst":"b","size":1}"#);
        scene.tick();
        assert_eq!(
            (scene.buffer().len(), scene.particle_count(), scene.buffer().revision()),
            before
        );
    }

    #[test]
    fn test_reconcile_skipped_without_appends() {
        let mut scene = PacketScene::seeded(SceneConfig::default(), 3).expect("valid config");
        scene.push(PacketMessage::new("a", "b", Protocol::Tcp, 1));
        assert_eq!(scene.reconcile().spawned, 1);
        assert!(scene.reconcile().is_empty());
    }

    #[test]
    fn test_tick_spawns_and_moves() {
        let mut scene = PacketScene::seeded(SceneConfig::default(), 4).expect("valid config");
        let id = scene.push(PacketMessage::new("a", "b", Protocol::Other, 1));

        let report = scene.tick();
        assert_eq!(report.advanced, 1);
        let p = scene.particle(id).expect("spawned on tick");
        assert!((p.position[2] - (p.spawn_depth + 0.3)).abs() < 1e-4);
    }

    #[test]
    fn test_stats_track_eviction() {
        let config = SceneConfig { capacity: 3, ..SceneConfig::default() };
        let mut scene = PacketScene::seeded(config, 5).expect("valid config");
        for size in 0..5 {
            scene.ingest(&frame("TCP", size));
        }
        scene.tick();
        let stats = scene.stats();
        assert_eq!(stats.evicted, 2);
        assert_eq!(stats.live_particles, 3);
        assert_eq!(stats.spawned, 3);
        assert_eq!(stats.frames, 1);
    }
}
