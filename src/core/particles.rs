//! Particle lifecycle: one live entity per buffered packet
//!
//! Entities live in an arena keyed by event id. Reconciliation against a
//! buffer snapshot is a set difference: ids that left the buffer are
//! retired, ids without an entity are spawned. Motion is not touched here,
//! it belongs to the frame loop.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, trace};

use super::{EventId, Protocol, SceneConfig, Snapshot, TelemetryEvent};

/// Renderable projection of a buffered packet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleEntity {
    pub id: EventId,
    pub protocol: Protocol,
    /// Packet length in bytes
    pub size: u64,
    /// World position; z grows toward the viewer
    pub position: [f64; 3],
    /// Rotation about x and y (radians, [0, 2π))
    pub rotation: [f64; 2],
    /// z the particle was spawned at
    pub spawn_depth: f64,
    /// Times the particle passed the viewpoint and was sent back
    pub recycled: u32,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub spawned: usize,
    pub retired: usize,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.spawned == 0 && self.retired == 0
    }
}

/// Arena of live particles indexed by event id
pub struct ParticleField {
    live: HashMap<EventId, ParticleEntity>,
    rng: SmallRng,
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleField {
    /// Field with an entropy-seeded spawner
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    /// Field with a deterministic spawner (reproducible scenes)
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            live: HashMap::new(),
            rng,
        }
    }

    /// Align live entities with buffer membership.
    /// Idempotent: a second pass over the same snapshot changes nothing.
    pub fn reconcile(&mut self, snapshot: &Snapshot<'_>, config: &SceneConfig) -> ReconcileReport {
        let before = self.live.len();
        self.live.retain(|id, _| snapshot.contains(*id));
        let retired = before - self.live.len();

        let mut spawned = 0;
        for event in snapshot.iter() {
            if let Entry::Vacant(slot) = self.live.entry(event.id) {
                let particle = spawn(&mut self.rng, event, config);
                trace!(id = event.id, z = particle.position[2], "Particle spawned");
                slot.insert(particle);
                spawned += 1;
            }
        }

        let report = ReconcileReport { spawned, retired };
        if !report.is_empty() {
            debug!(spawned, retired, live = self.live.len(), "Particles reconciled");
        }
        report
    }

    /// Remove a particle. Removing an absent id is a no-op.
    pub fn retire(&mut self, id: EventId) -> bool {
        self.live.remove(&id).is_some()
    }

    pub fn get(&self, id: EventId) -> Option<&ParticleEntity> {
        self.live.get(&id)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live particles in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &ParticleEntity> {
        self.live.values()
    }

    /// Mutable access for the frame loop
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ParticleEntity> {
        self.live.values_mut()
    }

    /// Drop every particle
    pub fn clear(&mut self) {
        self.live.clear();
    }
}

/// Fresh particle at a random point of the spawn window
fn spawn(rng: &mut SmallRng, event: &TelemetryEvent, config: &SceneConfig) -> ParticleEntity {
    let spread = config.spawn_spread.abs();
    let (far, near) = (
        config.spawn_depth_far.min(config.spawn_depth_near),
        config.spawn_depth_far.max(config.spawn_depth_near),
    );
    let x = rng.gen_range(-spread..=spread);
    let y = rng.gen_range(-spread..=spread);
    let z = rng.gen_range(far..=near);

    ParticleEntity {
        id: event.id,
        protocol: event.protocol,
        size: event.size,
        position: [x, y, z],
        rotation: [0.0, 0.0],
        spawn_depth: z,
        recycled: 0,
    }
}
