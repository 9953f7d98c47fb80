//! Per-frame particle update
//!
//! Runs once per rendered frame regardless of packet arrival. Moves every
//! particle toward the viewer and sends particles that passed the viewpoint
//! back to the recycle depth. Never creates or destroys particles and does
//! not allocate.

use std::f64::consts::TAU;

use super::{ParticleEntity, ParticleField, SceneConfig};

/// Outcome of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Particles moved this frame
    pub advanced: usize,
    /// Particles that crossed the near threshold and were sent back
    pub recycled: usize,
}

/// Advance every live particle by one frame
pub fn advance(field: &mut ParticleField, config: &SceneConfig) -> FrameReport {
    let mut report = FrameReport::default();
    for particle in field.iter_mut() {
        if step(particle, config) {
            report.recycled += 1;
        }
        report.advanced += 1;
    }
    report
}

/// Advance a single particle. Returns true if it was recycled.
#[inline]
pub fn step(particle: &mut ParticleEntity, config: &SceneConfig) -> bool {
    let z = &mut particle.position[2];
    *z += config.depth_step;
    let recycled = *z > config.near_threshold;
    if recycled {
        *z = config.recycle_depth;
        particle.recycled = particle.recycled.saturating_add(1);
    }

    for angle in &mut particle.rotation {
        *angle = (*angle + config.rotation_step).rem_euclid(TAU);
    }
    recycled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PacketBuffer, PacketMessage, Protocol};

    fn particle_at(z: f64) -> ParticleEntity {
        ParticleEntity {
            id: 0,
            protocol: Protocol::Tcp,
            size: 60,
            position: [0.0, 0.0, z],
            rotation: [0.0, 0.0],
            spawn_depth: z,
            recycled: 0,
        }
    }

    #[test]
    fn test_step_moves_toward_viewer() {
        let config = SceneConfig::default();
        let mut p = particle_at(-45.0);
        assert!(!step(&mut p, &config));
        assert!((p.position[2] - (-44.7)).abs() < 1e-5);
        assert!((p.rotation[0] - 0.02).abs() < 1e-6);
        assert!((p.rotation[1] - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_recycle_after_crossing_threshold() {
        // Accumulated z reaches 4.999999999999998 on tick 20, so the 21st step exceeds 5
        let config = SceneConfig::default();
        let mut p = particle_at(-1.0);
        let mut recycled_at = None;
        for tick in 1..=21 {
            if step(&mut p, &config) {
                recycled_at.get_or_insert(tick);
            } else {
                assert!(p.position[2] <= config.near_threshold);
            }
        }

        assert_eq!(recycled_at, Some(21));
        assert_eq!(p.position[2], -50.0);
        assert_eq!(p.recycled, 1);
        assert_eq!(p.id, 0);
    }

    #[test]
    fn test_no_recycle_before_tick_21() {
        let config = SceneConfig::default();
        let mut p = particle_at(-1.0);
        for _ in 0..20 {
            assert!(!step(&mut p, &config));
        }
        assert!(p.position[2] < config.near_threshold);
        assert!((p.position[2] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_recycled_particle_stays_live() {
        let config = SceneConfig::default();
        let mut buffer = PacketBuffer::new(4);
        let id = buffer.append(PacketMessage::new("a", "b", Protocol::Udp, 1));

        let mut field = ParticleField::seeded(0);
        field.reconcile(&buffer.snapshot(), &config);
        for p in field.iter_mut() {
            p.position[2] = config.near_threshold;
        }

        let report = advance(&mut field, &config);
        assert_eq!(report, FrameReport { advanced: 1, recycled: 1 });
        let p = field.get(id).expect("recycled particle must remain live");
        assert_eq!(p.position[2], config.recycle_depth);
        assert_eq!(p.recycled, 1);
    }

    #[test]
    fn test_long_lived_particle_crosses_repeatedly() {
        let config = SceneConfig::default();
        let mut p = particle_at(-50.0);
        // 55 units per lap at 0.3 per frame
        for _ in 0..600 {
            step(&mut p, &config);
        }
        assert_eq!(p.recycled, 3);
        assert!(p.position[2] <= config.near_threshold);
        assert!(p.position[2] >= config.recycle_depth);
    }

    #[test]
    fn test_rotation_wraps() {
        let config = SceneConfig { rotation_step: 1.0, ..SceneConfig::default() };
        let mut p = particle_at(-50.0);
        for _ in 0..100 {
            step(&mut p, &config);
        }
        assert!(p.rotation.iter().all(|a| (0.0..TAU).contains(a)));
    }

    #[test]
    fn test_advance_empty_field() {
        let mut field = ParticleField::seeded(0);
        assert_eq!(advance(&mut field, &SceneConfig::default()), FrameReport::default());
    }
}
