//! Scene configuration
//!
//! Fixed for the lifetime of a scene. Defaults reproduce the reference
//! behaviour; a JSON file (see `CONFIG_ENV`) may override any subset.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use super::buffer::DEFAULT_CAPACITY;

/// Env var naming an optional JSON config file
pub const CONFIG_ENV: &str = "PACKETLENS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Pipeline constants: buffer size, spawn window, motion and recycling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Maximum number of buffered packets (and live particles)
    pub capacity: usize,
    /// Spawn x/y are drawn from [-spread, spread]
    pub spawn_spread: f64,
    /// Spawn z is drawn from [spawn_depth_far, spawn_depth_near]
    pub spawn_depth_near: f64,
    pub spawn_depth_far: f64,
    /// z advance per frame, toward the viewer
    pub depth_step: f64,
    /// Particles past this z are recycled
    pub near_threshold: f64,
    /// z a recycled particle is moved back to
    pub recycle_depth: f64,
    /// Rotation advance per frame and axis (radians)
    pub rotation_step: f64,
    /// Sphere radius used by presentation
    pub particle_radius: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            spawn_spread: 15.0,
            spawn_depth_near: -40.0,
            spawn_depth_far: -60.0,
            depth_step: 0.3,
            near_threshold: 5.0,
            recycle_depth: -50.0,
            rotation_step: 0.02,
            particle_radius: 0.4,
        }
    }
}

impl SceneConfig {
    /// Parse a (possibly partial) JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from `PACKETLENS_CONFIG` if set, defaults otherwise.
    /// A broken file is logged and ignored.
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => {
                info!(path = %path, ?config, "Scene config loaded");
                config
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Ignoring scene config, using defaults");
                Self::default()
            }
        }
    }

    /// Check the invariants the pipeline relies on
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be at least 1"));
        }
        let finite = [
            self.spawn_spread,
            self.spawn_depth_near,
            self.spawn_depth_far,
            self.depth_step,
            self.near_threshold,
            self.recycle_depth,
            self.rotation_step,
            self.particle_radius,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(ConfigError::Invalid("all values must be finite"));
        }
        if self.depth_step <= 0.0 {
            return Err(ConfigError::Invalid("depth_step must be positive"));
        }
        if self.rotation_step < 0.0 {
            return Err(ConfigError::Invalid("rotation_step must not be negative"));
        }
        if self.particle_radius < 0.0 {
            return Err(ConfigError::Invalid("particle_radius must not be negative"));
        }
        if self.spawn_spread < 0.0 {
            return Err(ConfigError::Invalid("spawn_spread must not be negative"));
        }
        if self.spawn_depth_far > self.spawn_depth_near {
            return Err(ConfigError::Invalid("spawn_depth_far must not exceed spawn_depth_near"));
        }
        if self.recycle_depth >= self.near_threshold {
            return Err(ConfigError::Invalid("recycle_depth must be behind near_threshold"));
        }
        if self.spawn_depth_near >= self.near_threshold {
            return Err(ConfigError::Invalid("particles must spawn behind near_threshold"));
        }
        Ok(self)
    }
}
