//! Aggregated client tuning loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use firewall_defence_camera::CameraConfig;
use firewall_defence_core::Color;
use firewall_defence_effects::EffectsConfig;
use firewall_defence_interaction::InteractionConfig;
use firewall_defence_scene::DEFAULT_POOL_CAPACITY;
use firewall_defence_tower_visuals::DEFAULT_TURN_RATE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The contents are not valid configuration TOML.
    #[error("failed to parse config toml")]
    Parse(#[from] toml::de::Error),
}

/// Every tunable of the presentation client.
///
/// Missing tables and fields fall back to their defaults, so an empty file is
/// a valid configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Longest frame step in seconds; slower frames are clamped.
    pub max_frame_dt: f32,
    /// Turret turn rate in radians per second.
    pub turn_rate: f32,
    /// Detached nodes kept per pool tag.
    pub pool_capacity: usize,
    /// Particle nodes created up front so the first bursts allocate nothing.
    pub prewarm_particles: usize,
    /// Seconds the camera takes to glide to a newly spawned boss; 0 disables it.
    pub boss_focus_seconds: f32,
    /// Fragment color of enemy death bursts.
    pub death_burst_color: Color,
    /// Zoom factor applied per scroll-wheel step.
    pub wheel_zoom_step: f32,
    /// Camera tuning.
    pub camera: CameraConfig,
    /// Effect service tuning.
    pub effects: EffectsConfig,
    /// Gesture tuning.
    pub interaction: InteractionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_frame_dt: 0.1,
            turn_rate: DEFAULT_TURN_RATE,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            prewarm_particles: 64,
            boss_focus_seconds: 0.8,
            death_burst_color: Color::from_rgb_u8(255, 92, 72),
            wheel_zoom_step: 1.1,
            camera: CameraConfig::default(),
            effects: EffectsConfig::default(),
            interaction: InteractionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}
