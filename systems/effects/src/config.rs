//! Tuning for the effect service.

use serde::{Deserialize, Serialize};

use crate::EffectKind;

/// Minimum seconds between two effects of the same kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectCooldowns {
    /// Explosion cooldown.
    pub explosion: f32,
    /// Expanding ring cooldown.
    pub ring: f32,
    /// Lightning arc cooldown.
    pub arc: f32,
    /// Projectile impact cooldown.
    pub impact: f32,
    /// Enemy death burst cooldown.
    pub death_burst: f32,
    /// Screen flash cooldown.
    pub flash: f32,
    /// Screen shake cooldown.
    pub shake: f32,
}

impl Default for EffectCooldowns {
    fn default() -> Self {
        Self {
            explosion: 0.05,
            ring: 0.05,
            arc: 0.03,
            impact: 0.0,
            death_burst: 0.02,
            flash: 0.25,
            shake: 0.0,
        }
    }
}

impl EffectCooldowns {
    /// Cooldown configured for `kind`.
    #[must_use]
    pub fn get(&self, kind: EffectKind) -> f32 {
        match kind {
            EffectKind::Explosion => self.explosion,
            EffectKind::Ring => self.ring,
            EffectKind::Arc => self.arc,
            EffectKind::Impact => self.impact,
            EffectKind::DeathBurst => self.death_burst,
            EffectKind::Flash => self.flash,
            EffectKind::Shake => self.shake,
        }
    }
}

/// Tuning parameters for [`EffectService`](crate::EffectService).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Largest screen shake offset in world units.
    pub max_shake: f32,
    /// Camera scale above which particle effects are skipped.
    pub particle_zoom_cutoff: f32,
    /// Most effect nodes alive at once.
    pub max_live_particles: usize,
    /// Particles emitted by an explosion.
    pub explosion_particles: u32,
    /// Particles emitted by an enemy death burst.
    pub death_burst_particles: u32,
    /// Sparks emitted by a projectile impact.
    pub impact_particles: u32,
    /// Vertices of a lightning arc, end points included.
    pub arc_segments: u32,
    /// Seconds a particle lives.
    pub particle_lifetime: f32,
    /// Per-kind cooldowns.
    pub cooldowns: EffectCooldowns,
    /// Seed of the particle spread generator.
    pub seed: u64,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            max_shake: 18.0,
            particle_zoom_cutoff: 2.5,
            max_live_particles: 600,
            explosion_particles: 14,
            death_burst_particles: 8,
            impact_particles: 3,
            arc_segments: 9,
            particle_lifetime: 0.45,
            cooldowns: EffectCooldowns::default(),
            seed: 0x5eed_f1a5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_cooldowns_fill_missing_fields() {
        let config: EffectsConfig = toml::from_str(
            r#"
                max_live_particles = 40

                [cooldowns]
                flash = 1.5
            "#,
        )
        .expect("valid effects config");

        assert_eq!(config.max_live_particles, 40);
        assert_eq!(config.cooldowns.flash, 1.5);
        assert_eq!(config.cooldowns.get(EffectKind::Ring), 0.05);
        assert_eq!(config.seed, EffectsConfig::default().seed);
    }
}
