#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Particle and screen effect service.
//!
//! Every effect node is acquired from the [`NodePool`] and leaves the scene
//! through a fade followed by a recycle action. Requests are filtered by a
//! per-kind cooldown, by camera zoom for particle effects and by a global
//! budget of live effect nodes.

pub mod config;

use std::f32::consts::TAU;

use firewall_defence_core::{geometry::Rect, Color, TowerId};
use firewall_defence_scene::{Action, NodeId, NodePool, NodeSpec, PoolTag, SceneGraph, Timing};
use glam::Vec2;
use log::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use config::{EffectCooldowns, EffectsConfig};

const FLASH_ACTION: &str = "flash";
const EFFECT_LAYER_Z: f32 = 50.0;
const OVERLAY_LAYER_Z: f32 = 1_000.0;

/// Kinds of effect the service can spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKind {
    /// Burst of particles with a core flash.
    Explosion,
    /// Expanding ring.
    Ring,
    /// Jittered lightning polyline.
    Arc,
    /// Small spark burst where a projectile lands.
    Impact,
    /// Burst shown when an enemy dies.
    DeathBurst,
    /// Full-screen color flash.
    Flash,
    /// Camera shake.
    Shake,
}

impl EffectKind {
    /// Every effect kind.
    pub const ALL: [Self; 7] = [
        Self::Explosion,
        Self::Ring,
        Self::Arc,
        Self::Impact,
        Self::DeathBurst,
        Self::Flash,
        Self::Shake,
    ];

    /// Whether the effect is skipped when the camera is zoomed far out.
    #[must_use]
    pub const fn is_particle(self) -> bool {
        matches!(self, Self::Explosion | Self::Impact | Self::DeathBurst)
    }

    const fn index(self) -> usize {
        match self {
            Self::Explosion => 0,
            Self::Ring => 1,
            Self::Arc => 2,
            Self::Impact => 3,
            Self::DeathBurst => 4,
            Self::Flash => 5,
            Self::Shake => 6,
        }
    }
}

/// Result of an effect request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectOutcome {
    /// The effect was played using this many new nodes.
    Spawned(u32),
    /// The kind is still cooling down.
    RateLimited,
    /// The camera is zoomed out past the particle cutoff.
    Culled,
    /// Spawning would exceed the live node budget.
    OverBudget,
}

impl EffectOutcome {
    /// Whether the effect was played.
    #[must_use]
    pub const fn is_spawned(self) -> bool {
        matches!(self, Self::Spawned(_))
    }
}

/// Counters describing effect traffic since creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EffectStats {
    /// Effects that were played.
    pub spawned: u64,
    /// Nodes acquired for effects.
    pub nodes: u64,
    /// Requests rejected by cooldown.
    pub rate_limited: u64,
    /// Requests rejected by zoom gating.
    pub culled: u64,
    /// Requests rejected by the budget.
    pub over_budget: u64,
}

/// Effect request emitted by visual systems and played by the [`EffectService`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VisualCue {
    /// A boss entered a new phase.
    PhaseTransition {
        /// World position of the boss.
        position: Vec2,
        /// Accent color of the boss.
        color: Color,
    },
    /// Camera shake.
    Shake {
        /// Peak offset in world units.
        intensity: f32,
        /// Seconds until the shake fades out.
        duration: f32,
    },
    /// Explosion burst.
    Explosion {
        /// World position.
        position: Vec2,
        /// Particle color.
        color: Color,
        /// Spread radius in world units.
        radius: f32,
    },
    /// Expanding ring.
    Ring {
        /// World position.
        position: Vec2,
        /// Ring color.
        color: Color,
        /// Final radius in world units.
        max_radius: f32,
        /// Seconds to expand and fade.
        duration: f32,
    },
    /// Full-screen flash.
    Flash {
        /// Overlay color; its alpha is the peak opacity.
        color: Color,
        /// Seconds to fade out.
        duration: f32,
    },
    /// Lightning arc between two points.
    Arc {
        /// Start of the arc.
        from: Vec2,
        /// End of the arc.
        to: Vec2,
        /// Arc color.
        color: Color,
    },
    /// An enemy died.
    DeathBurst {
        /// World position of the enemy.
        position: Vec2,
        /// Fragment color.
        color: Color,
    },
    /// A tower changed archetype, rarity or merge level.
    TowerUpgraded {
        /// Upgraded tower.
        tower: TowerId,
        /// World position of the tower.
        position: Vec2,
        /// Rarity color of the upgraded tower.
        color: Color,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Shake {
    intensity: f32,
    duration: f32,
    elapsed: f32,
}

impl Shake {
    fn current_intensity(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        self.intensity * (1.0 - self.elapsed / self.duration).max(0.0)
    }
}

/// Spawns pooled effect nodes and tracks screen shake and flash state.
#[derive(Debug)]
pub struct EffectService {
    config: EffectsConfig,
    rng: ChaCha8Rng,
    layer: NodeId,
    overlay: NodeId,
    flash_node: Option<NodeId>,
    view: Rect,
    camera_scale: f32,
    cooldowns: [f32; EffectKind::ALL.len()],
    shake: Option<Shake>,
    shake_offset: Vec2,
    live: Vec<f32>,
    stats: EffectStats,
}

impl EffectService {
    /// Creates the service together with its effect and overlay layers.
    pub fn new(config: EffectsConfig, graph: &mut SceneGraph) -> Self {
        let layer = graph.spawn(NodeSpec::group().named("effects").z(EFFECT_LAYER_Z));
        let overlay = graph.spawn(NodeSpec::group().named("overlay").z(OVERLAY_LAYER_Z));
        debug!("effect service ready with seed {:#x}", config.seed);
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            layer,
            overlay,
            flash_node: None,
            view: Rect::from_center_size(Vec2::ZERO, Vec2::ZERO),
            camera_scale: 1.0,
            cooldowns: [0.0; EffectKind::ALL.len()],
            shake: None,
            shake_offset: Vec2::ZERO,
            live: Vec::new(),
            stats: EffectStats::default(),
        }
    }

    /// Active tuning.
    #[must_use]
    pub fn config(&self) -> &EffectsConfig {
        &self.config
    }

    /// Node under which world-space effects are spawned.
    #[must_use]
    pub fn layer(&self) -> NodeId {
        self.layer
    }

    /// Records the camera scale used for zoom gating.
    pub fn set_camera_scale(&mut self, scale: f32) {
        self.camera_scale = scale;
    }

    /// Records the world rectangle covered by the screen, used to place flashes.
    pub fn set_view(&mut self, view: Rect) {
        self.view = view;
    }

    /// Starts a camera shake. The stronger of the running and the new shake wins.
    pub fn screen_shake(&mut self, intensity: f32, duration: f32) -> EffectOutcome {
        if let Some(rejected) = self.gate(EffectKind::Shake, 0) {
            return rejected;
        }
        let intensity = intensity.clamp(0.0, self.config.max_shake);
        if duration <= 0.0 || intensity == 0.0 {
            return EffectOutcome::Spawned(0);
        }

        let stronger = self
            .shake
            .map_or(true, |current| intensity >= current.current_intensity());
        if stronger {
            self.shake = Some(Shake {
                intensity,
                duration,
                elapsed: 0.0,
            });
        }
        self.commit(EffectKind::Shake, 0)
    }

    /// Current shake offset in world units.
    #[must_use]
    pub fn shake_offset(&self) -> Vec2 {
        self.shake_offset
    }

    /// Flashes the screen with `color`, fading out over `duration` seconds.
    ///
    /// The overlay node is created once and reused by every flash.
    pub fn flash(&mut self, graph: &mut SceneGraph, color: Color, duration: f32) -> EffectOutcome {
        if let Some(rejected) = self.gate(EffectKind::Flash, 0) {
            return rejected;
        }

        let node = match self.flash_node.filter(|id| graph.contains(*id)) {
            Some(id) => id,
            None => {
                let id = graph.spawn_child(
                    self.overlay,
                    NodeSpec::rect(Vec2::ONE).named("flash").hidden(),
                );
                self.flash_node = Some(id);
                id
            }
        };

        let view = self.view;
        if let Some(flash) = graph.get_mut(node) {
            flash.fill = Some(color.with_alpha(1.0));
            flash.alpha = color.alpha.clamp(0.0, 1.0);
            flash.hidden = false;
            flash.position = view.center();
            flash.scale = view.size().max(Vec2::ONE) * 1.2;
        }
        graph.run_keyed(
            node,
            FLASH_ACTION,
            Action::sequence(vec![
                Action::fade_out(duration.max(0.0)).with_timing(Timing::EaseIn),
                Action::Hide,
            ]),
        );
        self.commit(EffectKind::Flash, 0)
    }

    /// Particle explosion with a bright core.
    pub fn explosion(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        position: Vec2,
        color: Color,
        radius: f32,
    ) -> EffectOutcome {
        let count = self.config.explosion_particles;
        if let Some(rejected) = self.gate(EffectKind::Explosion, count + 1) {
            return rejected;
        }

        let lifetime = self.config.particle_lifetime;
        let core = pool.acquire(
            graph,
            PoolTag::Flash,
            self.layer,
            NodeSpec::circle(radius.max(1.0) * 0.45)
                .fill(color.lighten(0.5))
                .glow(radius * 0.3)
                .at(position)
                .scaled(0.4),
        );
        graph.run_action(
            core,
            Action::group(vec![
                Action::scale_to(1.0, lifetime * 0.4).with_timing(Timing::EaseOut),
                Action::fade_out_and_recycle(lifetime * 0.6),
            ]),
        );
        self.track(lifetime * 0.6);

        self.scatter(graph, pool, position, color, radius, count, 1.0);
        self.commit(EffectKind::Explosion, count + 1)
    }

    /// Ring growing from a point to `max_radius` while fading.
    pub fn ring(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        position: Vec2,
        color: Color,
        max_radius: f32,
        duration: f32,
    ) -> EffectOutcome {
        if let Some(rejected) = self.gate(EffectKind::Ring, 1) {
            return rejected;
        }
        self.spawn_ring(graph, pool, position, color, max_radius, duration);
        self.commit(EffectKind::Ring, 1)
    }

    /// Jagged lightning arc between two points.
    pub fn arc(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        from: Vec2,
        to: Vec2,
        color: Color,
    ) -> EffectOutcome {
        if let Some(rejected) = self.gate(EffectKind::Arc, 1) {
            return rejected;
        }

        let segments = self.config.arc_segments.max(2);
        let span = to - from;
        let normal = span.perp().normalize_or_zero();
        let jitter = (span.length() * 0.12).min(14.0);
        let points: Vec<Vec2> = (0..segments)
            .map(|index| {
                let t = index as f32 / (segments - 1) as f32;
                let offset = if index == 0 || index == segments - 1 {
                    0.0
                } else {
                    self.rng.gen_range(-1.0..=1.0) * jitter
                };
                span * t + normal * offset
            })
            .collect();

        let node = pool.acquire(
            graph,
            PoolTag::Arc,
            self.layer,
            NodeSpec::polyline(points)
                .stroke(color, 2.0)
                .glow(3.0)
                .at(from),
        );
        let lifetime = 0.18;
        graph.run_action(node, Action::fade_out_and_recycle(lifetime));
        self.track(lifetime);
        self.commit(EffectKind::Arc, 1)
    }

    /// Small spark burst where a projectile lands.
    pub fn impact(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        position: Vec2,
        color: Color,
    ) -> EffectOutcome {
        let count = self.config.impact_particles;
        if let Some(rejected) = self.gate(EffectKind::Impact, count) {
            return rejected;
        }
        self.scatter(graph, pool, position, color, 10.0, count, 0.5);
        self.commit(EffectKind::Impact, count)
    }

    /// Burst of fragments and a small ring where an enemy died.
    pub fn death_burst(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        position: Vec2,
        color: Color,
    ) -> EffectOutcome {
        let count = self.config.death_burst_particles;
        if let Some(rejected) = self.gate(EffectKind::DeathBurst, count + 1) {
            return rejected;
        }
        self.scatter(graph, pool, position, color, 24.0, count, 0.8);
        self.spawn_ring(graph, pool, position, color, 18.0, 0.3);
        self.commit(EffectKind::DeathBurst, count + 1)
    }

    /// Flash, shake and a wide ring marking a boss phase change.
    ///
    /// Cooldowns and zoom gating do not apply; the budget does.
    pub fn phase_transition(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        position: Vec2,
        color: Color,
    ) -> EffectOutcome {
        if self.live.len() + 2 > self.config.max_live_particles {
            self.stats.over_budget += 1;
            warn!("phase transition skipped: effect budget exhausted");
            return EffectOutcome::OverBudget;
        }

        self.cooldowns[EffectKind::Flash.index()] = 0.0;
        self.cooldowns[EffectKind::Shake.index()] = 0.0;
        let _ = self.flash(graph, color.with_alpha(0.35), 0.45);
        let _ = self.screen_shake(self.config.max_shake * 0.8, 0.6);
        self.spawn_ring(graph, pool, position, color, 220.0, 0.8);
        self.spawn_ring(graph, pool, position, color.lighten(0.4), 140.0, 0.55);
        self.stats.spawned += 1;
        self.stats.nodes += 2;
        EffectOutcome::Spawned(2)
    }

    /// Plays a cue emitted by a visual system.
    pub fn play(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        cue: &VisualCue,
    ) -> EffectOutcome {
        match *cue {
            VisualCue::PhaseTransition { position, color } => {
                self.phase_transition(graph, pool, position, color)
            }
            VisualCue::Shake {
                intensity,
                duration,
            } => self.screen_shake(intensity, duration),
            VisualCue::Explosion {
                position,
                color,
                radius,
            } => self.explosion(graph, pool, position, color, radius),
            VisualCue::Ring {
                position,
                color,
                max_radius,
                duration,
            } => self.ring(graph, pool, position, color, max_radius, duration),
            VisualCue::Flash { color, duration } => self.flash(graph, color, duration),
            VisualCue::Arc { from, to, color } => self.arc(graph, pool, from, to, color),
            VisualCue::DeathBurst { position, color } => {
                self.death_burst(graph, pool, position, color)
            }
            VisualCue::TowerUpgraded {
                position, color, ..
            } => self.ring(graph, pool, position, color, 48.0, 0.5),
        }
    }

    /// Advances cooldowns, shake and live node accounting by `dt` seconds.
    ///
    /// Keeps the flash overlay covering the current view.
    pub fn update(&mut self, dt: f32, graph: &mut SceneGraph) {
        let dt = dt.max(0.0);
        for remaining in &mut self.cooldowns {
            *remaining = (*remaining - dt).max(0.0);
        }

        self.live.retain_mut(|remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });

        self.shake_offset = Vec2::ZERO;
        if let Some(mut shake) = self.shake.take() {
            shake.elapsed += dt;
            let intensity = shake.current_intensity();
            if intensity > 0.0 && shake.elapsed < shake.duration {
                let angle = self.rng.gen_range(0.0..TAU);
                let magnitude = self.rng.gen_range(0.5..=1.0) * intensity;
                self.shake_offset = Vec2::from_angle(angle) * magnitude;
                self.shake = Some(shake);
            }
        }

        if let Some(flash) = self.flash_node.and_then(|id| graph.get_mut(id)) {
            if !flash.hidden {
                flash.position = self.view.center();
                flash.scale = self.view.size().max(Vec2::ONE) * 1.2;
            }
        }
    }

    /// Effect nodes still animating.
    #[must_use]
    pub fn live_particles(&self) -> usize {
        self.live.len()
    }

    /// Traffic counters.
    #[must_use]
    pub fn stats(&self) -> EffectStats {
        self.stats
    }

    fn gate(&mut self, kind: EffectKind, nodes: u32) -> Option<EffectOutcome> {
        if self.cooldowns[kind.index()] > 0.0 {
            self.stats.rate_limited += 1;
            trace!("{kind:?} rate limited");
            return Some(EffectOutcome::RateLimited);
        }
        if kind.is_particle() && self.camera_scale > self.config.particle_zoom_cutoff {
            self.stats.culled += 1;
            return Some(EffectOutcome::Culled);
        }
        if self.live.len() + nodes as usize > self.config.max_live_particles {
            self.stats.over_budget += 1;
            warn!(
                "{kind:?} skipped: {} live effect nodes, budget {}",
                self.live.len(),
                self.config.max_live_particles
            );
            return Some(EffectOutcome::OverBudget);
        }
        None
    }

    fn commit(&mut self, kind: EffectKind, nodes: u32) -> EffectOutcome {
        self.cooldowns[kind.index()] = self.config.cooldowns.get(kind);
        self.stats.spawned += 1;
        self.stats.nodes += u64::from(nodes);
        EffectOutcome::Spawned(nodes)
    }

    fn track(&mut self, lifetime: f32) {
        self.live.push(lifetime.max(f32::EPSILON));
    }

    fn spawn_ring(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        position: Vec2,
        color: Color,
        max_radius: f32,
        duration: f32,
    ) {
        let node = pool.acquire(
            graph,
            PoolTag::Ring,
            self.layer,
            NodeSpec::ring(max_radius.max(1.0), 3.0)
                .stroke(color, 3.0)
                .glow(4.0)
                .at(position)
                .scaled(0.05),
        );
        let duration = duration.max(f32::EPSILON);
        graph.run_action(
            node,
            Action::group(vec![
                Action::scale_to(1.0, duration).with_timing(Timing::EaseOut),
                Action::fade_out_and_recycle(duration),
            ]),
        );
        self.track(duration);
    }

    #[allow(clippy::too_many_arguments)]
    fn scatter(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        origin: Vec2,
        color: Color,
        spread: f32,
        count: u32,
        size: f32,
    ) {
        let lifetime = self.config.particle_lifetime;
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..TAU);
            let distance = spread.max(1.0) * self.rng.gen_range(0.6..=1.2);
            let radius = size * self.rng.gen_range(1.5..=3.5);
            let life = lifetime * self.rng.gen_range(0.75..=1.25);

            let particle = pool.acquire(
                graph,
                PoolTag::Particle,
                self.layer,
                NodeSpec::circle(radius)
                    .fill(color.lerp(Color::WHITE, self.rng.gen_range(0.0..=0.35)))
                    .at(origin),
            );
            graph.run_action(
                particle,
                Action::group(vec![
                    Action::move_by(Vec2::from_angle(angle) * distance, life)
                        .with_timing(Timing::EaseOut),
                    Action::scale_to(0.3, life),
                    Action::sequence(vec![
                        Action::wait(life * 0.4),
                        Action::fade_out_and_recycle(life * 0.6),
                    ]),
                ]),
            );
            self.track(life);
        }
    }
}
