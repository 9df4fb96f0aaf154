#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-frame orchestration of the Firewall Defence presentation layer.
//!
//! The [`SceneController`] owns the scene graph together with every visual
//! system and drives them in a fixed order each frame. Gameplay stays with an
//! external [`Simulation`]; the controller only reads its snapshot and hands
//! it the commands produced by touch interaction.

pub mod config;

use std::time::Duration;

use firewall_defence_boss_rendering::{BossRenderingManager, RenderContext};
use firewall_defence_camera::CameraController;
use firewall_defence_core::{geometry::Rect, Color, TowerArchetype, WorldSnapshot};
use firewall_defence_effects::{EffectService, VisualCue};
use firewall_defence_interaction::{BoardQuery, InteractionCommand, InteractionController};
use firewall_defence_projectiles::{ProjectileCollision, ProjectileHit, ProjectileVisuals};
use firewall_defence_scene::{
    CameraView, FrameInput, NodeId, NodePool, NodeSpec, PoolStats, PoolTag, SceneDriver,
    SceneGraph,
};
use firewall_defence_tower_visuals::TowerVisualManager;
use glam::Vec2;
use log::{debug, trace};

pub use config::{ClientConfig, ConfigError};

/// Gameplay owner driven by the [`SceneController`].
pub trait Simulation: BoardQuery {
    /// Advances gameplay by `dt` seconds.
    fn step(&mut self, dt: f32);

    /// State published after the latest step.
    fn snapshot(&self) -> &WorldSnapshot;

    /// Applies a board command produced by touch interaction.
    fn apply(&mut self, command: &InteractionCommand);
}

/// Summary of one [`SceneController::frame`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Projectile contacts found this frame.
    pub hits: Vec<ProjectileHit>,
    /// Effect requests raised by the visual systems.
    pub cues: Vec<VisualCue>,
    /// Nodes alive in the scene graph, pooled ones included.
    pub live_nodes: usize,
    /// Detached nodes waiting in the pool.
    pub pooled: usize,
    /// Board commands produced by touch interaction.
    pub commands: Vec<InteractionCommand>,
}

#[derive(Clone, Copy, Debug)]
struct Layers {
    towers: NodeId,
    bosses: NodeId,
    projectiles: NodeId,
}

impl Layers {
    fn spawn(graph: &mut SceneGraph) -> Self {
        let root = graph.root();
        Self {
            towers: graph.spawn_child(root, NodeSpec::group().named("towers").z(10.0)),
            bosses: graph.spawn_child(root, NodeSpec::group().named("bosses").z(20.0)),
            projectiles: graph.spawn_child(root, NodeSpec::group().named("projectiles").z(30.0)),
        }
    }
}

/// Owns the scene and every visual system of the board.
#[derive(Debug)]
pub struct SceneController {
    config: ClientConfig,
    graph: SceneGraph,
    pool: NodePool,
    layers: Layers,
    camera: CameraController,
    effects: EffectService,
    collision: ProjectileCollision,
    projectiles: ProjectileVisuals,
    towers: TowerVisualManager,
    bosses: BossRenderingManager,
    interaction: InteractionController,
    paused: bool,
    frames: u64,
    hits: Vec<ProjectileHit>,
    cues: Vec<VisualCue>,
    commands: Vec<InteractionCommand>,
}

impl SceneController {
    /// Creates a controller showing a board covering `bounds` in a viewport
    /// of `viewport` pixels.
    #[must_use]
    pub fn new(config: ClientConfig, bounds: Rect, viewport: Vec2) -> Self {
        let mut graph = SceneGraph::new();
        let layers = Layers::spawn(&mut graph);
        let effects = EffectService::new(config.effects, &mut graph);
        let towers = TowerVisualManager::new(layers.towers).with_turn_rate(config.turn_rate);
        let mut pool = NodePool::new(config.pool_capacity);
        pool.prewarm(
            &mut graph,
            PoolTag::Particle,
            config.prewarm_particles.min(config.pool_capacity),
        );
        debug!(
            "scene controller created for bounds {:?} and viewport {viewport}",
            bounds
        );

        Self {
            config,
            pool,
            layers,
            camera: CameraController::new(config.camera, bounds, viewport),
            effects,
            collision: ProjectileCollision::new(),
            projectiles: ProjectileVisuals::new(),
            towers,
            bosses: BossRenderingManager::new(),
            interaction: InteractionController::new(config.interaction),
            paused: false,
            frames: 0,
            hits: Vec::new(),
            cues: Vec::new(),
            commands: Vec::new(),
            graph,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Scene graph presented by the rendering backend.
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Board camera.
    #[must_use]
    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    /// Camera parameters including the current screen shake.
    #[must_use]
    pub fn view(&self) -> CameraView {
        self.camera.view(self.effects.shake_offset())
    }

    /// Effect service.
    #[must_use]
    pub fn effects(&self) -> &EffectService {
        &self.effects
    }

    /// Tower visuals.
    #[must_use]
    pub fn towers(&self) -> &TowerVisualManager {
        &self.towers
    }

    /// Boss renderers.
    #[must_use]
    pub fn bosses(&self) -> &BossRenderingManager {
        &self.bosses
    }

    /// Pool traffic counters.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Frames processed so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Stops stepping the simulation; visuals keep animating.
    pub fn pause(&mut self) {
        if !self.paused {
            debug!("scene paused at frame {}", self.frames);
        }
        self.paused = true;
    }

    /// Resumes stepping the simulation.
    pub fn resume(&mut self) {
        if self.paused {
            debug!("scene resumed at frame {}", self.frames);
        }
        self.paused = false;
    }

    /// Whether the simulation step is skipped.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Runs one frame.
    ///
    /// Input is interpreted first and its commands reach the simulation
    /// before it steps. Visual systems then mirror the new snapshot, hits,
    /// kills and cues become effects, and finally animations advance and
    /// finished nodes return to the pool.
    ///
    /// Number keys arm a tower placement, `1` for the first archetype through
    /// `0` for the tenth; pressing the key of the armed archetype disarms it.
    pub fn frame<S>(&mut self, dt: f32, input: &FrameInput, simulation: &mut S) -> FrameReport
    where
        S: Simulation,
    {
        let dt = if dt.is_finite() {
            dt.max(0.0).min(self.config.max_frame_dt.max(0.0))
        } else {
            0.0
        };
        self.frames += 1;

        if input.viewport.x > 0.0 && input.viewport.y > 0.0 {
            self.camera.set_viewport(input.viewport);
        }
        if input.zoom_steps != 0.0 && input.zoom_steps.is_finite() {
            let anchor = input.pointer.unwrap_or(self.camera.viewport() * 0.5);
            self.camera
                .pinch(self.config.wheel_zoom_step.powf(input.zoom_steps), anchor);
        }

        if let Some(archetype) = input.number_key.and_then(placement_hotkey) {
            if self.interaction.placement() == Some(archetype) {
                self.interaction.disarm_placement();
            } else {
                self.interaction.arm_placement(archetype);
            }
        }
        self.interaction.advance(dt);
        self.interaction.handle(
            &input.touches,
            &*simulation,
            &mut self.camera,
            &mut self.commands,
        );
        for command in &self.commands {
            present_command(&mut self.towers, &mut self.graph, command);
            simulation.apply(command);
        }

        if !self.paused {
            simulation.step(dt);
        }
        let world = simulation.snapshot();

        self.cues.clear();
        self.towers
            .sync(&mut self.graph, &mut self.pool, &world.towers, dt, &mut self.cues);
        let arrival = world
            .bosses
            .iter()
            .find(|boss| self.bosses.kind_of(boss.id).is_none())
            .map(|boss| boss.state.position());
        let mut ctx = RenderContext::new(&mut self.graph, &mut self.pool, self.layers.bosses);
        self.bosses.sync(&mut ctx, &world.bosses, &mut self.cues);
        if let Some(point) = arrival.filter(|_| self.config.boss_focus_seconds > 0.0) {
            debug!("focusing camera on arriving boss at {point}");
            self.camera
                .focus_on(point, self.camera.scale(), self.config.boss_focus_seconds);
        }
        let _ = self.projectiles.sync(
            &mut self.graph,
            &mut self.pool,
            self.layers.projectiles,
            &world.projectiles,
        );

        self.effects.set_view(self.camera.visible_rect());
        self.effects.set_camera_scale(self.camera.scale());

        if self.paused {
            self.hits.clear();
        } else {
            self.collision
                .handle(&world.projectiles, &world.enemies, &mut self.hits);
            let color = self.config.death_burst_color;
            self.cues
                .extend(world.defeated.iter().map(|fallen| VisualCue::DeathBurst {
                    position: fallen.center,
                    color,
                }));
        }
        for hit in &self.hits {
            let color = world
                .projectiles
                .iter()
                .find(|projectile| projectile.id == hit.projectile)
                .map_or(Color::WHITE, |projectile| projectile.color);
            let outcome = self
                .effects
                .impact(&mut self.graph, &mut self.pool, hit.point, color);
            trace!("impact of projectile {} -> {outcome:?}", hit.projectile.get());
        }
        for cue in &self.cues {
            let outcome = self.effects.play(&mut self.graph, &mut self.pool, cue);
            trace!("cue {cue:?} -> {outcome:?}");
        }

        self.camera.update(dt);
        self.effects.set_view(self.camera.visible_rect());
        self.effects.update(dt, &mut self.graph);
        self.graph.advance(dt);
        let reclaimed = self.pool.reclaim(&mut self.graph);

        let report = FrameReport {
            hits: self.hits.clone(),
            cues: self.cues.clone(),
            live_nodes: self.graph.live_count(),
            pooled: self.pool.total_available(),
            commands: self.commands.clone(),
        };
        trace!(
            "frame {}: {} hits, {} cues, {} live nodes, {} pooled, {reclaimed} reclaimed",
            self.frames,
            report.hits.len(),
            report.cues.len(),
            report.live_nodes,
            report.pooled
        );
        report
    }
}

/// Archetype armed by number key `digit`; `0` follows `9`.
fn placement_hotkey(digit: u8) -> Option<TowerArchetype> {
    let index = match digit {
        0 => 9,
        1..=9 => usize::from(digit) - 1,
        _ => return None,
    };
    TowerArchetype::ALL.get(index).copied()
}

/// Mirrors a board command on the tower visuals before the simulation sees it.
fn present_command(
    towers: &mut TowerVisualManager,
    graph: &mut SceneGraph,
    command: &InteractionCommand,
) {
    match *command {
        InteractionCommand::SelectTower { tower } => towers.set_selected(graph, Some(tower)),
        InteractionCommand::ClearSelection => towers.set_selected(graph, None),
        InteractionCommand::BeginDrag { tower } => {
            if let Some(position) = towers.position(tower) {
                towers.drag_to(graph, tower, position);
            }
        }
        InteractionCommand::DragTo { tower, world } => towers.drag_to(graph, tower, world),
        InteractionCommand::HoverMergeTarget { target, .. } => towers.set_highlight(graph, target),
        InteractionCommand::MergeTowers { .. }
        | InteractionCommand::MoveTower { .. }
        | InteractionCommand::CancelDrag { .. } => {
            towers.set_highlight(graph, None);
            towers.end_drag(graph);
        }
        InteractionCommand::PlaceTower { .. } | InteractionCommand::TapEmpty { .. } => {}
    }
}

/// Pairs a [`SceneController`] with the simulation it presents so a
/// rendering backend can drive both.
#[derive(Debug)]
pub struct SimulationDriver<S> {
    controller: SceneController,
    simulation: S,
    last_report: FrameReport,
}

impl<S> SimulationDriver<S>
where
    S: Simulation,
{
    /// Creates a driver.
    #[must_use]
    pub fn new(controller: SceneController, simulation: S) -> Self {
        Self {
            controller,
            simulation,
            last_report: FrameReport::default(),
        }
    }

    /// Scene controller.
    #[must_use]
    pub fn controller(&self) -> &SceneController {
        &self.controller
    }

    /// Presented simulation.
    #[must_use]
    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    /// Report of the latest frame.
    #[must_use]
    pub fn last_report(&self) -> &FrameReport {
        &self.last_report
    }

    /// Runs one frame of `dt` seconds.
    pub fn tick(&mut self, dt: f32, input: &FrameInput) -> &FrameReport {
        self.last_report = self.controller.frame(dt, input, &mut self.simulation);
        &self.last_report
    }
}

impl<S> SceneDriver for SimulationDriver<S>
where
    S: Simulation,
{
    fn update(&mut self, dt: Duration, input: FrameInput) -> CameraView {
        let _ = self.tick(dt.as_secs_f32(), &input);
        self.controller.view()
    }

    fn scene(&self) -> &SceneGraph {
        self.controller.graph()
    }
}
