use std::collections::{HashMap, HashSet};

use firewall_defence_core::{
    BossKind, BossState, Color, CyberbossMode, CyberbossSnapshot, DamagePuddle, EntityId,
    LaserBeam, LaserState,
};
use firewall_defence_scene::{
    Action, Exit, NodeId, NodeRegistry, NodeSpec, PoolTag, SceneGraph, Shape, Stroke, Timing,
};
use glam::Vec2;
use log::trace;

use crate::common::{announce_phase, entity_key, BossBody, PhaseTracker};
use crate::{BossRenderer, RenderContext, VisualCue};

const PREFIX: &str = "cyberboss";
const RADIUS: f32 = 42.0;

const HULL: Color = Color::from_rgb_u8(58, 66, 92);
const CORE: Color = Color::from_rgb_u8(0, 229, 255);
const MELEE: Color = Color::from_rgb_u8(255, 82, 82);
const RANGED: Color = Color::from_rgb_u8(64, 196, 255);
const PUDDLE: Color = Color::from_rgb_u8(118, 255, 3);
const LASER: Color = Color::from_rgb_u8(255, 23, 68);

const PUDDLE_ALPHA: f32 = 0.55;
const CHARGING_WIDTH: f32 = 2.0;
const FIRING_WIDTH: f32 = 10.0;

fn mode_color(mode: CyberbossMode) -> Color {
    match mode {
        CyberbossMode::Melee => MELEE,
        CyberbossMode::Ranged => RANGED,
    }
}

#[derive(Debug)]
struct Parts {
    body: BossBody,
    core: NodeId,
    mode_ring: NodeId,
}

impl Parts {
    const NODES: usize = BossBody::NODES + 3;

    fn spawn(graph: &mut SceneGraph, layer: NodeId, mode: CyberbossMode) -> Self {
        let body = BossBody::spawn(graph, layer, PREFIX, RADIUS + 10.0, MELEE);
        let _ = graph.spawn_child(
            body.root,
            NodeSpec::new(Shape::regular_polygon(8, RADIUS, std::f32::consts::FRAC_PI_8))
                .fill(HULL)
                .stroke(HULL.lighten(0.3), 3.0),
        );
        let core = graph.spawn_child(
            body.root,
            NodeSpec::circle(RADIUS * 0.35).fill(CORE).glow(8.0).z(1.0),
        );
        graph.run_keyed(core, "pulse", Action::pulse(1.12, 1.2));
        let mode_ring = graph.spawn_child(
            body.root,
            NodeSpec::ring(RADIUS * 0.65, 3.0)
                .stroke(mode_color(mode), 3.0)
                .z(2.0),
        );
        Self {
            body,
            core,
            mode_ring,
        }
    }
}

/// Draws the Cyberboss, its damage puddles and its lasers.
#[derive(Debug, Default)]
pub struct CyberbossRenderer {
    parts: Option<Parts>,
    registry: NodeRegistry,
    live_keys: HashSet<String>,
    phase: PhaseTracker,
    mode: Option<CyberbossMode>,
    laser_states: HashMap<EntityId, LaserState>,
}

impl CyberbossRenderer {
    /// Creates a renderer with nothing drawn yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn puddle_key(id: EntityId) -> String {
        entity_key(PREFIX, "puddle", id.get())
    }

    fn laser_key(id: EntityId) -> String {
        entity_key(PREFIX, "laser", id.get())
    }

    fn draw(
        &mut self,
        ctx: &mut RenderContext<'_>,
        state: &CyberbossSnapshot,
        cues: &mut Vec<VisualCue>,
    ) {
        let parts = self
            .parts
            .get_or_insert_with(|| Parts::spawn(ctx.graph, ctx.layer, state.mode));
        parts.body.place(ctx.graph, state.position);
        parts.body.set_health(ctx.graph, state.health_fraction);

        if self.mode.is_some_and(|mode| mode != state.mode) {
            trace!("cyberboss switched to {:?}", state.mode);
            ctx.graph.run_keyed(
                parts.mode_ring,
                "mode",
                Action::stroke_color_to(mode_color(state.mode), 0.3),
            );
            ctx.graph.run_keyed(
                parts.core,
                "mode",
                Action::color_to(mode_color(state.mode).lighten(0.4), 0.3),
            );
        }
        self.mode = Some(state.mode);

        if self.phase.advanced(state.phase) {
            announce_phase(cues, state.position, mode_color(state.mode));
        }

        self.live_keys.clear();
        for puddle in &state.puddles {
            self.draw_puddle(ctx, puddle);
        }
        for laser in &state.lasers {
            self.draw_laser(ctx, laser);
        }

        let live = &self.live_keys;
        let puddle_prefix = format!("{PREFIX}_puddle_");
        let _ = self.registry.retain_where(
            ctx.graph,
            ctx.pool,
            Exit::FadeOut(0.3),
            |key| !key.starts_with(&puddle_prefix) || live.contains(key),
        );
        let _ = self
            .registry
            .retain_live(ctx.graph, ctx.pool, live, Exit::Immediate);
        self.laser_states
            .retain(|id, _| live.contains(&Self::laser_key(*id)));
    }

    fn draw_puddle(&mut self, ctx: &mut RenderContext<'_>, puddle: &DamagePuddle) {
        let key = Self::puddle_key(puddle.id);
        let layer = ctx.layer;
        let (node, created) = self.registry.ensure(ctx.graph, ctx.pool, &key, |graph, pool| {
            pool.acquire(
                graph,
                PoolTag::Puddle,
                layer,
                NodeSpec::circle(puddle.radius)
                    .fill(PUDDLE)
                    .glow(4.0)
                    .at(puddle.position)
                    .scaled(0.2)
                    .z(1.0),
            )
        });
        if created {
            ctx.graph.run_keyed(
                node,
                "grow",
                Action::scale_to(1.0, 0.25).with_timing(Timing::EaseOut),
            );
        }
        if let Some(body) = ctx.graph.get_mut(node) {
            body.position = puddle.position;
            body.shape = Shape::Circle {
                radius: puddle.radius,
            };
            body.alpha = PUDDLE_ALPHA * puddle.remaining_fraction();
        }
        let _ = self.live_keys.insert(key);
    }

    fn draw_laser(&mut self, ctx: &mut RenderContext<'_>, laser: &LaserBeam) {
        let key = Self::laser_key(laser.id);
        let layer = ctx.layer;
        let (node, _) = self.registry.ensure(ctx.graph, ctx.pool, &key, |graph, pool| {
            pool.acquire(
                graph,
                PoolTag::Laser,
                layer,
                NodeSpec::line(Vec2::new(laser.length, 0.0))
                    .stroke(LASER, CHARGING_WIDTH)
                    .z(30.0),
            )
        });
        if let Some(beam) = ctx.graph.get_mut(node) {
            beam.position = laser.origin;
            beam.rotation = laser.angle;
            beam.shape = Shape::Line {
                to: Vec2::new(laser.length.max(0.0), 0.0),
            };
        }

        if self.laser_states.insert(laser.id, laser.state) != Some(laser.state) {
            apply_laser_state(ctx.graph, node, laser.state);
        }
        let _ = self.live_keys.insert(key);
    }
}

fn apply_laser_state(graph: &mut SceneGraph, node: NodeId, state: LaserState) {
    if let Some(beam) = graph.get_mut(node) {
        let (width, glow) = match state {
            LaserState::Charging => (CHARGING_WIDTH, 0.0),
            LaserState::Firing => (FIRING_WIDTH, 12.0),
        };
        beam.stroke = Some(Stroke::new(LASER, width));
        beam.glow = glow;
        beam.alpha = 1.0;
    }
    match state {
        LaserState::Charging => graph.run_keyed(node, "charge", Action::blink(0.25, 0.2)),
        LaserState::Firing => graph.remove_action(node, "charge"),
    }
}

impl BossRenderer for CyberbossRenderer {
    fn kind(&self) -> BossKind {
        BossKind::Cyberboss
    }

    fn update(&mut self, ctx: &mut RenderContext<'_>, state: &BossState, cues: &mut Vec<VisualCue>) {
        if let BossState::Cyberboss(state) = state {
            self.draw(ctx, state, cues);
        }
    }

    fn teardown(&mut self, ctx: &mut RenderContext<'_>) {
        self.registry.clear(ctx.graph, ctx.pool, Exit::Immediate);
        if let Some(parts) = self.parts.take() {
            let _ = ctx.graph.remove(parts.body.root);
        }
        self.live_keys.clear();
        self.laser_states.clear();
        self.mode = None;
        self.phase = PhaseTracker::default();
    }

    fn live_nodes(&self) -> usize {
        self.registry.len() + self.parts.as_ref().map_or(0, |_| Parts::NODES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewall_defence_core::BossPhase;
    use firewall_defence_scene::NodePool;

    fn snapshot(puddles: Vec<DamagePuddle>, lasers: Vec<LaserBeam>) -> BossState {
        BossState::Cyberboss(CyberbossSnapshot {
            position: Vec2::new(10.0, 20.0),
            phase: BossPhase::FIRST,
            health_fraction: 0.8,
            mode: CyberbossMode::Melee,
            puddles,
            lasers,
        })
    }

    fn puddle(id: u32, age: f32) -> DamagePuddle {
        DamagePuddle {
            id: EntityId::new(id),
            position: Vec2::new(5.0, 5.0),
            radius: 12.0,
            age,
            lifetime: 4.0,
        }
    }

    fn laser(id: u32, state: LaserState) -> LaserBeam {
        LaserBeam {
            id: EntityId::new(id),
            origin: Vec2::ZERO,
            angle: 0.5,
            length: 300.0,
            state,
        }
    }

    #[test]
    fn puddles_grow_in_and_fade_with_lifetime() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = CyberbossRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(&mut ctx, &snapshot(vec![puddle(3, 2.0)], vec![]), &mut cues);
        let node = renderer
            .registry
            .get(ctx.graph, "cyberboss_puddle_3")
            .expect("puddle drawn");
        let drawn = ctx.graph.get(node).expect("live");
        assert!(drawn.scale.x < 1.0);
        assert!((drawn.alpha - PUDDLE_ALPHA * 0.5).abs() < 1e-5);
        assert_eq!(drawn.pool_tag(), Some(PoolTag::Puddle));

        ctx.graph.advance(0.3);
        assert_eq!(ctx.graph.get(node).expect("live").scale, Vec2::ONE);
    }

    #[test]
    fn vanished_puddles_fade_back_into_pool() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = CyberbossRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(&mut ctx, &snapshot(vec![puddle(1, 0.0)], vec![]), &mut cues);
        renderer.update(&mut ctx, &snapshot(vec![], vec![]), &mut cues);
        assert!(!renderer.registry.contains("cyberboss_puddle_1"));
        assert_eq!(ctx.pool.available(PoolTag::Puddle), 0);

        ctx.graph.advance(0.5);
        let _ = ctx.pool.reclaim(ctx.graph);
        assert_eq!(ctx.pool.available(PoolTag::Puddle), 1);
    }

    #[test]
    fn laser_thickens_when_it_starts_firing() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = CyberbossRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(
            &mut ctx,
            &snapshot(vec![], vec![laser(9, LaserState::Charging)]),
            &mut cues,
        );
        let node = renderer
            .registry
            .get(ctx.graph, "cyberboss_laser_9")
            .expect("laser drawn");
        assert!(ctx.graph.get(node).expect("live").has_action("charge"));

        renderer.update(
            &mut ctx,
            &snapshot(vec![], vec![laser(9, LaserState::Firing)]),
            &mut cues,
        );
        let beam = ctx.graph.get(node).expect("live");
        assert!(!beam.has_action("charge"));
        assert_eq!(beam.stroke.map(|stroke| stroke.width), Some(FIRING_WIDTH));
        assert_eq!(beam.rotation, 0.5);
        assert_eq!(beam.shape, Shape::Line { to: Vec2::new(300.0, 0.0) });

        renderer.update(&mut ctx, &snapshot(vec![], vec![]), &mut cues);
        assert_eq!(ctx.pool.available(PoolTag::Laser), 1);
        assert!(renderer.laser_states.is_empty());
    }

    #[test]
    fn mode_switch_recolors_indicator() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = CyberbossRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(&mut ctx, &snapshot(vec![], vec![]), &mut cues);
        let mut ranged = snapshot(vec![], vec![]);
        if let BossState::Cyberboss(state) = &mut ranged {
            state.mode = CyberbossMode::Ranged;
        }
        renderer.update(&mut ctx, &ranged, &mut cues);
        ctx.graph.advance(0.5);

        let ring = renderer.parts.as_ref().expect("spawned").mode_ring;
        let stroke = ctx.graph.get(ring).expect("live").stroke.expect("stroked");
        assert_eq!(stroke.color, RANGED);
    }
}
