use std::collections::{HashMap, HashSet};
use std::f32::consts::{FRAC_PI_2, TAU};

use firewall_defence_core::{
    BossKind, BossState, Color, EntityId, GravityWell, Pylon, VoidHarbingerSnapshot, VoidZone,
    VoidZoneState,
};
use firewall_defence_scene::{
    Action, Exit, NodeId, NodeRegistry, NodeSpec, PoolTag, SceneGraph, Shape, Stroke,
};
use glam::Vec2;

use crate::common::{announce_phase, entity_key, BossBody, PhaseTracker};
use crate::{BossRenderer, RenderContext, VisualCue};

const PREFIX: &str = "voidharbinger";
const GRAVITY_WELL_KEY: &str = "voidharbinger_gravity_well";
const ARENA_KEY: &str = "voidharbinger_arena";
const RADIUS: f32 = 48.0;

const VOID: Color = Color::from_rgb_u8(124, 77, 255);
const SHADOW: Color = Color::from_rgb_u8(26, 13, 51);
const PYLON: Color = Color::from_rgb_u8(179, 136, 255);
const HEALTH: Color = Color::from_rgb_u8(105, 240, 174);

const PYLON_BAR_WIDTH: f32 = 28.0;
const ARENA_THICKNESS: f32 = 6.0;
const WELL_ARCS: usize = 3;

#[derive(Debug)]
struct Parts {
    body: BossBody,
}

impl Parts {
    const NODES: usize = BossBody::NODES + 2;

    fn spawn(graph: &mut SceneGraph, layer: NodeId) -> Self {
        let body = BossBody::spawn(graph, layer, PREFIX, RADIUS + 10.0, VOID);
        let _ = graph.spawn_child(
            body.root,
            NodeSpec::circle(RADIUS).fill(SHADOW).stroke(VOID, 3.0).glow(10.0),
        );
        let eye = graph.spawn_child(
            body.root,
            NodeSpec::new(Shape::regular_polygon(4, RADIUS * 0.4, 0.0))
                .fill(VOID.lighten(0.3))
                .z(1.0),
        );
        graph.run_keyed(eye, "spin", Action::forever(Action::rotate_by(TAU, 5.0)));
        Self { body }
    }
}

/// Draws the Void Harbinger with its zones, pylons, gravity well and arena.
#[derive(Debug, Default)]
pub struct VoidHarbingerRenderer {
    parts: Option<Parts>,
    registry: NodeRegistry,
    live_keys: HashSet<String>,
    phase: PhaseTracker,
    zone_states: HashMap<EntityId, VoidZoneState>,
    pylons: HashMap<EntityId, PylonNodes>,
    well_radius: f32,
}

#[derive(Clone, Copy, Debug)]
struct PylonNodes {
    bar: NodeId,
    position: Vec2,
}

impl VoidHarbingerRenderer {
    /// Creates a renderer with nothing drawn yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn zone_key(id: EntityId) -> String {
        entity_key(PREFIX, "zone", id.get())
    }

    fn pylon_key(id: EntityId) -> String {
        entity_key(PREFIX, "pylon", id.get())
    }

    fn draw(
        &mut self,
        ctx: &mut RenderContext<'_>,
        state: &VoidHarbingerSnapshot,
        cues: &mut Vec<VisualCue>,
    ) {
        let parts = self
            .parts
            .get_or_insert_with(|| Parts::spawn(ctx.graph, ctx.layer));
        parts.body.place(ctx.graph, state.position);
        parts.body.set_health(ctx.graph, state.health_fraction);

        if self.phase.advanced(state.phase) {
            announce_phase(cues, state.position, VOID);
        }

        self.live_keys.clear();
        for zone in &state.zones {
            self.draw_zone(ctx, zone, cues);
        }
        for pylon in &state.pylons {
            self.draw_pylon(ctx, pylon);
        }
        if let Some(well) = &state.gravity_well {
            self.draw_gravity_well(ctx, well);
        }
        if let Some(radius) = state.arena_radius {
            self.draw_arena(ctx, state.position, radius);
        }

        let live = &self.live_keys;
        let pylons = &mut self.pylons;
        pylons.retain(|id, nodes| {
            let alive = live.contains(&Self::pylon_key(*id));
            if !alive {
                cues.push(VisualCue::Explosion {
                    position: nodes.position,
                    color: PYLON,
                    radius: 40.0,
                });
            }
            alive
        });
        self.zone_states
            .retain(|id, _| live.contains(&Self::zone_key(*id)));

        let pylon_prefix = format!("{PREFIX}_pylon_");
        let _ = self.registry.retain_where(
            ctx.graph,
            ctx.pool,
            Exit::Immediate,
            |key| !key.starts_with(&pylon_prefix) || live.contains(key),
        );
        let _ = self
            .registry
            .retain_live(ctx.graph, ctx.pool, live, Exit::FadeOut(0.3));
    }

    fn draw_zone(
        &mut self,
        ctx: &mut RenderContext<'_>,
        zone: &VoidZone,
        cues: &mut Vec<VisualCue>,
    ) {
        let key = Self::zone_key(zone.id);
        let layer = ctx.layer;
        let (node, _) = self.registry.ensure(ctx.graph, ctx.pool, &key, |graph, pool| {
            pool.acquire(
                graph,
                PoolTag::Puddle,
                layer,
                NodeSpec::circle(zone.radius).at(zone.center).z(2.0),
            )
        });
        if let Some(drawn) = ctx.graph.get_mut(node) {
            drawn.position = zone.center;
            drawn.shape = Shape::Circle {
                radius: zone.radius,
            };
        }
        if self.zone_states.insert(zone.id, zone.state) != Some(zone.state) {
            apply_zone_state(ctx.graph, node, zone.state);
            if zone.state == VoidZoneState::Active {
                cues.push(VisualCue::Ring {
                    position: zone.center,
                    color: VOID.lighten(0.3),
                    max_radius: zone.radius * 1.3,
                    duration: 0.4,
                });
            }
        }
        let _ = self.live_keys.insert(key);
    }

    fn draw_pylon(&mut self, ctx: &mut RenderContext<'_>, pylon: &Pylon) {
        let key = Self::pylon_key(pylon.id);
        let layer = ctx.layer;
        let (node, created) = self.registry.ensure(ctx.graph, ctx.pool, &key, |graph, _| {
            spawn_pylon(graph, layer)
        });
        if created {
            if let Some(bar) = ctx.graph.get(node).and_then(|group| group.children().last().copied()) {
                let _ = self.pylons.insert(
                    pylon.id,
                    PylonNodes {
                        bar,
                        position: pylon.position,
                    },
                );
            }
        }
        if let Some(group) = ctx.graph.get_mut(node) {
            group.position = pylon.position;
        }
        if let Some(nodes) = self.pylons.get_mut(&pylon.id) {
            nodes.position = pylon.position;
            let fraction = pylon.health_fraction.clamp(0.0, 1.0);
            if let Some(bar) = ctx.graph.get_mut(nodes.bar) {
                bar.scale.x = fraction;
                bar.position.x = -(1.0 - fraction) * PYLON_BAR_WIDTH * 0.5;
            }
        }
        let _ = self.live_keys.insert(key);
    }

    fn draw_gravity_well(&mut self, ctx: &mut RenderContext<'_>, well: &GravityWell) {
        let layer = ctx.layer;
        let (node, created) =
            self.registry
                .ensure(ctx.graph, ctx.pool, GRAVITY_WELL_KEY, |graph, _| {
                    spawn_gravity_well(graph, layer, well.radius)
                });
        if created {
            self.well_radius = well.radius.max(1.0);
        }
        if let Some(group) = ctx.graph.get_mut(node) {
            group.position = well.center;
            group.scale = Vec2::splat(well.radius.max(1.0) / self.well_radius);
        }
        let _ = self.live_keys.insert(GRAVITY_WELL_KEY.to_owned());
    }

    fn draw_arena(&mut self, ctx: &mut RenderContext<'_>, center: Vec2, radius: f32) {
        let layer = ctx.layer;
        let (node, _) = self.registry.ensure(ctx.graph, ctx.pool, ARENA_KEY, |graph, _| {
            graph.spawn_child(
                layer,
                NodeSpec::ring(radius, ARENA_THICKNESS)
                    .stroke(VOID, ARENA_THICKNESS)
                    .glow(12.0)
                    .named(ARENA_KEY)
                    .z(3.0),
            )
        });
        if let Some(ring) = ctx.graph.get_mut(node) {
            ring.position = center;
            ring.shape = Shape::Ring {
                radius: radius.max(0.0),
                thickness: ARENA_THICKNESS,
            };
        }
        let _ = self.live_keys.insert(ARENA_KEY.to_owned());
    }
}

fn apply_zone_state(graph: &mut SceneGraph, node: NodeId, state: VoidZoneState) {
    if let Some(zone) = graph.get_mut(node) {
        match state {
            VoidZoneState::Warning => {
                zone.fill = Some(VOID.with_alpha(0.2));
                zone.stroke = Some(Stroke::new(VOID, 2.0));
                zone.glow = 0.0;
            }
            VoidZoneState::Active => {
                zone.fill = Some(SHADOW.lerp(VOID, 0.5).with_alpha(0.85));
                zone.stroke = Some(Stroke::new(VOID.lighten(0.3), 3.0));
                zone.glow = 8.0;
                zone.alpha = 1.0;
            }
        }
    }
    match state {
        VoidZoneState::Warning => graph.run_keyed(node, "warning", Action::blink(0.3, 0.5)),
        VoidZoneState::Active => graph.remove_action(node, "warning"),
    }
}

fn spawn_pylon(graph: &mut SceneGraph, layer: NodeId) -> NodeId {
    let group = graph.spawn_child(layer, NodeSpec::group().z(4.0));
    let crystal = graph.spawn_child(
        group,
        NodeSpec::polygon(vec![
            Vec2::new(0.0, -18.0),
            Vec2::new(9.0, 0.0),
            Vec2::new(0.0, 18.0),
            Vec2::new(-9.0, 0.0),
        ])
        .fill(PYLON)
        .glow(6.0),
    );
    graph.run_keyed(crystal, "hover", Action::pulse(1.05, 1.4));
    let _ = graph.spawn_child(
        group,
        NodeSpec::rect(Vec2::new(PYLON_BAR_WIDTH, 4.0))
            .fill(Color::BLACK.with_alpha(0.6))
            .at(Vec2::new(0.0, 26.0))
            .z(1.0),
    );
    let _ = graph.spawn_child(
        group,
        NodeSpec::rect(Vec2::new(PYLON_BAR_WIDTH, 4.0))
            .fill(HEALTH)
            .at(Vec2::new(0.0, 26.0))
            .z(2.0),
    );
    group
}

fn spawn_gravity_well(graph: &mut SceneGraph, layer: NodeId, radius: f32) -> NodeId {
    let group = graph.spawn_child(layer, NodeSpec::group().named(GRAVITY_WELL_KEY).z(2.5));
    let span = TAU / WELL_ARCS as f32;
    for index in 0..WELL_ARCS {
        let start = index as f32 * span;
        let _ = graph.spawn_child(
            group,
            NodeSpec::new(Shape::Arc {
                radius: radius.max(1.0),
                start_angle: start,
                end_angle: start + span - FRAC_PI_2 * 0.5,
                thickness: 3.0,
            })
            .stroke(VOID.lighten(0.2), 3.0)
            .alpha(0.7),
        );
    }
    graph.run_keyed(group, "spin", Action::forever(Action::rotate_by(-TAU, 3.0)));
    group
}

impl BossRenderer for VoidHarbingerRenderer {
    fn kind(&self) -> BossKind {
        BossKind::VoidHarbinger
    }

    fn update(&mut self, ctx: &mut RenderContext<'_>, state: &BossState, cues: &mut Vec<VisualCue>) {
        if let BossState::VoidHarbinger(state) = state {
            self.draw(ctx, state, cues);
        }
    }

    fn teardown(&mut self, ctx: &mut RenderContext<'_>) {
        self.registry.clear(ctx.graph, ctx.pool, Exit::Immediate);
        if let Some(parts) = self.parts.take() {
            let _ = ctx.graph.remove(parts.body.root);
        }
        self.live_keys.clear();
        self.zone_states.clear();
        self.pylons.clear();
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

    fn snapshot(
        zones: Vec<VoidZone>,
        pylons: Vec<Pylon>,
        gravity_well: Option<GravityWell>,
        arena_radius: Option<f32>,
    ) -> BossState {
        BossState::VoidHarbinger(VoidHarbingerSnapshot {
            position: Vec2::new(200.0, 200.0),
            phase: BossPhase::FIRST,
            health_fraction: 1.0,
            zones,
            pylons,
            gravity_well,
            arena_radius,
        })
    }

    fn zone(id: u32, state: VoidZoneState) -> VoidZone {
        VoidZone {
            id: EntityId::new(id),
            center: Vec2::new(50.0, 60.0),
            radius: 30.0,
            state,
        }
    }

    fn pylon(id: u32, health_fraction: f32) -> Pylon {
        Pylon {
            id: EntityId::new(id),
            position: Vec2::new(-80.0, 10.0),
            health_fraction,
        }
    }

    #[test]
    fn warning_zone_pulses_until_active_then_rings_once() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = VoidHarbingerRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(
            &mut ctx,
            &snapshot(vec![zone(1, VoidZoneState::Warning)], vec![], None, None),
            &mut cues,
        );
        let node = renderer
            .registry
            .get(ctx.graph, "voidharbinger_zone_1")
            .expect("zone drawn");
        assert!(ctx.graph.get(node).expect("live").has_action("warning"));
        assert!(cues.is_empty());

        for _ in 0..2 {
            renderer.update(
                &mut ctx,
                &snapshot(vec![zone(1, VoidZoneState::Active)], vec![], None, None),
                &mut cues,
            );
        }
        let drawn = ctx.graph.get(node).expect("live");
        assert!(!drawn.has_action("warning"));
        assert_eq!(drawn.alpha, 1.0);
        assert_eq!(drawn.glow, 8.0);
        assert!(matches!(
            cues.as_slice(),
            [VisualCue::Ring { position, max_radius, .. }]
                if *position == Vec2::new(50.0, 60.0) && *max_radius == 39.0
        ));
    }

    #[test]
    fn pylon_bar_shrinks_and_destruction_explodes() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = VoidHarbingerRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(&mut ctx, &snapshot(vec![], vec![pylon(4, 0.5)], None, None), &mut cues);
        let bar = renderer.pylons[&EntityId::new(4)].bar;
        let drawn = ctx.graph.get(bar).expect("live");
        assert_eq!(drawn.scale.x, 0.5);
        assert_eq!(drawn.position.x, -PYLON_BAR_WIDTH * 0.25);

        renderer.update(&mut ctx, &snapshot(vec![], vec![], None, None), &mut cues);
        assert!(!ctx.graph.contains(bar));
        assert!(matches!(
            cues.as_slice(),
            [VisualCue::Explosion { position, .. }] if *position == Vec2::new(-80.0, 10.0)
        ));
    }

    #[test]
    fn arena_ring_tracks_shrinking_radius() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = VoidHarbingerRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(&mut ctx, &snapshot(vec![], vec![], None, Some(400.0)), &mut cues);
        renderer.update(&mut ctx, &snapshot(vec![], vec![], None, Some(350.0)), &mut cues);
        let ring = renderer.registry.get(ctx.graph, ARENA_KEY).expect("arena drawn");
        assert_eq!(
            ctx.graph.get(ring).expect("live").shape,
            Shape::Ring {
                radius: 350.0,
                thickness: ARENA_THICKNESS
            }
        );
    }

    #[test]
    fn gravity_well_scales_and_fades_away() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = VoidHarbingerRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);
        let well = |radius| GravityWell {
            center: Vec2::ZERO,
            radius,
        };

        renderer.update(&mut ctx, &snapshot(vec![], vec![], Some(well(100.0)), None), &mut cues);
        renderer.update(&mut ctx, &snapshot(vec![], vec![], Some(well(150.0)), None), &mut cues);
        let node = renderer
            .registry
            .get(ctx.graph, GRAVITY_WELL_KEY)
            .expect("well drawn");
        assert_eq!(ctx.graph.get(node).expect("live").scale, Vec2::splat(1.5));

        renderer.update(&mut ctx, &snapshot(vec![], vec![], None, None), &mut cues);
        ctx.graph.advance(0.5);
        assert!(!ctx.graph.contains(node));
    }
}
