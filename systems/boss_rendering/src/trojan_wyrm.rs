use std::collections::HashSet;
use std::f32::consts::{FRAC_PI_2, TAU};

use firewall_defence_core::{
    BossKind, BossState, CoilTarget, Color, FirewallWall, SubWorm, TrojanWyrmSnapshot, WyrmBody,
};
use firewall_defence_scene::{
    Action, Exit, NodeId, NodeRegistry, NodeSpec, PoolTag, SceneGraph, Shape,
};
use glam::Vec2;

use crate::common::{announce_phase, BossBody, PhaseTracker};
use crate::{BossRenderer, RenderContext, VisualCue};

const PREFIX: &str = "trojanwyrm";
const FIREWALL_LEFT_KEY: &str = "trojanwyrm_firewall_left";
const FIREWALL_RIGHT_KEY: &str = "trojanwyrm_firewall_right";
const COIL_KEY: &str = "trojanwyrm_coil";
const HEAD_RADIUS: f32 = 26.0;
const SEGMENT_RADIUS: f32 = 18.0;
const SUB_WORM_SCALE: f32 = 0.55;
const FIREWALL_THICKNESS: f32 = 14.0;

const SCALES: Color = Color::from_rgb_u8(0, 200, 83);
const BELLY: Color = Color::from_rgb_u8(27, 94, 32);
const FIREWALL: Color = Color::from_rgb_u8(255, 109, 0);
const RETICLE: Color = Color::from_rgb_u8(255, 23, 68);

#[derive(Debug)]
struct Parts {
    body: BossBody,
    head: NodeId,
}

impl Parts {
    const NODES: usize = BossBody::NODES + 1;

    fn spawn(graph: &mut SceneGraph, layer: NodeId) -> Self {
        let body = BossBody::spawn(graph, layer, PREFIX, HEAD_RADIUS + 10.0, SCALES);
        let head = graph.spawn_child(
            body.root,
            NodeSpec::polygon(head_outline(HEAD_RADIUS))
                .fill(SCALES)
                .stroke(BELLY, 3.0)
                .glow(4.0)
                .z(2.0),
        );
        Self { body, head }
    }
}

fn head_outline(radius: f32) -> Vec<Vec2> {
    vec![
        Vec2::new(radius * 1.3, 0.0),
        Vec2::new(radius * 0.4, radius * 0.9),
        Vec2::new(-radius * 0.8, radius * 0.7),
        Vec2::new(-radius * 0.8, -radius * 0.7),
        Vec2::new(radius * 0.4, -radius * 0.9),
    ]
}

/// Radius of segment `index` of a body with `count` segments, tapering to the tail.
fn segment_radius(base: f32, index: usize, count: usize) -> f32 {
    let taper = if count > 1 {
        index as f32 / (count - 1) as f32
    } else {
        0.0
    };
    base * (1.0 - 0.45 * taper)
}

/// Draws the Trojan Wyrm, its sub-worms, firewall and coil reticle.
#[derive(Debug, Default)]
pub struct TrojanWyrmRenderer {
    parts: Option<Parts>,
    registry: NodeRegistry,
    live_keys: HashSet<String>,
    phase: PhaseTracker,
    firewall_up: bool,
}

impl TrojanWyrmRenderer {
    /// Creates a renderer with nothing drawn yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn segment_key(index: usize) -> String {
        format!("{PREFIX}_segment_{index}")
    }

    fn sub_head_key(worm: &SubWorm) -> String {
        format!("{PREFIX}_sub_{}_head", worm.id.get())
    }

    fn sub_segment_key(worm: &SubWorm, index: usize) -> String {
        format!("{PREFIX}_sub_{}_segment_{index}", worm.id.get())
    }

    fn draw(
        &mut self,
        ctx: &mut RenderContext<'_>,
        state: &TrojanWyrmSnapshot,
        cues: &mut Vec<VisualCue>,
    ) {
        let parts = self
            .parts
            .get_or_insert_with(|| Parts::spawn(ctx.graph, ctx.layer));
        parts.body.place(ctx.graph, state.head.head);
        parts.body.set_health(ctx.graph, state.health_fraction);
        if let Some(head) = ctx.graph.get_mut(parts.head) {
            head.rotation = state.head.heading;
        }

        if self.phase.advanced(state.phase) {
            announce_phase(cues, state.head.head, SCALES);
        }

        self.live_keys.clear();
        self.draw_segments(ctx, &state.head, SEGMENT_RADIUS, Self::segment_key);
        for worm in &state.sub_worms {
            self.draw_sub_worm(ctx, worm);
        }
        if let Some(wall) = &state.firewall {
            self.draw_firewall(ctx, wall);
            if !self.firewall_up {
                cues.push(VisualCue::Flash {
                    color: FIREWALL.with_alpha(0.3),
                    duration: 0.35,
                });
            }
        }
        self.firewall_up = state.firewall.is_some();
        if let Some(coil) = &state.coiling {
            self.draw_coil(ctx, coil);
        }

        let live = &self.live_keys;
        let coil_and_wall = |key: &str| {
            key == COIL_KEY || key == FIREWALL_LEFT_KEY || key == FIREWALL_RIGHT_KEY
        };
        let _ = self.registry.retain_where(
            ctx.graph,
            ctx.pool,
            Exit::FadeOut(0.25),
            |key| !coil_and_wall(key) || live.contains(key),
        );
        let _ = self
            .registry
            .retain_live(ctx.graph, ctx.pool, live, Exit::Immediate);
    }

    fn draw_segments<K>(
        &mut self,
        ctx: &mut RenderContext<'_>,
        body: &WyrmBody,
        base_radius: f32,
        key_for: K,
    ) where
        K: Fn(usize) -> String,
    {
        let count = body.segments.len();
        for (index, center) in body.segments.iter().enumerate() {
            let key = key_for(index);
            let radius = segment_radius(base_radius, index, count);
            let node = ensure_segment(&mut self.registry, ctx, &key, radius);
            if let Some(segment) = ctx.graph.get_mut(node) {
                segment.position = *center;
                segment.shape = Shape::Circle { radius };
                segment.z = 1.0 - index as f32 * 0.001;
            }
            let _ = self.live_keys.insert(key);
        }
    }

    fn draw_sub_worm(&mut self, ctx: &mut RenderContext<'_>, worm: &SubWorm) {
        let key = Self::sub_head_key(worm);
        let layer = ctx.layer;
        let (head, _) = self.registry.ensure(ctx.graph, ctx.pool, &key, |graph, _| {
            graph.spawn_child(
                layer,
                NodeSpec::polygon(head_outline(HEAD_RADIUS * SUB_WORM_SCALE))
                    .fill(SCALES.lighten(0.2))
                    .stroke(BELLY, 2.0)
                    .z(1.5),
            )
        });
        if let Some(node) = ctx.graph.get_mut(head) {
            node.position = worm.body.head;
            node.rotation = worm.body.heading;
        }
        let _ = self.live_keys.insert(key);

        self.draw_segments(ctx, &worm.body, SEGMENT_RADIUS * SUB_WORM_SCALE, |index| {
            Self::sub_segment_key(worm, index)
        });
    }

    fn draw_firewall(&mut self, ctx: &mut RenderContext<'_>, wall: &FirewallWall) {
        let (left, right) = firewall_spans(wall);
        for (key, span) in [(FIREWALL_LEFT_KEY, left), (FIREWALL_RIGHT_KEY, right)] {
            let Some((start, end)) = span else {
                continue;
            };
            let layer = ctx.layer;
            let (node, created) = self.registry.ensure(ctx.graph, ctx.pool, key, |graph, _| {
                graph.spawn_child(
                    layer,
                    NodeSpec::rect(Vec2::new(1.0, FIREWALL_THICKNESS))
                        .fill(FIREWALL)
                        .glow(10.0)
                        .named(key)
                        .z(3.0),
                )
            });
            if created {
                ctx.graph.run_keyed(node, "flicker", Action::blink(0.75, 0.3));
            }
            if let Some(segment) = ctx.graph.get_mut(node) {
                segment.position = Vec2::new((start + end) * 0.5, wall.y);
                segment.shape = Shape::Rect {
                    size: Vec2::new(end - start, FIREWALL_THICKNESS),
                    corner_radius: 0.0,
                };
            }
            let _ = self.live_keys.insert(key.to_owned());
        }
    }

    fn draw_coil(&mut self, ctx: &mut RenderContext<'_>, coil: &CoilTarget) {
        let layer = ctx.layer;
        let (node, _) = self.registry.ensure(ctx.graph, ctx.pool, COIL_KEY, |graph, _| {
            spawn_reticle(graph, layer)
        });
        if let Some(reticle) = ctx.graph.get_mut(node) {
            reticle.position = coil.center;
            reticle.scale = Vec2::splat(coil.radius.max(1.0));
        }
        let _ = self.live_keys.insert(COIL_KEY.to_owned());
    }
}

fn ensure_segment(
    registry: &mut NodeRegistry,
    ctx: &mut RenderContext<'_>,
    key: &str,
    radius: f32,
) -> NodeId {
    let layer = ctx.layer;
    let (node, _) = registry.ensure(ctx.graph, ctx.pool, key, |graph, pool| {
        pool.acquire(
            graph,
            PoolTag::Segment,
            layer,
            NodeSpec::circle(radius).fill(BELLY).stroke(SCALES, 2.0),
        )
    });
    node
}

/// Horizontal extents of the wall pieces left and right of the gap.
///
/// A piece is `None` when the gap reaches past that end of the wall.
fn firewall_spans(wall: &FirewallWall) -> (Option<(f32, f32)>, Option<(f32, f32)>) {
    let width = wall.width.max(0.0);
    let half_gap = wall.gap_width.max(0.0) * 0.5;
    let gap_start = (wall.gap_center - half_gap).clamp(0.0, width);
    let gap_end = (wall.gap_center + half_gap).clamp(0.0, width);
    let left = (gap_start > 0.0).then_some((0.0, gap_start));
    let right = (gap_end < width).then_some((gap_end, width));
    (left, right)
}

/// Reticle drawn at unit radius and scaled to the coil.
fn spawn_reticle(graph: &mut SceneGraph, layer: NodeId) -> NodeId {
    let group = graph.spawn_child(layer, NodeSpec::group().named(COIL_KEY).z(4.0));
    let _ = graph.spawn_child(
        group,
        NodeSpec::ring(1.0, 0.03).stroke(RETICLE, 0.03).alpha(0.8),
    );
    for index in 0..4 {
        let angle = index as f32 * FRAC_PI_2;
        let direction = Vec2::new(angle.cos(), angle.sin());
        let _ = graph.spawn_child(
            group,
            NodeSpec::line(direction * 0.25)
                .stroke(RETICLE, 0.04)
                .at(direction * 0.85),
        );
    }
    graph.run_keyed(
        group,
        "spin",
        Action::group(vec![
            Action::forever(Action::rotate_by(TAU, 4.0)),
            Action::blink(0.5, 0.6),
        ]),
    );
    group
}

impl BossRenderer for TrojanWyrmRenderer {
    fn kind(&self) -> BossKind {
        BossKind::TrojanWyrm
    }

    fn update(&mut self, ctx: &mut RenderContext<'_>, state: &BossState, cues: &mut Vec<VisualCue>) {
        if let BossState::TrojanWyrm(state) = state {
            self.draw(ctx, state, cues);
        }
    }

    fn teardown(&mut self, ctx: &mut RenderContext<'_>) {
        self.registry.clear(ctx.graph, ctx.pool, Exit::Immediate);
        if let Some(parts) = self.parts.take() {
            let _ = ctx.graph.remove(parts.body.root);
        }
        self.live_keys.clear();
        self.phase = PhaseTracker::default();
        self.firewall_up = false;
    }

    fn live_nodes(&self) -> usize {
        self.registry.len() + self.parts.as_ref().map_or(0, |_| Parts::NODES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewall_defence_core::{BossPhase, EntityId};
    use firewall_defence_scene::NodePool;

    fn body(head: Vec2, segments: usize) -> WyrmBody {
        WyrmBody {
            head,
            heading: 0.3,
            segments: (1..=segments)
                .map(|index| head - Vec2::new(index as f32 * 20.0, 0.0))
                .collect(),
        }
    }

    fn snapshot(segments: usize, sub_worms: Vec<SubWorm>) -> TrojanWyrmSnapshot {
        TrojanWyrmSnapshot {
            phase: BossPhase::FIRST,
            health_fraction: 1.0,
            head: body(Vec2::new(300.0, 100.0), segments),
            sub_worms,
            firewall: None,
            coiling: None,
        }
    }

    #[test]
    fn segment_count_grows_and_shrinks_through_pool() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = TrojanWyrmRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(&mut ctx, &BossState::TrojanWyrm(snapshot(6, vec![])), &mut cues);
        assert_eq!(renderer.registry.len(), 6);

        renderer.update(&mut ctx, &BossState::TrojanWyrm(snapshot(4, vec![])), &mut cues);
        assert_eq!(renderer.registry.len(), 4);
        assert!(!renderer.registry.contains("trojanwyrm_segment_4"));
        assert_eq!(ctx.pool.available(PoolTag::Segment), 2);

        renderer.update(&mut ctx, &BossState::TrojanWyrm(snapshot(5, vec![])), &mut cues);
        assert_eq!(ctx.pool.available(PoolTag::Segment), 1);
    }

    #[test]
    fn sub_worms_get_their_own_keys() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = TrojanWyrmRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);
        let worm = SubWorm {
            id: EntityId::new(3),
            body: body(Vec2::new(-50.0, 0.0), 2),
        };

        renderer.update(
            &mut ctx,
            &BossState::TrojanWyrm(snapshot(1, vec![worm])),
            &mut cues,
        );

        assert_eq!(
            renderer.registry.keys(),
            vec![
                "trojanwyrm_segment_0",
                "trojanwyrm_sub_3_head",
                "trojanwyrm_sub_3_segment_0",
                "trojanwyrm_sub_3_segment_1",
            ]
        );

        renderer.update(&mut ctx, &BossState::TrojanWyrm(snapshot(1, vec![])), &mut cues);
        assert_eq!(renderer.registry.keys(), vec!["trojanwyrm_segment_0"]);
    }

    #[test]
    fn firewall_leaves_a_gap() {
        let wall = FirewallWall {
            y: 200.0,
            gap_center: 300.0,
            gap_width: 100.0,
            width: 800.0,
        };
        assert_eq!(
            firewall_spans(&wall),
            (Some((0.0, 250.0)), Some((350.0, 800.0)))
        );

        let flush_left = FirewallWall {
            gap_center: 20.0,
            ..wall
        };
        assert_eq!(firewall_spans(&flush_left).0, None);
    }

    #[test]
    fn firewall_and_coil_are_drawn_and_removed_with_one_flash() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = TrojanWyrmRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);
        let mut state = snapshot(0, vec![]);
        state.firewall = Some(FirewallWall {
            y: 200.0,
            gap_center: 300.0,
            gap_width: 100.0,
            width: 800.0,
        });
        state.coiling = Some(CoilTarget {
            center: Vec2::new(10.0, 10.0),
            radius: 90.0,
        });

        renderer.update(&mut ctx, &BossState::TrojanWyrm(state.clone()), &mut cues);
        renderer.update(&mut ctx, &BossState::TrojanWyrm(state.clone()), &mut cues);
        assert!(matches!(
            cues.as_slice(),
            [VisualCue::Flash { color, .. }] if *color == FIREWALL.with_alpha(0.3)
        ));
        let left = renderer
            .registry
            .get(ctx.graph, FIREWALL_LEFT_KEY)
            .expect("left wall");
        assert_eq!(ctx.graph.get(left).expect("live").position, Vec2::new(125.0, 200.0));
        let coil = renderer.registry.get(ctx.graph, COIL_KEY).expect("coil");
        assert_eq!(ctx.graph.get(coil).expect("live").scale, Vec2::splat(90.0));

        state.firewall = None;
        state.coiling = None;
        renderer.update(&mut ctx, &BossState::TrojanWyrm(state), &mut cues);
        assert!(renderer.registry.is_empty());
        ctx.graph.advance(0.5);
        assert!(!ctx.graph.contains(left));
        assert!(!ctx.graph.contains(coil));
    }

    #[test]
    fn segments_taper_towards_the_tail() {
        assert_eq!(segment_radius(20.0, 0, 5), 20.0);
        assert!(segment_radius(20.0, 4, 5) < segment_radius(20.0, 2, 5));
        assert_eq!(segment_radius(20.0, 0, 1), 20.0);
    }
}
