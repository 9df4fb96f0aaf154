use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

use firewall_defence_core::{
    BossKind, BossState, Color, HazardTile, HazardTileState, OverclockerSnapshot, SteamPuff,
};
use firewall_defence_scene::{
    Action, Exit, NodeId, NodeRegistry, NodeSpec, PoolTag, SceneGraph, Shape, Timing,
};
use glam::Vec2;
use log::trace;

use crate::common::{announce_phase, entity_key, BossBody, PhaseTracker};
use crate::{BossRenderer, RenderContext, VisualCue};

const PREFIX: &str = "overclocker";
const SUCTION_KEY: &str = "suction";
const RADIUS: f32 = 40.0;
const BLADES: usize = 3;
const STEAM_RADIUS: f32 = 10.0;

const CHASSIS: Color = Color::from_rgb_u8(69, 90, 100);
const BLADE: Color = Color::from_rgb_u8(207, 216, 220);
const HEAT: Color = Color::from_rgb_u8(255, 145, 0);
const MOLTEN: Color = Color::from_rgb_u8(255, 61, 0);
const STEAM: Color = Color::from_rgb_u8(236, 239, 241);

#[derive(Debug)]
struct Parts {
    body: BossBody,
    blades: NodeId,
    suction: NodeId,
}

impl Parts {
    const NODES: usize = BossBody::NODES + 3 + BLADES;

    fn spawn(graph: &mut SceneGraph, layer: NodeId) -> Self {
        let body = BossBody::spawn(graph, layer, PREFIX, RADIUS + 12.0, HEAT);
        let _ = graph.spawn_child(
            body.root,
            NodeSpec::new(Shape::regular_polygon(6, RADIUS * 0.7, 0.0))
                .fill(CHASSIS)
                .stroke(CHASSIS.lighten(0.25), 2.0)
                .z(1.0),
        );
        let blades = graph.spawn_child(body.root, NodeSpec::group().named("blades"));
        for index in 0..BLADES {
            let angle = index as f32 / BLADES as f32 * TAU;
            let direction = Vec2::new(angle.cos(), angle.sin());
            let _ = graph.spawn_child(
                blades,
                NodeSpec::rect(Vec2::new(RADIUS, 8.0))
                    .fill(BLADE)
                    .at(direction * RADIUS * 0.5)
                    .rotated(angle),
            );
        }
        let suction = graph.spawn_child(
            body.root,
            NodeSpec::ring(RADIUS * 3.0, 2.0)
                .stroke(STEAM.with_alpha(0.6), 2.0)
                .hidden()
                .z(-1.0),
        );
        Self {
            body,
            blades,
            suction,
        }
    }
}

/// Draws the Overclocker, its heated tiles, steam and suction indicator.
#[derive(Debug, Default)]
pub struct OverclockerRenderer {
    parts: Option<Parts>,
    registry: NodeRegistry,
    live_keys: HashSet<String>,
    phase: PhaseTracker,
    tile_states: HashMap<u32, HazardTileState>,
    suction: bool,
}

impl OverclockerRenderer {
    /// Creates a renderer with nothing drawn yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tile_key(index: u32) -> String {
        entity_key(PREFIX, "tile", index)
    }

    fn steam_key(puff: &SteamPuff) -> String {
        entity_key(PREFIX, "steam", puff.id.get())
    }

    fn draw(
        &mut self,
        ctx: &mut RenderContext<'_>,
        state: &OverclockerSnapshot,
        cues: &mut Vec<VisualCue>,
    ) {
        let parts = self
            .parts
            .get_or_insert_with(|| Parts::spawn(ctx.graph, ctx.layer));
        parts.body.place(ctx.graph, state.position);
        parts.body.set_health(ctx.graph, state.health_fraction);
        if let Some(blades) = ctx.graph.get_mut(parts.blades) {
            blades.rotation = state.blade_angle;
        }

        if state.suction != self.suction {
            trace!("overclocker suction {}", state.suction);
            set_suction(ctx.graph, parts.suction, state.suction);
            self.suction = state.suction;
        }

        if self.phase.advanced(state.phase) {
            announce_phase(cues, state.position, MOLTEN);
        }

        self.live_keys.clear();
        for tile in &state.tiles {
            self.draw_tile(ctx, tile);
        }
        for puff in &state.steam {
            self.draw_steam(ctx, puff);
        }

        let live = &self.live_keys;
        self.tile_states
            .retain(|index, _| live.contains(&Self::tile_key(*index)));
        let tile_prefix = format!("{PREFIX}_tile_");
        let _ = self.registry.retain_where(
            ctx.graph,
            ctx.pool,
            Exit::FadeOut(0.2),
            |key| !key.starts_with(&tile_prefix) || live.contains(key),
        );
        let _ = self
            .registry
            .retain_live(ctx.graph, ctx.pool, live, Exit::Immediate);
    }

    fn draw_tile(&mut self, ctx: &mut RenderContext<'_>, tile: &HazardTile) {
        let key = Self::tile_key(tile.index);
        let layer = ctx.layer;
        let (node, _) = self.registry.ensure(ctx.graph, ctx.pool, &key, |graph, _| {
            graph.spawn_child(
                layer,
                NodeSpec::rounded_rect(Vec2::splat(tile.size), 3.0)
                    .at(tile.center)
                    .z(0.5),
            )
        });
        if let Some(drawn) = ctx.graph.get_mut(node) {
            drawn.position = tile.center;
        }
        if self.tile_states.insert(tile.index, tile.state) != Some(tile.state) {
            apply_tile_state(ctx.graph, node, tile.state);
        }
        let _ = self.live_keys.insert(key);
    }

    fn draw_steam(&mut self, ctx: &mut RenderContext<'_>, puff: &SteamPuff) {
        let key = Self::steam_key(puff);
        let layer = ctx.layer;
        let (node, _) = self.registry.ensure(ctx.graph, ctx.pool, &key, |graph, pool| {
            pool.acquire(
                graph,
                PoolTag::Steam,
                layer,
                NodeSpec::circle(STEAM_RADIUS)
                    .fill(STEAM)
                    .at(puff.position)
                    .z(25.0),
            )
        });
        let progress = if puff.lifetime > f32::EPSILON {
            (puff.age / puff.lifetime).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if let Some(drawn) = ctx.graph.get_mut(node) {
            drawn.position = puff.position;
            drawn.scale = Vec2::splat(1.0 + progress * 1.5);
            drawn.alpha = 0.5 * (1.0 - progress);
        }
        let _ = self.live_keys.insert(key);
    }
}

fn apply_tile_state(graph: &mut SceneGraph, node: NodeId, state: HazardTileState) {
    match state {
        HazardTileState::Warning => {
            if let Some(tile) = graph.get_mut(node) {
                tile.fill = Some(HEAT.with_alpha(0.35));
                tile.glow = 0.0;
            }
            graph.run_keyed(node, "heat", Action::blink(0.4, 0.4));
        }
        HazardTileState::Hot => {
            graph.remove_action(node, "heat");
            if let Some(tile) = graph.get_mut(node) {
                tile.fill = Some(MOLTEN.with_alpha(0.8));
                tile.glow = 6.0;
                tile.alpha = 1.0;
            }
        }
    }
}

fn set_suction(graph: &mut SceneGraph, ring: NodeId, active: bool) {
    if active {
        if let Some(node) = graph.get_mut(ring) {
            node.hidden = false;
            node.scale = Vec2::ONE;
        }
        graph.run_keyed(
            ring,
            SUCTION_KEY,
            Action::forever(Action::sequence(vec![
                Action::scale_to(0.3, 0.8).with_timing(Timing::EaseIn),
                Action::scale_to(1.0, 0.0),
            ])),
        );
    } else {
        graph.remove_action(ring, SUCTION_KEY);
        if let Some(node) = graph.get_mut(ring) {
            node.hidden = true;
        }
    }
}

impl BossRenderer for OverclockerRenderer {
    fn kind(&self) -> BossKind {
        BossKind::Overclocker
    }

    fn update(&mut self, ctx: &mut RenderContext<'_>, state: &BossState, cues: &mut Vec<VisualCue>) {
        if let BossState::Overclocker(state) = state {
            self.draw(ctx, state, cues);
        }
    }

    fn teardown(&mut self, ctx: &mut RenderContext<'_>) {
        self.registry.clear(ctx.graph, ctx.pool, Exit::Immediate);
        if let Some(parts) = self.parts.take() {
            let _ = ctx.graph.remove(parts.body.root);
        }
        self.live_keys.clear();
        self.tile_states.clear();
        self.suction = false;
        self.phase = PhaseTracker::default();
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

    fn snapshot(tiles: Vec<HazardTile>, steam: Vec<SteamPuff>, suction: bool) -> BossState {
        BossState::Overclocker(OverclockerSnapshot {
            position: Vec2::ZERO,
            phase: BossPhase::FIRST,
            health_fraction: 1.0,
            blade_angle: 1.25,
            tiles,
            steam,
            suction,
        })
    }

    fn tile(index: u32, state: HazardTileState) -> HazardTile {
        HazardTile {
            index,
            center: Vec2::new(32.0, 32.0),
            size: 32.0,
            state,
        }
    }

    #[test]
    fn blades_follow_snapshot_angle() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = OverclockerRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(&mut ctx, &snapshot(vec![], vec![], false), &mut cues);

        let blades = renderer.parts.as_ref().expect("spawned").blades;
        let drawn = ctx.graph.get(blades).expect("live");
        assert_eq!(drawn.rotation, 1.25);
        assert_eq!(drawn.children().len(), BLADES);
    }

    #[test]
    fn tiles_heat_up_and_clear() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = OverclockerRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(
            &mut ctx,
            &snapshot(vec![tile(5, HazardTileState::Warning)], vec![], false),
            &mut cues,
        );
        let node = renderer
            .registry
            .get(ctx.graph, "overclocker_tile_5")
            .expect("tile drawn");
        assert!(ctx.graph.get(node).expect("live").has_action("heat"));

        renderer.update(
            &mut ctx,
            &snapshot(vec![tile(5, HazardTileState::Hot)], vec![], false),
            &mut cues,
        );
        let drawn = ctx.graph.get(node).expect("live");
        assert!(!drawn.has_action("heat"));
        assert_eq!(drawn.fill, Some(MOLTEN.with_alpha(0.8)));

        renderer.update(&mut ctx, &snapshot(vec![], vec![], false), &mut cues);
        assert!(!renderer.registry.contains("overclocker_tile_5"));
        ctx.graph.advance(0.3);
        assert!(!ctx.graph.contains(node));
    }

    #[test]
    fn steam_expands_and_fades_with_age() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = OverclockerRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);
        let puff = SteamPuff {
            id: EntityId::new(2),
            position: Vec2::new(4.0, 4.0),
            age: 0.5,
            lifetime: 1.0,
        };

        renderer.update(&mut ctx, &snapshot(vec![], vec![puff], false), &mut cues);
        let node = renderer
            .registry
            .get(ctx.graph, "overclocker_steam_2")
            .expect("steam drawn");
        let drawn = ctx.graph.get(node).expect("live");
        assert_eq!(drawn.scale, Vec2::splat(1.75));
        assert_eq!(drawn.alpha, 0.25);

        renderer.update(&mut ctx, &snapshot(vec![], vec![], false), &mut cues);
        assert_eq!(ctx.pool.available(PoolTag::Steam), 1);
    }

    #[test]
    fn suction_indicator_toggles_with_action_key() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let layer = graph.root();
        let mut renderer = OverclockerRenderer::new();
        let mut cues = Vec::new();
        let mut ctx = RenderContext::new(&mut graph, &mut pool, layer);

        renderer.update(&mut ctx, &snapshot(vec![], vec![], true), &mut cues);
        let ring = renderer.parts.as_ref().expect("spawned").suction;
        let drawn = ctx.graph.get(ring).expect("live");
        assert!(!drawn.hidden);
        assert!(drawn.has_action(SUCTION_KEY));

        renderer.update(&mut ctx, &snapshot(vec![], vec![], false), &mut cues);
        let drawn = ctx.graph.get(ring).expect("live");
        assert!(drawn.hidden);
        assert!(!drawn.has_action(SUCTION_KEY));
    }
}
