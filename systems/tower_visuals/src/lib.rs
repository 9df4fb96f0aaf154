#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tower visual factory, animations and the manager that mirrors placed towers.

pub mod animation;
pub mod factory;

use std::collections::{HashMap, HashSet};

use firewall_defence_core::{
    geometry::angle_between, Rarity, TowerArchetype, TowerId, TowerSnapshot,
};
use firewall_defence_effects::VisualCue;
use firewall_defence_scene::{Exit, NodeId, NodePool, NodeRegistry, SceneGraph};
use glam::Vec2;
use log::debug;

pub use animation::{
    fire, idle_action, merge_burst, set_highlight, set_lifted, set_selected, turn_toward,
};
pub use factory::{build_tower, range_radius, TowerVisual, TOWER_RADIUS};

/// Default turret turn rate in radians per second.
pub const DEFAULT_TURN_RATE: f32 = 9.0;

const REMOVAL_FADE: f32 = 0.25;

#[derive(Debug)]
struct TrackedTower {
    visual: TowerVisual,
    archetype: TowerArchetype,
    rarity: Rarity,
    merge_level: u8,
    position: Vec2,
    heading: f32,
}

/// Keeps one visual per placed tower, keyed `tower_{id}`.
#[derive(Debug)]
pub struct TowerVisualManager {
    layer: NodeId,
    turn_rate: f32,
    registry: NodeRegistry,
    towers: HashMap<TowerId, TrackedTower>,
    live_keys: HashSet<String>,
    dragged: Option<(TowerId, Vec2)>,
    highlighted: Option<TowerId>,
    selected: Option<TowerId>,
}

impl TowerVisualManager {
    /// Creates a manager spawning tower visuals under `layer`.
    #[must_use]
    pub fn new(layer: NodeId) -> Self {
        Self {
            layer,
            turn_rate: DEFAULT_TURN_RATE,
            registry: NodeRegistry::new(),
            towers: HashMap::new(),
            live_keys: HashSet::new(),
            dragged: None,
            highlighted: None,
            selected: None,
        }
    }

    /// Overrides the turret turn rate, in radians per second.
    #[must_use]
    pub fn with_turn_rate(mut self, turn_rate: f32) -> Self {
        self.turn_rate = turn_rate.max(0.0);
        self
    }

    /// Registry key of a tower's visual.
    #[must_use]
    pub fn key(tower: TowerId) -> String {
        format!("tower_{}", tower.get())
    }

    /// Brings the visuals in line with `towers`.
    ///
    /// New towers get a visual, towers whose archetype, rarity or merge level
    /// changed are rebuilt and announced with [`VisualCue::TowerUpgraded`],
    /// turrets turn towards their heading and vanished towers fade out. A
    /// firing Tesla coil with a target raises a [`VisualCue::Arc`] to it.
    pub fn sync(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        towers: &[TowerSnapshot],
        dt: f32,
        cues: &mut Vec<VisualCue>,
    ) {
        self.live_keys.clear();
        let max_step = self.turn_rate * dt.max(0.0);

        for snapshot in towers {
            let key = Self::key(snapshot.id);
            let level = snapshot.clamped_merge_level();

            let rebuild = match self.towers.get(&snapshot.id) {
                Some(tracked) => {
                    tracked.archetype != snapshot.archetype
                        || tracked.rarity != snapshot.rarity
                        || tracked.merge_level != level
                        || !graph.contains(tracked.visual.root)
                }
                None => true,
            };

            if rebuild {
                let previous = self.towers.remove(&snapshot.id);
                if let Some(old) = self.registry.remove(&key) {
                    let _ = graph.remove(old);
                }
                let visual = build_tower(graph, self.layer, snapshot);
                animation::start_idle(graph, &visual, snapshot.archetype);
                let _ = self.registry.insert(key.clone(), visual.root);

                if let Some(previous) = previous.as_ref() {
                    debug!("rebuilt visual for tower {}", snapshot.id.get());
                    if level > previous.merge_level {
                        merge_burst(graph, &visual);
                    }
                    cues.push(VisualCue::TowerUpgraded {
                        tower: snapshot.id,
                        position: snapshot.position,
                        color: snapshot.rarity.color(),
                    });
                }

                let heading = previous.map_or(snapshot.heading, |previous| previous.heading);
                let _ = self.towers.insert(
                    snapshot.id,
                    TrackedTower {
                        visual,
                        archetype: snapshot.archetype,
                        rarity: snapshot.rarity,
                        merge_level: level,
                        position: snapshot.position,
                        heading,
                    },
                );
                self.restore_indicators(graph, snapshot.id);
            }

            let Some(tracked) = self.towers.get_mut(&snapshot.id) else {
                continue;
            };

            let desired = snapshot
                .target
                .map_or(snapshot.heading, |target| angle_between(snapshot.position, target));
            tracked.heading = turn_toward(tracked.heading, desired, max_step);
            tracked.position = snapshot.position;

            let shown_at = match self.dragged {
                Some((id, world)) if id == snapshot.id => world,
                _ => snapshot.position,
            };
            if let Some(root) = graph.get_mut(tracked.visual.root) {
                root.position = shown_at;
            }
            if let Some(turret) = graph.get_mut(tracked.visual.turret) {
                turret.rotation = tracked.heading;
            }
            if snapshot.firing {
                fire(graph, pool, &tracked.visual, snapshot.archetype);
                if let Some(target) = snapshot
                    .target
                    .filter(|_| snapshot.archetype == TowerArchetype::Tesla)
                {
                    cues.push(VisualCue::Arc {
                        from: shown_at,
                        to: target,
                        color: snapshot.archetype.accent_color(),
                    });
                }
            }

            let _ = self.live_keys.insert(key);
        }

        let removed = self.registry.retain_live(
            graph,
            pool,
            &self.live_keys,
            Exit::FadeOut(REMOVAL_FADE),
        );
        if removed > 0 {
            let live = &self.live_keys;
            self.towers.retain(|id, _| live.contains(&Self::key(*id)));
            if self.dragged.is_some_and(|(id, _)| !self.towers.contains_key(&id)) {
                self.dragged = None;
            }
            if self.highlighted.is_some_and(|id| !self.towers.contains_key(&id)) {
                self.highlighted = None;
            }
            if self.selected.is_some_and(|id| !self.towers.contains_key(&id)) {
                self.selected = None;
            }
            debug!("faded out {removed} tower visuals");
        }
    }

    /// Visual of a tower.
    #[must_use]
    pub fn visual(&self, tower: TowerId) -> Option<&TowerVisual> {
        self.towers.get(&tower).map(|tracked| &tracked.visual)
    }

    /// Last simulated position of a tower.
    #[must_use]
    pub fn position(&self, tower: TowerId) -> Option<Vec2> {
        self.towers.get(&tower).map(|tracked| tracked.position)
    }

    /// Smoothed turret heading of a tower.
    #[must_use]
    pub fn heading(&self, tower: TowerId) -> Option<f32> {
        self.towers.get(&tower).map(|tracked| tracked.heading)
    }

    /// Number of towers with a visual.
    #[must_use]
    pub fn len(&self) -> usize {
        self.towers.len()
    }

    /// Whether no tower has a visual.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.towers.is_empty()
    }

    /// Closest tower whose center lies within `radius` of `world`.
    ///
    /// Equidistant towers resolve to the lower id.
    #[must_use]
    pub fn hit_test(&self, world: Vec2, radius: f32) -> Option<TowerId> {
        let limit = radius * radius;
        self.towers
            .iter()
            .map(|(id, tracked)| (tracked.position.distance_squared(world), *id))
            .filter(|(distance, _)| *distance <= limit)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }

    /// Lifts `tower` and makes it follow `world` until [`end_drag`](Self::end_drag).
    pub fn drag_to(&mut self, graph: &mut SceneGraph, tower: TowerId, world: Vec2) {
        let Some(tracked) = self.towers.get(&tower) else {
            return;
        };
        if self.dragged.map(|(id, _)| id) != Some(tower) {
            if let Some((previous, _)) = self.dragged {
                self.drop_visual(graph, previous);
            }
            set_lifted(graph, &tracked.visual, true);
        }
        if let Some(root) = graph.get_mut(tracked.visual.root) {
            root.position = world;
        }
        self.dragged = Some((tower, world));
    }

    /// Drops the dragged tower back onto its simulated position.
    pub fn end_drag(&mut self, graph: &mut SceneGraph) {
        if let Some((tower, _)) = self.dragged.take() {
            self.drop_visual(graph, tower);
        }
    }

    /// Tower currently following a drag.
    #[must_use]
    pub fn dragged(&self) -> Option<TowerId> {
        self.dragged.map(|(id, _)| id)
    }

    /// Moves the merge highlight to `tower`, or clears it.
    pub fn set_highlight(&mut self, graph: &mut SceneGraph, tower: Option<TowerId>) {
        if self.highlighted == tower {
            return;
        }
        if let Some(previous) = self.highlighted.and_then(|id| self.towers.get(&id)) {
            set_highlight(graph, &previous.visual, false);
        }
        if let Some(next) = tower.and_then(|id| self.towers.get(&id)) {
            set_highlight(graph, &next.visual, true);
        }
        self.highlighted = tower.filter(|id| self.towers.contains_key(id));
    }

    /// Shows the range of `tower`, or hides the current selection.
    pub fn set_selected(&mut self, graph: &mut SceneGraph, tower: Option<TowerId>) {
        if self.selected == tower {
            return;
        }
        if let Some(previous) = self.selected.and_then(|id| self.towers.get(&id)) {
            set_selected(graph, &previous.visual, false);
        }
        if let Some(next) = tower.and_then(|id| self.towers.get(&id)) {
            set_selected(graph, &next.visual, true);
        }
        self.selected = tower.filter(|id| self.towers.contains_key(id));
    }

    /// Tower whose range is shown.
    #[must_use]
    pub fn selected(&self) -> Option<TowerId> {
        self.selected
    }

    /// Tower shown as merge target.
    #[must_use]
    pub fn highlighted(&self) -> Option<TowerId> {
        self.highlighted
    }

    /// Releases every tower visual.
    pub fn clear(&mut self, graph: &mut SceneGraph, pool: &mut NodePool) {
        self.registry.clear(graph, pool, Exit::Immediate);
        self.towers.clear();
        self.dragged = None;
        self.highlighted = None;
        self.selected = None;
    }

    fn drop_visual(&self, graph: &mut SceneGraph, tower: TowerId) {
        if let Some(tracked) = self.towers.get(&tower) {
            set_lifted(graph, &tracked.visual, false);
            if let Some(root) = graph.get_mut(tracked.visual.root) {
                root.position = tracked.position;
            }
        }
    }

    fn restore_indicators(&self, graph: &mut SceneGraph, tower: TowerId) {
        let Some(tracked) = self.towers.get(&tower) else {
            return;
        };
        if self.highlighted == Some(tower) {
            set_highlight(graph, &tracked.visual, true);
        }
        if self.selected == Some(tower) {
            set_selected(graph, &tracked.visual, true);
        }
        if self.dragged.map(|(id, _)| id) == Some(tower) {
            set_lifted(graph, &tracked.visual, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewall_defence_scene::NodeSpec;

    fn setup() -> (SceneGraph, NodePool, TowerVisualManager) {
        let mut graph = SceneGraph::new();
        let layer = graph.spawn(NodeSpec::group().named("towers"));
        (graph, NodePool::default(), TowerVisualManager::new(layer))
    }

    fn tower(id: u32, x: f32) -> TowerSnapshot {
        TowerSnapshot::new(
            TowerId::new(id),
            TowerArchetype::Projectile,
            Rarity::Common,
            Vec2::new(x, 0.0),
        )
    }

    #[test]
    fn creates_one_visual_per_tower() {
        let (mut graph, mut pool, mut manager) = setup();
        let mut cues = Vec::new();
        let towers = [tower(1, 0.0), tower(2, 50.0)];

        manager.sync(&mut graph, &mut pool, &towers, 0.016, &mut cues);
        let nodes = graph.live_count();
        manager.sync(&mut graph, &mut pool, &towers, 0.016, &mut cues);

        assert_eq!(manager.len(), 2);
        assert_eq!(graph.live_count(), nodes);
        assert!(cues.is_empty());
    }

    #[test]
    fn merge_level_change_rebuilds_and_emits_cue() {
        let (mut graph, mut pool, mut manager) = setup();
        let mut cues = Vec::new();
        let mut snapshot = tower(1, 0.0);
        manager.sync(&mut graph, &mut pool, &[snapshot], 0.016, &mut cues);
        let old_root = manager.visual(TowerId::new(1)).expect("visual").root;

        snapshot.merge_level = 2;
        manager.sync(&mut graph, &mut pool, &[snapshot], 0.016, &mut cues);

        let visual = manager.visual(TowerId::new(1)).expect("visual");
        assert!(!graph.contains(old_root));
        assert_eq!(visual.level_pips.len(), 2);
        assert_eq!(
            cues,
            vec![VisualCue::TowerUpgraded {
                tower: TowerId::new(1),
                position: Vec2::ZERO,
                color: Rarity::Common.color(),
            }]
        );
    }

    #[test]
    fn firing_tesla_coil_arcs_to_its_target() {
        let (mut graph, mut pool, mut manager) = setup();
        let mut cues = Vec::new();
        let mut coil = TowerSnapshot::new(
            TowerId::new(3),
            TowerArchetype::Tesla,
            Rarity::Epic,
            Vec2::new(40.0, 40.0),
        );
        coil.firing = true;
        coil.target = Some(Vec2::new(140.0, 40.0));
        let mut gun = tower(4, 200.0);
        gun.firing = true;
        gun.target = Some(Vec2::new(300.0, 0.0));

        manager.sync(&mut graph, &mut pool, &[coil, gun], 0.016, &mut cues);
        coil.target = None;
        manager.sync(&mut graph, &mut pool, &[coil, gun], 0.016, &mut cues);

        assert_eq!(
            cues,
            vec![VisualCue::Arc {
                from: Vec2::new(40.0, 40.0),
                to: Vec2::new(140.0, 40.0),
                color: TowerArchetype::Tesla.accent_color(),
            }]
        );
    }

    #[test]
    fn vanished_towers_fade_out() {
        let (mut graph, mut pool, mut manager) = setup();
        let mut cues = Vec::new();
        manager.sync(&mut graph, &mut pool, &[tower(1, 0.0)], 0.016, &mut cues);
        let root = manager.visual(TowerId::new(1)).expect("visual").root;

        manager.sync(&mut graph, &mut pool, &[], 0.016, &mut cues);
        assert!(manager.is_empty());
        assert!(graph.contains(root));

        graph.advance(0.5);
        assert!(!graph.contains(root));
    }

    #[test]
    fn turret_turns_at_limited_rate() {
        let (mut graph, mut pool, mut manager) = setup();
        let mut cues = Vec::new();
        let mut snapshot = tower(1, 0.0);
        manager.sync(&mut graph, &mut pool, &[snapshot], 0.0, &mut cues);

        snapshot.target = Some(Vec2::new(0.0, 100.0));
        manager.sync(&mut graph, &mut pool, &[snapshot], 0.1, &mut cues);

        let heading = manager.heading(TowerId::new(1)).expect("heading");
        assert!((heading - DEFAULT_TURN_RATE * 0.1).abs() < 1e-5);
    }

    #[test]
    fn hit_test_prefers_closest_then_lowest_id() {
        let (mut graph, mut pool, mut manager) = setup();
        let mut cues = Vec::new();
        manager.sync(
            &mut graph,
            &mut pool,
            &[tower(4, -10.0), tower(2, 10.0), tower(9, 40.0)],
            0.016,
            &mut cues,
        );

        assert_eq!(manager.hit_test(Vec2::ZERO, 20.0), Some(TowerId::new(2)));
        assert_eq!(manager.hit_test(Vec2::new(38.0, 0.0), 20.0), Some(TowerId::new(9)));
        assert_eq!(manager.hit_test(Vec2::new(200.0, 0.0), 20.0), None);
    }

    #[test]
    fn dragged_tower_follows_pointer_until_dropped() {
        let (mut graph, mut pool, mut manager) = setup();
        let mut cues = Vec::new();
        let towers = [tower(1, 0.0)];
        manager.sync(&mut graph, &mut pool, &towers, 0.016, &mut cues);
        let root = manager.visual(TowerId::new(1)).expect("visual").root;

        manager.drag_to(&mut graph, TowerId::new(1), Vec2::new(30.0, 30.0));
        manager.sync(&mut graph, &mut pool, &towers, 0.016, &mut cues);
        assert_eq!(graph.get(root).expect("root").position, Vec2::new(30.0, 30.0));

        manager.end_drag(&mut graph);
        assert_eq!(graph.get(root).expect("root").position, Vec2::ZERO);
        assert_eq!(manager.dragged(), None);
    }

    #[test]
    fn highlight_moves_between_towers() {
        let (mut graph, mut pool, mut manager) = setup();
        let mut cues = Vec::new();
        manager.sync(
            &mut graph,
            &mut pool,
            &[tower(1, 0.0), tower(2, 50.0)],
            0.016,
            &mut cues,
        );
        let first = manager.visual(TowerId::new(1)).expect("visual").highlight;
        let second = manager.visual(TowerId::new(2)).expect("visual").highlight;

        manager.set_highlight(&mut graph, Some(TowerId::new(1)));
        manager.set_highlight(&mut graph, Some(TowerId::new(2)));

        assert!(graph.get(first).expect("first").hidden);
        assert!(!graph.get(second).expect("second").hidden);
        assert_eq!(manager.highlighted(), Some(TowerId::new(2)));
    }
}
