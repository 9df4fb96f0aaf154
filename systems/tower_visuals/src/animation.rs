//! Tower animations: idle loops, firing recoil, turret turning and drag feedback.

use firewall_defence_core::{geometry::normalize_angle, TowerArchetype};
use firewall_defence_scene::{Action, NodePool, NodeSpec, PoolTag, SceneGraph, Timing};
use glam::Vec2;

use crate::factory::{barrel_rest, muzzle_offset, TowerVisual};

const IDLE_KEY: &str = "idle";
const RECOIL_KEY: &str = "recoil";
const MERGE_KEY: &str = "merge";
const LIFT_KEY: &str = "lift";
const HIGHLIGHT_KEY: &str = "highlight";
const SELECT_KEY: &str = "select";

/// Looping animation played on the base of an idle tower.
#[must_use]
pub fn idle_action(archetype: TowerArchetype) -> Action {
    match archetype {
        TowerArchetype::Frost => Action::pulse(1.06, 2.0),
        TowerArchetype::Magic => Action::forever(Action::rotate_by(std::f32::consts::TAU, 6.0)),
        TowerArchetype::Tesla => Action::blink(0.7, 0.6),
        TowerArchetype::Legendary => Action::group(vec![
            Action::pulse(1.08, 1.6),
            Action::forever(Action::rotate_by(-std::f32::consts::TAU, 9.0)),
        ]),
        TowerArchetype::Pyro => Action::blink(0.85, 0.35),
        _ => Action::pulse(1.02, 2.4),
    }
}

/// Starts the idle loop of a freshly built tower.
pub fn start_idle(graph: &mut SceneGraph, visual: &TowerVisual, archetype: TowerArchetype) {
    graph.run_keyed(visual.base, IDLE_KEY, idle_action(archetype));
}

/// Plays the barrel recoil and a pooled muzzle flash.
pub fn fire(
    graph: &mut SceneGraph,
    pool: &mut NodePool,
    visual: &TowerVisual,
    archetype: TowerArchetype,
) {
    let rest = barrel_rest(archetype);
    let kick = match archetype {
        TowerArchetype::Artillery => 6.0,
        TowerArchetype::Tesla | TowerArchetype::Magic | TowerArchetype::Legendary => 0.0,
        _ => 3.0,
    };
    if let Some(barrel) = graph.get_mut(visual.barrel) {
        barrel.position = rest;
    }
    graph.run_keyed(
        visual.barrel,
        RECOIL_KEY,
        Action::sequence(vec![
            Action::move_to(rest - Vec2::new(kick, 0.0), 0.04).with_timing(Timing::EaseOut),
            Action::move_to(rest, 0.12).with_timing(Timing::EaseInOut),
        ]),
    );

    let accent = archetype.accent_color();
    let flash = pool.acquire(
        graph,
        PoolTag::Flash,
        visual.turret,
        NodeSpec::circle(4.0)
            .fill(accent.lighten(0.6))
            .glow(4.0)
            .at(muzzle_offset(archetype))
            .z(2.0),
    );
    graph.run_action(
        flash,
        Action::group(vec![
            Action::scale_to(1.8, 0.08),
            Action::fade_out_and_recycle(0.08),
        ]),
    );
}

/// Rotates `current` towards `desired` by at most `max_step` radians.
///
/// Takes the shorter way around and returns an angle in `(-PI, PI]`.
#[must_use]
pub fn turn_toward(current: f32, desired: f32, max_step: f32) -> f32 {
    let current = normalize_angle(current);
    let difference = normalize_angle(desired - current);
    let step = max_step.max(0.0);
    if difference.abs() <= step {
        return normalize_angle(desired);
    }
    normalize_angle(current + step.copysign(difference))
}

/// Pop played on a tower that absorbed another one.
pub fn merge_burst(graph: &mut SceneGraph, visual: &TowerVisual) {
    if let Some(root) = graph.get_mut(visual.root) {
        root.scale = Vec2::ONE;
    }
    graph.run_keyed(
        visual.root,
        MERGE_KEY,
        Action::sequence(vec![
            Action::scale_to(1.35, 0.12).with_timing(Timing::EaseOut),
            Action::scale_to(1.0, 0.22).with_timing(Timing::EaseIn),
        ]),
    );
    graph.run_keyed(
        visual.rarity_ring,
        MERGE_KEY,
        Action::sequence(vec![
            Action::scale_to(1.6, 0.15),
            Action::scale_to(1.0, 0.2),
        ]),
    );
}

/// Raises or lowers a tower picked up by a drag.
pub fn set_lifted(graph: &mut SceneGraph, visual: &TowerVisual, lifted: bool) {
    let (scale, alpha, z) = if lifted {
        (1.15, 0.85, 40.0)
    } else {
        (1.0, 1.0, 10.0)
    };
    if let Some(root) = graph.get_mut(visual.root) {
        root.z = z;
    }
    graph.run_keyed(
        visual.root,
        LIFT_KEY,
        Action::group(vec![
            Action::scale_to(scale, 0.1).with_timing(Timing::EaseOut),
            Action::fade_to(alpha, 0.1),
        ]),
    );
}

/// Shows or hides the merge target outline.
pub fn set_highlight(graph: &mut SceneGraph, visual: &TowerVisual, highlighted: bool) {
    if let Some(outline) = graph.get_mut(visual.highlight) {
        outline.hidden = !highlighted;
        outline.alpha = 1.0;
    }
    if highlighted {
        graph.run_keyed(visual.highlight, HIGHLIGHT_KEY, Action::blink(0.35, 0.5));
    } else {
        graph.remove_action(visual.highlight, HIGHLIGHT_KEY);
    }
}

/// Shows or hides the range indicator of a selected tower.
pub fn set_selected(graph: &mut SceneGraph, visual: &TowerVisual, selected: bool) {
    if selected {
        if let Some(range) = graph.get_mut(visual.range) {
            range.hidden = false;
            range.alpha = 0.0;
        }
        graph.run_keyed(visual.range, SELECT_KEY, Action::fade_in(0.15));
    } else {
        graph.run_keyed(
            visual.range,
            SELECT_KEY,
            Action::sequence(vec![Action::fade_out(0.1), Action::Hide]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::build_tower;
    use firewall_defence_core::{Rarity, TowerId, TowerSnapshot};
    use std::f32::consts::PI;

    fn visual(graph: &mut SceneGraph, archetype: TowerArchetype) -> TowerVisual {
        let root = graph.root();
        build_tower(
            graph,
            root,
            &TowerSnapshot::new(TowerId::new(1), archetype, Rarity::Common, Vec2::ZERO),
        )
    }

    #[test]
    fn turn_toward_takes_the_short_way_round() {
        let turned = turn_toward(PI - 0.1, -PI + 0.1, 0.05);

        assert!((turned - (PI - 0.05)).abs() < 1e-5);
    }

    #[test]
    fn turn_toward_snaps_when_within_step() {
        assert_eq!(turn_toward(0.0, 0.2, 0.5), 0.2);
        assert_eq!(turn_toward(1.0, 0.0, 0.25), 0.75);
    }

    #[test]
    fn recoil_returns_barrel_to_rest() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let tower = visual(&mut graph, TowerArchetype::Projectile);

        fire(&mut graph, &mut pool, &tower, TowerArchetype::Projectile);
        graph.advance(0.04);
        let kicked = graph.get(tower.barrel).expect("barrel").position;
        graph.advance(0.2);
        let _ = pool.reclaim(&mut graph);

        assert!(kicked.x < barrel_rest(TowerArchetype::Projectile).x);
        assert_eq!(
            graph.get(tower.barrel).expect("barrel").position,
            barrel_rest(TowerArchetype::Projectile)
        );
        assert_eq!(pool.available(PoolTag::Flash), 1);
    }

    #[test]
    fn highlight_toggles_outline_and_blink() {
        let mut graph = SceneGraph::new();
        let tower = visual(&mut graph, TowerArchetype::Frost);

        set_highlight(&mut graph, &tower, true);
        assert!(!graph.get(tower.highlight).expect("outline").hidden);
        assert!(graph.has_actions(tower.highlight));

        set_highlight(&mut graph, &tower, false);
        assert!(graph.get(tower.highlight).expect("outline").hidden);
        assert!(!graph.has_actions(tower.highlight));
    }

    #[test]
    fn deselecting_hides_range_after_fade() {
        let mut graph = SceneGraph::new();
        let tower = visual(&mut graph, TowerArchetype::Beam);

        set_selected(&mut graph, &tower, true);
        graph.advance(0.2);
        assert_eq!(graph.get(tower.range).expect("range").alpha, 1.0);

        set_selected(&mut graph, &tower, false);
        graph.advance(0.2);
        assert!(graph.get(tower.range).expect("range").hidden);
    }

    #[test]
    fn lifting_scales_tower_up_and_back() {
        let mut graph = SceneGraph::new();
        let tower = visual(&mut graph, TowerArchetype::Pyro);

        set_lifted(&mut graph, &tower, true);
        graph.advance(0.2);
        assert_eq!(graph.get(tower.root).expect("root").scale, Vec2::splat(1.15));

        set_lifted(&mut graph, &tower, false);
        graph.advance(0.2);
        assert_eq!(graph.get(tower.root).expect("root").scale, Vec2::ONE);
    }
}
