//! Shape trees for the ten tower archetypes.

use std::f32::consts::{FRAC_PI_4, FRAC_PI_6, PI, TAU};

use firewall_defence_core::{Color, TowerArchetype, TowerSnapshot};
use firewall_defence_scene::{NodeId, NodeSpec, SceneGraph, Shape};
use glam::Vec2;

/// Radius of the tower footprint in world units.
pub const TOWER_RADIUS: f32 = 18.0;

const BASE_FILL: Color = Color::from_rgb_u8(38, 44, 56);
const PIP_SPACING: f32 = 6.0;

/// Handles to the nodes making up one tower.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerVisual {
    /// Group positioned at the tower center.
    pub root: NodeId,
    /// Archetype body.
    pub base: NodeId,
    /// Rotating group oriented along the turret heading.
    pub turret: NodeId,
    /// Barrel node animated by recoil.
    pub barrel: NodeId,
    /// Ring tinted with the rarity color.
    pub rarity_ring: NodeId,
    /// One pip per merge level.
    pub level_pips: Vec<NodeId>,
    /// Outline shown while the tower is a merge target.
    pub highlight: NodeId,
    /// Range indicator shown while the tower is selected.
    pub range: NodeId,
}

/// Attack range drawn by the selection indicator, in world units.
#[must_use]
pub fn range_radius(archetype: TowerArchetype) -> f32 {
    match archetype {
        TowerArchetype::Projectile | TowerArchetype::MultiShot => 120.0,
        TowerArchetype::Artillery => 170.0,
        TowerArchetype::Frost => 100.0,
        TowerArchetype::Magic => 140.0,
        TowerArchetype::Beam => 150.0,
        TowerArchetype::Tesla => 110.0,
        TowerArchetype::Pyro => 80.0,
        TowerArchetype::Execute => 130.0,
        TowerArchetype::Legendary => 180.0,
    }
}

/// Resting offset of the barrel along the turret's local x axis.
#[must_use]
pub fn barrel_rest(archetype: TowerArchetype) -> Vec2 {
    match archetype {
        TowerArchetype::Artillery => Vec2::new(6.0, 0.0),
        TowerArchetype::Magic | TowerArchetype::Legendary => Vec2::new(4.0, 0.0),
        TowerArchetype::Tesla => Vec2::ZERO,
        TowerArchetype::Pyro => Vec2::new(8.0, 0.0),
        _ => Vec2::new(10.0, 0.0),
    }
}

/// Tip of the barrel in turret space, where muzzle flashes appear.
#[must_use]
pub fn muzzle_offset(archetype: TowerArchetype) -> Vec2 {
    match archetype {
        TowerArchetype::Tesla => Vec2::ZERO,
        TowerArchetype::Magic | TowerArchetype::Legendary => Vec2::new(10.0, 0.0),
        TowerArchetype::Artillery => Vec2::new(16.0, 0.0),
        _ => barrel_rest(archetype) + Vec2::new(10.0, 0.0),
    }
}

/// Builds the node tree of `snapshot` under `parent`.
pub fn build_tower(graph: &mut SceneGraph, parent: NodeId, snapshot: &TowerSnapshot) -> TowerVisual {
    let archetype = snapshot.archetype;
    let accent = archetype.accent_color();
    let rarity_color = snapshot.rarity.color();

    let root = graph.spawn_child(
        parent,
        NodeSpec::group()
            .named(format!("tower_{}", snapshot.id.get()))
            .at(snapshot.position)
            .z(10.0),
    );

    let range = graph.spawn_child(
        root,
        NodeSpec::circle(range_radius(archetype))
            .fill(accent.with_alpha(0.08))
            .stroke(accent.with_alpha(0.45), 1.5)
            .z(-3.0)
            .hidden(),
    );
    let rarity_ring = graph.spawn_child(
        root,
        NodeSpec::ring(TOWER_RADIUS + 3.0, 2.0)
            .stroke(rarity_color, 2.0)
            .glow(f32::from(snapshot.rarity.tier()) * 2.0)
            .z(-1.0),
    );
    let highlight = graph.spawn_child(
        root,
        NodeSpec::ring(TOWER_RADIUS + 7.0, 2.5)
            .stroke(Color::WHITE, 2.5)
            .glow(4.0)
            .z(-2.0)
            .hidden(),
    );
    let base = graph.spawn_child(
        root,
        base_spec(archetype).fill(BASE_FILL).stroke(accent, 2.0),
    );
    decorate_base(graph, base, archetype, accent);

    let turret = graph.spawn_child(root, NodeSpec::group().rotated(snapshot.heading).z(1.0));
    let barrel = graph.spawn_child(turret, barrel_spec(archetype, accent));
    decorate_barrel(graph, barrel, archetype, accent);

    let level = snapshot.clamped_merge_level();
    let first = -(f32::from(level) - 1.0) * PIP_SPACING * 0.5;
    let level_pips = (0..level)
        .map(|index| {
            graph.spawn_child(
                root,
                NodeSpec::circle(2.0)
                    .fill(accent.lighten(0.3))
                    .at(Vec2::new(
                        first + f32::from(index) * PIP_SPACING,
                        TOWER_RADIUS + 6.0,
                    ))
                    .z(2.0),
            )
        })
        .collect();

    TowerVisual {
        root,
        base,
        turret,
        barrel,
        rarity_ring,
        level_pips,
        highlight,
        range,
    }
}

fn base_spec(archetype: TowerArchetype) -> NodeSpec {
    let radius = TOWER_RADIUS;
    match archetype {
        TowerArchetype::Projectile => NodeSpec::rounded_rect(Vec2::splat(radius * 1.6), 5.0),
        TowerArchetype::Artillery => NodeSpec::new(Shape::regular_polygon(8, radius, PI / 8.0)),
        TowerArchetype::Frost => NodeSpec::new(Shape::regular_polygon(6, radius, FRAC_PI_6)),
        TowerArchetype::Magic | TowerArchetype::Tesla => NodeSpec::circle(radius * 0.9),
        TowerArchetype::Beam => NodeSpec::rect(Vec2::splat(radius * 1.4)).rotated(FRAC_PI_4),
        TowerArchetype::Pyro => NodeSpec::new(Shape::regular_polygon(3, radius, -PI / 2.0)),
        TowerArchetype::MultiShot => NodeSpec::rounded_rect(Vec2::new(radius * 1.8, radius * 1.4), 4.0),
        TowerArchetype::Execute => NodeSpec::new(Shape::regular_polygon(4, radius, 0.0)),
        TowerArchetype::Legendary => NodeSpec::polygon(star_points(5, radius, radius * 0.5)),
    }
}

fn decorate_base(graph: &mut SceneGraph, base: NodeId, archetype: TowerArchetype, accent: Color) {
    match archetype {
        TowerArchetype::Frost => {
            for index in 0..3 {
                let angle = index as f32 * TAU / 3.0;
                let _ = graph.spawn_child(
                    base,
                    NodeSpec::line(Vec2::from_angle(angle) * TOWER_RADIUS * 0.8)
                        .stroke(accent.with_alpha(0.6), 1.0),
                );
            }
        }
        TowerArchetype::Tesla => {
            let _ = graph.spawn_child(
                base,
                NodeSpec::ring(TOWER_RADIUS * 0.6, 1.5).stroke(accent, 1.5).glow(3.0),
            );
        }
        TowerArchetype::Legendary => {
            let _ = graph.spawn_child(
                base,
                NodeSpec::circle(TOWER_RADIUS * 0.35)
                    .fill(accent)
                    .glow(6.0),
            );
        }
        TowerArchetype::Artillery | TowerArchetype::Execute => {
            let _ = graph.spawn_child(
                base,
                NodeSpec::circle(TOWER_RADIUS * 0.4).stroke(accent.with_alpha(0.5), 1.0),
            );
        }
        _ => {}
    }
}

fn barrel_spec(archetype: TowerArchetype, accent: Color) -> NodeSpec {
    let rest = barrel_rest(archetype);
    let spec = match archetype {
        TowerArchetype::Projectile => NodeSpec::rect(Vec2::new(18.0, 5.0)).fill(accent),
        TowerArchetype::Artillery => NodeSpec::rounded_rect(Vec2::new(14.0, 10.0), 3.0).fill(accent),
        TowerArchetype::Frost => NodeSpec::polygon(vec![
            Vec2::new(-6.0, 0.0),
            Vec2::new(0.0, -4.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 4.0),
        ])
        .fill(accent.with_alpha(0.85)),
        TowerArchetype::Magic => NodeSpec::circle(6.0).fill(accent).glow(5.0),
        TowerArchetype::Beam => NodeSpec::rect(Vec2::new(22.0, 3.0)).fill(accent).glow(2.0),
        TowerArchetype::Tesla => NodeSpec::ring(5.0, 2.0).stroke(accent, 2.0).glow(4.0),
        TowerArchetype::Pyro => NodeSpec::polygon(vec![
            Vec2::new(-6.0, -3.0),
            Vec2::new(8.0, -6.0),
            Vec2::new(8.0, 6.0),
            Vec2::new(-6.0, 3.0),
        ])
        .fill(accent),
        TowerArchetype::MultiShot => NodeSpec::group(),
        TowerArchetype::Execute => NodeSpec::polygon(vec![
            Vec2::new(-8.0, -2.0),
            Vec2::new(12.0, 0.0),
            Vec2::new(-8.0, 2.0),
        ])
        .fill(accent)
        .stroke(Color::WHITE.with_alpha(0.6), 1.0),
        TowerArchetype::Legendary => NodeSpec::circle(6.0)
            .fill(Color::WHITE)
            .stroke(accent, 2.0)
            .glow(8.0),
    };
    spec.at(rest).named("barrel")
}

fn decorate_barrel(graph: &mut SceneGraph, barrel: NodeId, archetype: TowerArchetype, accent: Color) {
    match archetype {
        TowerArchetype::MultiShot => {
            for offset in [-5.0, 0.0, 5.0] {
                let _ = graph.spawn_child(
                    barrel,
                    NodeSpec::rect(Vec2::new(16.0, 3.0))
                        .fill(accent)
                        .at(Vec2::new(0.0, offset)),
                );
            }
        }
        TowerArchetype::Legendary => {
            let _ = graph.spawn_child(
                barrel,
                NodeSpec::ring(9.0, 1.0).stroke(accent.with_alpha(0.7), 1.0),
            );
        }
        _ => {}
    }
}

fn star_points(spikes: u32, outer: f32, inner: f32) -> Vec<Vec2> {
    let count = spikes.max(2) * 2;
    (0..count)
        .map(|index| {
            let radius = if index % 2 == 0 { outer } else { inner };
            let angle = -PI / 2.0 + index as f32 * TAU / count as f32;
            Vec2::from_angle(angle) * radius
        })
        .collect()
}
