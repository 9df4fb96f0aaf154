//! Pieces shared by every boss renderer.

use std::f32::consts::{FRAC_PI_2, TAU};

use firewall_defence_core::{BossPhase, Color};
use firewall_defence_effects::VisualCue;
use firewall_defence_scene::{NodeId, NodeSpec, SceneGraph, Shape};
use glam::Vec2;

pub(crate) const BOSS_LAYER_Z: f32 = 20.0;
const HEALTH_THICKNESS: f32 = 4.0;
const PHASE_SHAKE_INTENSITY: f32 = 10.0;
const PHASE_SHAKE_DURATION: f32 = 0.5;

/// Remembers the last observed phase.
#[derive(Debug, Default)]
pub(crate) struct PhaseTracker {
    last: Option<BossPhase>,
}

impl PhaseTracker {
    /// Records `phase`, returning `true` when it advanced past the previous one.
    pub(crate) fn advanced(&mut self, phase: BossPhase) -> bool {
        let advanced = self.last.is_some_and(|last| phase > last);
        self.last = Some(phase);
        advanced
    }
}

/// Queues the cues announcing a phase change.
pub(crate) fn announce_phase(cues: &mut Vec<VisualCue>, position: Vec2, color: Color) {
    cues.push(VisualCue::PhaseTransition { position, color });
    cues.push(VisualCue::Shake {
        intensity: PHASE_SHAKE_INTENSITY,
        duration: PHASE_SHAKE_DURATION,
    });
}

/// Root group of a boss with its health arc.
#[derive(Debug)]
pub(crate) struct BossBody {
    pub(crate) root: NodeId,
    health: NodeId,
    health_radius: f32,
}

impl BossBody {
    pub(crate) fn spawn(
        graph: &mut SceneGraph,
        layer: NodeId,
        name: &str,
        health_radius: f32,
        color: Color,
    ) -> Self {
        let root = graph.spawn_child(layer, NodeSpec::group().named(name).z(BOSS_LAYER_Z));
        let health = graph.spawn_child(
            root,
            NodeSpec::new(health_arc(health_radius, 1.0))
                .stroke(color, HEALTH_THICKNESS)
                .z(5.0),
        );
        Self {
            root,
            health,
            health_radius,
        }
    }

    pub(crate) fn place(&self, graph: &mut SceneGraph, position: Vec2) {
        if let Some(root) = graph.get_mut(self.root) {
            root.position = position;
        }
    }

    pub(crate) fn set_health(&self, graph: &mut SceneGraph, fraction: f32) {
        if let Some(node) = graph.get_mut(self.health) {
            node.shape = health_arc(self.health_radius, fraction);
        }
    }

    /// Nodes owned directly by the body, not counting decorations.
    pub(crate) const NODES: usize = 2;
}

fn health_arc(radius: f32, fraction: f32) -> Shape {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    Shape::Arc {
        radius,
        start_angle: -FRAC_PI_2,
        end_angle: -FRAC_PI_2 + TAU * fraction,
        thickness: HEALTH_THICKNESS,
    }
}

/// Registry key `"{prefix}_{kind}_{id}"`.
pub(crate) fn entity_key(prefix: &str, kind: &str, id: impl std::fmt::Display) -> String {
    format!("{prefix}_{kind}_{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_tracker_ignores_first_observation_and_regressions() {
        let mut tracker = PhaseTracker::default();

        assert!(!tracker.advanced(BossPhase::new(2)));
        assert!(tracker.advanced(BossPhase::new(3)));
        assert!(!tracker.advanced(BossPhase::new(3)));
        assert!(!tracker.advanced(BossPhase::new(1)));
        assert!(tracker.advanced(BossPhase::new(2)));
    }

    #[test]
    fn health_arc_spans_remaining_fraction() {
        let Shape::Arc {
            start_angle,
            end_angle,
            ..
        } = health_arc(10.0, 0.25)
        else {
            panic!("health is drawn as an arc");
        };

        assert!((end_angle - start_angle - TAU * 0.25).abs() < 1e-6);
    }
}
