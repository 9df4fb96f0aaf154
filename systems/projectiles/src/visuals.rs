use std::collections::HashSet;

use firewall_defence_core::{geometry::angle_between, ProjectileSnapshot};
use firewall_defence_scene::{Exit, NodeId, NodePool, NodeRegistry, NodeSpec, PoolTag, SceneGraph};
use glam::Vec2;
use log::trace;

/// Pooled nodes mirroring the projectiles in flight, keyed `projectile_{id}`.
#[derive(Debug, Default)]
pub struct ProjectileVisuals {
    registry: NodeRegistry,
    live_keys: HashSet<String>,
}

impl ProjectileVisuals {
    /// Creates an empty visual set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry key of a projectile's node.
    #[must_use]
    pub fn key(projectile: &ProjectileSnapshot) -> String {
        format!("projectile_{}", projectile.id.get())
    }

    /// Creates, moves and orients nodes for `projectiles` and recycles nodes
    /// whose projectile vanished. Returns how many nodes were recycled.
    pub fn sync(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        layer: NodeId,
        projectiles: &[ProjectileSnapshot],
    ) -> usize {
        self.live_keys.clear();

        for projectile in projectiles {
            let key = Self::key(projectile);
            let (id, _) = self.registry.ensure(graph, pool, &key, |graph, pool| {
                pool.acquire(graph, PoolTag::Projectile, layer, body_spec(projectile))
            });

            if let Some(node) = graph.get_mut(id) {
                node.position = projectile.position;
                node.fill = Some(projectile.color);
                let motion = projectile.position - projectile.previous;
                if motion.length_squared() > f32::EPSILON {
                    node.rotation = angle_between(Vec2::ZERO, motion);
                }
            }
            let _ = self.live_keys.insert(key);
        }

        let recycled = self
            .registry
            .retain_live(graph, pool, &self.live_keys, Exit::Immediate);
        if recycled > 0 {
            trace!("recycled {recycled} projectile nodes");
        }
        recycled
    }

    /// Node drawn for the projectile with registry key `key`.
    pub fn node(&mut self, graph: &SceneGraph, key: &str) -> Option<NodeId> {
        self.registry.get(graph, key)
    }

    /// Number of projectile nodes currently shown.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no projectile nodes are shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Releases every projectile node.
    pub fn clear(&mut self, graph: &mut SceneGraph, pool: &mut NodePool) {
        self.registry.clear(graph, pool, Exit::Immediate);
    }
}

fn body_spec(projectile: &ProjectileSnapshot) -> NodeSpec {
    let radius = projectile.radius.max(1.0);
    NodeSpec::rounded_rect(Vec2::new(radius * 3.0, radius * 1.6), radius * 0.8)
        .fill(projectile.color)
        .glow(radius)
        .at(projectile.position)
        .z(5.0)
}
