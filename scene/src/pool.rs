//! Keyed free-list of reusable nodes.
//!
//! Effects such as puddles, lasers and particles are created and destroyed
//! many times per second. Instead of allocating fresh nodes every time, the
//! pool keeps detached nodes per [`PoolTag`] and hands them out again with
//! their transient state reset.

use std::collections::{HashMap, HashSet};

use log::trace;

use crate::{graph::SceneGraph, node::NodeId, node::NodeSpec};

/// Default number of free nodes retained per tag.
pub const DEFAULT_POOL_CAPACITY: usize = 256;

/// Category of interchangeable pooled nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PoolTag {
    /// Ground puddles.
    Puddle,
    /// Laser beams.
    Laser,
    /// Small particles.
    Particle,
    /// Expanding rings.
    Ring,
    /// Lightning arcs.
    Arc,
    /// Steam puffs.
    Steam,
    /// Projectile bodies.
    Projectile,
    /// Worm body segments.
    Segment,
    /// Screen overlays.
    Flash,
}

/// Counters describing pool traffic since creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Nodes handed out by `acquire`.
    pub acquired: u64,
    /// Acquisitions satisfied from the free list.
    pub reused: u64,
    /// Nodes filed back into a free list.
    pub released: u64,
    /// Nodes destroyed because their free list was full or they had no tag.
    pub discarded: u64,
}

/// Free lists of detached nodes grouped by [`PoolTag`].
#[derive(Debug)]
pub struct NodePool {
    free: HashMap<PoolTag, Vec<NodeId>>,
    filed: HashSet<NodeId>,
    capacity_per_tag: usize,
    stats: PoolStats,
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl NodePool {
    /// Creates an empty pool retaining at most `capacity_per_tag` free nodes per tag.
    #[must_use]
    pub fn new(capacity_per_tag: usize) -> Self {
        Self {
            free: HashMap::new(),
            filed: HashSet::new(),
            capacity_per_tag,
            stats: PoolStats::default(),
        }
    }

    /// Hands out a node tagged `tag`, attached to `parent` and initialised from `spec`.
    ///
    /// Reused nodes have their actions stopped, children destroyed and every
    /// visual property reset from `spec`.
    pub fn acquire(
        &mut self,
        graph: &mut SceneGraph,
        tag: PoolTag,
        parent: NodeId,
        spec: NodeSpec,
    ) -> NodeId {
        self.stats.acquired += 1;

        while let Some(id) = self.free.get_mut(&tag).and_then(Vec::pop) {
            let _ = self.filed.remove(&id);
            if !graph.contains(id) {
                continue;
            }
            graph.reset_node(id, spec);
            if graph.attach(parent, id).is_err() {
                log::warn!("pooled {id} could not join missing parent {parent}");
            }
            self.stats.reused += 1;
            return id;
        }

        let id = graph.spawn_child(parent, spec);
        if let Some(node) = graph.get_mut(id) {
            node.pool_tag = Some(tag);
        }
        id
    }

    /// Returns a node to its free list, detached and reset.
    ///
    /// Untagged nodes, and nodes whose free list is already full, are destroyed.
    pub fn release(&mut self, graph: &mut SceneGraph, id: NodeId) {
        let Some(tag) = graph.get(id).map(|node| node.pool_tag) else {
            return;
        };

        let Some(tag) = tag else {
            self.stats.discarded += 1;
            let _ = graph.remove(id);
            return;
        };

        if self.filed.contains(&id) {
            return;
        }
        let free = self.free.entry(tag).or_default();
        if free.len() >= self.capacity_per_tag {
            self.stats.discarded += 1;
            let _ = graph.remove(id);
            return;
        }

        graph.detach(id);
        graph.reset_node(id, NodeSpec::group().hidden());
        free.push(id);
        let _ = self.filed.insert(id);
        self.stats.released += 1;
        trace!("released {id} into {tag:?} pool");
    }

    /// Files every node recycled by actions since the last call.
    pub fn reclaim(&mut self, graph: &mut SceneGraph) -> usize {
        let recycled = graph.drain_recycled();
        let count = recycled.len();
        for id in recycled {
            self.release(graph, id);
        }
        count
    }

    /// Creates `count` free nodes for `tag` ahead of time.
    pub fn prewarm(&mut self, graph: &mut SceneGraph, tag: PoolTag, count: usize) {
        for _ in 0..count {
            let id = graph.spawn(NodeSpec::group());
            if let Some(node) = graph.get_mut(id) {
                node.pool_tag = Some(tag);
            }
            self.release(graph, id);
        }
    }

    /// Number of free nodes available for `tag`.
    #[must_use]
    pub fn available(&self, tag: PoolTag) -> usize {
        self.free.get(&tag).map_or(0, Vec::len)
    }

    /// Total number of free nodes across every tag.
    #[must_use]
    pub fn total_available(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// Traffic counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Destroys every free node.
    pub fn clear(&mut self, graph: &mut SceneGraph) {
        self.filed.clear();
        for (_, ids) in self.free.drain() {
            for id in ids {
                let _ = graph.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use glam::Vec2;

    #[test]
    fn released_nodes_are_detached_and_reset() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let root = graph.root();
        let id = pool.acquire(&mut graph, PoolTag::Puddle, root, NodeSpec::circle(5.0));
        {
            let node = graph.get_mut(id).expect("live");
            node.alpha = 0.3;
            node.scale = Vec2::splat(3.0);
        }
        graph.run_action(id, Action::pulse(1.2, 1.0));
        let _ = graph.spawn_child(id, NodeSpec::circle(1.0));

        pool.release(&mut graph, id);

        let node = graph.get(id).expect("pooled node stays alive");
        assert_eq!(node.parent(), None);
        assert_eq!(node.alpha, 1.0);
        assert_eq!(node.scale, Vec2::ONE);
        assert_eq!(node.action_count(), 0);
        assert!(node.children().is_empty());
        assert_eq!(pool.available(PoolTag::Puddle), 1);
    }

    #[test]
    fn acquire_reuses_free_nodes_of_the_same_tag() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let root = graph.root();
        let first = pool.acquire(&mut graph, PoolTag::Laser, root, NodeSpec::line(Vec2::X));
        pool.release(&mut graph, first);

        let other_tag = pool.acquire(&mut graph, PoolTag::Ring, root, NodeSpec::ring(2.0, 1.0));
        let reused = pool.acquire(
            &mut graph,
            PoolTag::Laser,
            root,
            NodeSpec::line(Vec2::Y).alpha(0.5),
        );

        assert_ne!(other_tag, first);
        assert_eq!(reused, first);
        let node = graph.get(reused).expect("live");
        assert_eq!(node.alpha, 0.5);
        assert!(!node.hidden);
        assert_eq!(node.parent(), Some(root));
        assert_eq!(
            pool.stats(),
            PoolStats {
                acquired: 3,
                reused: 1,
                released: 1,
                discarded: 0,
            }
        );
    }

    #[test]
    fn capacity_overflow_destroys_nodes() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::new(1);
        let root = graph.root();
        let a = pool.acquire(&mut graph, PoolTag::Particle, root, NodeSpec::circle(1.0));
        let b = pool.acquire(&mut graph, PoolTag::Particle, root, NodeSpec::circle(1.0));

        pool.release(&mut graph, a);
        pool.release(&mut graph, b);

        assert!(graph.contains(a));
        assert!(!graph.contains(b));
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn untagged_nodes_are_destroyed_on_release() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let id = graph.spawn(NodeSpec::circle(1.0));

        pool.release(&mut graph, id);

        assert!(!graph.contains(id));
    }

    #[test]
    fn double_release_files_node_once() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let root = graph.root();
        let id = pool.acquire(&mut graph, PoolTag::Steam, root, NodeSpec::circle(1.0));

        pool.release(&mut graph, id);
        pool.release(&mut graph, id);

        assert_eq!(pool.available(PoolTag::Steam), 1);
        assert_eq!(pool.stats().released, 1);
    }

    #[test]
    fn reacquired_node_can_be_released_again() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let root = graph.root();
        let id = pool.acquire(&mut graph, PoolTag::Arc, root, NodeSpec::circle(1.0));
        pool.release(&mut graph, id);

        let again = pool.acquire(&mut graph, PoolTag::Arc, root, NodeSpec::circle(2.0));
        pool.release(&mut graph, again);
        pool.release(&mut graph, again);

        assert_eq!(again, id);
        assert_eq!(pool.available(PoolTag::Arc), 1);
        assert_eq!(pool.stats().released, 2);
        assert_eq!(pool.stats().discarded, 0);
    }

    #[test]
    fn reclaim_collects_recycled_nodes() {
        let mut graph = SceneGraph::new();
        let mut pool = NodePool::default();
        let root = graph.root();
        let id = pool.acquire(&mut graph, PoolTag::Ring, root, NodeSpec::ring(4.0, 1.0));
        graph.run_action(id, Action::fade_out_and_recycle(0.1));

        graph.advance(0.2);
        let reclaimed = pool.reclaim(&mut graph);

        assert_eq!(reclaimed, 1);
        assert_eq!(pool.available(PoolTag::Ring), 1);
    }
}
