//! String-keyed registry of live nodes owned by a visual system.

use std::collections::{HashMap, HashSet};

use crate::{action::Action, graph::SceneGraph, node::NodeId, pool::NodePool};

/// How a node leaves the scene when its key disappears.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Exit {
    /// Release the node right away.
    Immediate,
    /// Fade out over the given number of seconds, then release.
    FadeOut(f32),
}

/// Mapping from stable string keys (for example `"overclocker_tile_3"`) to
/// the node that currently represents that key.
///
/// At most one node is live per key. Nodes removed from the registry are
/// handed back to the [`NodePool`] when pooled and destroyed otherwise.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashMap<String, NodeId>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Node registered under `key`, dropping the entry if the node died elsewhere.
    pub fn get(&mut self, graph: &SceneGraph, key: &str) -> Option<NodeId> {
        let id = *self.nodes.get(key)?;
        if graph.contains(id) {
            Some(id)
        } else {
            let _ = self.nodes.remove(key);
            None
        }
    }

    /// Whether `key` is registered.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// Registers `id` under `key`, returning the node it displaced.
    ///
    /// The caller owns the displaced node and must release it.
    pub fn insert(&mut self, key: impl Into<String>, id: NodeId) -> Option<NodeId> {
        self.nodes.insert(key.into(), id)
    }

    /// Unregisters `key` without touching its node.
    pub fn remove(&mut self, key: &str) -> Option<NodeId> {
        self.nodes.remove(key)
    }

    /// Returns the node under `key`, creating it with `create` when missing or stale.
    ///
    /// The boolean is `true` when the node was created by this call.
    pub fn ensure<F>(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        key: &str,
        create: F,
    ) -> (NodeId, bool)
    where
        F: FnOnce(&mut SceneGraph, &mut NodePool) -> NodeId,
    {
        if let Some(id) = self.get(graph, key) {
            return (id, false);
        }
        let id = create(graph, pool);
        let _ = self.nodes.insert(key.to_owned(), id);
        (id, true)
    }

    /// Unregisters `key` and releases its node using `exit`.
    pub fn release(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        key: &str,
        exit: Exit,
    ) -> bool {
        match self.nodes.remove(key) {
            Some(id) => {
                dispose(graph, pool, id, exit);
                true
            }
            None => false,
        }
    }

    /// Releases every node whose key is not in `live`. Returns how many were released.
    pub fn retain_live(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        live: &HashSet<String>,
        exit: Exit,
    ) -> usize {
        self.retain_where(graph, pool, exit, |key| live.contains(key))
    }

    /// Releases every node whose key fails `keep`. Returns how many were released.
    pub fn retain_where<F>(
        &mut self,
        graph: &mut SceneGraph,
        pool: &mut NodePool,
        exit: Exit,
        mut keep: F,
    ) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let mut stale: Vec<String> = self
            .nodes
            .keys()
            .filter(|key| !keep(key))
            .cloned()
            .collect();
        stale.sort_unstable();
        for key in &stale {
            if let Some(id) = self.nodes.remove(key) {
                dispose(graph, pool, id, exit);
            }
        }
        stale.len()
    }

    /// Releases every registered node.
    pub fn clear(&mut self, graph: &mut SceneGraph, pool: &mut NodePool, exit: Exit) {
        let mut entries: Vec<(String, NodeId)> = self.nodes.drain().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        for (_, id) in entries {
            dispose(graph, pool, id, exit);
        }
    }

    /// Registered keys in lexicographic order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Releases `id` immediately or after a fade, back into the pool when tagged.
pub fn dispose(graph: &mut SceneGraph, pool: &mut NodePool, id: NodeId, exit: Exit) {
    let Some(node) = graph.get(id) else {
        return;
    };
    let pooled = node.pool_tag().is_some();

    match exit {
        Exit::Immediate => {
            if pooled {
                pool.release(graph, id);
            } else {
                let _ = graph.remove(id);
            }
        }
        Exit::FadeOut(duration) => {
            graph.remove_all_actions(id);
            let action = if pooled {
                Action::fade_out_and_recycle(duration)
            } else {
                Action::fade_out_and_remove(duration)
            };
            graph.run_action(id, action);
        }
    }
}
