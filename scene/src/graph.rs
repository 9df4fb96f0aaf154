//! Arena-backed retained scene graph.

use firewall_defence_core::Color;
use glam::Vec2;
use log::{trace, warn};

use crate::{
    action::{Action, RunningAction, Structural},
    node::{Node, NodeId, NodeSpec},
    SceneError,
};

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Accumulated transform of a node relative to the scene root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldTransform {
    /// Origin of the node in world units.
    pub position: Vec2,
    /// Accumulated rotation in radians.
    pub rotation: f32,
    /// Accumulated scale.
    pub scale: Vec2,
    /// Accumulated opacity.
    pub alpha: f32,
}

impl WorldTransform {
    /// Transform of the scene root.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
        alpha: 1.0,
    };

    /// Composes a child's local transform onto this one.
    #[must_use]
    pub fn then(&self, node: &Node) -> Self {
        let local = node.position * self.scale;
        let rotated = Vec2::from_angle(self.rotation).rotate(local);
        Self {
            position: self.position + rotated,
            rotation: self.rotation + node.rotation,
            scale: self.scale * node.scale,
            alpha: self.alpha * node.alpha,
        }
    }

    /// Maps a point from the node's local space into world space.
    #[must_use]
    pub fn apply(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.rotation).rotate(local * self.scale)
    }
}

/// Visible node paired with its world transform, in draw order.
#[derive(Debug)]
pub struct DrawItem<'a> {
    /// Handle of the node.
    pub id: NodeId,
    /// Node being drawn.
    pub node: &'a Node,
    /// Accumulated world transform.
    pub transform: WorldTransform,
}

/// Retained tree of visual nodes with attached animations.
#[derive(Debug)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    live: usize,
    recycled: Vec<NodeId>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a graph containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            live: 0,
            recycled: Vec::new(),
        };
        graph.root = graph.insert(Node::from_spec(NodeSpec::group().named("root")));
        graph
    }

    /// Handle of the root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, including the root and detached nodes.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Whether `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Immutable access to a live node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Mutable access to a live node.
    #[must_use]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Spawns a node as a child of the root.
    pub fn spawn(&mut self, spec: NodeSpec) -> NodeId {
        let root = self.root;
        self.spawn_child(root, spec)
    }

    /// Spawns a node as the last child of `parent`.
    ///
    /// A stale `parent` leaves the new node detached.
    pub fn spawn_child(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        let id = self.insert(Node::from_spec(spec));
        if self.link(parent, id).is_err() {
            warn!("spawned {id} under missing parent {parent}; node left detached");
        }
        id
    }

    /// Attaches `child` as the last child of `parent`, detaching it first.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if child == self.root {
            return Err(SceneError::RootImmutable);
        }
        if !self.contains(child) {
            return Err(SceneError::UnknownNode(child));
        }
        if !self.contains(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::CycleDetected { parent, child });
        }

        self.detach(child);
        self.link(parent, child)
    }

    /// Removes `id` from its parent without destroying it.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(Node::parent) else {
            return;
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|child| *child != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    /// Destroys `id` and its whole subtree. Returns `false` for stale handles
    /// and for the root, which cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }

        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                self.live -= 1;
            }
        }
        true
    }

    /// Destroys every child of `id`, keeping `id` itself.
    pub fn remove_children(&mut self, id: NodeId) {
        let children = match self.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            if let Some(node) = self.get_mut(child) {
                node.parent = None;
            }
            let _ = self.remove(child);
        }
    }

    /// Whether `id` is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.root {
                return true;
            }
            current = self.get(node_id).and_then(Node::parent);
        }
        false
    }

    /// World transform of a live node, composed along its parent chain.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Option<WorldTransform> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get(node_id)?;
            chain.push(node);
            current = node.parent;
        }

        Some(
            chain
                .iter()
                .rev()
                .fold(WorldTransform::IDENTITY, |transform, node| {
                    transform.then(node)
                }),
        )
    }

    /// Visible nodes reachable from the root, in back-to-front order.
    ///
    /// Siblings are ordered by `z` and then by insertion order. Hidden nodes
    /// skip their whole subtree.
    #[must_use]
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::with_capacity(self.live);
        self.collect_draw_items(self.root, WorldTransform::IDENTITY, &mut items);
        items
    }

    fn collect_draw_items<'a>(
        &'a self,
        id: NodeId,
        parent: WorldTransform,
        items: &mut Vec<DrawItem<'a>>,
    ) {
        let Some(node) = self.get(id) else {
            return;
        };
        if node.hidden {
            return;
        }

        let transform = parent.then(node);
        items.push(DrawItem {
            id,
            node,
            transform,
        });

        let mut children: Vec<(f32, usize, NodeId)> = node
            .children
            .iter()
            .enumerate()
            .filter_map(|(order, child)| self.get(*child).map(|n| (n.z, order, *child)))
            .collect();
        children.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        for (_, _, child) in children {
            self.collect_draw_items(child, transform, items);
        }
    }

    /// Starts `action` on `id`.
    pub fn run_action(&mut self, id: NodeId, action: Action) {
        if let Some(node) = self.get_mut(id) {
            node.actions.push(RunningAction::new(None, action));
        }
    }

    /// Starts `action` on `id`, replacing any action running under `key`.
    pub fn run_keyed(&mut self, id: NodeId, key: &str, action: Action) {
        if let Some(node) = self.get_mut(id) {
            node.actions
                .retain(|running| running.key.as_deref() != Some(key));
            node.actions
                .push(RunningAction::new(Some(key.to_owned()), action));
        }
    }

    /// Stops the action running under `key`, leaving properties where they are.
    pub fn remove_action(&mut self, id: NodeId, key: &str) {
        if let Some(node) = self.get_mut(id) {
            node.actions
                .retain(|running| running.key.as_deref() != Some(key));
        }
    }

    /// Stops every action running on `id`.
    pub fn remove_all_actions(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.actions.clear();
        }
    }

    /// Whether `id` has any running action.
    #[must_use]
    pub fn has_actions(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|node| !node.actions.is_empty())
    }

    /// Sets the fill color of a live node.
    pub fn set_fill(&mut self, id: NodeId, color: Color) {
        if let Some(node) = self.get_mut(id) {
            node.fill = Some(color);
        }
    }

    /// Steps every running action by `dt` seconds and applies the structural
    /// changes they request.
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let mut requests = Vec::new();

        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];
            let Some(node) = slot.node.as_mut() else {
                continue;
            };
            if node.actions.is_empty() {
                continue;
            }

            let id = NodeId {
                index: index as u32,
                generation: slot.generation,
            };
            let mut actions = std::mem::take(&mut node.actions);
            let mut structural = None;
            actions.retain_mut(|action| {
                if structural.is_some() {
                    return true;
                }
                !action.step(node, dt, &mut structural)
            });

            match structural {
                Some(request) => requests.push((id, request)),
                None => node.actions = actions,
            }
        }

        for (id, request) in requests {
            match request {
                Structural::Remove => {
                    trace!("action removed {id}");
                    let _ = self.remove(id);
                }
                Structural::Recycle => {
                    self.detach(id);
                    if let Some(node) = self.get_mut(id) {
                        node.actions.clear();
                        self.recycled.push(id);
                    }
                }
            }
        }
    }

    /// Takes the nodes detached by `Recycle` actions since the last call.
    pub fn drain_recycled(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.recycled)
    }

    /// Restores a node to the default visual state described by `spec`,
    /// stopping its actions and destroying its children.
    pub(crate) fn reset_node(&mut self, id: NodeId, spec: NodeSpec) {
        self.remove_children(id);
        if let Some(node) = self.get_mut(id) {
            node.actions.clear();
            node.apply_spec(spec);
        }
    }

    fn insert(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let parent_node = self
            .get_mut(parent)
            .ok_or(SceneError::UnknownNode(parent))?;
        parent_node.children.push(child);
        let child_node = self.get_mut(child).ok_or(SceneError::UnknownNode(child))?;
        child_node.parent = Some(parent);
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.get(node_id).and_then(Node::parent);
        }
        false
    }
}
