//! Scene nodes, their shapes and the declarative spec used to create them.

use std::fmt;

use firewall_defence_core::Color;
use glam::Vec2;

use crate::{action::RunningAction, pool::PoolTag};

/// Generational handle to a node stored in a [`SceneGraph`](crate::SceneGraph).
///
/// Handles to removed nodes never alias nodes created later in the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}v{}", self.index, self.generation)
    }
}

/// Geometry drawn by a node, expressed in the node's local space.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Container without geometry of its own.
    Group,
    /// Circle centered on the node origin.
    Circle {
        /// Radius in local units.
        radius: f32,
    },
    /// Rectangle centered on the node origin.
    Rect {
        /// Width and height in local units.
        size: Vec2,
        /// Radius applied to the corners.
        corner_radius: f32,
    },
    /// Closed polygon.
    Polygon {
        /// Vertices in local units.
        points: Vec<Vec2>,
    },
    /// Open polyline.
    Polyline {
        /// Vertices in local units.
        points: Vec<Vec2>,
    },
    /// Line segment from the node origin.
    Line {
        /// End point in local units.
        to: Vec2,
    },
    /// Circular outline with thickness.
    Ring {
        /// Radius measured to the middle of the stroke.
        radius: f32,
        /// Width of the ring.
        thickness: f32,
    },
    /// Circular arc.
    Arc {
        /// Radius of the arc.
        radius: f32,
        /// Start angle in radians.
        start_angle: f32,
        /// End angle in radians.
        end_angle: f32,
        /// Width of the arc stroke.
        thickness: f32,
    },
}

impl Shape {
    /// Creates a regular polygon with `sides` vertices on a circle of `radius`.
    #[must_use]
    pub fn regular_polygon(sides: u32, radius: f32, rotation: f32) -> Self {
        let sides = sides.max(3);
        let points = (0..sides)
            .map(|index| {
                let angle = rotation + index as f32 / sides as f32 * std::f32::consts::TAU;
                Vec2::new(angle.cos(), angle.sin()) * radius
            })
            .collect();
        Self::Polygon { points }
    }
}

/// Outline applied to a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    /// Outline color.
    pub color: Color,
    /// Outline width in local units.
    pub width: f32,
}

impl Stroke {
    /// Creates a new stroke.
    #[must_use]
    pub const fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

/// Retained visual node.
#[derive(Debug)]
pub struct Node {
    /// Optional debug name.
    pub name: Option<String>,
    /// Geometry drawn by the node.
    pub shape: Shape,
    /// Fill color, if the shape is filled.
    pub fill: Option<Color>,
    /// Outline, if the shape is stroked.
    pub stroke: Option<Stroke>,
    /// Width of the soft glow drawn around the shape.
    pub glow: f32,
    /// Position relative to the parent.
    pub position: Vec2,
    /// Rotation relative to the parent, in radians.
    pub rotation: f32,
    /// Scale relative to the parent.
    pub scale: Vec2,
    /// Opacity multiplied into every descendant.
    pub alpha: f32,
    /// Draw order among siblings; higher draws later.
    pub z: f32,
    /// Hidden nodes and their subtrees are not drawn.
    pub hidden: bool,
    pub(crate) pool_tag: Option<PoolTag>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) actions: Vec<RunningAction>,
}

impl Node {
    pub(crate) fn from_spec(spec: NodeSpec) -> Self {
        let mut node = Self {
            name: None,
            shape: Shape::Group,
            fill: None,
            stroke: None,
            glow: 0.0,
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            alpha: 1.0,
            z: 0.0,
            hidden: false,
            pool_tag: None,
            parent: None,
            children: Vec::new(),
            actions: Vec::new(),
        };
        node.apply_spec(spec);
        node
    }

    pub(crate) fn apply_spec(&mut self, spec: NodeSpec) {
        self.name = spec.name;
        self.shape = spec.shape;
        self.fill = spec.fill;
        self.stroke = spec.stroke;
        self.glow = spec.glow;
        self.position = spec.position;
        self.rotation = spec.rotation;
        self.scale = spec.scale;
        self.alpha = spec.alpha;
        self.z = spec.z;
        self.hidden = spec.hidden;
    }

    /// Parent node, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Pool the node belongs to, if it was acquired from a [`NodePool`](crate::NodePool).
    #[must_use]
    pub fn pool_tag(&self) -> Option<PoolTag> {
        self.pool_tag
    }

    /// Number of running actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Whether an action registered under `key` is running.
    #[must_use]
    pub fn has_action(&self, key: &str) -> bool {
        self.actions
            .iter()
            .any(|action| action.key.as_deref() == Some(key))
    }
}

/// Declarative description of a node's initial visual state.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
    pub(crate) name: Option<String>,
    pub(crate) shape: Shape,
    pub(crate) fill: Option<Color>,
    pub(crate) stroke: Option<Stroke>,
    pub(crate) glow: f32,
    pub(crate) position: Vec2,
    pub(crate) rotation: f32,
    pub(crate) scale: Vec2,
    pub(crate) alpha: f32,
    pub(crate) z: f32,
    pub(crate) hidden: bool,
}

impl Default for NodeSpec {
    fn default() -> Self {
        Self::new(Shape::Group)
    }
}

impl NodeSpec {
    /// Creates a spec for the provided shape with default visual state.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            name: None,
            shape,
            fill: None,
            stroke: None,
            glow: 0.0,
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            alpha: 1.0,
            z: 0.0,
            hidden: false,
        }
    }

    /// Container node.
    #[must_use]
    pub fn group() -> Self {
        Self::new(Shape::Group)
    }

    /// Circle node.
    #[must_use]
    pub fn circle(radius: f32) -> Self {
        Self::new(Shape::Circle { radius })
    }

    /// Rectangle node.
    #[must_use]
    pub fn rect(size: Vec2) -> Self {
        Self::new(Shape::Rect {
            size,
            corner_radius: 0.0,
        })
    }

    /// Rectangle node with rounded corners.
    #[must_use]
    pub fn rounded_rect(size: Vec2, corner_radius: f32) -> Self {
        Self::new(Shape::Rect {
            size,
            corner_radius,
        })
    }

    /// Ring node.
    #[must_use]
    pub fn ring(radius: f32, thickness: f32) -> Self {
        Self::new(Shape::Ring { radius, thickness })
    }

    /// Line node from the origin to `to`.
    #[must_use]
    pub fn line(to: Vec2) -> Self {
        Self::new(Shape::Line { to })
    }

    /// Open polyline node.
    #[must_use]
    pub fn polyline(points: Vec<Vec2>) -> Self {
        Self::new(Shape::Polyline { points })
    }

    /// Closed polygon node.
    #[must_use]
    pub fn polygon(points: Vec<Vec2>) -> Self {
        Self::new(Shape::Polygon { points })
    }

    /// Sets the debug name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the fill color.
    #[must_use]
    pub fn fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    /// Sets the outline.
    #[must_use]
    pub fn stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke = Some(Stroke::new(color, width));
        self
    }

    /// Sets the glow width.
    #[must_use]
    pub fn glow(mut self, width: f32) -> Self {
        self.glow = width.max(0.0);
        self
    }

    /// Sets the local position.
    #[must_use]
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Sets the local rotation.
    #[must_use]
    pub fn rotated(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets a uniform scale.
    #[must_use]
    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = Vec2::splat(scale);
        self
    }

    /// Sets the opacity.
    #[must_use]
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Sets the sibling draw order.
    #[must_use]
    pub fn z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    /// Starts the node hidden.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}
