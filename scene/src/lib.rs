#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Retained 2D scene graph and rendering contracts for Firewall Defence.
//!
//! Visual systems build trees of shape [`Node`]s inside a [`SceneGraph`],
//! animate them with declarative [`Action`]s, reuse short-lived nodes through
//! the [`NodePool`] and track per-entity nodes by string key in a
//! [`NodeRegistry`]. Rendering backends only ever read the graph through
//! [`SceneGraph::draw_list`].

pub mod action;
pub mod graph;
pub mod node;
pub mod pool;
pub mod registry;

use anyhow::Result as AnyResult;
use firewall_defence_core::Color;
use glam::Vec2;
use std::time::Duration;
use thiserror::Error;

pub use action::{Action, Timing};
pub use graph::{DrawItem, SceneGraph, WorldTransform};
pub use node::{Node, NodeId, NodeSpec, Shape, Stroke};
pub use pool::{NodePool, PoolStats, PoolTag, DEFAULT_POOL_CAPACITY};
pub use registry::{dispose, Exit, NodeRegistry};

/// Errors raised by structural scene graph operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// The handle does not refer to a live node.
    #[error("{0} is not a live node")]
    UnknownNode(NodeId),
    /// Attaching would make a node its own ancestor.
    #[error("attaching {child} under {parent} would create a cycle")]
    CycleDetected {
        /// Requested parent.
        parent: NodeId,
        /// Node that was being attached.
        child: NodeId,
    },
    /// The root node cannot be removed or reparented.
    #[error("the scene root cannot be removed or reparented")]
    RootImmutable,
}

/// Lifecycle stage of a touch point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// The finger went down.
    Began,
    /// The finger moved.
    Moved,
    /// The finger lifted.
    Ended,
    /// The platform cancelled the touch.
    Cancelled,
}

/// Single touch observation in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchSample {
    /// Platform identifier, stable for the lifetime of the touch.
    pub id: u64,
    /// Lifecycle stage.
    pub phase: TouchPhase,
    /// Position in screen pixels, origin at the top-left corner.
    pub position: Vec2,
}

impl TouchSample {
    /// Creates a new touch sample.
    #[must_use]
    pub const fn new(id: u64, phase: TouchPhase, position: Vec2) -> Self {
        Self {
            id,
            phase,
            position,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Touch samples observed since the previous frame, in arrival order.
    pub touches: Vec<TouchSample>,
    /// Size of the drawable area in screen pixels.
    pub viewport: Vec2,
    /// Scroll-wheel zoom steps; positive zooms in.
    pub zoom_steps: f32,
    /// Pointer position used as the zoom anchor, in screen pixels.
    pub pointer: Option<Vec2>,
    /// Number key pressed this frame, `0..=9`.
    pub number_key: Option<u8>,
}

/// Camera parameters the backend uses to project the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    /// World position shown at the center of the viewport.
    pub position: Vec2,
    /// World units per screen pixel; larger values show more of the world.
    pub scale: f32,
    /// Transient screen shake offset in world units.
    pub shake_offset: Vec2,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: 1.0,
            shake_offset: Vec2::ZERO,
        }
    }
}

impl CameraView {
    /// Projects a world position into screen pixels for a viewport.
    #[must_use]
    pub fn world_to_screen(&self, world: Vec2, viewport: Vec2) -> Vec2 {
        let scale = self.scale.max(f32::EPSILON);
        (world - self.position - self.shake_offset) / scale + viewport * 0.5
    }

    /// Projects a screen position into world units for a viewport.
    #[must_use]
    pub fn screen_to_world(&self, screen: Vec2, viewport: Vec2) -> Vec2 {
        (screen - viewport * 0.5) * self.scale + self.position + self.shake_offset
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
        }
    }
}

/// Owner of a retained scene that a rendering backend drives once per frame.
pub trait SceneDriver {
    /// Advances the scene by `dt` using the input captured by the adapter and
    /// returns the camera the frame should be drawn with.
    fn update(&mut self, dt: Duration, input: FrameInput) -> CameraView;

    /// Scene graph to draw after [`SceneDriver::update`].
    fn scene(&self) -> &SceneGraph;
}

/// Rendering backend capable of presenting a [`SceneGraph`].
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    fn run<D>(self, presentation: Presentation, driver: D) -> AnyResult<()>
    where
        D: SceneDriver + 'static;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_projection_round_trips_through_screen_space() {
        let camera = CameraView {
            position: Vec2::new(100.0, 50.0),
            scale: 2.0,
            shake_offset: Vec2::new(1.0, -1.0),
        };
        let viewport = Vec2::new(800.0, 600.0);
        let world = Vec2::new(120.0, 10.0);

        let screen = camera.world_to_screen(world, viewport);
        let back = camera.screen_to_world(screen, viewport);

        assert!((back - world).length() < 1e-4);
        assert_eq!(
            camera.world_to_screen(camera.position + camera.shake_offset, viewport),
            viewport * 0.5
        );
    }

    #[test]
    fn scene_errors_render_human_readable_messages() {
        let error = SceneError::RootImmutable;

        assert_eq!(
            error.to_string(),
            "the scene root cannot be removed or reparented"
        );
    }
}
