#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Camera controller with drag panning, pinch zoom, inertia and elastic bounds.
//!
//! Scale is expressed in world units per screen pixel, so zooming in lowers
//! the scale. The controller keeps its position inside the world bounds
//! expanded by an elastic margin and springs back into the bounds whenever no
//! gesture is holding it outside.

use firewall_defence_core::geometry::Rect;
use firewall_defence_scene::{CameraView, Timing};
use glam::Vec2;
use log::trace;
use serde::{Deserialize, Serialize};

/// Tuning parameters for [`CameraController`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Smallest allowed scale (closest zoom).
    pub min_scale: f32,
    /// Largest allowed scale (widest zoom).
    pub max_scale: f32,
    /// Velocity retained per 60 Hz frame while coasting.
    pub friction: f32,
    /// Coasting stops below this speed, in world units per second.
    pub min_velocity: f32,
    /// Fastest coasting speed, in world units per second.
    pub max_velocity: f32,
    /// Distance the camera may travel past the bounds, in world units.
    pub elastic_margin: f32,
    /// Spring rate pulling the camera back inside the bounds, per second.
    pub elastic_stiffness: f32,
    /// Fraction of a drag applied while outside the bounds.
    pub elastic_resistance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 3.0,
            friction: 0.92,
            min_velocity: 4.0,
            max_velocity: 4_000.0,
            elastic_margin: 120.0,
            elastic_stiffness: 10.0,
            elastic_resistance: 0.35,
        }
    }
}

impl CameraConfig {
    fn sanitized(mut self) -> Self {
        if self.min_scale <= 0.0 || !self.min_scale.is_finite() {
            self.min_scale = f32::EPSILON;
        }
        if self.max_scale < self.min_scale || !self.max_scale.is_finite() {
            self.max_scale = self.min_scale;
        }
        self.friction = self.friction.clamp(0.0, 1.0);
        self.min_velocity = self.min_velocity.max(0.0);
        self.max_velocity = self.max_velocity.max(self.min_velocity);
        self.elastic_margin = self.elastic_margin.max(0.0);
        self.elastic_stiffness = self.elastic_stiffness.max(0.0);
        self.elastic_resistance = self.elastic_resistance.clamp(0.0, 1.0);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FocusAnimation {
    from_position: Vec2,
    to_position: Vec2,
    from_scale: f32,
    to_scale: f32,
    elapsed: f32,
    duration: f32,
}

/// Pan and zoom state of the board camera.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraController {
    config: CameraConfig,
    bounds: Rect,
    viewport: Vec2,
    position: Vec2,
    scale: f32,
    velocity: Vec2,
    dragging: bool,
    pinching: bool,
    focus: Option<FocusAnimation>,
}

impl CameraController {
    /// Creates a camera centered on `bounds` at the widest allowed scale that
    /// is not wider than the board.
    #[must_use]
    pub fn new(config: CameraConfig, bounds: Rect, viewport: Vec2) -> Self {
        let config = config.sanitized();
        let fit = if viewport.x > 0.0 && viewport.y > 0.0 {
            let size = bounds.size();
            (size.x / viewport.x).max(size.y / viewport.y)
        } else {
            1.0
        };
        Self {
            config,
            bounds,
            viewport,
            position: bounds.center(),
            scale: fit.clamp(config.min_scale, config.max_scale),
            velocity: Vec2::ZERO,
            dragging: false,
            pinching: false,
            focus: None,
        }
    }

    /// Active tuning.
    #[must_use]
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// World position at the center of the viewport.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// World units per screen pixel.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Coasting velocity in world units per second.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Size of the viewport in screen pixels.
    #[must_use]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// World rectangle the camera center is kept inside when at rest.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Whether a pan gesture is active.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Whether a focus animation is running.
    #[must_use]
    pub fn is_focusing(&self) -> bool {
        self.focus.is_some()
    }

    /// Updates the viewport size after a window resize.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    /// Replaces the world bounds and clamps the camera into the new margin.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.position = self.elastic_rect().clamp(self.position);
    }

    /// Starts a pan gesture, stopping inertia and any focus animation.
    pub fn begin_pan(&mut self) {
        self.dragging = true;
        self.velocity = Vec2::ZERO;
        self.focus = None;
    }

    /// Moves the camera so the content follows a finger moving by `screen_delta` pixels.
    ///
    /// Movement past the bounds is damped by the elastic resistance and the
    /// position never leaves the elastic margin.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        let world_delta = -screen_delta * self.scale;
        let mut target = self.position + world_delta;

        let outside_x = target.x < self.bounds.min.x || target.x > self.bounds.max.x;
        let outside_y = target.y < self.bounds.min.y || target.y > self.bounds.max.y;
        let resistance = self.config.elastic_resistance;
        if outside_x {
            target.x = self.position.x + world_delta.x * resistance;
        }
        if outside_y {
            target.y = self.position.y + world_delta.y * resistance;
        }

        self.position = self.elastic_rect().clamp(target);
    }

    /// Ends a pan gesture, coasting with the release velocity given in pixels per second.
    pub fn end_pan(&mut self, screen_velocity: Vec2) {
        self.dragging = false;
        let velocity = -screen_velocity * self.scale;
        self.velocity = velocity.clamp_length_max(self.config.max_velocity);
        if self.velocity.length() < self.config.min_velocity {
            self.velocity = Vec2::ZERO;
        }
    }

    /// Marks the start of a pinch gesture.
    pub fn begin_pinch(&mut self) {
        self.pinching = true;
        self.dragging = false;
        self.velocity = Vec2::ZERO;
        self.focus = None;
    }

    /// Marks the end of a pinch gesture.
    pub fn end_pinch(&mut self) {
        self.pinching = false;
    }

    /// Zooms by `factor` around `screen_anchor`; factors above one zoom in.
    ///
    /// The world point under the anchor stays under the anchor unless the
    /// position has to be clamped into the elastic margin.
    pub fn pinch(&mut self, factor: f32, screen_anchor: Vec2) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor_world = self.screen_to_world(screen_anchor);
        self.scale = (self.scale / factor).clamp(self.config.min_scale, self.config.max_scale);
        let offset = (screen_anchor - self.viewport * 0.5) * self.scale;
        self.position = self.elastic_rect().clamp(anchor_world - offset);
    }

    /// Sets the scale directly, clamped into range, keeping the center fixed.
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.scale = scale.clamp(self.config.min_scale, self.config.max_scale);
        }
    }

    /// Animates the camera to `point` and `scale` over `duration` seconds.
    ///
    /// A non-positive duration jumps immediately.
    pub fn focus_on(&mut self, point: Vec2, scale: f32, duration: f32) {
        let to_scale = scale.clamp(self.config.min_scale, self.config.max_scale);
        let to_position = self.elastic_rect().clamp(point);
        self.velocity = Vec2::ZERO;
        if duration <= 0.0 {
            self.position = to_position;
            self.scale = to_scale;
            self.focus = None;
            return;
        }
        self.focus = Some(FocusAnimation {
            from_position: self.position,
            to_position,
            from_scale: self.scale,
            to_scale,
            elapsed: 0.0,
            duration,
        });
    }

    /// Advances inertia, focus animation and the elastic spring by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        if dt == 0.0 {
            return;
        }

        if let Some(mut focus) = self.focus.take() {
            focus.elapsed = (focus.elapsed + dt).min(focus.duration);
            let t = Timing::EaseInOut.apply(focus.elapsed / focus.duration);
            self.position = focus.from_position.lerp(focus.to_position, t);
            self.scale = focus.from_scale + (focus.to_scale - focus.from_scale) * t;
            if focus.elapsed < focus.duration {
                self.focus = Some(focus);
            }
            return;
        }

        if self.dragging || self.pinching {
            return;
        }

        if self.velocity != Vec2::ZERO {
            self.position += self.velocity * dt;
            self.velocity *= self.config.friction.powf(dt * 60.0);
            if self.velocity.length() < self.config.min_velocity {
                self.velocity = Vec2::ZERO;
            }
        }

        let inside = self.bounds.clamp(self.position);
        let overshoot = inside - self.position;
        if overshoot != Vec2::ZERO {
            if overshoot.x != 0.0 {
                self.velocity.x = 0.0;
            }
            if overshoot.y != 0.0 {
                self.velocity.y = 0.0;
            }
            let blend = 1.0 - (-self.config.elastic_stiffness * dt).exp();
            self.position += overshoot * blend;
            if (inside - self.position).length() < 0.01 {
                self.position = inside;
            }
            trace!("camera springing back by {overshoot:?}");
        }

        self.position = self.elastic_rect().clamp(self.position);
    }

    /// Converts a screen position in pixels into world units.
    #[must_use]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.viewport * 0.5) * self.scale + self.position
    }

    /// Converts a world position into screen pixels.
    #[must_use]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.position) / self.scale + self.viewport * 0.5
    }

    /// World rectangle currently covered by the viewport.
    #[must_use]
    pub fn visible_rect(&self) -> Rect {
        Rect::from_center_size(self.position, self.viewport * self.scale)
    }

    /// Camera parameters handed to the rendering backend.
    #[must_use]
    pub fn view(&self, shake_offset: Vec2) -> CameraView {
        CameraView {
            position: self.position,
            scale: self.scale,
            shake_offset,
        }
    }

    fn elastic_rect(&self) -> Rect {
        self.bounds.expand(self.config.elastic_margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> CameraController {
        CameraController::new(
            CameraConfig::default(),
            Rect::from_corners(Vec2::ZERO, Vec2::new(1000.0, 1000.0)),
            Vec2::new(500.0, 500.0),
        )
    }

    #[test]
    fn starts_centered_and_fitted_to_bounds() {
        let camera = camera();

        assert_eq!(camera.position(), Vec2::new(500.0, 500.0));
        assert_eq!(camera.scale(), 2.0);
    }

    #[test]
    fn pan_moves_against_finger_direction() {
        let mut camera = camera();
        camera.begin_pan();

        camera.pan_by(Vec2::new(10.0, 0.0));

        assert_eq!(camera.position(), Vec2::new(480.0, 500.0));
    }

    #[test]
    fn pan_outside_bounds_is_damped_and_capped() {
        let mut camera = camera();
        camera.begin_pan();

        for _ in 0..100 {
            camera.pan_by(Vec2::new(100.0, 0.0));
        }

        assert_eq!(camera.position().x, -120.0);
    }

    #[test]
    fn pinch_keeps_anchor_under_finger() {
        let mut camera = camera();
        let anchor = Vec2::new(100.0, 300.0);
        let before = camera.screen_to_world(anchor);

        camera.pinch(1.6, anchor);

        let after = camera.screen_to_world(anchor);
        assert!((before - after).length() < 1e-3);
        assert!((camera.scale() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn scale_stays_within_configured_range() {
        let mut camera = camera();

        camera.pinch(100.0, Vec2::splat(250.0));
        assert_eq!(camera.scale(), 0.5);
        camera.pinch(0.001, Vec2::splat(250.0));
        assert_eq!(camera.scale(), 3.0);
        camera.set_scale(f32::NAN);
        assert_eq!(camera.scale(), 3.0);
    }

    #[test]
    fn inertia_decays_and_stops() {
        let mut camera = camera();
        camera.begin_pan();
        camera.end_pan(Vec2::new(-100.0, 0.0));
        assert_eq!(camera.velocity(), Vec2::new(200.0, 0.0));

        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }

        assert_eq!(camera.velocity(), Vec2::ZERO);
        assert!(camera.position().x > 500.0);
    }

    #[test]
    fn idle_camera_springs_back_into_bounds() {
        let mut camera = camera();
        camera.begin_pan();
        for _ in 0..10 {
            camera.pan_by(Vec2::new(200.0, 200.0));
        }
        camera.end_pan(Vec2::ZERO);
        assert!(camera.position().x < 0.0);

        for _ in 0..240 {
            camera.update(1.0 / 60.0);
        }

        assert_eq!(camera.position(), Vec2::ZERO);
    }

    #[test]
    fn focus_animation_reaches_target() {
        let mut camera = camera();

        camera.focus_on(Vec2::new(800.0, 200.0), 1.0, 0.5);
        assert!(camera.is_focusing());
        for _ in 0..40 {
            camera.update(1.0 / 60.0);
        }

        assert!(!camera.is_focusing());
        assert_eq!(camera.position(), Vec2::new(800.0, 200.0));
        assert_eq!(camera.scale(), 1.0);
    }

    #[test]
    fn screen_and_world_conversions_are_inverse() {
        let camera = camera();
        let screen = Vec2::new(37.0, 410.0);

        let world = camera.screen_to_world(screen);

        assert!((camera.world_to_screen(world) - screen).length() < 1e-4);
        assert_eq!(
            camera.visible_rect(),
            Rect::from_corners(Vec2::ZERO, Vec2::new(1000.0, 1000.0))
        );
    }

    #[test]
    fn config_fields_default_when_missing_from_toml() {
        let config: CameraConfig = toml::from_str("min_scale = 0.25").expect("valid toml");

        assert_eq!(config.min_scale, 0.25);
        assert_eq!(config.max_scale, CameraConfig::default().max_scale);
    }
}
