//! Small geometry helpers shared by collision and rendering code.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

/// Shortest distance from `point` to the segment `a..b`.
///
/// A degenerate segment collapses to the distance between `point` and `a`.
#[must_use]
pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    point.distance(closest_point_on_segment(point, a, b))
}

/// Closest point to `point` lying on the segment `a..b`.
#[must_use]
pub fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let length_sq = ab.length_squared();
    if length_sq <= f32::EPSILON {
        return a;
    }

    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Whether the segment `a..b` touches the circle at `center` with `radius`.
#[must_use]
pub fn segment_intersects_circle(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    distance_to_segment(center, a, b) <= radius
}

/// Total length of the polyline described by `points`.
#[must_use]
pub fn path_length(points: &[Vec2]) -> f32 {
    points
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum()
}

/// Point located `distance` units along the polyline.
///
/// Distances before the start or past the end clamp to the first or last
/// point. Returns `None` for an empty polyline.
#[must_use]
pub fn point_along_path(points: &[Vec2], distance: f32) -> Option<Vec2> {
    let first = *points.first()?;
    if distance <= 0.0 {
        return Some(first);
    }

    let mut remaining = distance;
    for pair in points.windows(2) {
        let length = pair[0].distance(pair[1]);
        if remaining <= length {
            if length <= f32::EPSILON {
                return Some(pair[1]);
            }
            return Some(pair[0].lerp(pair[1], remaining / length));
        }
        remaining -= length;
    }

    points.last().copied()
}

/// Earliest normalised time at which a moving circle touches a static one.
///
/// The moving circle has `radius` and travels from `start` to `end` during
/// the step. Returns `Some(t)` with `t` in `0.0..=1.0`, `Some(0.0)` when the
/// circles already overlap at `start`, and `None` when they never touch
/// during the step.
#[must_use]
pub fn swept_circle_hit(
    start: Vec2,
    end: Vec2,
    radius: f32,
    center: Vec2,
    target_radius: f32,
) -> Option<f32> {
    let combined = radius.max(0.0) + target_radius.max(0.0);
    let offset = start - center;
    let c = offset.length_squared() - combined * combined;
    if c <= 0.0 {
        return Some(0.0);
    }

    let motion = end - start;
    let a = motion.length_squared();
    if a <= f32::EPSILON {
        return None;
    }

    let b = 2.0 * offset.dot(motion);
    if b >= 0.0 {
        // Moving away from (or tangent to) the target.
        return None;
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Heading in radians from `from` towards `to`.
#[must_use]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

/// Wraps an angle into the half-open range `(-PI, PI]`.
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }

    let mut wrapped = angle % TAU;
    if wrapped <= -PI {
        wrapped += TAU;
    } else if wrapped > PI {
        wrapped -= TAU;
    }
    wrapped
}

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Rect {
    /// Creates a rectangle from two corners, normalising their order.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a rectangle centered on `center`.
    #[must_use]
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Width and height of the rectangle.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether `point` lies inside or on the border.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Grows the rectangle by `margin` on every side.
    #[must_use]
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    /// Clamps `point` into the rectangle.
    #[must_use]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}
