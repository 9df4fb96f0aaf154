//! Conversion of scene nodes into screen-space primitives and their macroquad
//! draw calls.

use std::f32::consts::{FRAC_PI_2, TAU};

use firewall_defence_core::Color;
use firewall_defence_scene::{CameraView, DrawItem, Shape, WorldTransform};
use glam::Vec2;
use macroquad::math::Vec2 as MacroquadVec2;

const CIRCLE_SEGMENTS: usize = 32;
const CORNER_SEGMENTS: usize = 4;
const GLOW_ALPHA: f32 = 0.25;

/// Screen-space drawing instruction.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Primitive {
    /// Filled convex polygon.
    Fill { points: Vec<Vec2>, color: Color },
    /// Stroked path.
    Path {
        points: Vec<Vec2>,
        closed: bool,
        width: f32,
        color: Color,
    },
}

/// Local outline of a shape and whether it is closed.
fn outline(shape: &Shape) -> Option<(Vec<Vec2>, bool)> {
    match shape {
        Shape::Group => None,
        Shape::Circle { radius } | Shape::Ring { radius, .. } => {
            Some((arc_points(*radius, 0.0, TAU, CIRCLE_SEGMENTS), true))
        }
        Shape::Rect {
            size,
            corner_radius,
        } => Some((rect_points(*size, *corner_radius), true)),
        Shape::Polygon { points } => Some((points.clone(), true)),
        Shape::Polyline { points } => Some((points.clone(), false)),
        Shape::Line { to } => Some((vec![Vec2::ZERO, *to], false)),
        Shape::Arc {
            radius,
            start_angle,
            end_angle,
            ..
        } => {
            let span = (end_angle - start_angle).abs().min(TAU);
            let segments = ((span / TAU) * CIRCLE_SEGMENTS as f32).ceil().max(1.0) as usize;
            Some((arc_points(*radius, *start_angle, *end_angle, segments), false))
        }
    }
}

fn arc_points(radius: f32, start: f32, end: f32, segments: usize) -> Vec<Vec2> {
    let closed = (end - start).abs() >= TAU;
    let count = if closed { segments } else { segments + 1 };
    (0..count)
        .map(|index| {
            let angle = start + (end - start) * index as f32 / segments as f32;
            Vec2::from_angle(angle) * radius
        })
        .collect()
}

fn rect_points(size: Vec2, corner_radius: f32) -> Vec<Vec2> {
    let half = size.abs() * 0.5;
    let radius = corner_radius.clamp(0.0, half.x.min(half.y));
    if radius <= f32::EPSILON {
        return vec![
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ];
    }

    let inner = half - Vec2::splat(radius);
    let corners = [
        (Vec2::new(inner.x, inner.y), 0.0),
        (Vec2::new(-inner.x, inner.y), FRAC_PI_2),
        (Vec2::new(-inner.x, -inner.y), 2.0 * FRAC_PI_2),
        (Vec2::new(inner.x, -inner.y), 3.0 * FRAC_PI_2),
    ];
    corners
        .iter()
        .flat_map(|(center, start)| {
            (0..=CORNER_SEGMENTS).map(move |index| {
                let angle = start + FRAC_PI_2 * index as f32 / CORNER_SEGMENTS as f32;
                *center + Vec2::from_angle(angle) * radius
            })
        })
        .collect()
}

fn faded(color: Color, alpha: f32) -> Option<Color> {
    let alpha = (color.alpha * alpha).clamp(0.0, 1.0);
    (alpha > 0.0).then_some(color.with_alpha(alpha))
}

/// Converts one draw item into screen-space primitives appended to `out`.
pub(crate) fn primitives(
    item: &DrawItem<'_>,
    view: &CameraView,
    viewport: Vec2,
    out: &mut Vec<Primitive>,
) {
    let node = item.node;
    let Some((local, closed)) = outline(&node.shape) else {
        return;
    };
    let transform: &WorldTransform = &item.transform;
    let points: Vec<Vec2> = local
        .iter()
        .map(|point| view.world_to_screen(transform.apply(*point), viewport))
        .collect();
    let pixels_per_unit =
        (transform.scale.x.abs() + transform.scale.y.abs()) * 0.5 / view.scale.max(f32::EPSILON);

    let (outline_color, outline_width) = match &node.shape {
        Shape::Ring { thickness, .. } | Shape::Arc { thickness, .. } => (
            node.stroke.map(|stroke| stroke.color).or(node.fill),
            *thickness,
        ),
        _ => (
            node.stroke.map(|stroke| stroke.color),
            node.stroke.map_or(0.0, |stroke| stroke.width),
        ),
    };
    let filled = closed && !matches!(node.shape, Shape::Ring { .. });

    if node.glow > 0.0 {
        let glow_color = outline_color.or(node.fill.filter(|_| filled));
        if let Some(color) = glow_color.and_then(|color| faded(color, transform.alpha * GLOW_ALPHA)) {
            out.push(Primitive::Path {
                points: points.clone(),
                closed,
                width: (outline_width + node.glow) * pixels_per_unit,
                color,
            });
        }
    }

    if filled {
        if let Some(color) = node.fill.and_then(|fill| faded(fill, transform.alpha)) {
            out.push(Primitive::Fill {
                points: points.clone(),
                color,
            });
        }
    }

    if let Some(color) = outline_color.and_then(|color| faded(color, transform.alpha)) {
        if outline_width > 0.0 {
            out.push(Primitive::Path {
                points,
                closed,
                width: (outline_width * pixels_per_unit).max(1.0),
                color,
            });
        }
    }
}

fn to_macroquad(point: Vec2) -> MacroquadVec2 {
    MacroquadVec2::new(point.x, point.y)
}

/// Issues the macroquad calls for a primitive.
pub(crate) fn emit(primitive: &Primitive) {
    match primitive {
        Primitive::Fill { points, color } => {
            if points.len() < 3 {
                return;
            }
            let color = crate::to_macroquad_color(*color);
            let centroid = points.iter().copied().sum::<Vec2>() / points.len() as f32;
            for (index, point) in points.iter().enumerate() {
                let next = points[(index + 1) % points.len()];
                macroquad::shapes::draw_triangle(
                    to_macroquad(centroid),
                    to_macroquad(*point),
                    to_macroquad(next),
                    color,
                );
            }
        }
        Primitive::Path {
            points,
            closed,
            width,
            color,
        } => {
            let color = crate::to_macroquad_color(*color);
            for pair in points.windows(2) {
                macroquad::shapes::draw_line(pair[0].x, pair[0].y, pair[1].x, pair[1].y, *width, color);
            }
            if *closed && points.len() > 2 {
                if let (Some(last), Some(first)) = (points.last(), points.first()) {
                    macroquad::shapes::draw_line(last.x, last.y, first.x, first.y, *width, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewall_defence_scene::{NodeSpec, SceneGraph};

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    fn view() -> CameraView {
        CameraView {
            position: Vec2::ZERO,
            scale: 2.0,
            shake_offset: Vec2::ZERO,
        }
    }

    fn collect(graph: &SceneGraph) -> Vec<Primitive> {
        let mut out = Vec::new();
        for item in graph.draw_list() {
            primitives(&item, &view(), VIEWPORT, &mut out);
        }
        out
    }

    #[test]
    fn sharp_rects_have_four_corners() {
        let points = rect_points(Vec2::new(4.0, 2.0), 0.0);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Vec2::new(-2.0, -1.0));
        assert_eq!(points[2], Vec2::new(2.0, 1.0));
    }

    #[test]
    fn rounded_rects_stay_inside_their_bounds() {
        let points = rect_points(Vec2::new(10.0, 6.0), 2.0);
        assert_eq!(points.len(), 4 * (CORNER_SEGMENTS + 1));
        assert!(points
            .iter()
            .all(|point| point.x.abs() <= 5.0 + 1e-4 && point.y.abs() <= 3.0 + 1e-4));
    }

    #[test]
    fn open_arcs_include_both_end_points() {
        let points = arc_points(10.0, 0.0, FRAC_PI_2, 4);
        assert_eq!(points.len(), 5);
        assert!((points[0] - Vec2::new(10.0, 0.0)).length() < 1e-4);
        assert!((points[4] - Vec2::new(0.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn filled_circle_is_projected_through_the_camera() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let _ = graph.spawn_child(
            root,
            NodeSpec::circle(20.0)
                .fill(Color::WHITE)
                .at(Vec2::new(100.0, 0.0)),
        );

        let out = collect(&graph);
        let [Primitive::Fill { points, color }] = out.as_slice() else {
            panic!("expected a single fill, got {out:?}");
        };
        assert_eq!(*color, Color::WHITE);
        assert_eq!(points.len(), CIRCLE_SEGMENTS);
        // Camera scale 2 halves world distances on screen.
        assert!((points[0] - Vec2::new(460.0, 300.0)).length() < 1e-3);
    }

    #[test]
    fn rings_only_stroke_and_glow_adds_a_wider_pass() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let _ = graph.spawn_child(
            root,
            NodeSpec::ring(30.0, 4.0)
                .stroke(Color::WHITE, 1.0)
                .fill(Color::BLACK)
                .glow(6.0),
        );

        let out = collect(&graph);
        assert_eq!(out.len(), 2);
        let widths: Vec<f32> = out
            .iter()
            .map(|primitive| match primitive {
                Primitive::Path { width, .. } => *width,
                Primitive::Fill { .. } => panic!("rings are never filled"),
            })
            .collect();
        assert_eq!(widths, vec![5.0, 2.0]);
    }

    #[test]
    fn transparent_nodes_produce_nothing() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let _ = graph.spawn_child(
            root,
            NodeSpec::rect(Vec2::splat(10.0))
                .fill(Color::WHITE)
                .alpha(0.0),
        );

        assert!(collect(&graph).is_empty());
    }
}
