//! Declarative animation actions and the runtime that steps them.
//!
//! An [`Action`] is an immutable description. When it is attached to a node
//! through [`SceneGraph::run_action`](crate::SceneGraph::run_action) it is
//! turned into running state that captures start values on its first step,
//! so the same description can be reused on any number of nodes.

use std::collections::VecDeque;

use firewall_defence_core::{geometry::normalize_angle, Color};
use glam::Vec2;

use crate::node::Node;

/// Upper bound on completed iterations a repeat may run inside one step.
const MAX_REPEAT_ITERATIONS_PER_STEP: u32 = 64;

/// Easing curve applied to the progress of a timed action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Timing {
    /// Constant speed.
    #[default]
    Linear,
    /// Starts slow and accelerates.
    EaseIn,
    /// Starts fast and decelerates.
    EaseOut,
    /// Accelerates then decelerates.
    EaseInOut,
}

impl Timing {
    /// Maps linear progress in `0.0..=1.0` onto the easing curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Animation or structural change applied to a node over time.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Moves the node to an absolute local position.
    MoveTo {
        /// Destination position.
        target: Vec2,
        /// Duration in seconds.
        duration: f32,
        /// Easing curve.
        timing: Timing,
    },
    /// Moves the node by a relative offset.
    MoveBy {
        /// Offset added to the start position.
        delta: Vec2,
        /// Duration in seconds.
        duration: f32,
        /// Easing curve.
        timing: Timing,
    },
    /// Scales the node to an absolute per-axis scale.
    ScaleTo {
        /// Destination scale.
        scale: Vec2,
        /// Duration in seconds.
        duration: f32,
        /// Easing curve.
        timing: Timing,
    },
    /// Fades the node to an absolute opacity.
    FadeTo {
        /// Destination opacity.
        alpha: f32,
        /// Duration in seconds.
        duration: f32,
        /// Easing curve.
        timing: Timing,
    },
    /// Rotates the node by a relative angle.
    RotateBy {
        /// Angle added to the start rotation, in radians.
        angle: f32,
        /// Duration in seconds.
        duration: f32,
        /// Easing curve.
        timing: Timing,
    },
    /// Rotates the node to an absolute angle along the shortest arc.
    RotateTo {
        /// Destination rotation, in radians.
        angle: f32,
        /// Duration in seconds.
        duration: f32,
        /// Easing curve.
        timing: Timing,
    },
    /// Blends the fill color.
    ColorTo {
        /// Destination fill color.
        color: Color,
        /// Duration in seconds.
        duration: f32,
        /// Easing curve.
        timing: Timing,
    },
    /// Blends the stroke color.
    StrokeColorTo {
        /// Destination stroke color.
        color: Color,
        /// Duration in seconds.
        duration: f32,
        /// Easing curve.
        timing: Timing,
    },
    /// Does nothing for a while.
    Wait {
        /// Duration in seconds.
        duration: f32,
    },
    /// Runs actions one after another.
    Sequence(Vec<Action>),
    /// Runs actions simultaneously and finishes when all of them finish.
    Group(Vec<Action>),
    /// Runs an action a fixed number of times.
    Repeat {
        /// Repeated action.
        action: Box<Action>,
        /// Number of repetitions.
        count: u32,
    },
    /// Runs an action until it is removed.
    RepeatForever(Box<Action>),
    /// Hides the node.
    Hide,
    /// Shows the node.
    Unhide,
    /// Destroys the node and its subtree.
    RemoveFromParent,
    /// Detaches the node and hands it back to its pool.
    Recycle,
}

impl Action {
    /// Moves to `target` over `duration` seconds.
    #[must_use]
    pub fn move_to(target: Vec2, duration: f32) -> Self {
        Self::MoveTo {
            target,
            duration,
            timing: Timing::Linear,
        }
    }

    /// Moves by `delta` over `duration` seconds.
    #[must_use]
    pub fn move_by(delta: Vec2, duration: f32) -> Self {
        Self::MoveBy {
            delta,
            duration,
            timing: Timing::Linear,
        }
    }

    /// Scales uniformly to `scale` over `duration` seconds.
    #[must_use]
    pub fn scale_to(scale: f32, duration: f32) -> Self {
        Self::scale_xy_to(Vec2::splat(scale), duration)
    }

    /// Scales each axis to `scale` over `duration` seconds.
    #[must_use]
    pub fn scale_xy_to(scale: Vec2, duration: f32) -> Self {
        Self::ScaleTo {
            scale,
            duration,
            timing: Timing::Linear,
        }
    }

    /// Fades to `alpha` over `duration` seconds.
    #[must_use]
    pub fn fade_to(alpha: f32, duration: f32) -> Self {
        Self::FadeTo {
            alpha: alpha.clamp(0.0, 1.0),
            duration,
            timing: Timing::Linear,
        }
    }

    /// Fades to fully transparent.
    #[must_use]
    pub fn fade_out(duration: f32) -> Self {
        Self::fade_to(0.0, duration)
    }

    /// Fades to fully opaque.
    #[must_use]
    pub fn fade_in(duration: f32) -> Self {
        Self::fade_to(1.0, duration)
    }

    /// Rotates by `angle` radians over `duration` seconds.
    #[must_use]
    pub fn rotate_by(angle: f32, duration: f32) -> Self {
        Self::RotateBy {
            angle,
            duration,
            timing: Timing::Linear,
        }
    }

    /// Rotates to `angle` radians along the shortest arc.
    #[must_use]
    pub fn rotate_to(angle: f32, duration: f32) -> Self {
        Self::RotateTo {
            angle,
            duration,
            timing: Timing::Linear,
        }
    }

    /// Blends the fill towards `color`.
    #[must_use]
    pub fn color_to(color: Color, duration: f32) -> Self {
        Self::ColorTo {
            color,
            duration,
            timing: Timing::Linear,
        }
    }

    /// Blends the stroke towards `color`.
    #[must_use]
    pub fn stroke_color_to(color: Color, duration: f32) -> Self {
        Self::StrokeColorTo {
            color,
            duration,
            timing: Timing::Linear,
        }
    }

    /// Waits for `duration` seconds.
    #[must_use]
    pub fn wait(duration: f32) -> Self {
        Self::Wait { duration }
    }

    /// Runs `actions` one after another.
    #[must_use]
    pub fn sequence(actions: Vec<Action>) -> Self {
        Self::Sequence(actions)
    }

    /// Runs `actions` simultaneously.
    #[must_use]
    pub fn group(actions: Vec<Action>) -> Self {
        Self::Group(actions)
    }

    /// Runs `action` `count` times.
    #[must_use]
    pub fn repeat(action: Action, count: u32) -> Self {
        Self::Repeat {
            action: Box::new(action),
            count,
        }
    }

    /// Runs `action` until removed.
    #[must_use]
    pub fn forever(action: Action) -> Self {
        Self::RepeatForever(Box::new(action))
    }

    /// Endless breathing scale animation between 1.0 and `scale`.
    #[must_use]
    pub fn pulse(scale: f32, period: f32) -> Self {
        let half = (period * 0.5).max(0.0);
        Self::forever(Self::sequence(vec![
            Self::scale_to(scale, half).with_timing(Timing::EaseInOut),
            Self::scale_to(1.0, half).with_timing(Timing::EaseInOut),
        ]))
    }

    /// Endless opacity flicker between `low` and 1.0.
    #[must_use]
    pub fn blink(low: f32, period: f32) -> Self {
        let half = (period * 0.5).max(0.0);
        Self::forever(Self::sequence(vec![
            Self::fade_to(low, half).with_timing(Timing::EaseInOut),
            Self::fade_to(1.0, half).with_timing(Timing::EaseInOut),
        ]))
    }

    /// Fades out and hands the node back to its pool.
    #[must_use]
    pub fn fade_out_and_recycle(duration: f32) -> Self {
        Self::sequence(vec![Self::fade_out(duration), Self::Recycle])
    }

    /// Fades out and destroys the node.
    #[must_use]
    pub fn fade_out_and_remove(duration: f32) -> Self {
        Self::sequence(vec![Self::fade_out(duration), Self::RemoveFromParent])
    }

    /// Replaces the easing curve of a timed action. Other actions are returned unchanged.
    #[must_use]
    pub fn with_timing(mut self, new_timing: Timing) -> Self {
        match &mut self {
            Self::MoveTo { timing, .. }
            | Self::MoveBy { timing, .. }
            | Self::ScaleTo { timing, .. }
            | Self::FadeTo { timing, .. }
            | Self::RotateBy { timing, .. }
            | Self::RotateTo { timing, .. }
            | Self::ColorTo { timing, .. }
            | Self::StrokeColorTo { timing, .. } => *timing = new_timing,
            _ => {}
        }
        self
    }

    /// Total running time in seconds, or `None` for actions that never finish.
    #[must_use]
    pub fn duration(&self) -> Option<f32> {
        match self {
            Self::MoveTo { duration, .. }
            | Self::MoveBy { duration, .. }
            | Self::ScaleTo { duration, .. }
            | Self::FadeTo { duration, .. }
            | Self::RotateBy { duration, .. }
            | Self::RotateTo { duration, .. }
            | Self::ColorTo { duration, .. }
            | Self::StrokeColorTo { duration, .. }
            | Self::Wait { duration } => Some(duration.max(0.0)),
            Self::Sequence(actions) => actions.iter().map(Self::duration).sum(),
            Self::Group(actions) => actions
                .iter()
                .map(Self::duration)
                .try_fold(0.0_f32, |longest, duration| {
                    duration.map(|duration| longest.max(duration))
                }),
            Self::Repeat { action, count } => action.duration().map(|d| d * *count as f32),
            Self::RepeatForever(_) => None,
            Self::Hide | Self::Unhide | Self::RemoveFromParent | Self::Recycle => Some(0.0),
        }
    }
}

/// Structural change requested by an action that the graph must apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Structural {
    Remove,
    Recycle,
}

/// Action attached to a node, optionally under a replaceable key.
#[derive(Debug)]
pub(crate) struct RunningAction {
    pub(crate) key: Option<String>,
    state: ActionState,
}

impl RunningAction {
    pub(crate) fn new(key: Option<String>, action: Action) -> Self {
        Self {
            key,
            state: ActionState::from_action(action),
        }
    }

    /// Advances the action. Returns `true` once it has finished.
    pub(crate) fn step(
        &mut self,
        node: &mut Node,
        dt: f32,
        structural: &mut Option<Structural>,
    ) -> bool {
        self.state.step(node, dt, structural).is_some()
    }
}

#[derive(Clone, Copy, Debug)]
enum Property {
    Position,
    Scale,
    Alpha,
    Rotation,
    Fill,
    StrokeColor,
}

#[derive(Clone, Copy, Debug)]
enum Goal {
    To(Vec2),
    By(Vec2),
    Scalar(f32),
    Angle(f32),
    AngleBy(f32),
    Color(Color),
}

#[derive(Clone, Copy, Debug)]
enum Endpoints {
    Vector(Vec2, Vec2),
    Scalar(f32, f32),
    Color(Color, Color),
}

#[derive(Debug)]
enum ActionState {
    Tween {
        property: Property,
        goal: Goal,
        duration: f32,
        elapsed: f32,
        timing: Timing,
        endpoints: Option<Endpoints>,
    },
    Wait {
        duration: f32,
        elapsed: f32,
    },
    Instant(InstantKind),
    Sequence {
        pending: VecDeque<Action>,
        current: Option<Box<ActionState>>,
    },
    Group {
        children: Vec<Option<ActionState>>,
    },
    Repeat {
        template: Box<Action>,
        remaining: Option<u32>,
        current: Box<ActionState>,
    },
}

#[derive(Clone, Copy, Debug)]
enum InstantKind {
    Hide,
    Unhide,
    Remove,
    Recycle,
}

impl ActionState {
    fn tween(property: Property, goal: Goal, duration: f32, timing: Timing) -> Self {
        Self::Tween {
            property,
            goal,
            duration: duration.max(0.0),
            elapsed: 0.0,
            timing,
            endpoints: None,
        }
    }

    fn from_action(action: Action) -> Self {
        match action {
            Action::MoveTo {
                target,
                duration,
                timing,
            } => Self::tween(Property::Position, Goal::To(target), duration, timing),
            Action::MoveBy {
                delta,
                duration,
                timing,
            } => Self::tween(Property::Position, Goal::By(delta), duration, timing),
            Action::ScaleTo {
                scale,
                duration,
                timing,
            } => Self::tween(Property::Scale, Goal::To(scale), duration, timing),
            Action::FadeTo {
                alpha,
                duration,
                timing,
            } => Self::tween(Property::Alpha, Goal::Scalar(alpha), duration, timing),
            Action::RotateBy {
                angle,
                duration,
                timing,
            } => Self::tween(Property::Rotation, Goal::AngleBy(angle), duration, timing),
            Action::RotateTo {
                angle,
                duration,
                timing,
            } => Self::tween(Property::Rotation, Goal::Angle(angle), duration, timing),
            Action::ColorTo {
                color,
                duration,
                timing,
            } => Self::tween(Property::Fill, Goal::Color(color), duration, timing),
            Action::StrokeColorTo {
                color,
                duration,
                timing,
            } => Self::tween(Property::StrokeColor, Goal::Color(color), duration, timing),
            Action::Wait { duration } => Self::Wait {
                duration: duration.max(0.0),
                elapsed: 0.0,
            },
            Action::Sequence(actions) => Self::Sequence {
                pending: actions.into(),
                current: None,
            },
            Action::Group(actions) => Self::Group {
                children: actions
                    .into_iter()
                    .map(|action| Some(Self::from_action(action)))
                    .collect(),
            },
            Action::Repeat { action, count } => {
                let current = Box::new(Self::from_action((*action).clone()));
                Self::Repeat {
                    template: action,
                    remaining: Some(count),
                    current,
                }
            }
            Action::RepeatForever(action) => {
                let current = Box::new(Self::from_action((*action).clone()));
                Self::Repeat {
                    template: action,
                    remaining: None,
                    current,
                }
            }
            Action::Hide => Self::Instant(InstantKind::Hide),
            Action::Unhide => Self::Instant(InstantKind::Unhide),
            Action::RemoveFromParent => Self::Instant(InstantKind::Remove),
            Action::Recycle => Self::Instant(InstantKind::Recycle),
        }
    }

    /// Steps the state by `dt` seconds. Returns the unused time once finished.
    fn step(
        &mut self,
        node: &mut Node,
        dt: f32,
        structural: &mut Option<Structural>,
    ) -> Option<f32> {
        match self {
            Self::Tween {
                property,
                goal,
                duration,
                elapsed,
                timing,
                endpoints,
            } => {
                let endpoints = *endpoints.get_or_insert_with(|| capture(node, *property, *goal));
                *elapsed += dt;
                if *duration <= f32::EPSILON || *elapsed >= *duration {
                    apply(node, *property, endpoints, 1.0);
                    let leftover = if *duration <= f32::EPSILON {
                        dt
                    } else {
                        *elapsed - *duration
                    };
                    return Some(leftover.max(0.0));
                }
                apply(node, *property, endpoints, timing.apply(*elapsed / *duration));
                None
            }
            Self::Wait { duration, elapsed } => {
                *elapsed += dt;
                if *elapsed >= *duration {
                    let leftover = if *duration <= f32::EPSILON {
                        dt
                    } else {
                        *elapsed - *duration
                    };
                    Some(leftover.max(0.0))
                } else {
                    None
                }
            }
            Self::Instant(kind) => {
                match kind {
                    InstantKind::Hide => node.hidden = true,
                    InstantKind::Unhide => node.hidden = false,
                    InstantKind::Remove => *structural = Some(Structural::Remove),
                    InstantKind::Recycle => *structural = Some(Structural::Recycle),
                }
                Some(dt)
            }
            Self::Sequence { pending, current } => {
                let mut remaining = dt;
                loop {
                    if structural.is_some() {
                        return Some(remaining);
                    }
                    if current.is_none() {
                        match pending.pop_front() {
                            Some(next) => *current = Some(Box::new(Self::from_action(next))),
                            None => return Some(remaining),
                        }
                    }
                    let Some(state) = current.as_mut() else {
                        return Some(remaining);
                    };
                    match state.step(node, remaining, structural) {
                        Some(leftover) => {
                            *current = None;
                            remaining = leftover;
                        }
                        None => return None,
                    }
                }
            }
            Self::Group { children } => {
                let mut finished = true;
                let mut leftover = dt;
                for child in children.iter_mut() {
                    let Some(state) = child else {
                        continue;
                    };
                    match state.step(node, dt, structural) {
                        Some(child_leftover) => {
                            leftover = leftover.min(child_leftover);
                            *child = None;
                        }
                        None => finished = false,
                    }
                }
                finished.then_some(leftover)
            }
            Self::Repeat {
                template,
                remaining,
                current,
            } => {
                if *remaining == Some(0) {
                    return Some(dt);
                }
                let mut budget = dt;
                let mut iterations = 0;
                loop {
                    let leftover = current.step(node, budget, structural)?;
                    if let Some(count) = remaining {
                        *count = count.saturating_sub(1);
                        if *count == 0 {
                            return Some(leftover);
                        }
                    }
                    **current = Self::from_action((**template).clone());
                    iterations += 1;
                    if structural.is_some() || iterations >= MAX_REPEAT_ITERATIONS_PER_STEP {
                        return None;
                    }
                    budget = leftover;
                }
            }
        }
    }
}

fn capture(node: &Node, property: Property, goal: Goal) -> Endpoints {
    match (property, goal) {
        (Property::Position, Goal::To(target)) => Endpoints::Vector(node.position, target),
        (Property::Position, Goal::By(delta)) => {
            Endpoints::Vector(node.position, node.position + delta)
        }
        (Property::Scale, Goal::To(target)) => Endpoints::Vector(node.scale, target),
        (Property::Scale, Goal::By(delta)) => Endpoints::Vector(node.scale, node.scale + delta),
        (Property::Alpha, Goal::Scalar(target)) => Endpoints::Scalar(node.alpha, target),
        (Property::Rotation, Goal::Angle(target)) => Endpoints::Scalar(
            node.rotation,
            node.rotation + normalize_angle(target - node.rotation),
        ),
        (Property::Rotation, Goal::AngleBy(delta)) => {
            Endpoints::Scalar(node.rotation, node.rotation + delta)
        }
        (Property::Fill, Goal::Color(target)) => {
            Endpoints::Color(node.fill.unwrap_or(target), target)
        }
        (Property::StrokeColor, Goal::Color(target)) => Endpoints::Color(
            node.stroke.map(|stroke| stroke.color).unwrap_or(target),
            target,
        ),
        // Constructors never pair a property with a mismatched goal; hold still.
        (Property::Position, _) => Endpoints::Vector(node.position, node.position),
        (Property::Scale, _) => Endpoints::Vector(node.scale, node.scale),
        (Property::Alpha, _) => Endpoints::Scalar(node.alpha, node.alpha),
        (Property::Rotation, _) => Endpoints::Scalar(node.rotation, node.rotation),
        (Property::Fill, _) | (Property::StrokeColor, _) => {
            Endpoints::Color(Color::CLEAR, Color::CLEAR)
        }
    }
}

fn apply(node: &mut Node, property: Property, endpoints: Endpoints, t: f32) {
    // Land exactly on the target once complete.
    let endpoints = if t >= 1.0 {
        match endpoints {
            Endpoints::Vector(_, to) => Endpoints::Vector(to, to),
            Endpoints::Scalar(_, to) => Endpoints::Scalar(to, to),
            Endpoints::Color(_, to) => Endpoints::Color(to, to),
        }
    } else {
        endpoints
    };
    match (property, endpoints) {
        (Property::Position, Endpoints::Vector(from, to)) => node.position = from.lerp(to, t),
        (Property::Scale, Endpoints::Vector(from, to)) => node.scale = from.lerp(to, t),
        (Property::Alpha, Endpoints::Scalar(from, to)) => {
            node.alpha = (from + (to - from) * t).clamp(0.0, 1.0);
        }
        (Property::Rotation, Endpoints::Scalar(from, to)) => {
            node.rotation = from + (to - from) * t;
        }
        (Property::Fill, Endpoints::Color(from, to)) => node.fill = Some(from.lerp(to, t)),
        (Property::StrokeColor, Endpoints::Color(from, to)) => {
            if let Some(stroke) = node.stroke.as_mut() {
                stroke.color = from.lerp(to, t);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSpec;

    fn node() -> Node {
        Node::from_spec(NodeSpec::circle(4.0))
    }

    fn run(node: &mut Node, action: Action, steps: &[f32]) -> (bool, Option<Structural>) {
        let mut running = RunningAction::new(None, action);
        let mut structural = None;
        let mut finished = false;
        for &dt in steps {
            finished = running.step(node, dt, &mut structural);
            if finished {
                break;
            }
        }
        (finished, structural)
    }

    #[test]
    fn easing_curves_hit_end_points() {
        for timing in [
            Timing::Linear,
            Timing::EaseIn,
            Timing::EaseOut,
            Timing::EaseInOut,
        ] {
            assert_eq!(timing.apply(0.0), 0.0);
            assert_eq!(timing.apply(1.0), 1.0);
        }
        assert!(Timing::EaseIn.apply(0.5) < 0.5);
        assert!(Timing::EaseOut.apply(0.5) > 0.5);
    }

    #[test]
    fn move_to_interpolates_from_captured_start() {
        let mut node = node();
        node.position = Vec2::new(10.0, 0.0);
        let mut running = RunningAction::new(None, Action::move_to(Vec2::new(20.0, 0.0), 1.0));
        let mut structural = None;

        assert!(!running.step(&mut node, 0.5, &mut structural));
        assert_eq!(node.position, Vec2::new(15.0, 0.0));
        assert!(running.step(&mut node, 0.5, &mut structural));
        assert_eq!(node.position, Vec2::new(20.0, 0.0));
    }

    #[test]
    fn sequence_carries_leftover_time_into_next_child() {
        let mut node = node();
        let action = Action::sequence(vec![
            Action::wait(0.25),
            Action::move_by(Vec2::new(8.0, 0.0), 1.0),
        ]);
        let (finished, _) = run(&mut node, action, &[0.75]);

        assert!(!finished);
        assert_eq!(node.position, Vec2::new(4.0, 0.0));
    }

    #[test]
    fn group_finishes_with_its_longest_child() {
        let mut node = node();
        let action = Action::group(vec![Action::fade_out(0.25), Action::scale_to(2.0, 1.0)]);
        let mut running = RunningAction::new(None, action);
        let mut structural = None;

        assert!(!running.step(&mut node, 0.5, &mut structural));
        assert_eq!(node.alpha, 0.0);
        assert!(running.step(&mut node, 0.5, &mut structural));
        assert_eq!(node.scale, Vec2::splat(2.0));
    }

    #[test]
    fn repeat_runs_the_requested_number_of_times() {
        let mut node = node();
        let action = Action::repeat(Action::move_by(Vec2::new(1.0, 0.0), 0.1), 3);
        let (finished, _) = run(&mut node, action, &[0.1; 10]);

        assert!(finished);
        assert!((node.position.x - 3.0).abs() < 1e-4);
    }

    #[test]
    fn repeat_forever_with_instant_body_does_not_spin() {
        let mut node = node();
        let action = Action::forever(Action::Hide);
        let (finished, _) = run(&mut node, action, &[0.016]);

        assert!(!finished);
        assert!(node.hidden);
    }

    #[test]
    fn rotate_to_takes_the_shortest_arc() {
        let mut node = node();
        node.rotation = 3.0;
        let (finished, _) = run(&mut node, Action::rotate_to(-3.0, 1.0), &[0.5]);

        assert!(!finished);
        // Halfway along the short arc through PI, not back through zero.
        assert!(node.rotation > 3.0);
    }

    #[test]
    fn fade_out_and_recycle_requests_recycling_after_fade() {
        let mut node = node();
        let (finished, structural) = run(&mut node, Action::fade_out_and_recycle(0.2), &[0.1, 0.1]);

        assert!(finished);
        assert_eq!(structural, Some(Structural::Recycle));
        assert_eq!(node.alpha, 0.0);
    }

    #[test]
    fn durations_compose() {
        let action = Action::sequence(vec![
            Action::wait(0.5),
            Action::group(vec![Action::fade_out(0.2), Action::scale_to(2.0, 0.7)]),
            Action::repeat(Action::wait(0.1), 3),
        ]);

        let duration = action.duration().expect("finite");
        assert!((duration - 1.5).abs() < 1e-5);
        assert_eq!(Action::pulse(1.2, 1.0).duration(), None);
    }
}
