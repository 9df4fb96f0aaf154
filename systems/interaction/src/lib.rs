#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Touch gesture recognition for the board.
//!
//! Raw [`TouchSample`]s are folded into a small state machine that decides
//! whether a finger is tapping, dragging a tower, panning the camera or
//! pinching. Board-level consequences are emitted as [`InteractionCommand`]s
//! for the simulation; camera gestures are applied directly to the
//! [`CameraController`].

use firewall_defence_camera::CameraController;
use firewall_defence_core::{SlotId, TowerArchetype, TowerId};
use glam::Vec2;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

pub use firewall_defence_scene::{TouchPhase, TouchSample};

/// Seconds a finger may rest before a pan releases without inertia.
const PAN_REST: f32 = 0.1;

/// Tuning parameters for [`InteractionController`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Distance in pixels a press must travel before it becomes a drag or pan.
    pub drag_threshold: f32,
    /// Longest press, in seconds, still treated as a tap.
    pub tap_max_duration: f32,
    /// World radius around a touch that picks up a tower.
    pub tower_hit_radius: f32,
    /// World radius within which a dropped tower snaps onto a slot.
    pub slot_snap_radius: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 10.0,
            tap_max_duration: 0.35,
            tower_hit_radius: 28.0,
            slot_snap_radius: 40.0,
        }
    }
}

/// Read access to board occupancy needed to interpret gestures.
pub trait BoardQuery {
    /// Tower whose footprint lies within `radius` of `world`, preferring the closest.
    fn tower_at(&self, world: Vec2, radius: f32) -> Option<TowerId>;

    /// Whether dropping `source` onto `target` merges the two towers.
    fn can_merge(&self, source: TowerId, target: TowerId) -> bool;

    /// Build slot within `radius` of `world`, preferring the closest.
    fn slot_at(&self, world: Vec2, radius: f32) -> Option<SlotId>;

    /// Whether `slot` is unoccupied.
    fn slot_free(&self, slot: SlotId) -> bool;

    /// Slot occupied by `tower`.
    fn tower_slot(&self, tower: TowerId) -> Option<SlotId>;
}

/// Board change requested by a completed gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionCommand {
    /// A tower was tapped.
    SelectTower {
        /// Tapped tower.
        tower: TowerId,
    },
    /// The current selection was dismissed.
    ClearSelection,
    /// A tower was picked up.
    BeginDrag {
        /// Tower being dragged.
        tower: TowerId,
    },
    /// A dragged tower moved.
    DragTo {
        /// Tower being dragged.
        tower: TowerId,
        /// Finger position in world units.
        world: Vec2,
    },
    /// The tower a drop would merge into changed.
    HoverMergeTarget {
        /// Tower being dragged.
        tower: TowerId,
        /// Tower under the finger that accepts the merge, if any.
        target: Option<TowerId>,
    },
    /// A dragged tower was dropped onto a compatible tower.
    MergeTowers {
        /// Tower that was dragged and is consumed.
        source: TowerId,
        /// Tower that absorbs the source.
        target: TowerId,
    },
    /// A dragged tower was dropped onto a free slot.
    MoveTower {
        /// Tower that was dragged.
        tower: TowerId,
        /// Destination slot.
        slot: SlotId,
    },
    /// A drag ended without a valid drop.
    CancelDrag {
        /// Tower returning to its slot.
        tower: TowerId,
    },
    /// A free slot was tapped while a placement was armed.
    PlaceTower {
        /// Archetype to build.
        archetype: TowerArchetype,
        /// Slot to build on.
        slot: SlotId,
    },
    /// Empty ground was tapped.
    TapEmpty {
        /// Tap position in world units.
        world: Vec2,
    },
}

/// Touch identifier paired with its latest screen position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedTouch {
    /// Platform identifier of the touch.
    pub id: u64,
    /// Latest position in screen pixels.
    pub position: Vec2,
}

/// Gesture currently being recognised.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InteractionState {
    /// No finger is down.
    #[default]
    Idle,
    /// A finger is down but has not moved far enough to drag.
    Pressing {
        /// Tower under the finger when it went down.
        tower: Option<TowerId>,
        /// Screen position where the finger went down.
        start: Vec2,
        /// The pressing finger.
        touch: TrackedTouch,
        /// Controller time when the finger went down.
        started_at: f32,
    },
    /// A tower follows the finger.
    DraggingTower {
        /// Tower being dragged.
        tower: TowerId,
        /// World position where the drag started.
        origin: Vec2,
        /// Current finger position in world units.
        current: Vec2,
        /// The dragging finger.
        touch: TrackedTouch,
        /// Merge target currently highlighted.
        hover: Option<TowerId>,
    },
    /// The camera follows the finger.
    Panning {
        /// The panning finger.
        touch: TrackedTouch,
        /// Estimated finger velocity in pixels per second.
        velocity: Vec2,
        /// Controller time of the last movement.
        moved_at: f32,
    },
    /// Two fingers zoom the camera.
    Pinching {
        /// First finger.
        a: TrackedTouch,
        /// Second finger.
        b: TrackedTouch,
        /// Finger distance at the previous update, in pixels.
        last_distance: f32,
    },
}

/// Turns touch samples into camera gestures and board commands.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
    config: InteractionConfig,
    state: InteractionState,
    clock: f32,
    selected: Option<TowerId>,
    placement: Option<TowerArchetype>,
}

impl InteractionController {
    /// Creates an idle controller.
    #[must_use]
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active tuning.
    #[must_use]
    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Gesture currently being recognised.
    #[must_use]
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Tower selected by the last tap, if any.
    #[must_use]
    pub fn selected(&self) -> Option<TowerId> {
        self.selected
    }

    /// Forgets the selection without emitting a command.
    pub fn forget_selection(&mut self) {
        self.selected = None;
    }

    /// Archetype placed by the next tap on a free slot, if armed.
    #[must_use]
    pub fn placement(&self) -> Option<TowerArchetype> {
        self.placement
    }

    /// Arms a one-shot placement of `archetype`.
    pub fn arm_placement(&mut self, archetype: TowerArchetype) {
        debug!("placement armed for {}", archetype.name());
        self.placement = Some(archetype);
    }

    /// Clears an armed placement.
    pub fn disarm_placement(&mut self) {
        self.placement = None;
    }

    /// Advances the controller clock used for tap timing and pan velocity.
    pub fn advance(&mut self, dt: f32) {
        self.clock += dt.max(0.0);
    }

    /// Folds `touches` into the gesture state.
    ///
    /// `out` is cleared and receives the board commands in the order the
    /// touches produced them.
    pub fn handle(
        &mut self,
        touches: &[TouchSample],
        board: &dyn BoardQuery,
        camera: &mut CameraController,
        out: &mut Vec<InteractionCommand>,
    ) {
        out.clear();
        for touch in touches {
            let state = std::mem::take(&mut self.state);
            self.state = match touch.phase {
                TouchPhase::Began => self.touch_began(state, touch, board, camera, out),
                TouchPhase::Moved => self.touch_moved(state, touch, board, camera, out),
                TouchPhase::Ended => self.touch_ended(state, touch, board, camera, out),
                TouchPhase::Cancelled => Self::touch_cancelled(state, touch, camera, out),
            };
        }
    }

    fn touch_began(
        &mut self,
        state: InteractionState,
        touch: &TouchSample,
        board: &dyn BoardQuery,
        camera: &mut CameraController,
        out: &mut Vec<InteractionCommand>,
    ) -> InteractionState {
        let second = TrackedTouch {
            id: touch.id,
            position: touch.position,
        };
        match state {
            InteractionState::Idle => {
                let world = camera.screen_to_world(touch.position);
                InteractionState::Pressing {
                    tower: board.tower_at(world, self.config.tower_hit_radius),
                    start: touch.position,
                    touch: second,
                    started_at: self.clock,
                }
            }
            InteractionState::Pressing { touch: first, .. } if first.id != touch.id => {
                begin_pinch(first, second, camera)
            }
            InteractionState::DraggingTower {
                tower,
                touch: first,
                ..
            } if first.id != touch.id => {
                out.push(InteractionCommand::CancelDrag { tower });
                begin_pinch(first, second, camera)
            }
            InteractionState::Panning { touch: first, .. } if first.id != touch.id => {
                camera.end_pan(Vec2::ZERO);
                begin_pinch(first, second, camera)
            }
            other => other,
        }
    }

    fn touch_moved(
        &mut self,
        state: InteractionState,
        touch: &TouchSample,
        board: &dyn BoardQuery,
        camera: &mut CameraController,
        out: &mut Vec<InteractionCommand>,
    ) -> InteractionState {
        match state {
            InteractionState::Pressing {
                tower,
                start,
                touch: pressing,
                started_at,
            } if pressing.id == touch.id => {
                if touch.position.distance(start) <= self.config.drag_threshold {
                    return InteractionState::Pressing {
                        tower,
                        start,
                        touch: TrackedTouch {
                            id: touch.id,
                            position: touch.position,
                        },
                        started_at,
                    };
                }
                match tower {
                    Some(tower) => {
                        trace!("drag started on tower {}", tower.get());
                        out.push(InteractionCommand::BeginDrag { tower });
                        let origin = camera.screen_to_world(start);
                        self.drag(tower, origin, None, touch, board, camera, out)
                    }
                    None => {
                        camera.begin_pan();
                        camera.pan_by(touch.position - start);
                        InteractionState::Panning {
                            touch: TrackedTouch {
                                id: touch.id,
                                position: touch.position,
                            },
                            velocity: Vec2::ZERO,
                            moved_at: self.clock,
                        }
                    }
                }
            }
            InteractionState::DraggingTower {
                tower,
                origin,
                touch: dragging,
                hover,
                ..
            } if dragging.id == touch.id => {
                self.drag(tower, origin, hover, touch, board, camera, out)
            }
            InteractionState::Panning {
                touch: panning,
                velocity,
                moved_at,
            } if panning.id == touch.id => {
                let delta = touch.position - panning.position;
                camera.pan_by(delta);
                let elapsed = self.clock - moved_at;
                let velocity = if elapsed > f32::EPSILON {
                    delta / elapsed
                } else {
                    velocity
                };
                InteractionState::Panning {
                    touch: TrackedTouch {
                        id: touch.id,
                        position: touch.position,
                    },
                    velocity,
                    moved_at: self.clock,
                }
            }
            InteractionState::Pinching {
                mut a,
                mut b,
                last_distance,
            } if a.id == touch.id || b.id == touch.id => {
                if a.id == touch.id {
                    a.position = touch.position;
                } else {
                    b.position = touch.position;
                }
                let distance = a.position.distance(b.position);
                if last_distance > f32::EPSILON && distance > f32::EPSILON {
                    camera.pinch(distance / last_distance, (a.position + b.position) * 0.5);
                }
                InteractionState::Pinching {
                    a,
                    b,
                    last_distance: distance,
                }
            }
            other => other,
        }
    }

    fn touch_ended(
        &mut self,
        state: InteractionState,
        touch: &TouchSample,
        board: &dyn BoardQuery,
        camera: &mut CameraController,
        out: &mut Vec<InteractionCommand>,
    ) -> InteractionState {
        match state {
            InteractionState::Pressing {
                tower,
                touch: pressing,
                started_at,
                ..
            } if pressing.id == touch.id => {
                if self.clock - started_at <= self.config.tap_max_duration {
                    let world = camera.screen_to_world(touch.position);
                    self.tap(tower, world, board, out);
                }
                InteractionState::Idle
            }
            InteractionState::DraggingTower {
                tower,
                touch: dragging,
                ..
            } if dragging.id == touch.id => {
                let world = camera.screen_to_world(touch.position);
                out.push(self.drop_tower(tower, world, board));
                InteractionState::Idle
            }
            InteractionState::Panning {
                touch: panning,
                velocity,
                moved_at,
            } if panning.id == touch.id => {
                let resting = self.clock - moved_at > PAN_REST;
                camera.end_pan(if resting { Vec2::ZERO } else { velocity });
                InteractionState::Idle
            }
            InteractionState::Pinching { a, b, .. } if a.id == touch.id || b.id == touch.id => {
                camera.end_pinch();
                camera.begin_pan();
                let remaining = if a.id == touch.id { b } else { a };
                InteractionState::Panning {
                    touch: remaining,
                    velocity: Vec2::ZERO,
                    moved_at: self.clock,
                }
            }
            other => other,
        }
    }

    fn touch_cancelled(
        state: InteractionState,
        touch: &TouchSample,
        camera: &mut CameraController,
        out: &mut Vec<InteractionCommand>,
    ) -> InteractionState {
        match state {
            InteractionState::Pressing { touch: pressing, .. } if pressing.id == touch.id => {
                InteractionState::Idle
            }
            InteractionState::DraggingTower {
                tower,
                touch: dragging,
                ..
            } if dragging.id == touch.id => {
                out.push(InteractionCommand::CancelDrag { tower });
                InteractionState::Idle
            }
            InteractionState::Panning { touch: panning, .. } if panning.id == touch.id => {
                camera.end_pan(Vec2::ZERO);
                InteractionState::Idle
            }
            InteractionState::Pinching { a, b, .. } if a.id == touch.id || b.id == touch.id => {
                camera.end_pinch();
                InteractionState::Idle
            }
            other => other,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn drag(
        &self,
        tower: TowerId,
        origin: Vec2,
        hover: Option<TowerId>,
        touch: &TouchSample,
        board: &dyn BoardQuery,
        camera: &CameraController,
        out: &mut Vec<InteractionCommand>,
    ) -> InteractionState {
        let world = camera.screen_to_world(touch.position);
        out.push(InteractionCommand::DragTo { tower, world });
        let target = self.merge_target(tower, world, board);
        if target != hover {
            out.push(InteractionCommand::HoverMergeTarget { tower, target });
        }
        InteractionState::DraggingTower {
            tower,
            origin,
            current: world,
            touch: TrackedTouch {
                id: touch.id,
                position: touch.position,
            },
            hover: target,
        }
    }

    fn merge_target(&self, tower: TowerId, world: Vec2, board: &dyn BoardQuery) -> Option<TowerId> {
        board
            .tower_at(world, self.config.tower_hit_radius)
            .filter(|target| *target != tower && board.can_merge(tower, *target))
    }

    fn drop_tower(
        &mut self,
        tower: TowerId,
        world: Vec2,
        board: &dyn BoardQuery,
    ) -> InteractionCommand {
        if let Some(target) = self.merge_target(tower, world, board) {
            if self.selected == Some(tower) {
                self.selected = None;
            }
            return InteractionCommand::MergeTowers {
                source: tower,
                target,
            };
        }
        let destination = board
            .slot_at(world, self.config.slot_snap_radius)
            .filter(|slot| board.slot_free(*slot) && board.tower_slot(tower) != Some(*slot));
        match destination {
            Some(slot) => InteractionCommand::MoveTower { tower, slot },
            None => InteractionCommand::CancelDrag { tower },
        }
    }

    fn tap(
        &mut self,
        tower: Option<TowerId>,
        world: Vec2,
        board: &dyn BoardQuery,
        out: &mut Vec<InteractionCommand>,
    ) {
        if let Some(tower) = tower {
            if self.selected == Some(tower) {
                self.selected = None;
                out.push(InteractionCommand::ClearSelection);
            } else {
                self.selected = Some(tower);
                out.push(InteractionCommand::SelectTower { tower });
            }
            return;
        }

        if let Some(archetype) = self.placement {
            let slot = board
                .slot_at(world, self.config.slot_snap_radius)
                .filter(|slot| board.slot_free(*slot));
            if let Some(slot) = slot {
                self.placement = None;
                out.push(InteractionCommand::PlaceTower { archetype, slot });
                return;
            }
        }

        if self.selected.take().is_some() {
            out.push(InteractionCommand::ClearSelection);
        }
        out.push(InteractionCommand::TapEmpty { world });
    }
}

fn begin_pinch(
    first: TrackedTouch,
    second: TrackedTouch,
    camera: &mut CameraController,
) -> InteractionState {
    camera.begin_pinch();
    InteractionState::Pinching {
        a: first,
        b: second,
        last_distance: first.position.distance(second.position),
    }
}
