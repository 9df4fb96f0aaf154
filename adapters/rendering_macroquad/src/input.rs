//! Translation of macroquad touch, mouse and wheel state into [`FrameInput`].

use firewall_defence_scene::{FrameInput, TouchPhase, TouchSample};
use glam::Vec2;
use macroquad::input::{
    is_key_pressed, is_mouse_button_down, is_mouse_button_pressed, mouse_position, mouse_wheel,
    touches, KeyCode, MouseButton, TouchPhase as MacroquadTouchPhase,
};

/// Touch identifier reported for the emulated mouse finger.
pub const MOUSE_TOUCH_ID: u64 = u64::MAX;

/// Emulates a single finger with the left mouse button.
///
/// Used on desktop where no touch events arrive, so the same gesture
/// handling drives both input styles.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MouseTouch {
    down: bool,
    last: Vec2,
}

impl MouseTouch {
    /// Folds one frame of mouse state into touch samples appended to `out`.
    pub fn observe(&mut self, pressed: bool, down: bool, position: Vec2, out: &mut Vec<TouchSample>) {
        if !self.down && (pressed || down) {
            out.push(TouchSample::new(MOUSE_TOUCH_ID, TouchPhase::Began, position));
            self.down = true;
        } else if self.down && !down {
            out.push(TouchSample::new(MOUSE_TOUCH_ID, TouchPhase::Ended, position));
            self.down = false;
        } else if self.down && position != self.last {
            out.push(TouchSample::new(MOUSE_TOUCH_ID, TouchPhase::Moved, position));
        }
        self.last = position;
    }

    /// Ends an emulated press that is still held, e.g. when real touches start.
    pub fn cancel(&mut self, out: &mut Vec<TouchSample>) {
        if self.down {
            out.push(TouchSample::new(
                MOUSE_TOUCH_ID,
                TouchPhase::Cancelled,
                self.last,
            ));
            self.down = false;
        }
    }

    /// Whether the emulated finger is down.
    #[must_use]
    pub fn is_down(&self) -> bool {
        self.down
    }
}

/// Maps a macroquad touch phase; stationary touches produce no sample.
pub(crate) fn touch_phase(phase: MacroquadTouchPhase) -> Option<TouchPhase> {
    match phase {
        MacroquadTouchPhase::Started => Some(TouchPhase::Began),
        MacroquadTouchPhase::Moved => Some(TouchPhase::Moved),
        MacroquadTouchPhase::Ended => Some(TouchPhase::Ended),
        MacroquadTouchPhase::Cancelled => Some(TouchPhase::Cancelled),
        MacroquadTouchPhase::Stationary => None,
    }
}

/// Wheel deltas differ wildly between platforms, so only the direction counts.
pub(crate) fn wheel_steps(raw: f32) -> f32 {
    if raw.abs() <= f32::EPSILON || !raw.is_finite() {
        0.0
    } else {
        raw.signum()
    }
}

const NUMBER_KEYS: [KeyCode; 10] = [
    KeyCode::Key0,
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
    KeyCode::Key6,
    KeyCode::Key7,
    KeyCode::Key8,
    KeyCode::Key9,
];

/// Lowest number key reported as pressed by `pressed`.
pub(crate) fn number_key(pressed: impl Fn(KeyCode) -> bool) -> Option<u8> {
    (0u8..)
        .zip(NUMBER_KEYS)
        .find(|(_, key)| pressed(*key))
        .map(|(digit, _)| digit)
}

/// Gathers the input observed since the previous frame.
pub(crate) fn capture(mouse: &mut MouseTouch, viewport: Vec2) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    let pointer = Vec2::new(cursor_x, cursor_y);
    let mut input = FrameInput {
        viewport,
        zoom_steps: wheel_steps(mouse_wheel().1),
        pointer: Some(pointer),
        number_key: number_key(is_key_pressed),
        ..FrameInput::default()
    };

    let observed = touches();
    if observed.is_empty() {
        mouse.observe(
            is_mouse_button_pressed(MouseButton::Left),
            is_mouse_button_down(MouseButton::Left),
            pointer,
            &mut input.touches,
        );
    } else {
        mouse.cancel(&mut input.touches);
        input.touches.extend(observed.iter().filter_map(|touch| {
            touch_phase(touch.phase).map(|phase| {
                TouchSample::new(
                    touch.id,
                    phase,
                    Vec2::new(touch.position.x, touch.position.y),
                )
            })
        }));
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_direction_ignores_magnitude() {
        assert_eq!(wheel_steps(120.0), 1.0);
        assert_eq!(wheel_steps(-0.5), -1.0);
        assert_eq!(wheel_steps(0.0), 0.0);
        assert_eq!(wheel_steps(f32::NAN), 0.0);
    }

    #[test]
    fn number_keys_map_to_their_digit() {
        assert_eq!(number_key(|key| key == KeyCode::Key7), Some(7));
        assert_eq!(number_key(|key| key == KeyCode::Key0), Some(0));
        assert_eq!(
            number_key(|key| matches!(key, KeyCode::Key2 | KeyCode::Key5)),
            Some(2)
        );
        assert_eq!(number_key(|_| false), None);
    }

    #[test]
    fn stationary_touches_are_dropped() {
        assert_eq!(touch_phase(MacroquadTouchPhase::Stationary), None);
        assert_eq!(
            touch_phase(MacroquadTouchPhase::Started),
            Some(TouchPhase::Began)
        );
    }

    #[test]
    fn held_mouse_reports_moves_only_when_the_cursor_travels() {
        let mut mouse = MouseTouch::default();
        let mut out = Vec::new();

        mouse.observe(true, true, Vec2::new(10.0, 10.0), &mut out);
        mouse.observe(false, true, Vec2::new(10.0, 10.0), &mut out);
        mouse.observe(false, true, Vec2::new(14.0, 10.0), &mut out);
        mouse.observe(false, false, Vec2::new(14.0, 10.0), &mut out);

        let phases: Vec<_> = out.iter().map(|sample| sample.phase).collect();
        assert_eq!(
            phases,
            vec![TouchPhase::Began, TouchPhase::Moved, TouchPhase::Ended]
        );
        assert!(out.iter().all(|sample| sample.id == MOUSE_TOUCH_ID));
    }

    #[test]
    fn cancel_only_reports_held_presses() {
        let mut mouse = MouseTouch::default();
        let mut out = Vec::new();

        mouse.cancel(&mut out);
        assert!(out.is_empty());

        mouse.observe(true, true, Vec2::ZERO, &mut out);
        mouse.cancel(&mut out);
        assert_eq!(out.last().map(|sample| sample.phase), Some(TouchPhase::Cancelled));
        assert!(!mouse.is_down());
    }
}
