//! One poll of a driver gamepad.

use serde::{Deserialize, Serialize};

/// Button and trigger state read from a gamepad on one control tick.
///
/// Analog triggers range over `[0, 1]`; everything else is a plain boolean.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GamepadSnapshot {
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub start: bool,
    pub back: bool,
    pub left_bumper: bool,
    pub right_bumper: bool,
    pub left_stick_button: bool,
    pub right_stick_button: bool,
    pub left_trigger: f32,
    pub right_trigger: f32,
}

impl GamepadSnapshot {
    /// A snapshot with nothing engaged.
    pub fn idle() -> Self {
        Self::default()
    }
}
