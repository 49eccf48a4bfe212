//! [`InputTag`] – the gamepad input that triggers a teleop sequence.
//!
//! A snapshot resolves to exactly one tag: the first engaged input in
//! [`InputTag::PRIORITY`] order, or [`InputTag::None`] when nothing is
//! engaged.  Analog triggers count as engaged at any value above zero.

use std::fmt;

use fission_hal::GamepadSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputTag {
    /// Nothing engaged.
    #[default]
    None,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    A,
    B,
    X,
    Y,
    Start,
    Back,
    LeftBumper,
    RightBumper,
    LeftStickButton,
    RightStickButton,
    LeftTrigger,
    RightTrigger,
}

impl InputTag {
    /// Every active tag, highest priority first.
    pub const PRIORITY: [InputTag; 16] = [
        InputTag::DpadUp,
        InputTag::DpadDown,
        InputTag::DpadLeft,
        InputTag::DpadRight,
        InputTag::A,
        InputTag::B,
        InputTag::X,
        InputTag::Y,
        InputTag::Start,
        InputTag::Back,
        InputTag::LeftBumper,
        InputTag::RightBumper,
        InputTag::LeftStickButton,
        InputTag::RightStickButton,
        InputTag::LeftTrigger,
        InputTag::RightTrigger,
    ];

    /// The highest-priority engaged input in `snapshot`.
    pub fn from_snapshot(snapshot: &GamepadSnapshot) -> InputTag {
        Self::PRIORITY
            .into_iter()
            .find(|tag| tag.is_pressed(snapshot))
            .unwrap_or(InputTag::None)
    }

    /// Whether this input is engaged in `snapshot`.  [`InputTag::None`] is
    /// never pressed.
    pub fn is_pressed(self, snapshot: &GamepadSnapshot) -> bool {
        match self {
            InputTag::None => false,
            InputTag::DpadUp => snapshot.dpad_up,
            InputTag::DpadDown => snapshot.dpad_down,
            InputTag::DpadLeft => snapshot.dpad_left,
            InputTag::DpadRight => snapshot.dpad_right,
            InputTag::A => snapshot.a,
            InputTag::B => snapshot.b,
            InputTag::X => snapshot.x,
            InputTag::Y => snapshot.y,
            InputTag::Start => snapshot.start,
            InputTag::Back => snapshot.back,
            InputTag::LeftBumper => snapshot.left_bumper,
            InputTag::RightBumper => snapshot.right_bumper,
            InputTag::LeftStickButton => snapshot.left_stick_button,
            InputTag::RightStickButton => snapshot.right_stick_button,
            InputTag::LeftTrigger => snapshot.left_trigger > 0.0,
            InputTag::RightTrigger => snapshot.right_trigger > 0.0,
        }
    }
}

impl fmt::Display for InputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InputTag::None => "NONE",
            InputTag::DpadUp => "DPAD_UP",
            InputTag::DpadDown => "DPAD_DOWN",
            InputTag::DpadLeft => "DPAD_LEFT",
            InputTag::DpadRight => "DPAD_RIGHT",
            InputTag::A => "A",
            InputTag::B => "B",
            InputTag::X => "X",
            InputTag::Y => "Y",
            InputTag::Start => "START",
            InputTag::Back => "BACK",
            InputTag::LeftBumper => "LEFT_BUMPER",
            InputTag::RightBumper => "RIGHT_BUMPER",
            InputTag::LeftStickButton => "LEFT_STICK_BUTTON",
            InputTag::RightStickButton => "RIGHT_STICK_BUTTON",
            InputTag::LeftTrigger => "LEFT_TRIGGER",
            InputTag::RightTrigger => "RIGHT_TRIGGER",
        };
        f.write_str(s)
    }
}
