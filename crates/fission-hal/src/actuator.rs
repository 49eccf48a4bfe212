//! Generic `Actuator` trait for encoder-equipped DC motors.
//!
//! Drivers implement this trait and register themselves with a
//! [`HardwareMap`][crate::registry::HardwareMap].  The motion code only ever
//! talks to the trait, so a real motor controller and a
//! [`SimActuator`][crate::sim::SimActuator] are interchangeable.

use fission_types::FissionError;
use serde::{Deserialize, Serialize};

/// How the motor controller interprets power commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Stop the motor and zero the encoder count.
    StopAndResetEncoder,
    /// Raw power; the controller runs no loop of its own.
    RunWithoutEncoder,
    /// Power is interpreted as a velocity setpoint for the on-board loop.
    RunUsingEncoder,
    /// The controller drives to its own position target.
    RunToPosition,
}

/// What the motor does when commanded zero power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZeroPowerBehavior {
    Brake,
    Float,
}

/// Logical direction of rotation for positive power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

/// Descriptive metadata reported by a device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub device_name: String,
    pub connection_info: String,
    pub version: u32,
}

/// An encoder-equipped DC motor.
///
/// Setters return [`FissionError::HardwareFault`] when the controller rejects
/// a command.  Getters report the most recently known value and never fail.
pub trait Actuator: Send {
    /// Stable identifier for this motor, e.g. `"lift"` or `"arm_spool"`.
    fn id(&self) -> &str;

    fn set_mode(&mut self, mode: RunMode) -> Result<(), FissionError>;

    fn set_zero_power_behavior(&mut self, behavior: ZeroPowerBehavior)
    -> Result<(), FissionError>;

    /// Encoder position in ticks.
    fn current_position(&self) -> i32;

    /// Encoder velocity in ticks per second.
    fn velocity(&self) -> f64;

    /// Command a power level in `[-1, 1]`.
    fn set_power(&mut self, power: f64) -> Result<(), FissionError>;

    /// The most recently commanded power level.
    fn power(&self) -> f64;

    fn set_direction(&mut self, direction: Direction) -> Result<(), FissionError>;

    fn direction(&self) -> Direction;

    fn device_info(&self) -> DeviceInfo;

    /// Restore the configuration expected at the start of a match (e.g.
    /// direction back to forward).
    fn reset_device_configuration(&mut self) -> Result<(), FissionError> {
        self.set_direction(Direction::Forward)
    }

    /// Release the device.  Further commands may fail.
    fn close(&mut self) {}
}
