//! `fission-types` – value types shared by every Fission crate.
//!
//! Nothing in here talks to hardware or owns a thread.  The crate holds the
//! configuration records an actuator is set up with, the kinematic
//! [`MotionState`] exchanged with the profile generator, and the workspace
//! error type [`FissionError`].

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Kinematics
// ────────────────────────────────────────────────────────────────────────────

/// A point on a single-axis motion plan: position, velocity, acceleration and
/// jerk.  Units follow whatever the caller works in (inches for a
/// profiled motor).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionState {
    pub x: f64,
    pub v: f64,
    pub a: f64,
    #[serde(default)]
    pub j: f64,
}

impl MotionState {
    pub fn new(x: f64, v: f64, a: f64, j: f64) -> Self {
        Self { x, v, a, j }
    }

    /// A state at rest at position `x`.
    pub fn at_rest(x: f64) -> Self {
        Self::new(x, 0.0, 0.0, 0.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Actuator configuration
// ────────────────────────────────────────────────────────────────────────────

/// Geometry of the spool / wheel / lead screw a motor drives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelConstants {
    /// Radius of the spool or wheel driven by the motor, in inches.
    pub wheel_radius: f64,
    /// Output revolutions per input revolution.
    pub gear_ratio: f64,
    /// Encoder ticks per input revolution.
    pub ticks_per_rev: f64,
}

impl WheelConstants {
    pub fn new(wheel_radius: f64, gear_ratio: f64, ticks_per_rev: f64) -> Self {
        Self {
            wheel_radius,
            gear_ratio,
            ticks_per_rev,
        }
    }

    /// Convert encoder ticks (or ticks per second) into linear inches (or
    /// inches per second).
    pub fn ticks_to_inches(&self, ticks: f64) -> f64 {
        self.wheel_radius * 2.0 * PI * self.gear_ratio * ticks / self.ticks_per_rev
    }
}

/// Velocity and acceleration bounds for a trapezoidal profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionConstraints {
    /// Inches per second.
    pub max_velocity: f64,
    /// Inches per second squared.
    pub max_acceleration: f64,
}

impl MotionConstraints {
    pub fn new(max_velocity: f64, max_acceleration: f64) -> Self {
        Self {
            max_velocity,
            max_acceleration,
        }
    }

    /// `true` when both bounds are positive and finite, so a profile under
    /// them actually moves.
    pub fn is_usable(&self) -> bool {
        let positive = |b: f64| b.is_finite() && b > 0.0;
        positive(self.max_velocity) && positive(self.max_acceleration)
    }

    /// Both bounds multiplied by `multiplier`.
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self::new(
            self.max_velocity * multiplier,
            self.max_acceleration * multiplier,
        )
    }
}

/// Gains for a PIDF controller.  `kf` is a constant feedforward term added to
/// every output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidfCoefficients {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    #[serde(default)]
    pub kf: f64,
}

impl PidfCoefficients {
    pub fn new(kp: f64, ki: f64, kd: f64, kf: f64) -> Self {
        Self { kp, ki, kd, kf }
    }
}

fn default_retraction_multiplier() -> f64 {
    1.0
}

/// Everything a profiled motor can be configured with.
///
/// Every section is optional: a missing section is not a load error, it is
/// reported through the configuration-missing diagnostic the first time the
/// motor needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Hardware-map name of the motor, defaults to the table key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Scales both motion constraints when retracting (target below the
    /// current position).
    #[serde(default = "default_retraction_multiplier")]
    pub retraction_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wheel: Option<WheelConstants>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<MotionConstraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<PidfCoefficients>,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            device: None,
            wheel: None,
            constraints: None,
            pid: None,
            retraction_multiplier: default_retraction_multiplier(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// A piece of actuator configuration that has to be set before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigItem {
    WheelConstants,
    MotionConstraints,
    PidCoefficients,
}

impl ConfigItem {
    /// The `ProfiledActuator` method that supplies this item.
    pub fn setter(&self) -> &'static str {
        match self {
            ConfigItem::WheelConstants => "set_wheel_constants",
            ConfigItem::MotionConstraints => "set_motion_constraints",
            ConfigItem::PidCoefficients => "set_pid_coefficients",
        }
    }
}

impl fmt::Display for ConfigItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigItem::WheelConstants => write!(f, "wheel constants"),
            ConfigItem::MotionConstraints => write!(f, "motion constraints"),
            ConfigItem::PidCoefficients => write!(f, "PID coefficients"),
        }
    }
}

/// Workspace-wide error type.  None of these are fatal to the host loop.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FissionError {
    #[error("{component}: {item} not set; call {}() first", .item.setter())]
    ConfigurationMissing { component: String, item: ConfigItem },

    #[error("{component}: {item} invalid: {details}")]
    ConfigurationInvalid {
        component: String,
        item: ConfigItem,
        details: String,
    },

    #[error("{component}: setup missing: {details}")]
    SetupMissing { component: String, details: String },

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Action '{action}' failed: {details}")]
    ActionFailed { action: String, details: String },

    #[error("Configuration Error: {0}")]
    Config(String),
}
