//! `fission-motion` – motion-profiled actuators.
//!
//! # Modules
//!
//! - [`profile`] – [`MotionProfile`][profile::MotionProfile] and the
//!   [`ProfileGenerator`][profile::ProfileGenerator] port, with the
//!   time-optimal [`TrapezoidalGenerator`][profile::TrapezoidalGenerator].
//! - [`profiled_actuator`] – [`ProfiledActuator`][profiled_actuator::ProfiledActuator]:
//!   turns a target in inches into a profile, then closes the loop on it with
//!   a PIDF step every control tick.

pub mod profile;
pub mod profiled_actuator;

pub use profile::{MotionProfile, MotionSegment, ProfileGenerator, TrapezoidalGenerator};
pub use profiled_actuator::ProfiledActuator;
