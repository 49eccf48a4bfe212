//! `fission-hal` – the ports the control core talks to.
//!
//! The core never touches a device directly.  It reads encoders and writes
//! power through [`Actuator`], tells time through [`Clock`], reads driver
//! input through a [`GamepadSnapshot`], and reports configuration problems
//! through a [`DiagnosticSink`].  Host programs supply real implementations;
//! the [`sim`] module and [`ManualClock`] stand in for them in tests.
//!
//! # Modules
//!
//! - [`actuator`] – [`Actuator`]: encoder reads, power writes, run modes and
//!   device metadata for a DC motor.
//! - [`clock`] – [`Clock`], [`SystemClock`], [`ManualClock`] and the
//!   resettable [`ElapsedTimer`].
//! - [`gamepad`] – [`GamepadSnapshot`]: one poll of a driver gamepad.
//! - [`diagnostics`] – [`DiagnosticSink`]: the host's diagnostic channel.
//! - [`pid`] – [`PidfController`]: PID with velocity/acceleration/constant
//!   feedforward, fed with motion-profile setpoints.
//! - [`registry`] – [`HardwareMap`]: named device lookup.
//! - [`sim`] – [`SimActuator`][sim::SimActuator] and
//!   [`SimHardware`][sim::SimHardware] for headless tests.

pub mod actuator;
pub mod clock;
pub mod diagnostics;
pub mod gamepad;
pub mod pid;
pub mod registry;
pub mod sim;

pub use actuator::{Actuator, DeviceInfo, Direction, RunMode, ZeroPowerBehavior};
pub use clock::{Clock, ElapsedTimer, ManualClock, SystemClock};
pub use diagnostics::{DiagnosticSink, MemorySink, TracingSink};
pub use gamepad::GamepadSnapshot;
pub use pid::PidfController;
pub use registry::HardwareMap;
