//! `fission-runtime` – host-side setup for a robot control loop.
//!
//! # Modules
//!
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: global
//!   `tracing` subscriber with `RUST_LOG` filtering and optional JSON output.
//! - [`config`] – [`RobotConfig`]: TOML loop rate and actuator settings with
//!   `FISSION_*` environment overrides.
//! - [`actuators`] – [`build_actuators`]: one
//!   [`ProfiledActuator`][fission_motion::ProfiledActuator] per configured
//!   entry.
//! - [`loop_rate`] – [`LoopRate`]: fixed-rate pacing with overrun warnings.

pub mod actuators;
pub mod config;
pub mod loop_rate;
pub mod telemetry;

pub use actuators::{build_actuators, build_actuators_with};
pub use config::RobotConfig;
pub use loop_rate::LoopRate;
