//! In-process simulation for testing without physical hardware.
//!
//! [`SimActuator`] is a motor with a first-order model: velocity follows
//! commanded power instantly (`velocity = power · free_speed`) and position
//! integrates velocity whenever [`SimHandle::step`] is called.  Each
//! simulated motor hands out a [`SimHandle`] so a test can keep poking at the
//! motor after ownership has moved into a mechanism.
//!
//! # Example
//!
//! ```rust
//! use fission_hal::sim::SimHardware;
//!
//! let (mut hardware, handles) = SimHardware::new().with_motor("lift").build();
//!
//! let mut lift = hardware.take_motor("lift").unwrap();
//! lift.set_power(0.5).unwrap();
//! assert_eq!(handles["lift"].power(), 0.5);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fission_types::FissionError;

use crate::actuator::{Actuator, DeviceInfo, Direction, RunMode, ZeroPowerBehavior};
use crate::registry::HardwareMap;

/// Free speed of a simulated motor, ticks per second at full power.
pub const DEFAULT_FREE_SPEED: f64 = 2_800.0;

// ────────────────────────────────────────────────────────────────────────────
// Simulated motor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct SimState {
    position: f64,
    velocity: f64,
    power: f64,
    free_speed: f64,
    direction: Direction,
    zero_power: ZeroPowerBehavior,
    modes: Vec<RunMode>,
    closed: bool,
    fault: Option<String>,
}

/// Shared view of a [`SimActuator`]'s state.
#[derive(Debug, Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimHandle {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Teleport the encoder to `ticks`.
    pub fn set_position(&self, ticks: f64) {
        self.lock().position = ticks;
    }

    /// Override the measured velocity in ticks per second.
    pub fn set_velocity(&self, ticks_per_sec: f64) {
        self.lock().velocity = ticks_per_sec;
    }

    pub fn position(&self) -> f64 {
        self.lock().position
    }

    pub fn velocity(&self) -> f64 {
        self.lock().velocity
    }

    pub fn power(&self) -> f64 {
        self.lock().power
    }

    pub fn zero_power_behavior(&self) -> ZeroPowerBehavior {
        self.lock().zero_power
    }

    /// Every run mode the motor has been put in, oldest first.
    pub fn mode_history(&self) -> Vec<RunMode> {
        self.lock().modes.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Make every subsequent setter fail with `details`.
    pub fn inject_fault(&self, details: impl Into<String>) {
        self.lock().fault = Some(details.into());
    }

    /// Advance the motor model by `dt` seconds.
    pub fn step(&self, dt: f64) {
        let mut s = self.lock();
        let sign = match s.direction {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        };
        s.velocity = sign * s.power * s.free_speed;
        s.position += s.velocity * dt;
    }
}

/// A simulated DC motor.  Setters succeed unless a fault was injected
/// through its [`SimHandle`].
#[derive(Debug)]
pub struct SimActuator {
    id: String,
    handle: SimHandle,
}

impl SimActuator {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_free_speed(id, DEFAULT_FREE_SPEED)
    }

    pub fn with_free_speed(id: impl Into<String>, free_speed: f64) -> Self {
        Self {
            id: id.into(),
            handle: SimHandle {
                state: Arc::new(Mutex::new(SimState {
                    position: 0.0,
                    velocity: 0.0,
                    power: 0.0,
                    free_speed,
                    direction: Direction::Forward,
                    zero_power: ZeroPowerBehavior::Float,
                    modes: Vec::new(),
                    closed: false,
                    fault: None,
                })),
            },
        }
    }

    pub fn handle(&self) -> SimHandle {
        self.handle.clone()
    }

    fn check_fault(&self) -> Result<MutexGuard<'_, SimState>, FissionError> {
        let state = self.handle.lock();
        match &state.fault {
            Some(details) => Err(FissionError::HardwareFault {
                component: self.id.clone(),
                details: details.clone(),
            }),
            None => Ok(state),
        }
    }
}

impl Actuator for SimActuator {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_mode(&mut self, mode: RunMode) -> Result<(), FissionError> {
        let mut s = self.check_fault()?;
        if mode == RunMode::StopAndResetEncoder {
            s.position = 0.0;
            s.velocity = 0.0;
            s.power = 0.0;
        }
        s.modes.push(mode);
        Ok(())
    }

    fn set_zero_power_behavior(
        &mut self,
        behavior: ZeroPowerBehavior,
    ) -> Result<(), FissionError> {
        self.check_fault()?.zero_power = behavior;
        Ok(())
    }

    fn current_position(&self) -> i32 {
        self.handle.position().round() as i32
    }

    fn velocity(&self) -> f64 {
        self.handle.velocity()
    }

    fn set_power(&mut self, power: f64) -> Result<(), FissionError> {
        self.check_fault()?.power = power.clamp(-1.0, 1.0);
        Ok(())
    }

    fn power(&self) -> f64 {
        self.handle.power()
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), FissionError> {
        self.check_fault()?.direction = direction;
        Ok(())
    }

    fn direction(&self) -> Direction {
        self.handle.lock().direction
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            manufacturer: "Fission".to_string(),
            device_name: "Simulated DC Motor".to_string(),
            connection_info: format!("sim:{}", self.id),
            version: 1,
        }
    }

    fn close(&mut self) {
        let mut s = self.handle.lock();
        s.power = 0.0;
        s.closed = true;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimHardware builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder that constructs a [`HardwareMap`] pre-populated with simulated
/// motors, returning a [`SimHandle`] for each one.
#[derive(Default)]
pub struct SimHardware {
    motors: Vec<SimActuator>,
}

impl SimHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a simulated motor with the default free speed.
    pub fn with_motor(mut self, id: impl Into<String>) -> Self {
        self.motors.push(SimActuator::new(id));
        self
    }

    /// Register a pre-built simulated motor.
    pub fn with_sim_motor(mut self, motor: SimActuator) -> Self {
        self.motors.push(motor);
        self
    }

    /// Consume the builder and return the populated [`HardwareMap`] along
    /// with a handle per motor, keyed by id.
    pub fn build(self) -> (HardwareMap, BTreeMap<String, SimHandle>) {
        let mut map = HardwareMap::new();
        let mut handles = BTreeMap::new();
        for motor in self.motors {
            handles.insert(motor.id.clone(), motor.handle());
            map.register_motor(Box::new(motor));
        }
        (map, handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_encoder_zeroes_position() {
        let mut motor = SimActuator::new("lift");
        let handle = motor.handle();
        handle.set_position(1234.0);
        assert_eq!(motor.current_position(), 1234);

        motor.set_mode(RunMode::StopAndResetEncoder).unwrap();
        assert_eq!(motor.current_position(), 0);
        assert_eq!(handle.mode_history(), vec![RunMode::StopAndResetEncoder]);
    }

    #[test]
    fn power_is_clamped() {
        let mut motor = SimActuator::new("lift");
        motor.set_power(3.0).unwrap();
        assert_eq!(motor.power(), 1.0);
        motor.set_power(-3.0).unwrap();
        assert_eq!(motor.power(), -1.0);
    }

    #[test]
    fn step_integrates_power() {
        let mut motor = SimActuator::with_free_speed("lift", 100.0);
        let handle = motor.handle();
        motor.set_power(0.5).unwrap();
        handle.step(2.0);
        assert!((handle.velocity() - 50.0).abs() < 1e-9);
        assert_eq!(motor.current_position(), 100);

        motor.set_direction(Direction::Reverse).unwrap();
        handle.step(1.0);
        assert_eq!(motor.current_position(), 50);
    }

    #[test]
    fn injected_fault_fails_setters() {
        let mut motor = SimActuator::new("lift");
        motor.handle().inject_fault("overcurrent");
        let err = motor.set_power(0.2).unwrap_err();
        assert!(err.to_string().contains("overcurrent"));
        assert_eq!(motor.power(), 0.0);
    }

    #[test]
    fn close_stops_motor() {
        let mut motor = SimActuator::new("lift");
        motor.set_power(0.8).unwrap();
        motor.close();
        assert!(motor.handle().is_closed());
        assert_eq!(motor.power(), 0.0);
    }

    #[test]
    fn sim_hardware_exposes_handles() {
        let (mut map, handles) = SimHardware::new()
            .with_motor("lift")
            .with_sim_motor(SimActuator::with_free_speed("arm", 500.0))
            .build();
        assert_eq!(map.names(), vec!["arm".to_string(), "lift".to_string()]);

        let mut arm = map.take_motor("arm").unwrap();
        arm.set_power(-0.25).unwrap();
        assert_eq!(handles["arm"].power(), -0.25);
        assert_eq!(handles["lift"].power(), 0.0);
    }
}
