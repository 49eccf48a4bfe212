//! [`HardwareMap`] – named device lookup.
//!
//! The host registers every motor it owns under its configured name before
//! the match.  Mechanisms then acquire the motors they drive by name; a
//! motor can be acquired once, after which the mechanism owns it.

use std::collections::BTreeMap;

use fission_types::FissionError;

use crate::actuator::Actuator;

/// Registry of named [`Actuator`] drivers.
#[derive(Default)]
pub struct HardwareMap {
    motors: BTreeMap<String, Box<dyn Actuator>>,
}

impl HardwareMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a motor under its [`Actuator::id`].  Any previously
    /// registered motor with the same id is replaced.
    pub fn register_motor(&mut self, motor: Box<dyn Actuator>) {
        self.motors.insert(motor.id().to_string(), motor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.motors.contains_key(name)
    }

    /// Names of every motor still available, in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.motors.keys().cloned().collect()
    }

    /// Acquire exclusive ownership of the motor registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FissionError::HardwareFault`] when no motor is registered
    /// under `name` (or it has already been acquired).
    pub fn take_motor(&mut self, name: &str) -> Result<Box<dyn Actuator>, FissionError> {
        self.motors
            .remove(name)
            .ok_or_else(|| FissionError::HardwareFault {
                component: name.to_string(),
                details: format!("motor '{name}' is not registered"),
            })
    }
}

impl std::fmt::Debug for HardwareMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareMap")
            .field("motors", &self.motors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimActuator;

    #[test]
    fn take_registered_motor() {
        let mut map = HardwareMap::new();
        map.register_motor(Box::new(SimActuator::new("lift")));
        assert!(map.contains("lift"));

        let motor = map.take_motor("lift").unwrap();
        assert_eq!(motor.id(), "lift");
        assert!(!map.contains("lift"));
    }

    #[test]
    fn take_unknown_motor_is_hardware_fault() {
        let mut map = HardwareMap::new();
        let err = map.take_motor("ghost").err().unwrap();
        assert!(matches!(err, FissionError::HardwareFault { ref component, .. } if component == "ghost"));
    }

    #[test]
    fn motor_can_only_be_taken_once() {
        let mut map = HardwareMap::new();
        map.register_motor(Box::new(SimActuator::new("arm")));
        assert!(map.take_motor("arm").is_ok());
        assert!(map.take_motor("arm").is_err());
    }

    #[test]
    fn register_replaces_same_id() {
        let mut map = HardwareMap::new();
        map.register_motor(Box::new(SimActuator::new("arm")));
        map.register_motor(Box::new(SimActuator::new("arm")));
        map.register_motor(Box::new(SimActuator::new("lift")));
        assert_eq!(map.names(), vec!["arm".to_string(), "lift".to_string()]);
    }
}
